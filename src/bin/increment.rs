use std::env;
use std::error::Error;
use std::num::NonZeroUsize;
use std::process;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use round_robin_counter::timer::ElapsedTimer;
use round_robin_counter::{PinningPolicy, RunConfig, StrategyKind};

const HELP: &str = "\
usage: increment <num_threads> <max_value> [strategy|all] [--pin]

strategies: blocking-lock, spin-lock, wait-notify (default), lock-free
            `all` runs every strategy one after another
--pin       pin worker i to core i mod available cores";

#[derive(Debug, PartialEq)]
enum ParseError {
    Help,
    Invalid(String),
}

struct Args {
    workers: NonZeroUsize,
    target: usize,
    strategies: Vec<StrategyKind>,
    pinning: PinningPolicy,
}

fn parse_args(args: &[String]) -> Result<Args, ParseError> {
    let mut positional = Vec::new();
    let mut pinning = PinningPolicy::None;
    for arg in args {
        match arg.as_str() {
            "--pin" => pinning = PinningPolicy::RoundRobin,
            "-h" | "--help" => return Err(ParseError::Help),
            _ => positional.push(arg.as_str()),
        }
    }

    let (workers, target, strategy) = match positional.as_slice() {
        [workers, target] => (*workers, *target, None),
        [workers, target, strategy] => (*workers, *target, Some(*strategy)),
        _ => {
            return Err(ParseError::Invalid(
                "expected <num_threads> <max_value>".to_owned(),
            ))
        }
    };

    let workers = workers
        .parse::<NonZeroUsize>()
        .map_err(|_| {
            ParseError::Invalid(format!(
                "invalid thread count `{}`, expected a positive integer",
                workers
            ))
        })?;
    let target = target
        .parse::<usize>()
        .map_err(|_| ParseError::Invalid(format!("invalid max value `{}`", target)))?;
    let strategies = match strategy {
        None => vec![StrategyKind::default()],
        Some("all") => StrategyKind::ALL.to_vec(),
        Some(name) => vec![name
            .parse::<StrategyKind>()
            .map_err(|e| ParseError::Invalid(e.to_string()))?],
    };

    Ok(Args {
        workers,
        target,
        strategies,
        pinning,
    })
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let args = env::args().skip(1).collect::<Vec<_>>();
    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(ParseError::Help) => {
            println!("{}", HELP);
            return Ok(());
        }
        Err(ParseError::Invalid(message)) => {
            eprintln!("{}", message);
            eprintln!("{}", HELP);
            process::exit(1);
        }
    };

    for strategy in args.strategies {
        let config = RunConfig::new(args.workers, args.target)
            .strategy(strategy)
            .pinning(args.pinning);

        info!(
            strategy = %strategy,
            num_threads = args.workers.get(),
            max_value = args.target,
            "incrementing"
        );
        let report = {
            let _timer = ElapsedTimer::new("main");
            config.run()
        };

        match report {
            Ok(report) => info!(
                strategy = %strategy,
                final_value = report.final_value,
                lock_acquisitions = report.stats.lock_acquisitions,
                parks = report.stats.parks,
                cas_retries = report.stats.cas_retries,
                "done"
            ),
            Err(err) => {
                error!(strategy = %strategy, error = %err, "run failed");
                return Err(err.into());
            }
        }
    }

    Ok(())
}
