//! Synchronization primitives used by the engine, swapped for their `loom` counterparts when the
//! crate is built with `--cfg loom`.
//!
//! The lock and condition variable expose the same small surface in both builds: `lock()` hands
//! back a guard directly and `Condvar::wait` consumes a guard and returns it re-acquired.

use std::io;

#[cfg(loom)]
pub(crate) mod atomic {
    pub use loom::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
}

#[cfg(not(loom))]
pub(crate) mod atomic {
    pub use core::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
}

#[cfg(not(loom))]
mod imp {
    use std::io;
    use std::thread;

    pub(crate) use parking_lot::MutexGuard;
    pub(crate) use std::thread::JoinHandle;

    #[derive(Debug, Default)]
    pub(crate) struct Mutex(parking_lot::Mutex<()>);

    impl Mutex {
        pub(crate) fn new() -> Self {
            Mutex(parking_lot::Mutex::new(()))
        }

        pub(crate) fn lock(&self) -> MutexGuard<'_, ()> {
            self.0.lock()
        }
    }

    #[derive(Debug, Default)]
    pub(crate) struct Condvar(parking_lot::Condvar);

    impl Condvar {
        pub(crate) fn new() -> Self {
            Condvar(parking_lot::Condvar::new())
        }

        pub(crate) fn wait<'a>(&self, mut guard: MutexGuard<'a, ()>) -> MutexGuard<'a, ()> {
            self.0.wait(&mut guard);
            guard
        }

        pub(crate) fn notify_all(&self) -> usize {
            self.0.notify_all()
        }
    }

    pub(crate) fn spawn<F, T>(name: String, f: F) -> io::Result<JoinHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        thread::Builder::new().name(name).spawn(f)
    }

    #[inline]
    pub(crate) fn spin_loop() {
        core::hint::spin_loop();
    }
}

#[cfg(loom)]
mod imp {
    use core::fmt;
    use std::io;
    use std::sync::PoisonError;

    pub(crate) use loom::sync::MutexGuard;
    pub(crate) use loom::thread::JoinHandle;

    pub(crate) struct Mutex(loom::sync::Mutex<()>);

    impl fmt::Debug for Mutex {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("Mutex { .. }")
        }
    }

    impl Mutex {
        pub(crate) fn new() -> Self {
            Mutex(loom::sync::Mutex::new(()))
        }

        pub(crate) fn lock(&self) -> MutexGuard<'_, ()> {
            self.0.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    pub(crate) struct Condvar(loom::sync::Condvar);

    impl fmt::Debug for Condvar {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("Condvar { .. }")
        }
    }

    impl Condvar {
        pub(crate) fn new() -> Self {
            Condvar(loom::sync::Condvar::new())
        }

        pub(crate) fn wait<'a>(&self, guard: MutexGuard<'a, ()>) -> MutexGuard<'a, ()> {
            self.0.wait(guard).unwrap_or_else(PoisonError::into_inner)
        }

        // loom does not report how many waiters were woken
        pub(crate) fn notify_all(&self) -> usize {
            self.0.notify_all();
            0
        }
    }

    pub(crate) fn spawn<F, T>(_name: String, f: F) -> io::Result<JoinHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        Ok(loom::thread::spawn(f))
    }

    // Busy loops have to yield under loom or the model never makes progress.
    #[inline]
    pub(crate) fn spin_loop() {
        loom::thread::yield_now();
    }
}

pub(crate) use imp::{spin_loop, Condvar, JoinHandle, Mutex};

/// Spawns a named OS thread, surfacing creation failure instead of panicking.
pub(crate) fn spawn<F, T>(name: String, f: F) -> io::Result<JoinHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    imp::spawn(name, f)
}
