//! Standard runtime services backed by Rust's `std` library.
//!
//! This crate provides a concrete [`RuntimeScheduler`] for hosts that poll:
//! the scheduler remembers that a flush was requested and optionally wakes
//! the host loop. [`StdRuntime`] bundles it with a [`Runtime`].

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use skyview_core::{Runtime, RuntimeHandle, RuntimeScheduler};

/// Scheduler that records flush requests in an atomic flag.
pub struct StdScheduler {
    flush_requested: AtomicBool,
    waker: RwLock<Option<Arc<dyn Fn() + Send + Sync + 'static>>>,
}

impl StdScheduler {
    pub fn new() -> Self {
        Self {
            flush_requested: AtomicBool::new(false),
            waker: RwLock::new(None),
        }
    }

    /// Returns whether a flush has been requested since the last call.
    pub fn take_flush_request(&self) -> bool {
        self.flush_requested.swap(false, Ordering::SeqCst)
    }

    /// Registers a waker invoked whenever a new flush is requested.
    pub fn set_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        if let Ok(mut slot) = self.waker.write() {
            *slot = Some(Arc::new(waker));
        }
    }

    /// Clears any registered waker.
    pub fn clear_waker(&self) {
        if let Ok(mut slot) = self.waker.write() {
            *slot = None;
        }
    }

    fn wake(&self) {
        let waker = self.waker.read().ok().and_then(|slot| slot.clone());
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl Default for StdScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdScheduler")
            .field(
                "flush_requested",
                &self.flush_requested.load(Ordering::SeqCst),
            )
            .finish()
    }
}

impl RuntimeScheduler for StdScheduler {
    fn request_flush(&self) {
        self.flush_requested.store(true, Ordering::SeqCst);
        self.wake();
    }
}

/// Convenience container bundling the standard scheduler with a runtime.
#[derive(Clone)]
pub struct StdRuntime {
    scheduler: Arc<StdScheduler>,
    runtime: Runtime,
}

impl StdRuntime {
    pub fn new() -> Self {
        let scheduler = Arc::new(StdScheduler::default());
        let runtime = Runtime::new(scheduler.clone());
        Self { scheduler, runtime }
    }

    pub fn runtime(&self) -> Runtime {
        self.runtime.clone()
    }

    pub fn handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn scheduler(&self) -> Arc<StdScheduler> {
        Arc::clone(&self.scheduler)
    }

    /// Returns whether a flush was requested since the last call.
    pub fn take_flush_request(&self) -> bool {
        self.scheduler.take_flush_request()
    }

    /// Flush until idle if a flush was requested. Returns the items processed.
    pub fn poll(&self) -> usize {
        if !self.take_flush_request() && self.runtime.is_idle() {
            return 0;
        }
        self.runtime.flush()
    }
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .field("needs_flush", &self.runtime.needs_flush())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyview_core::{mutableStateOf, watch};
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn writes_raise_flush_request_and_wake() {
        let runtime = StdRuntime::new();
        let wakes = Arc::new(AtomicUsize::new(0));
        runtime.scheduler().set_waker({
            let wakes = Arc::clone(&wakes);
            move || {
                wakes.fetch_add(1, Ordering::SeqCst);
            }
        });

        let handle = runtime.handle();
        let value = mutableStateOf(&handle, 0);
        let observer = watch(&handle, {
            let value = value.clone();
            move || {
                value.value();
            }
        });

        assert!(runtime.poll() > 0);
        assert_eq!(observer.run_count(), 1);
        assert_eq!(runtime.poll(), 0);

        value.set_value(1);
        assert!(wakes.load(Ordering::SeqCst) >= 2);
        assert_eq!(runtime.poll(), 1);
        assert_eq!(observer.run_count(), 2);
    }

    #[test]
    fn cleared_waker_is_not_called() {
        let runtime = StdRuntime::new();
        let wakes = Arc::new(AtomicUsize::new(0));
        runtime.scheduler().set_waker({
            let wakes = Arc::clone(&wakes);
            move || {
                wakes.fetch_add(1, Ordering::SeqCst);
            }
        });
        runtime.scheduler().clear_waker();
        runtime.handle().spawn_task(|| {});
        assert_eq!(wakes.load(Ordering::SeqCst), 0);
        assert!(runtime.take_flush_request());
    }
}
