//! Dependency tracking.
//!
//! An [`Observer`] runs a callback while recording every state cell the
//! callback reads. When any of those cells is written, the observer is queued
//! on its runtime and replayed on the next flush. Each replay starts a new
//! generation, so cells read only by an earlier run stop triggering it.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::runtime::RuntimeHandle;

pub(crate) type ObserverId = usize;

static NEXT_OBSERVER_ID: AtomicUsize = AtomicUsize::new(1);

fn next_observer_id() -> ObserverId {
    NEXT_OBSERVER_ID.fetch_add(1, Ordering::Relaxed)
}

type ObserverCallback = Box<dyn FnMut() + 'static>;

pub(crate) struct ObserverInner {
    id: ObserverId,
    runtime: RuntimeHandle,
    active: Cell<bool>,
    generation: Cell<u64>,
    reads: Cell<usize>,
    runs: Cell<usize>,
    callback: RefCell<Option<ObserverCallback>>,
}

impl ObserverInner {
    pub(crate) fn id(&self) -> ObserverId {
        self.id
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.get()
    }

    pub(crate) fn record_read(&self) {
        self.reads.set(self.reads.get() + 1);
    }
}

thread_local! {
    // `None` entries mark untracked sections inside a tracked run.
    static CURRENT_OBSERVER: RefCell<Vec<Option<Weak<ObserverInner>>>> = RefCell::new(Vec::new());
}

/// The observer currently recording reads, if any.
pub(crate) fn current_observer() -> Option<Rc<ObserverInner>> {
    CURRENT_OBSERVER.with(|stack| {
        stack
            .borrow()
            .last()
            .and_then(|entry| entry.as_ref())
            .and_then(Weak::upgrade)
    })
}

struct StackGuard;

impl StackGuard {
    fn push(entry: Option<Weak<ObserverInner>>) -> Self {
        CURRENT_OBSERVER.with(|stack| stack.borrow_mut().push(entry));
        StackGuard
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        CURRENT_OBSERVER.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Run `f` without recording any reads against the enclosing observer.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let _guard = StackGuard::push(None);
    f()
}

/// Handle to a tracked callback. Dropping the last handle disposes it.
#[derive(Clone)]
pub struct Observer {
    inner: Rc<ObserverInner>,
}

impl Observer {
    /// Register `callback` and queue its first run on `runtime`.
    pub fn new(runtime: &RuntimeHandle, callback: impl FnMut() + 'static) -> Self {
        let observer = Self {
            inner: Rc::new(ObserverInner {
                id: next_observer_id(),
                runtime: runtime.clone(),
                active: Cell::new(true),
                generation: Cell::new(0),
                reads: Cell::new(0),
                runs: Cell::new(0),
                callback: RefCell::new(Some(Box::new(callback))),
            }),
        };
        observer.invalidate();
        observer
    }

    pub(crate) fn from_inner(inner: Rc<ObserverInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<ObserverInner> {
        Rc::downgrade(&self.inner)
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    /// Number of times the callback has run.
    pub fn run_count(&self) -> usize {
        self.inner.runs.get()
    }

    /// Number of state reads recorded during the latest run.
    pub fn dependency_count(&self) -> usize {
        self.inner.reads.get()
    }

    /// Queue a replay on the owning runtime.
    pub fn invalidate(&self) {
        if !self.inner.active.get() {
            return;
        }
        self.inner
            .runtime
            .enqueue_observer(self.inner.id, self.downgrade());
    }

    /// Run the callback now, recording a fresh read set.
    pub(crate) fn run(&self) {
        if !self.inner.active.get() {
            return;
        }
        let Some(mut callback) = self.inner.callback.borrow_mut().take() else {
            // Already running further up the stack; the write that queued us
            // will be observed by that run.
            return;
        };
        self.inner.generation.set(self.inner.generation.get() + 1);
        self.inner.reads.set(0);
        {
            let _guard = StackGuard::push(Some(self.downgrade()));
            callback();
        }
        self.inner.runs.set(self.inner.runs.get() + 1);
        if self.inner.active.get() {
            *self.inner.callback.borrow_mut() = Some(callback);
        }
    }

    /// Stop tracking and drop the callback.
    pub fn dispose(&self) {
        if !self.inner.active.replace(false) {
            return;
        }
        self.inner.runtime.forget_observer(self.inner.id);
        let callback = self.inner.callback.borrow_mut().take();
        drop(callback);
    }
}

/// Register a tracked callback on `runtime`.
///
/// The callback runs on the next flush and again whenever a state it read
/// during its latest run changes.
pub fn watch(runtime: &RuntimeHandle, callback: impl FnMut() + 'static) -> Observer {
    Observer::new(runtime, callback)
}
