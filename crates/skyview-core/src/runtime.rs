use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use crate::hash::HashSet;
use crate::observer::{Observer, ObserverId, ObserverInner};
use crate::platform::RuntimeScheduler;

type Task = Box<dyn FnOnce() + 'static>;

struct RuntimeInner {
    scheduler: Arc<dyn RuntimeScheduler>,
    needs_flush: Cell<bool>,
    flushing: Cell<bool>,
    queued: RefCell<HashSet<ObserverId>>,
    observer_queue: RefCell<VecDeque<(ObserverId, Weak<ObserverInner>)>>,
    pending_tasks: RefCell<VecDeque<Task>>,
}

impl RuntimeInner {
    fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            scheduler,
            needs_flush: Cell::new(false),
            flushing: Cell::new(false),
            queued: RefCell::new(HashSet::new()),
            observer_queue: RefCell::new(VecDeque::new()),
            pending_tasks: RefCell::new(VecDeque::new()),
        }
    }

    fn schedule(&self) {
        self.needs_flush.set(true);
        self.scheduler.request_flush();
    }

    fn enqueue_observer(&self, id: ObserverId, observer: Weak<ObserverInner>) {
        if self.queued.borrow_mut().insert(id) {
            self.observer_queue.borrow_mut().push_back((id, observer));
            self.schedule();
        }
    }

    fn forget_observer(&self, id: ObserverId) {
        self.queued.borrow_mut().remove(&id);
    }

    fn pop_observer(&self) -> Option<(ObserverId, Weak<ObserverInner>)> {
        let next = self.observer_queue.borrow_mut().pop_front();
        if let Some((id, _)) = &next {
            self.queued.borrow_mut().remove(id);
        }
        next
    }

    fn has_pending_effects(&self) -> bool {
        !self.observer_queue.borrow().is_empty()
    }

    fn enqueue_task(&self, task: Task) {
        self.pending_tasks.borrow_mut().push_back(task);
        self.schedule();
    }

    fn drain_tasks(&self) -> usize {
        let tasks: Vec<Task> = {
            let mut pending = self.pending_tasks.borrow_mut();
            pending.drain(..).collect()
        };
        let count = tasks.len();
        for task in tasks {
            task();
        }
        count
    }

    fn has_tasks(&self) -> bool {
        !self.pending_tasks.borrow().is_empty()
    }

    fn is_idle(&self) -> bool {
        !self.has_tasks() && !self.has_pending_effects()
    }
}

/// Owner of the effect queue and task queue for one application session.
///
/// Everything runs on the thread that owns the `Runtime`. Effects are
/// delivered one at a time from [`Runtime::flush`], so two passes of the same
/// effect never overlap.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner::new(scheduler)),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle(Rc::downgrade(&self.inner))
    }

    pub fn needs_flush(&self) -> bool {
        self.inner.needs_flush.get()
    }

    pub fn is_idle(&self) -> bool {
        self.inner.is_idle()
    }

    /// Run queued tasks and effects until both queues are empty.
    ///
    /// Returns how many tasks and effect passes ran. A nested call made from
    /// inside an effect returns `0` immediately; the outer flush picks up
    /// anything the effect queued.
    pub fn flush(&self) -> usize {
        if self.inner.flushing.replace(true) {
            return 0;
        }
        let mut processed = 0;
        loop {
            let mut progressed = false;

            let tasks = self.inner.drain_tasks();
            if tasks > 0 {
                processed += tasks;
                progressed = true;
            }

            while let Some((id, weak)) = self.inner.pop_observer() {
                match weak.upgrade() {
                    Some(inner) => {
                        Observer::from_inner(inner).run();
                        processed += 1;
                        progressed = true;
                    }
                    None => self.inner.forget_observer(id),
                }
            }

            if !progressed {
                break;
            }
        }
        self.inner.flushing.set(false);
        self.inner.needs_flush.set(false);
        if processed > 0 {
            log::trace!("runtime flush processed {processed} item(s)");
        }
        processed
    }
}

#[derive(Default)]
pub struct DefaultScheduler;

impl RuntimeScheduler for DefaultScheduler {
    fn request_flush(&self) {}
}

/// Weak handle to a [`Runtime`]. Calls on a handle whose runtime is gone are
/// no-ops, except [`RuntimeHandle::spawn_task`] which runs the task inline.
#[derive(Clone)]
pub struct RuntimeHandle(pub(crate) Weak<RuntimeInner>);

impl RuntimeHandle {
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    pub fn schedule(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.schedule();
        }
    }

    pub fn spawn_task(&self, task: impl FnOnce() + 'static) {
        if let Some(inner) = self.0.upgrade() {
            inner.enqueue_task(Box::new(task));
        } else {
            task();
        }
    }

    pub fn drain_tasks(&self) -> usize {
        self.0
            .upgrade()
            .map(|inner| inner.drain_tasks())
            .unwrap_or(0)
    }

    pub fn has_pending_tasks(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.has_tasks())
            .unwrap_or(false)
    }

    pub fn has_pending_effects(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.has_pending_effects())
            .unwrap_or(false)
    }

    /// Flush the owning runtime, if it is still alive.
    pub fn flush(&self) -> usize {
        self.0
            .upgrade()
            .map(|inner| Runtime { inner }.flush())
            .unwrap_or(0)
    }

    pub(crate) fn enqueue_observer(&self, id: ObserverId, observer: Weak<ObserverInner>) {
        if let Some(inner) = self.0.upgrade() {
            inner.enqueue_observer(id, observer);
        }
    }

    pub(crate) fn forget_observer(&self, id: ObserverId) {
        if let Some(inner) = self.0.upgrade() {
            inner.forget_observer(id);
        }
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct TestScheduler {
    requests: Cell<usize>,
}

#[cfg(test)]
impl TestScheduler {
    pub fn requests(&self) -> usize {
        self.requests.get()
    }
}

#[cfg(test)]
impl RuntimeScheduler for TestScheduler {
    fn request_flush(&self) {
        self.requests.set(self.requests.get() + 1);
    }
}

#[cfg(test)]
pub struct TestRuntime {
    runtime: Runtime,
    scheduler: Arc<TestScheduler>,
}

#[cfg(test)]
impl TestRuntime {
    pub fn new() -> Self {
        let scheduler = Arc::new(TestScheduler::default());
        Self {
            runtime: Runtime::new(scheduler.clone()),
            scheduler,
        }
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn flush_requests(&self) -> usize {
        self.scheduler.requests()
    }
}
