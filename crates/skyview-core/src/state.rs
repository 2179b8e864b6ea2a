use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::observer::{current_observer, Observer, ObserverInner};
use crate::runtime::RuntimeHandle;

struct Watcher {
    observer: Weak<ObserverInner>,
    generation: u64,
}

struct MutableStateInner<T> {
    value: RefCell<T>,
    watchers: RefCell<Vec<Watcher>>,
    version: Cell<u64>,
    _runtime: RuntimeHandle,
}

impl<T> MutableStateInner<T> {
    fn subscribe_current_observer(&self) {
        let Some(observer) = current_observer() else {
            return;
        };
        let generation = observer.generation();
        let mut watchers = self.watchers.borrow_mut();
        watchers.retain(|w| w.observer.strong_count() > 0);
        let existing = watchers.iter().position(|w| {
            w.observer
                .upgrade()
                .map(|inner| inner.id() == observer.id())
                .unwrap_or(false)
        });
        match existing {
            Some(index) if watchers[index].generation == generation => return,
            Some(index) => watchers[index].generation = generation,
            None => watchers.push(Watcher {
                observer: Rc::downgrade(&observer),
                generation,
            }),
        }
        observer.record_read();
    }

    fn notify(&self) {
        self.version.set(self.version.get() + 1);
        // Collect first: invalidation may re-enter `value()` on this cell.
        let stale: Vec<Rc<ObserverInner>> = {
            let mut watchers = self.watchers.borrow_mut();
            watchers.retain(|w| w.observer.strong_count() > 0);
            watchers
                .iter()
                .filter_map(|w| {
                    w.observer
                        .upgrade()
                        .filter(|inner| inner.generation() == w.generation)
                })
                .collect()
        };
        for inner in stale {
            Observer::from_inner(inner).invalidate();
        }
    }
}

/// Read-only view of a state cell. Reading inside an observer subscribes it.
pub struct State<T> {
    inner: Rc<MutableStateInner<T>>,
}

/// A reactive state cell with change notification.
pub struct MutableState<T> {
    inner: Rc<MutableStateInner<T>>,
}

impl<T> PartialEq for State<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Eq for State<T> {}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> PartialEq for MutableState<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Eq for MutableState<T> {}

impl<T> Clone for MutableState<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> MutableState<T> {
    pub fn with_runtime(value: T, runtime: RuntimeHandle) -> Self {
        Self {
            inner: Rc::new(MutableStateInner {
                value: RefCell::new(value),
                watchers: RefCell::new(Vec::new()),
                version: Cell::new(0),
                _runtime: runtime,
            }),
        }
    }

    pub fn as_state(&self) -> State<T> {
        State {
            inner: Rc::clone(&self.inner),
        }
    }

    /// Overwrite the value and notify every observer that read it.
    pub fn set_value(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        self.inner.notify();
    }

    pub fn set(&self, value: T) {
        self.set_value(value);
    }

    /// Mutate in place, then notify.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = f(&mut *self.inner.value.borrow_mut());
        self.inner.notify();
        result
    }

    /// Read without subscribing the current observer.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&*self.inner.value.borrow())
    }

    /// Number of writes since creation.
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }
}

impl<T: PartialEq> MutableState<T> {
    /// Write only when the value differs. Returns whether a write happened.
    pub fn set_if_changed(&self, value: T) -> bool {
        if *self.inner.value.borrow() == value {
            return false;
        }
        self.set_value(value);
        true
    }
}

impl<T: Clone> MutableState<T> {
    pub fn value(&self) -> T {
        self.as_state().value()
    }

    pub fn get(&self) -> T {
        self.value()
    }
}

impl<T> State<T> {
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.subscribe_current_observer();
        f(&*self.inner.value.borrow())
    }

    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&*self.inner.value.borrow())
    }

    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }
}

impl<T: Clone> State<T> {
    pub fn value(&self) -> T {
        self.with(T::clone)
    }

    pub fn get(&self) -> T {
        self.value()
    }
}

impl<T: fmt::Debug> fmt::Debug for MutableState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutableState")
            .field("value", &*self.inner.value.borrow())
            .finish()
    }
}

impl<T: fmt::Debug> fmt::Debug for State<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("value", &*self.inner.value.borrow())
            .finish()
    }
}
