use std::cell::RefCell;
use std::rc::Rc;

/// Single-threaded shared owner for values that several effects touch.
///
/// A mounted widget lives in an `Owned` so the renderer effect, the theme
/// effect and the teardown path can all reach it without a global.
pub struct Owned<T> {
    inner: Rc<RefCell<T>>,
}

impl<T> Clone for Owned<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Owned<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(value)),
        }
    }

    /// Run `f` with an immutable reference to the stored value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let borrow = self.inner.borrow();
        f(&*borrow)
    }

    /// Run `f` with a mutable reference to the stored value.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut borrow = self.inner.borrow_mut();
        f(&mut *borrow)
    }

    /// Replace the stored value entirely, returning the previous one.
    pub fn replace(&self, new_value: T) -> T {
        std::mem::replace(&mut *self.inner.borrow_mut(), new_value)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Default> Owned<T> {
    /// Move the stored value out, leaving `T::default()` behind.
    pub fn take(&self) -> T {
        std::mem::take(&mut *self.inner.borrow_mut())
    }
}
