//! Keyed effects with cleanup.
//!
//! An effect has two halves: a dependency closure that runs tracked and
//! produces a hashable key, and a body that runs untracked only when that key
//! differs from the previous run. The previous body's cleanup always runs
//! before the body is replayed, and once more when the effect is disposed.

use std::cell::RefCell;
use std::hash::Hash;
use std::rc::Rc;

use crate::hash::dependency_key;
use crate::observer::{untracked, Observer};
use crate::runtime::RuntimeHandle;

pub type Key = u64;

#[derive(Default)]
struct EffectState {
    key: Option<Key>,
    cleanup: Option<Box<dyn FnOnce()>>,
    runs: usize,
}

impl EffectState {
    fn should_run(&self, key: Key) -> bool {
        match self.key {
            Some(current) => current != key,
            None => true,
        }
    }

    fn set_key(&mut self, key: Key) {
        self.key = Some(key);
    }

    fn set_cleanup(&mut self, cleanup: Option<Box<dyn FnOnce()>>) {
        self.cleanup = cleanup;
    }

    fn run_cleanup(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

impl Drop for EffectState {
    fn drop(&mut self) {
        self.run_cleanup();
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct EffectScope;

pub struct EffectResult {
    cleanup: Option<Box<dyn FnOnce()>>,
}

impl EffectScope {
    pub fn on_dispose(&self, cleanup: impl FnOnce() + 'static) -> EffectResult {
        EffectResult::new(cleanup)
    }
}

impl EffectResult {
    pub fn new(cleanup: impl FnOnce() + 'static) -> Self {
        Self {
            cleanup: Some(Box::new(cleanup)),
        }
    }

    fn into_cleanup(self) -> Option<Box<dyn FnOnce()>> {
        self.cleanup
    }
}

impl Default for EffectResult {
    fn default() -> Self {
        Self { cleanup: None }
    }
}

/// Registration returned by [`effect`]. Dropping it disposes the effect.
pub struct EffectHandle {
    observer: Observer,
    state: Rc<RefCell<EffectState>>,
}

impl EffectHandle {
    /// How many times the body (not the dependency closure) has run.
    pub fn run_count(&self) -> usize {
        self.state.borrow().runs
    }

    pub fn is_active(&self) -> bool {
        self.observer.is_active()
    }

    /// Stop tracking and run the pending cleanup, if any.
    pub fn dispose(&self) {
        if !self.observer.is_active() {
            return;
        }
        self.observer.dispose();
        let cleanup = self.state.borrow_mut().cleanup.take();
        if let Some(cleanup) = cleanup {
            cleanup();
        }
    }
}

impl Drop for EffectHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Register an effect that replays `body` whenever the key produced by
/// `deps` changes. The first run happens on the next flush.
pub fn effect<K, D, F>(runtime: &RuntimeHandle, deps: D, body: F) -> EffectHandle
where
    K: Hash,
    D: Fn() -> K + 'static,
    F: FnMut(EffectScope) -> EffectResult + 'static,
{
    let state = Rc::new(RefCell::new(EffectState::default()));
    let callback_state = Rc::clone(&state);
    let mut body = body;
    let observer = Observer::new(runtime, move || {
        let key = dependency_key(&deps());
        if !callback_state.borrow().should_run(key) {
            return;
        }
        let previous = {
            let mut state = callback_state.borrow_mut();
            state.set_key(key);
            state.cleanup.take()
        };
        if let Some(cleanup) = previous {
            untracked(cleanup);
        }
        let result = untracked(|| body(EffectScope));
        let mut state = callback_state.borrow_mut();
        state.runs += 1;
        state.set_cleanup(result.into_cleanup());
    });
    EffectHandle { observer, state }
}

/// Register an effect that runs once on the next flush and never replays.
#[allow(non_snake_case)]
pub fn SideEffect(runtime: &RuntimeHandle, effect: impl FnOnce() + 'static) {
    runtime.spawn_task(effect);
}
