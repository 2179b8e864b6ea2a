#![doc = r"Reactive runtime pieces for the skyview dashboards."]

pub mod effect;
mod hash;
pub mod observer;
pub mod owned;
pub mod platform;
pub mod runtime;
mod state;

pub use effect::{effect, EffectHandle, EffectResult, EffectScope, Key, SideEffect};
pub use hash::dependency_key;
pub use observer::{untracked, watch, Observer};
pub use owned::Owned;
pub use platform::RuntimeScheduler;
pub use runtime::{DefaultScheduler, Runtime, RuntimeHandle};
pub use state::{MutableState, State};

#[cfg(test)]
pub use runtime::{TestRuntime, TestScheduler};

/// Create a state cell bound to `runtime`.
#[allow(non_snake_case)]
pub fn mutableStateOf<T: 'static>(runtime: &RuntimeHandle, initial: T) -> MutableState<T> {
    MutableState::with_runtime(initial, runtime.clone())
}

/// Create a read-only state that recomputes whenever a state read by
/// `compute` changes. The returned observer keeps the derivation alive.
#[allow(non_snake_case)]
pub fn derivedStateOf<T: Clone + PartialEq + 'static>(
    runtime: &RuntimeHandle,
    compute: impl Fn() -> T + 'static,
) -> (State<T>, Observer) {
    let initial = untracked(&compute);
    let cell = MutableState::with_runtime(initial, runtime.clone());
    let writer = cell.clone();
    let observer = watch(runtime, move || {
        let next = compute();
        untracked(|| writer.set_if_changed(next));
    });
    (cell.as_state(), observer)
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
