use std::rc::Rc;

use skyview_core::{mutableStateOf, MutableState, RuntimeHandle, State};
use skyview_figure::FigureDescription;

type DescriptionProvider = Rc<dyn Fn() -> FigureDescription>;

/// Read side of the loader signal.
///
/// `false` until the loader reports that the widget has been constructed and
/// attached. Reconciliation is gated on it.
#[derive(Clone)]
pub struct ReadyState {
    ready: State<bool>,
    provider: DescriptionProvider,
}

impl ReadyState {
    /// Tracked read; subscribes the current observer.
    pub fn is_ready(&self) -> bool {
        self.ready.value()
    }

    pub fn is_ready_untracked(&self) -> bool {
        self.ready.with_untracked(|ready| *ready)
    }

    /// The description the widget is first constructed from.
    pub fn initial_description(&self) -> FigureDescription {
        (self.provider)()
    }
}

/// Write side of the loader signal, handed to whatever constructs the widget.
#[derive(Clone)]
pub struct ReadySetter {
    cell: MutableState<bool>,
}

impl ReadySetter {
    pub fn set(&self, ready: bool) {
        self.cell.set_if_changed(ready);
    }

    pub fn mark_ready(&self) {
        self.set(true);
    }
}

/// Create the loader signal for a figure whose first description comes
/// from `provider`. Nothing else happens until the setter fires.
pub fn initialize(
    runtime: &RuntimeHandle,
    provider: impl Fn() -> FigureDescription + 'static,
) -> (ReadyState, ReadySetter) {
    let cell = mutableStateOf(runtime, false);
    (
        ReadyState {
            ready: cell.as_state(),
            provider: Rc::new(provider),
        },
        ReadySetter { cell },
    )
}
