//! Keeps a live figure widget in step with the figure description produced
//! by application state.
//!
//! The widget model refuses wholesale replacement of its renderer list and of
//! its document model, so every update goes through the narrow set of
//! mutations in [`reconcile`]: append the new renderers, drop the stale
//! prefix, overwrite the axes and the theme, and tear down in a fixed order on unmount.
//! [`FigureView`] wires those onto the reactive runtime, gated on the loader
//! signal from [`loader::initialize`].

mod error;
pub mod loader;
pub mod reconcile;
mod renderable;
mod view;

pub use error::BridgeError;
pub use loader::{initialize, ReadySetter, ReadyState};
pub use reconcile::{reconcile_axes, reconcile_renderers, reconcile_theme, teardown};
pub use renderable::{FigureRenderable, Renderable, RenderableRegistry};
pub use view::{FigurePhase, FigureView};

#[cfg(test)]
#[path = "tests/bridge_tests.rs"]
mod tests;
