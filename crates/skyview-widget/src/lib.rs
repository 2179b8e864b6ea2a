//! Contract for the live, mutable on-screen representation of a figure.
//!
//! A [`WidgetHandle`] is owned by the UI runtime; the bridge only mutates it.
//! [`HeadlessWidget`] implements the contract in memory and records every
//! lifecycle call, which is what the bridge is tested against.

mod error;
mod handle;
mod headless;

pub use error::WidgetError;
pub use handle::WidgetHandle;
pub use headless::{HeadlessRenderer, HeadlessWidget, RendererId, WidgetEvent};
