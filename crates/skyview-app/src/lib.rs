//! Application layer for skyview dashboards.
//!
//! Holds the per-session [`AppContext`], the JSON [`AppConfig`], logger
//! setup, a synthetic catalog generator, and [`Session`], which wires plot
//! controls through the figure builders into mounted figure widgets.

pub mod catalog;
mod config;
pub mod context;
mod logging;
mod session;

pub use config::AppConfig;
pub use context::{Alert, AppContext, DataState, PlotState, Severity};
pub use logging::init_logging;
pub use session::Session;

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
