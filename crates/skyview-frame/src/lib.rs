//! Column-oriented tabular data for building figure descriptions.
//!
//! The [`FrameProvider`] trait is the contract figures are built against:
//! column enumeration, row count, min/max, binned aggregation and
//! boolean-mask filtering. [`ColumnFrame`] is the in-memory implementation.

mod binning;
mod error;
mod frame;

pub use binning::{Aggregation, Grid, Limits};
pub use error::FrameError;
pub use frame::{ColumnFrame, FrameProvider};

pub type Result<T> = std::result::Result<T, FrameError>;
