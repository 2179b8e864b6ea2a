use thiserror::Error;

/// Errors raised by dataframe queries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("column `{0}` not found")]
    MissingColumn(String),

    #[error("column `{column}` has {found} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("column `{0}` has no finite values")]
    EmptyColumn(String),

    #[error("bin count must be positive, got {0}")]
    InvalidBins(usize),

    #[error("invalid limits [{min}, {max}]")]
    InvalidLimits { min: f64, max: f64 },
}
