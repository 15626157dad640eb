//! Error types for sarchange

use thiserror::Error;

/// Main error type for sarchange operations.
///
/// Errors fall into two families: input-validation errors
/// (`InvalidDimensions`, `IndexOutOfBounds`, `SizeMismatch`, `EmptyInput`,
/// `InvalidParameter`), raised before any computation starts, and
/// computation errors (`Algorithm`, `Other`), raised when an internal
/// numeric or statistical step fails. Computation errors carry the name of
/// the failing stage and are never converted into a default output.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Empty input: {0}")]
    EmptyInput(&'static str),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error was raised by input validation, before any
    /// computation ran.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidDimensions { .. }
                | Error::SizeMismatch { .. }
                | Error::EmptyInput(_)
                | Error::InvalidParameter { .. }
        )
    }
}

/// Result type alias for sarchange operations
pub type Result<T> = std::result::Result<T, Error>;
