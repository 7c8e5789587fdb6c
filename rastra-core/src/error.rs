//! Error types for rastra

use thiserror::Error;

/// Main error type for rastra operations.
///
/// Degenerate primitives, empty geometry and NaN fallout during a render
/// pass are not errors: the pipeline silently skips them and a pass always
/// completes. Errors only arise at the input boundary.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

/// Result type alias for rastra operations
pub type Result<T> = std::result::Result<T, Error>;
