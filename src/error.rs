//! Error types for rank estimation.

use thiserror::Error;

/// Error variants for rank estimation operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An argument violated an operation's requirements.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A buffer or string did not have the required size.
    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// The size the operation required.
        expected: usize,
        /// The size that was supplied.
        actual: usize,
    },

    /// Bit arithmetic exceeded the available numeric width.
    #[error("overflow: {0}")]
    Overflow(&'static str),

    /// A requested integer type cannot hold the value.
    #[error("out of range: {0}")]
    OutOfRange(&'static str),

    /// A pre-condition on the data itself was violated.
    #[error("logic error: {0}")]
    Logic(&'static str),
}

/// A specialized Result type for rank estimation operations.
pub type Result<T> = std::result::Result<T, Error>;
