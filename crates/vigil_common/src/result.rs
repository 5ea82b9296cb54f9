//! Common result and error types for the Vigil toolchain.

/// The standard result type for operations that can only fail on a bug.
pub type VigilResult<T> = Result<T, InternalError>;

/// An internal error indicating a bug in Vigil, not a problem with the
/// circuit description or the test sequence.
///
/// User-facing problems (bad references, values that do not fit, failed
/// expectations) have their own error types or are recorded in a verdict.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
