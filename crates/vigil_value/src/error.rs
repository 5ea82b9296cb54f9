//! Errors raised while encoding, decoding, or parsing values.

/// Errors that can occur when a value does not fit a signal type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// An integer lies outside the range representable by the type.
    #[error("value {value} out of range for {ty}")]
    OutOfRange {
        /// The offending value.
        value: String,
        /// The target type.
        ty: String,
    },

    /// The value's shape does not match the type's shape.
    #[error("value does not match {ty}: {reason}")]
    ShapeMismatch {
        /// The target type.
        ty: String,
        /// What did not match.
        reason: String,
    },

    /// A literal string could not be parsed.
    #[error("invalid literal `{text}`: {reason}")]
    InvalidLiteral {
        /// The text that failed to parse.
        text: String,
        /// What was wrong with it.
        reason: String,
    },
}
