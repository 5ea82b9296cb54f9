//! Errors raised while parsing or normalizing signal paths.

/// Errors that can occur when a signal path does not match the circuit.
///
/// These are caller bugs: they are reported as soon as the path is
/// normalized and are never recovered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    /// The path names something the circuit's type tree does not contain.
    #[error("invalid reference `{path}`: {reason}")]
    InvalidReference {
        /// The offending path in text form.
        path: String,
        /// Why the reference is invalid.
        reason: String,
    },

    /// The path text could not be parsed.
    #[error("malformed signal path `{text}`: {reason}")]
    Syntax {
        /// The text that failed to parse.
        text: String,
        /// What was expected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_reference_display() {
        let e = ReferenceError::InvalidReference {
            path: "O[3]".into(),
            reason: "index 3 out of range for length 3".into(),
        };
        assert_eq!(
            e.to_string(),
            "invalid reference `O[3]`: index 3 out of range for length 3"
        );
    }

    #[test]
    fn syntax_display() {
        let e = ReferenceError::Syntax {
            text: "I[".into(),
            reason: "unclosed '['".into(),
        };
        assert_eq!(e.to_string(), "malformed signal path `I[`: unclosed '['");
    }
}
