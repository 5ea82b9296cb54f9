//! Errors raised while recording sequences and loading test files.

use vigil_signal::ReferenceError;

/// Errors that can occur while recording a sequence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    /// The sequence has been finalized and accepts no more actions.
    #[error("sequence is finalized and accepts no further actions")]
    Frozen,

    /// An action refers to a signal the circuit does not have.
    #[error("action {index}: {source}")]
    Reference {
        /// The position the action would have taken.
        index: usize,
        /// The underlying reference error.
        #[source]
        source: ReferenceError,
    },

    /// A step action names something other than a single-bit signal.
    #[error("action {index}: clock `{path}` has type {ty}, expected a single bit")]
    InvalidClock {
        /// The position the action would have taken.
        index: usize,
        /// The clock path.
        path: String,
        /// The clock's actual type.
        ty: String,
    },
}

/// Errors that can occur when loading a test file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read test file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a valid test description.
    #[error("failed to parse test file: {0}")]
    Parse(String),

    /// The circuit declares a port or element with no bits.
    #[error("invalid circuit: {0}")]
    Circuit(#[source] ReferenceError),

    /// The actions do not fit the circuit.
    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_frozen() {
        assert_eq!(
            SequenceError::Frozen.to_string(),
            "sequence is finalized and accepts no further actions"
        );
    }

    #[test]
    fn display_reference() {
        let e = SequenceError::Reference {
            index: 4,
            source: ReferenceError::InvalidReference {
                path: "O[3]".into(),
                reason: "index 3 out of range".into(),
            },
        };
        assert_eq!(
            e.to_string(),
            "action 4: invalid reference `O[3]`: index 3 out of range"
        );
    }

    #[test]
    fn display_load_parse() {
        let e = LoadError::Parse("expected value at line 1".into());
        assert_eq!(
            e.to_string(),
            "failed to parse test file: expected value at line 1"
        );
    }
}
