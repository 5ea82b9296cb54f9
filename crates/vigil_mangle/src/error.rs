//! Errors raised while mangling signal paths.

use std::fmt;

/// The kind of path segment a naming scheme is asked to express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// An index selecting one bit of an array of single bits.
    BitIndex,
    /// An index selecting an element of an array of wider elements.
    Element,
    /// A tuple field access.
    Field,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::BitIndex => write!(f, "bit index"),
            ReferenceKind::Element => write!(f, "array element"),
            ReferenceKind::Field => write!(f, "tuple field"),
        }
    }
}

/// Errors that can occur when a path is turned into a backend identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MangleError {
    /// The scheme has no rule for a segment kind that appears in the path.
    #[error("naming scheme `{scheme}` cannot address {kind} in `{path}`")]
    UnsupportedReferenceKind {
        /// The scheme name.
        scheme: String,
        /// The path being mangled, in text form.
        path: String,
        /// The segment kind with no rule.
        kind: ReferenceKind,
    },

    /// Two distinct paths produced the same backend address.
    #[error("name collision on `{address}`: `{first}` and `{second}`")]
    Collision {
        /// The shared address.
        address: String,
        /// The path that claimed the address first.
        first: String,
        /// The path that tried to claim it again.
        second: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unsupported() {
        let e = MangleError::UnsupportedReferenceKind {
            scheme: "root-only".into(),
            path: "I[0]".into(),
            kind: ReferenceKind::BitIndex,
        };
        assert_eq!(
            e.to_string(),
            "naming scheme `root-only` cannot address bit index in `I[0]`"
        );
    }

    #[test]
    fn display_collision() {
        let e = MangleError::Collision {
            address: "I_0".into(),
            first: "I[0]".into(),
            second: "I_0".into(),
        };
        assert_eq!(e.to_string(), "name collision on `I_0`: `I[0]` and `I_0`");
    }
}
