//! Hierarchical signal paths and their text form.

use crate::error::ReferenceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A hierarchical address of a signal or one of its sub-elements.
///
/// Paths are built only by descending from a named root, so they always form
/// a chain ending at a top-level port. The text form is `I`, `I[2]`, `I.a`,
/// `I[1][0].b`; integer tuple keys are written `I.1`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SignalPath {
    /// A top-level port.
    Root(String),
    /// An element of an array.
    Index(Box<SignalPath>, u32),
    /// A field of a tuple.
    Field(Box<SignalPath>, String),
}

/// One step of a normalized path, ordered from the root.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Segment {
    /// The top-level port name.
    Root(String),
    /// An array element index.
    Index(u32),
    /// A tuple field key.
    Field(String),
}

impl SignalPath {
    /// Creates a path naming a top-level port.
    pub fn root(name: impl Into<String>) -> Self {
        SignalPath::Root(name.into())
    }

    /// Descends into array element `index`.
    pub fn index(self, index: u32) -> Self {
        SignalPath::Index(Box::new(self), index)
    }

    /// Descends into tuple field `key`.
    pub fn field(self, key: impl Into<String>) -> Self {
        SignalPath::Field(Box::new(self), key.into())
    }

    /// Returns the name of the top-level port this path starts from.
    pub fn root_name(&self) -> &str {
        match self {
            SignalPath::Root(name) => name,
            SignalPath::Index(parent, _) | SignalPath::Field(parent, _) => parent.root_name(),
        }
    }

    /// Returns the segments of this path in order from root to leaf.
    pub fn segments(&self) -> Vec<Segment> {
        let mut out = Vec::new();
        self.collect_segments(&mut out);
        out
    }

    fn collect_segments(&self, out: &mut Vec<Segment>) {
        match self {
            SignalPath::Root(name) => out.push(Segment::Root(name.clone())),
            SignalPath::Index(parent, index) => {
                parent.collect_segments(out);
                out.push(Segment::Index(*index));
            }
            SignalPath::Field(parent, key) => {
                parent.collect_segments(out);
                out.push(Segment::Field(key.clone()));
            }
        }
    }

    /// Rebuilds a path from normalized segments.
    ///
    /// Returns `None` unless the first segment, and only the first, is a root.
    pub fn from_segments(segments: &[Segment]) -> Option<Self> {
        let (first, rest) = segments.split_first()?;
        let mut path = match first {
            Segment::Root(name) => SignalPath::root(name.clone()),
            _ => return None,
        };
        for seg in rest {
            path = match seg {
                Segment::Root(_) => return None,
                Segment::Index(i) => path.index(*i),
                Segment::Field(key) => path.field(key.clone()),
            };
        }
        Some(path)
    }
}

impl fmt::Display for SignalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalPath::Root(name) => write!(f, "{name}"),
            SignalPath::Index(parent, index) => write!(f, "{parent}[{index}]"),
            SignalPath::Field(parent, key) => write!(f, "{parent}.{key}"),
        }
    }
}

impl FromStr for SignalPath {
    type Err = ReferenceError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let syntax = |reason: &str| ReferenceError::Syntax {
            text: text.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = text.trim();
        let root_end = trimmed
            .find(|c: char| c == '[' || c == '.')
            .unwrap_or(trimmed.len());
        let root = &trimmed[..root_end];
        if root.is_empty() || !root.chars().all(is_ident_char) {
            return Err(syntax("expected a port name"));
        }

        let mut path = SignalPath::root(root);
        let mut rest = &trimmed[root_end..];
        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('[') {
                let close = after.find(']').ok_or_else(|| syntax("unclosed '['"))?;
                let index: u32 = after[..close]
                    .trim()
                    .parse()
                    .map_err(|_| syntax("array index must be a non-negative integer"))?;
                path = path.index(index);
                rest = &after[close + 1..];
            } else if let Some(after) = rest.strip_prefix('.') {
                let end = after
                    .find(|c: char| c == '[' || c == '.')
                    .unwrap_or(after.len());
                let key = &after[..end];
                if key.is_empty() || !key.chars().all(is_ident_char) {
                    return Err(syntax("expected a field key after '.'"));
                }
                path = path.field(key);
                rest = &after[end..];
            } else {
                return Err(syntax("expected '[' or '.'"));
            }
        }
        Ok(path)
    }
}

impl TryFrom<String> for SignalPath {
    type Error = ReferenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SignalPath> for String {
    fn from(path: SignalPath) -> Self {
        path.to_string()
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_and_display() {
        let p = SignalPath::root("I").index(1).index(0).field("b");
        assert_eq!(p.to_string(), "I[1][0].b");
        assert_eq!(p.root_name(), "I");
    }

    #[test]
    fn segments_are_root_first() {
        let p = SignalPath::root("I").field("a").index(2);
        assert_eq!(
            p.segments(),
            vec![
                Segment::Root("I".into()),
                Segment::Field("a".into()),
                Segment::Index(2)
            ]
        );
        assert_eq!(SignalPath::from_segments(&p.segments()), Some(p));
    }

    #[test]
    fn from_segments_rejects_misplaced_root() {
        assert_eq!(SignalPath::from_segments(&[Segment::Index(0)]), None);
        assert_eq!(
            SignalPath::from_segments(&[Segment::Root("a".into()), Segment::Root("b".into())]),
            None
        );
        assert_eq!(SignalPath::from_segments(&[]), None);
    }

    #[test]
    fn parse_roundtrip() {
        for text in ["I", "O[2]", "I.a", "I[1][0].b", "T.1", "io_bus.data[7]"] {
            let p: SignalPath = text.parse().unwrap();
            assert_eq!(p.to_string(), text);
        }
    }

    #[test]
    fn parse_integer_field_is_field_not_index() {
        let p: SignalPath = "T.1".parse().unwrap();
        assert_eq!(p, SignalPath::root("T").field("1"));
    }

    #[test]
    fn parse_errors() {
        for text in ["", "[0]", "I[", "I[a]", "I[-1]", "I.", "I..a", "I]"] {
            let err = text.parse::<SignalPath>().unwrap_err();
            assert!(
                matches!(err, ReferenceError::Syntax { .. }),
                "{text} -> {err}"
            );
        }
    }

    #[test]
    fn serde_uses_text_form() {
        let p = SignalPath::root("I").index(3);
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#""I[3]""#);
        let back: SignalPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
