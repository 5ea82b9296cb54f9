//! Normalization of signal paths against a circuit's type tree.

use crate::circuit::{Circuit, Direction};
use crate::error::ReferenceError;
use crate::path::{Segment, SignalPath};
use crate::types::SignalType;
use std::fmt;

/// A normalized segment annotated with the type of the node it reaches.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResolvedSegment {
    /// The path segment.
    pub segment: Segment,
    /// The type of the element this segment addresses.
    pub ty: SignalType,
}

/// A signal path that has been checked against a circuit.
///
/// Holds the segments from root port to addressed element, each with its
/// type, so manglers and codecs never need the circuit again.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResolvedPath {
    path: SignalPath,
    direction: Direction,
    segments: Vec<ResolvedSegment>,
}

impl ResolvedPath {
    /// Returns the original path.
    pub fn path(&self) -> &SignalPath {
        &self.path
    }

    /// Returns the normalized segments, root first.
    pub fn segments(&self) -> &[ResolvedSegment] {
        &self.segments
    }

    /// Returns the type of the addressed element.
    pub fn ty(&self) -> &SignalType {
        // A resolved path always holds at least its root segment.
        &self.segments[self.segments.len() - 1].ty
    }

    /// Returns the type of the enclosing array or tuple, or `None` at a root.
    pub fn parent_ty(&self) -> Option<&SignalType> {
        let n = self.segments.len();
        (n >= 2).then(|| &self.segments[n - 2].ty)
    }

    /// Returns the direction of the root port.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns the root port name.
    pub fn root_name(&self) -> &str {
        self.path.root_name()
    }

    /// Descends into array element `index`, if the addressed element is an
    /// array long enough to have it.
    pub fn child_index(&self, index: u32) -> Option<ResolvedPath> {
        match self.ty() {
            SignalType::Array { element, length } if index < *length => {
                Some(self.extend(Segment::Index(index), (**element).clone()))
            }
            _ => None,
        }
    }

    /// Descends into tuple field `key`, if the addressed element has it.
    pub fn child_field(&self, key: &str) -> Option<ResolvedPath> {
        let ty = self.ty().field(key)?.clone();
        Some(self.extend(Segment::Field(key.to_string()), ty))
    }

    /// Expands this reference into the packed leaves underneath it.
    ///
    /// Packed references (scalars, bit-vectors, arrays of bits) are their own
    /// single leaf. Arrays of wider elements and tuples expand element-wise
    /// in declared order.
    pub fn leaves(&self) -> Vec<ResolvedPath> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(&self, out: &mut Vec<ResolvedPath>) {
        if self.ty().is_packed() {
            out.push(self.clone());
            return;
        }
        match self.ty() {
            SignalType::Array { length, .. } => {
                for i in 0..*length {
                    if let Some(child) = self.child_index(i) {
                        child.collect_leaves(out);
                    }
                }
            }
            SignalType::Tuple { fields } => {
                for (key, _) in fields {
                    if let Some(child) = self.child_field(key) {
                        child.collect_leaves(out);
                    }
                }
            }
            SignalType::Digital | SignalType::Bits { .. } => out.push(self.clone()),
        }
    }

    fn extend(&self, segment: Segment, ty: SignalType) -> ResolvedPath {
        let path = match &segment {
            Segment::Index(i) => self.path.clone().index(*i),
            Segment::Field(key) => self.path.clone().field(key.clone()),
            Segment::Root(name) => SignalPath::root(name.clone()),
        };
        let mut segments = self.segments.clone();
        segments.push(ResolvedSegment { segment, ty });
        ResolvedPath {
            path,
            direction: self.direction,
            segments,
        }
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

/// Checks `path` against the circuit and returns its normalized form.
///
/// Every array index must be below the parent array's length and every field
/// key must exist in the parent tuple. Violations fail with
/// [`ReferenceError::InvalidReference`] naming the offending path.
pub fn resolve(circuit: &Circuit, path: &SignalPath) -> Result<ResolvedPath, ReferenceError> {
    let invalid = |reason: String| ReferenceError::InvalidReference {
        path: path.to_string(),
        reason,
    };

    let segments = path.segments();
    let mut iter = segments.into_iter();
    let root_name = match iter.next() {
        Some(Segment::Root(name)) => name,
        _ => return Err(invalid("path does not start at a port".to_string())),
    };
    let port = circuit
        .port(&root_name)
        .ok_or_else(|| invalid(format!("circuit `{}` has no port `{root_name}`", circuit.name)))?;

    let mut resolved = ResolvedPath {
        path: SignalPath::root(root_name.clone()),
        direction: port.direction,
        segments: vec![ResolvedSegment {
            segment: Segment::Root(root_name),
            ty: port.ty.clone(),
        }],
    };

    for segment in iter {
        resolved = match &segment {
            Segment::Index(index) => match resolved.ty() {
                SignalType::Array { length, .. } if index >= length => {
                    return Err(invalid(format!(
                        "index {index} out of range for `{}` of length {length}",
                        resolved.path
                    )));
                }
                SignalType::Array { .. } => resolved
                    .child_index(*index)
                    .ok_or_else(|| invalid(format!("cannot index `{}`", resolved.path)))?,
                other => {
                    return Err(invalid(format!(
                        "`{}` has type {other}, which cannot be indexed",
                        resolved.path
                    )));
                }
            },
            Segment::Field(key) => match resolved.ty() {
                SignalType::Tuple { .. } => resolved.child_field(key).ok_or_else(|| {
                    invalid(format!("`{}` has no field `{key}`", resolved.path))
                })?,
                other => {
                    return Err(invalid(format!(
                        "`{}` has type {other}, which has no fields",
                        resolved.path
                    )));
                }
            },
            Segment::Root(_) => {
                return Err(invalid("a port name can only start a path".to_string()));
            }
        };
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circuit() -> Circuit {
        Circuit::new("Top")
            .with_port("O", Direction::Out, SignalType::array(SignalType::Digital, 3))
            .with_port(
                "I",
                Direction::In,
                SignalType::tuple([
                    ("a", SignalType::bits(4)),
                    ("1", SignalType::array(SignalType::sint(5), 2)),
                ]),
            )
    }

    #[test]
    fn resolves_nested_reference() {
        let c = circuit();
        let r = resolve(&c, &SignalPath::root("I").field("1").index(1)).unwrap();
        assert_eq!(r.ty(), &SignalType::sint(5));
        assert_eq!(r.direction(), Direction::In);
        assert_eq!(r.segments().len(), 3);
        assert_eq!(r.segments()[1].ty, SignalType::array(SignalType::sint(5), 2));
        assert_eq!(r.to_string(), "I.1[1]");
    }

    #[test]
    fn resolution_is_deterministic() {
        let c = circuit();
        let p = SignalPath::root("O").index(2);
        assert_eq!(resolve(&c, &p).unwrap(), resolve(&c, &p).unwrap());
    }

    #[test]
    fn index_out_of_range() {
        let err = resolve(&circuit(), &SignalPath::root("O").index(3)).unwrap_err();
        match err {
            ReferenceError::InvalidReference { path, reason } => {
                assert_eq!(path, "O[3]");
                assert!(reason.contains("out of range"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn unknown_field_and_port() {
        let c = circuit();
        assert!(matches!(
            resolve(&c, &SignalPath::root("I").field("b")),
            Err(ReferenceError::InvalidReference { .. })
        ));
        assert!(matches!(
            resolve(&c, &SignalPath::root("Q")),
            Err(ReferenceError::InvalidReference { .. })
        ));
    }

    #[test]
    fn shape_errors() {
        let c = circuit();
        assert!(resolve(&c, &SignalPath::root("I").index(0)).is_err());
        assert!(resolve(&c, &SignalPath::root("O").field("a")).is_err());
        assert!(resolve(&c, &SignalPath::root("O").index(0).index(0)).is_err());
    }

    #[test]
    fn leaves_of_tuple() {
        let c = circuit();
        let r = resolve(&c, &SignalPath::root("I")).unwrap();
        let leaves: Vec<String> = r.leaves().iter().map(|l| l.to_string()).collect();
        assert_eq!(leaves, vec!["I.a", "I.1[0]", "I.1[1]"]);
    }

    #[test]
    fn packed_array_is_single_leaf() {
        let c = circuit();
        let r = resolve(&c, &SignalPath::root("O")).unwrap();
        assert_eq!(r.leaves(), vec![r.clone()]);
    }
}
