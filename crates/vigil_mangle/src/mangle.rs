//! Applying a naming scheme to a resolved path.

use crate::error::{MangleError, ReferenceKind};
use crate::scheme::{BitIndexRule, ElementRule, FieldRule, NamingScheme};
use std::fmt;
use vigil_signal::{ResolvedPath, Segment};

/// A backend address: a flat identifier plus an optional bit within it.
///
/// `bit` is only set by schemes using [`BitIndexRule::WholeWord`], where a
/// single bit of a packed array is reached by selecting it from the whole
/// word at value-encoding time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    /// The mangled identifier.
    pub name: String,
    /// The bit selected within `name`, if any.
    pub bit: Option<u32>,
}

impl Address {
    /// An address naming a whole identifier.
    pub fn whole(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bit: None,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bit {
            Some(bit) => write!(f, "{}{{bit {bit}}}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Computes the backend address of `path` under `scheme`.
///
/// Deterministic: the same scheme and path always give the same address.
pub fn address(scheme: &NamingScheme, path: &ResolvedPath) -> Result<Address, MangleError> {
    let unsupported = |kind| MangleError::UnsupportedReferenceKind {
        scheme: scheme.name.to_string(),
        path: path.to_string(),
        kind,
    };

    let mut name = String::new();
    let mut bit = None;
    for resolved in path.segments() {
        match &resolved.segment {
            Segment::Root(root) => name.push_str(root),
            Segment::Index(index) if resolved.ty.is_digital() => {
                match scheme.bit_index.ok_or_else(|| unsupported(ReferenceKind::BitIndex))? {
                    BitIndexRule::InName => {
                        name.push_str(&format!("[{index}]"));
                    }
                    BitIndexRule::WholeWord => bit = Some(*index),
                }
            }
            Segment::Index(index) => {
                match scheme
                    .element_index
                    .ok_or_else(|| unsupported(ReferenceKind::Element))?
                {
                    ElementRule::Bracketed => name.push_str(&format!("[{index}]")),
                    ElementRule::Underscore => name.push_str(&format!("_{index}")),
                }
            }
            Segment::Field(key) => {
                match scheme.field.ok_or_else(|| unsupported(ReferenceKind::Field))? {
                    FieldRule::Underscore if is_integer_key(key) => {
                        name.push_str(&format!("__{key}"));
                    }
                    FieldRule::Underscore => name.push_str(&format!("_{key}")),
                    FieldRule::Dotted => name.push_str(&format!(".{key}")),
                }
            }
        }
    }

    if let Some(escape) = scheme.double_underscore_escape {
        name = name.replace("__", escape);
    }
    Ok(Address { name, bit })
}

/// Computes just the identifier of `path` under `scheme`.
pub fn mangle(scheme: &NamingScheme, path: &ResolvedPath) -> Result<String, MangleError> {
    address(scheme, path).map(|a| a.name)
}

fn is_integer_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use vigil_signal::{resolve, Circuit, Direction, SignalPath, SignalType};

    fn circuit() -> Circuit {
        Circuit::new("Top")
            .with_port("O", Direction::Out, SignalType::array(SignalType::Digital, 3))
            .with_port(
                "I",
                Direction::In,
                SignalType::array(SignalType::array(SignalType::bits(4), 3), 2),
            )
            .with_port(
                "T",
                Direction::In,
                SignalType::tuple([
                    ("a", SignalType::bits(4)),
                    ("1", SignalType::array(SignalType::Digital, 2)),
                ]),
            )
    }

    fn addr(scheme: NamingScheme, path: SignalPath) -> Result<Address, MangleError> {
        let c = circuit();
        address(&scheme, &resolve(&c, &path).unwrap())
    }

    #[test]
    fn verilog_names() {
        let v = NamingScheme::verilog();
        assert_eq!(addr(v, SignalPath::root("O")).unwrap(), Address::whole("O"));
        assert_eq!(addr(v, SignalPath::root("O").index(2)).unwrap().name, "O[2]");
        assert_eq!(
            addr(v, SignalPath::root("I").index(1).index(0)).unwrap().name,
            "I_1_0"
        );
        assert_eq!(addr(v, SignalPath::root("T").field("a")).unwrap().name, "T_a");
    }

    #[test]
    fn integer_field_gets_extra_underscore() {
        let v = NamingScheme::verilog();
        assert_eq!(addr(v, SignalPath::root("T").field("1")).unwrap().name, "T__1");
    }

    #[test]
    fn verilator_escapes_double_underscore() {
        let v = NamingScheme::verilator();
        assert_eq!(
            addr(v, SignalPath::root("T").field("1")).unwrap().name,
            "T___05F1"
        );
    }

    #[test]
    fn verilator_bit_index_addresses_whole_word() {
        let v = NamingScheme::verilator();
        let a = addr(v, SignalPath::root("O").index(1)).unwrap();
        assert_eq!(a.name, "O");
        assert_eq!(a.bit, Some(1));
        assert_eq!(a.to_string(), "O{bit 1}");
        let nested = addr(v, SignalPath::root("T").field("1").index(0)).unwrap();
        assert_eq!(nested.name, "T___05F1");
        assert_eq!(nested.bit, Some(0));
    }

    #[test]
    fn hierarchical_matches_path_text() {
        let c = circuit();
        for path in c.all_paths() {
            let resolved = resolve(&c, &path).unwrap();
            assert_eq!(
                mangle(&NamingScheme::hierarchical(), &resolved).unwrap(),
                path.to_string()
            );
        }
    }

    #[test]
    fn root_only_rejects_sub_elements() {
        let r = NamingScheme::root_only();
        assert_eq!(addr(r, SignalPath::root("O")).unwrap().name, "O");
        for (path, kind) in [
            (SignalPath::root("O").index(0), ReferenceKind::BitIndex),
            (SignalPath::root("I").index(0), ReferenceKind::Element),
            (SignalPath::root("T").field("a"), ReferenceKind::Field),
        ] {
            match addr(r, path) {
                Err(MangleError::UnsupportedReferenceKind { kind: k, scheme, .. }) => {
                    assert_eq!(k, kind);
                    assert_eq!(scheme, "root-only");
                }
                other => panic!("expected unsupported, got {other:?}"),
            }
        }
    }

    #[test]
    fn deterministic() {
        let c = circuit();
        for scheme in [NamingScheme::verilog(), NamingScheme::verilator()] {
            for path in c.all_paths() {
                let r = resolve(&c, &path).unwrap();
                assert_eq!(address(&scheme, &r), address(&scheme, &r));
            }
        }
    }

    #[test]
    fn injective_over_all_paths() {
        let c = circuit();
        for scheme in [
            NamingScheme::verilog(),
            NamingScheme::verilator(),
            NamingScheme::hierarchical(),
        ] {
            let mut seen = HashSet::new();
            for path in c.all_paths() {
                let a = address(&scheme, &resolve(&c, &path).unwrap()).unwrap();
                assert!(seen.insert(a.clone()), "{} reused {a}", scheme.name);
            }
        }
    }
}
