//! Signal types describing the shape and width of every port and sub-element.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The type of a signal or sub-element in a circuit's port hierarchy.
///
/// Types are netlist-independent: a single-bit clock, an 8-bit signed bus, an
/// array of buses, and a struct of fields all map onto these four shapes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    /// A single bit.
    Digital,
    /// A bit-vector of known width.
    Bits {
        /// The number of bits.
        width: u32,
        /// Whether the vector holds a two's complement signed value.
        #[serde(default)]
        signed: bool,
    },
    /// A fixed-size array of elements of one type.
    Array {
        /// The type of each element.
        element: Box<SignalType>,
        /// The number of elements.
        length: u32,
    },
    /// A tuple or struct with named fields in declared order.
    Tuple {
        /// Field keys and their types. Keys may be pure integers (`"0"`).
        fields: Vec<(String, SignalType)>,
    },
}

impl SignalType {
    /// Shorthand for an unsigned bit-vector.
    pub fn bits(width: u32) -> Self {
        SignalType::Bits {
            width,
            signed: false,
        }
    }

    /// Shorthand for a signed bit-vector.
    pub fn sint(width: u32) -> Self {
        SignalType::Bits {
            width,
            signed: true,
        }
    }

    /// Shorthand for an array type.
    pub fn array(element: SignalType, length: u32) -> Self {
        SignalType::Array {
            element: Box::new(element),
            length,
        }
    }

    /// Shorthand for a tuple type built from `(key, type)` pairs.
    pub fn tuple<K: Into<String>>(fields: impl IntoIterator<Item = (K, SignalType)>) -> Self {
        SignalType::Tuple {
            fields: fields.into_iter().map(|(k, t)| (k.into(), t)).collect(),
        }
    }

    /// Returns the total number of bits in this type.
    pub fn width(&self) -> u32 {
        match self {
            SignalType::Digital => 1,
            SignalType::Bits { width, .. } => *width,
            SignalType::Array { element, length } => element.width() * length,
            SignalType::Tuple { fields } => fields.iter().map(|(_, t)| t.width()).sum(),
        }
    }

    /// Returns `true` for a single-bit [`SignalType::Digital`].
    pub fn is_digital(&self) -> bool {
        matches!(self, SignalType::Digital)
    }

    /// Returns `true` for a signed bit-vector.
    pub fn is_signed(&self) -> bool {
        matches!(self, SignalType::Bits { signed: true, .. })
    }

    /// Returns `true` if a netlist keeps this type as a single port.
    ///
    /// Scalars, bit-vectors, and arrays of single bits are packed. Arrays of
    /// anything wider and tuples are flattened into one port per element.
    pub fn is_packed(&self) -> bool {
        match self {
            SignalType::Digital | SignalType::Bits { .. } => true,
            SignalType::Array { element, .. } => element.is_digital(),
            SignalType::Tuple { .. } => false,
        }
    }

    /// Looks up a tuple field's type by key.
    pub fn field(&self, key: &str) -> Option<&SignalType> {
        match self {
            SignalType::Tuple { fields } => {
                fields.iter().find(|(k, _)| k == key).map(|(_, t)| t)
            }
            _ => None,
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalType::Digital => write!(f, "Digital"),
            SignalType::Bits {
                width,
                signed: false,
            } => write!(f, "Bits({width})"),
            SignalType::Bits {
                width,
                signed: true,
            } => write!(f, "SInt({width})"),
            SignalType::Array { element, length } => write!(f, "Array[{length}, {element}]"),
            SignalType::Tuple { fields } => {
                write!(f, "Tuple(")?;
                for (i, (key, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}={ty}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths() {
        assert_eq!(SignalType::Digital.width(), 1);
        assert_eq!(SignalType::sint(7).width(), 7);
        let nested = SignalType::array(SignalType::array(SignalType::bits(4), 3), 2);
        assert_eq!(nested.width(), 24);
        let t = SignalType::tuple([("a", SignalType::bits(4)), ("b", SignalType::bits(5))]);
        assert_eq!(t.width(), 9);
    }

    #[test]
    fn packed_shapes() {
        assert!(SignalType::Digital.is_packed());
        assert!(SignalType::bits(8).is_packed());
        assert!(SignalType::array(SignalType::Digital, 3).is_packed());
        assert!(!SignalType::array(SignalType::bits(4), 3).is_packed());
        assert!(!SignalType::tuple([("a", SignalType::Digital)]).is_packed());
    }

    #[test]
    fn field_lookup() {
        let t = SignalType::tuple([("a", SignalType::bits(4)), ("1", SignalType::Digital)]);
        assert_eq!(t.field("1"), Some(&SignalType::Digital));
        assert_eq!(t.field("c"), None);
        assert_eq!(SignalType::Digital.field("a"), None);
    }

    #[test]
    fn display() {
        let t = SignalType::tuple([
            ("a", SignalType::sint(4)),
            ("b", SignalType::array(SignalType::Digital, 2)),
        ]);
        assert_eq!(t.to_string(), "Tuple(a=SInt(4), b=Array[2, Digital])");
    }

    #[test]
    fn serde_from_json() {
        let json = r#"{"array": {"element": {"bits": {"width": 4}}, "length": 3}}"#;
        let ty: SignalType = serde_json::from_str(json).unwrap();
        assert_eq!(ty, SignalType::array(SignalType::bits(4), 3));
        let digital: SignalType = serde_json::from_str(r#""digital""#).unwrap();
        assert_eq!(digital, SignalType::Digital);
    }
}
