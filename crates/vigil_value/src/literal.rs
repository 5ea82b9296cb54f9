//! Backend-neutral wire-level literals.

use crate::error::CodecError;
use vigil_common::LogicVec;
use vigil_signal::SignalType;

/// An encoded value with the same shape as its signal type.
///
/// Scalars and bit-vectors are single words. Arrays and tuples keep one
/// literal per element so backends that flatten composites can address each
/// part, while [`Literal::pack`] gives the packed form for backends that
/// treat the composite as one word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// A single word of the type's exact width.
    Word(LogicVec),
    /// One literal per array element, index 0 first.
    Array(Vec<Literal>),
    /// One literal per tuple field, in declared order.
    Tuple(Vec<(String, Literal)>),
}

impl Literal {
    /// Returns the total number of bits.
    pub fn width(&self) -> u32 {
        match self {
            Literal::Word(w) => w.width(),
            Literal::Array(items) => items.iter().map(Literal::width).sum(),
            Literal::Tuple(fields) => fields.iter().map(|(_, l)| l.width()).sum(),
        }
    }

    /// Returns the word if this literal is a single word.
    pub fn as_word(&self) -> Option<&LogicVec> {
        match self {
            Literal::Word(w) => Some(w),
            _ => None,
        }
    }

    /// Concatenates the literal into one word.
    ///
    /// Array element 0 and the first tuple field occupy the least
    /// significant bits.
    pub fn pack(&self) -> LogicVec {
        let mut out = LogicVec::new(self.width());
        self.pack_into(&mut out, 0);
        out
    }

    fn pack_into(&self, out: &mut LogicVec, low: u32) -> u32 {
        match self {
            Literal::Word(w) => {
                out.set_slice(low, w);
                low + w.width()
            }
            Literal::Array(items) => items.iter().fold(low, |at, l| l.pack_into(out, at)),
            Literal::Tuple(fields) => fields.iter().fold(low, |at, (_, l)| l.pack_into(out, at)),
        }
    }

    /// Splits a packed word back into a literal shaped like `ty`.
    pub fn unpack(bits: &LogicVec, ty: &SignalType) -> Result<Literal, CodecError> {
        if bits.width() != ty.width() {
            return Err(CodecError::ShapeMismatch {
                ty: ty.to_string(),
                reason: format!("expected {} bits, found {}", ty.width(), bits.width()),
            });
        }
        Ok(unpack_at(bits, ty, 0))
    }

    /// Returns true if both literals pack to the same fully known bits.
    pub fn matches(&self, other: &Literal) -> bool {
        bits_match(&self.pack(), &other.pack())
    }
}

/// Bit-exact comparison where X and Z never match anything.
pub fn bits_match(a: &LogicVec, b: &LogicVec) -> bool {
    a.width() == b.width()
        && (0..a.width()).all(|i| {
            let (x, y) = (a.get(i), b.get(i));
            x.is_known() && x == y
        })
}

fn unpack_at(bits: &LogicVec, ty: &SignalType, low: u32) -> Literal {
    match ty {
        SignalType::Digital | SignalType::Bits { .. } => Literal::Word(bits.slice(low, ty.width())),
        SignalType::Array { element, length } => {
            let w = element.width();
            Literal::Array(
                (0..*length)
                    .map(|i| unpack_at(bits, element, low + i * w))
                    .collect(),
            )
        }
        SignalType::Tuple { fields } => {
            let mut at = low;
            Literal::Tuple(
                fields
                    .iter()
                    .map(|(key, fty)| {
                        let lit = unpack_at(bits, fty, at);
                        at += fty.width();
                        (key.clone(), lit)
                    })
                    .collect(),
            )
        }
    }
}
