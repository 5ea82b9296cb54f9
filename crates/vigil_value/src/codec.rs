//! Encoding values into literals and decoding them back.

use crate::error::CodecError;
use crate::literal::Literal;
use crate::value::Value;
use std::collections::BTreeMap;
use vigil_common::LogicVec;
use vigil_signal::SignalType;

/// Encodes `value` as a literal shaped like `ty`.
///
/// Integers become two's complement words of the type's width and must lie
/// in `[-2^(w-1), 2^(w-1) - 1]` for signed types or `[0, 2^w - 1]` for
/// unsigned ones. Arrays of single bits also accept an integer, read as the
/// packed word. Raw bits must match the type's total width and are split
/// into its shape. Composites encode element-wise in declared order.
pub fn encode(value: &Value, ty: &SignalType) -> Result<Literal, CodecError> {
    match (value, ty) {
        (Value::Bits(bits), _) => {
            if bits.width() != ty.width() {
                return Err(shape(
                    ty,
                    format!("expected {} bits, found {}", ty.width(), bits.width()),
                ));
            }
            Literal::unpack(bits, ty)
        }
        (Value::Bool(b), SignalType::Digital | SignalType::Bits { .. }) => {
            encode_int(i128::from(*b), ty)
        }
        (Value::Int(v), SignalType::Digital | SignalType::Bits { .. }) => encode_int(*v, ty),
        (Value::Int(_) | Value::Bool(_), SignalType::Array { element, length })
            if element.is_digital() =>
        {
            let word = match value {
                Value::Bool(b) => i128::from(*b),
                Value::Int(v) => *v,
                _ => 0,
            };
            let packed = encode_int(word, &SignalType::bits(*length))?;
            let bits = packed.pack();
            Literal::unpack(&bits, ty).map_err(|_| out_of_range(word, ty))
        }
        (Value::Array(items), SignalType::Array { element, length }) => {
            if items.len() != *length as usize {
                return Err(shape(
                    ty,
                    format!("expected {length} elements, found {}", items.len()),
                ));
            }
            Ok(Literal::Array(
                items
                    .iter()
                    .map(|item| encode(item, element))
                    .collect::<Result<_, _>>()?,
            ))
        }
        (Value::Tuple(map), SignalType::Tuple { fields }) => {
            if let Some(extra) = map.keys().find(|k| ty.field(k).is_none()) {
                return Err(shape(ty, format!("unexpected field `{extra}`")));
            }
            let mut out = Vec::with_capacity(fields.len());
            for (key, fty) in fields {
                let v = map
                    .get(key)
                    .ok_or_else(|| shape(ty, format!("missing field `{key}`")))?;
                out.push((key.clone(), encode(v, fty)?));
            }
            Ok(Literal::Tuple(out))
        }
        (Value::Array(_) | Value::Tuple(_), SignalType::Digital | SignalType::Bits { .. }) => {
            Err(shape(ty, "composite value for a scalar signal".to_string()))
        }
        (Value::Int(_) | Value::Bool(_), _) => {
            Err(shape(ty, "scalar value for a composite signal".to_string()))
        }
        (Value::Array(_), SignalType::Tuple { .. }) => {
            Err(shape(ty, "list value for a tuple signal".to_string()))
        }
        (Value::Tuple(_), SignalType::Array { .. }) => {
            Err(shape(ty, "record value for an array signal".to_string()))
        }
    }
}

/// Decodes a literal shaped like `ty` back into a value.
///
/// Single bits decode to booleans. Words decode to integers, sign-extended
/// for signed types; words with X or Z bits, or too wide for an `i128`,
/// decode to [`Value::Bits`]. A packed word for a composite type is split
/// first.
pub fn decode(literal: &Literal, ty: &SignalType) -> Result<Value, CodecError> {
    match (literal, ty) {
        (Literal::Word(bits), SignalType::Digital | SignalType::Bits { .. }) => {
            if bits.width() != ty.width() {
                return Err(shape(
                    ty,
                    format!("expected {} bits, found {}", ty.width(), bits.width()),
                ));
            }
            Ok(decode_word(bits, ty))
        }
        (Literal::Word(bits), _) => decode(&Literal::unpack(bits, ty)?, ty),
        (Literal::Array(items), SignalType::Array { element, length }) => {
            if items.len() != *length as usize {
                return Err(shape(
                    ty,
                    format!("expected {length} elements, found {}", items.len()),
                ));
            }
            Ok(Value::Array(
                items
                    .iter()
                    .map(|item| decode(item, element))
                    .collect::<Result<_, _>>()?,
            ))
        }
        (Literal::Tuple(parts), SignalType::Tuple { fields }) => {
            if parts.len() != fields.len() {
                return Err(shape(
                    ty,
                    format!("expected {} fields, found {}", fields.len(), parts.len()),
                ));
            }
            let mut out = BTreeMap::new();
            for ((key, lit), (fkey, fty)) in parts.iter().zip(fields) {
                if key != fkey {
                    return Err(shape(ty, format!("expected field `{fkey}`, found `{key}`")));
                }
                out.insert(key.clone(), decode(lit, fty)?);
            }
            Ok(Value::Tuple(out))
        }
        _ => Err(shape(ty, "literal shape differs from the signal type".to_string())),
    }
}

fn encode_int(v: i128, ty: &SignalType) -> Result<Literal, CodecError> {
    let width = ty.width();
    if !fits(v, width, ty.is_signed()) {
        return Err(out_of_range(v, ty));
    }
    Ok(Literal::Word(LogicVec::from_i128(v, width)))
}

fn fits(v: i128, width: u32, signed: bool) -> bool {
    match (signed, width) {
        (_, 0) => v == 0,
        (true, w) if w >= 128 => true,
        (true, w) => {
            let half = 1i128 << (w - 1);
            (-half..half).contains(&v)
        }
        (false, w) if w >= 127 => v >= 0,
        (false, w) => (0..(1i128 << w)).contains(&v),
    }
}

fn decode_word(bits: &LogicVec, ty: &SignalType) -> Value {
    if ty.is_digital() {
        return match bits.to_u128() {
            Some(v) => Value::Bool(v != 0),
            None => Value::Bits(bits.clone()),
        };
    }
    let n = if ty.is_signed() {
        bits.to_i128_signed()
    } else {
        bits.to_i128_unsigned()
    };
    n.map(Value::Int).unwrap_or_else(|| Value::Bits(bits.clone()))
}

fn shape(ty: &SignalType, reason: String) -> CodecError {
    CodecError::ShapeMismatch {
        ty: ty.to_string(),
        reason,
    }
}

fn out_of_range(v: i128, ty: &SignalType) -> CodecError {
    CodecError::OutOfRange {
        value: v.to_string(),
        ty: ty.to_string(),
    }
}
