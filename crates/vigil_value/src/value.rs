//! Test values as written by a test author.

use crate::error::CodecError;
use crate::format::{parse_verilog_literal, verilog_literal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use vigil_common::LogicVec;

/// A value to drive onto, or expect from, a signal.
///
/// In JSON a value is a number, a boolean, a string holding a decimal
/// integer or a Verilog-style literal (`"8'hff"`, `"4'b10x1"`, `"'d5"`), a
/// list for arrays, or an object for tuples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ValueRepr", into = "ValueRepr")]
pub enum Value {
    /// An integer, checked against the target's width and signedness.
    Int(i128),
    /// A single bit.
    Bool(bool),
    /// Raw bits; the width must match the target exactly.
    Bits(LogicVec),
    /// Array elements, index 0 first.
    Array(Vec<Value>),
    /// Tuple fields by key.
    Tuple(BTreeMap<String, Value>),
}

impl Value {
    /// Builds a tuple value from `(key, value)` pairs.
    pub fn tuple<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Tuple(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Returns true for values that describe a composite signal.
    pub fn is_composite(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Tuple(_))
    }
}

impl From<i128> for Value {
    fn from(v: i128) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v.into())
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<LogicVec> for Value {
    fn from(v: LogicVec) -> Self {
        Value::Bits(v)
    }
}

impl FromStr for Value {
    type Err = CodecError;

    /// Parses a decimal integer or a Verilog-style literal.
    ///
    /// Sized literals become [`Value::Bits`]; unsized literals with no X or Z
    /// bits become [`Value::Int`].
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        if let Ok(v) = trimmed.parse::<i128>() {
            return Ok(Value::Int(v));
        }
        let bits = parse_verilog_literal(trimmed)?;
        if trimmed.starts_with('\'') {
            if let Some(v) = bits.to_i128_unsigned() {
                return Ok(Value::Int(v));
            }
        }
        Ok(Value::Bits(bits))
    }
}

/// The JSON shape of a [`Value`].
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ValueRepr {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Text(String),
    List(Vec<ValueRepr>),
    Fields(BTreeMap<String, ValueRepr>),
}

impl TryFrom<ValueRepr> for Value {
    type Error = CodecError;

    fn try_from(repr: ValueRepr) -> Result<Self, Self::Error> {
        Ok(match repr {
            ValueRepr::Bool(b) => Value::Bool(b),
            ValueRepr::Int(v) => Value::Int(v.into()),
            ValueRepr::UInt(v) => Value::Int(v.into()),
            ValueRepr::Text(text) => text.parse()?,
            ValueRepr::List(items) => Value::Array(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            ValueRepr::Fields(fields) => Value::Tuple(
                fields
                    .into_iter()
                    .map(|(k, v)| Value::try_from(v).map(|v| (k, v)))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }
}

impl From<Value> for ValueRepr {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(b) => ValueRepr::Bool(b),
            Value::Int(v) => match i64::try_from(v) {
                Ok(small) => ValueRepr::Int(small),
                Err(_) => ValueRepr::Text(v.to_string()),
            },
            Value::Bits(bits) => ValueRepr::Text(verilog_literal(&bits)),
            Value::Array(items) => ValueRepr::List(items.into_iter().map(Into::into).collect()),
            Value::Tuple(fields) => {
                ValueRepr::Fields(fields.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}
