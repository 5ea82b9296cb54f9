//! Verilog-style literal text and human-readable value formatting.

use crate::error::CodecError;
use crate::value::Value;
use vigil_common::{Logic, LogicVec};

/// Formats a word as a sized Verilog literal.
///
/// Fully known words use hex (`3'h5`); words with X or Z bits use binary
/// (`4'b1x01`) so every bit survives.
pub fn verilog_literal(bits: &LogicVec) -> String {
    match bits.to_hex_string() {
        Some(hex) => format!("{}'h{hex}", bits.width()),
        None => format!("{}'b{}", bits.width(), bits.to_binary_string()),
    }
}

/// Parses a Verilog-style literal such as `8'hff`, `4'b10x1`, `6'o17`,
/// `'d5`, or `8'sd3`.
///
/// Unsized literals are at least 32 bits wide. Short literals are
/// zero-extended, or X/Z-extended when their leading digit is X or Z.
/// Literals with set bits beyond their declared size are rejected.
pub fn parse_verilog_literal(text: &str) -> Result<LogicVec, CodecError> {
    let invalid = |reason: &str| CodecError::InvalidLiteral {
        text: text.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = text.trim();
    let (size, rest) = trimmed
        .split_once('\'')
        .ok_or_else(|| invalid("expected a `'` base marker"))?;
    let size = size.trim().replace('_', "");
    let width = if size.is_empty() {
        None
    } else {
        match size.parse::<u32>() {
            Ok(0) | Err(_) => return Err(invalid("size must be a positive integer")),
            Ok(w) => Some(w),
        }
    };

    let rest = rest.strip_prefix(|c: char| c == 's' || c == 'S').unwrap_or(rest);
    let mut chars = rest.chars();
    let base = chars.next().ok_or_else(|| invalid("missing base"))?;
    let digits = chars.as_str().trim();

    let parsed = match base.to_ascii_lowercase() {
        'b' => LogicVec::from_binary_str(digits),
        'o' => from_octal_str(digits),
        'h' => LogicVec::from_hex_str(digits),
        'd' => from_decimal_str(digits),
        _ => return Err(invalid("base must be one of b, o, d, h")),
    }
    .ok_or_else(|| invalid("digits do not match the base"))?;
    if parsed.width() == 0 {
        return Err(invalid("missing digits"));
    }

    let width = width.unwrap_or_else(|| parsed.width().max(32));
    fit(&parsed, width).ok_or_else(|| invalid(&format!("value does not fit in {width} bits")))
}

/// Formats a word as a decimal integer, honoring signedness.
///
/// Words with X or Z bits are shown as a binary Verilog literal instead.
pub fn format_word(bits: &LogicVec, signed: bool) -> String {
    let n = if signed {
        bits.to_i128_signed().map(|v| v.to_string())
    } else {
        bits.to_u128().map(|v| v.to_string())
    };
    n.unwrap_or_else(|| verilog_literal(bits))
}

/// Formats a value for print output: decimal integers, `0`/`1` booleans,
/// and Verilog literals for words containing X or Z.
pub fn format_display(value: &Value) -> String {
    match value {
        Value::Int(v) => v.to_string(),
        Value::Bool(b) => u8::from(*b).to_string(),
        Value::Bits(bits) => format_word(bits, false),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(format_display).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Tuple(fields) => {
            let parts: Vec<String> = fields
                .iter()
                .map(|(k, v)| format!("{k}: {}", format_display(v)))
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
    }
}

fn from_octal_str(digits: &str) -> Option<LogicVec> {
    let digits: Vec<char> = digits.chars().filter(|c| *c != '_').collect();
    let mut v = LogicVec::new(digits.len() as u32 * 3);
    for (i, c) in digits.iter().rev().enumerate() {
        let base = i as u32 * 3;
        if let Some(state @ (Logic::X | Logic::Z)) = Logic::from_char(*c) {
            for bit in 0..3 {
                v.set(base + bit, state);
            }
            continue;
        }
        let d = c.to_digit(8)?;
        for bit in 0..3 {
            v.set(base + bit, Logic::from_bool(d & (1 << bit) != 0));
        }
    }
    Some(v)
}

fn from_decimal_str(digits: &str) -> Option<LogicVec> {
    let digits: String = digits.chars().filter(|c| *c != '_').collect();
    if let Some(state @ (Logic::X | Logic::Z)) = single_char(&digits).and_then(Logic::from_char) {
        return Some(LogicVec::filled(1, state));
    }
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: u128 = digits.parse().ok()?;
    let width = (128 - n.leading_zeros()).max(1);
    Some(LogicVec::from_i128(n as i128, width))
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    let c = chars.next()?;
    chars.next().is_none().then_some(c)
}

fn fit(bits: &LogicVec, width: u32) -> Option<LogicVec> {
    if bits.width() > width {
        if (width..bits.width()).any(|i| bits.get(i) != Logic::Zero) {
            return None;
        }
        return Some(bits.resized(width));
    }
    let mut out = bits.resized(width);
    let msb = bits.get(bits.width() - 1);
    if !msb.is_known() {
        for i in bits.width()..width {
            out.set(i, msb);
        }
    }
    Some(out)
}
