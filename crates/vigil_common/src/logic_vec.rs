//! Packed vectors of 4-state logic values, the wire-level form of every
//! encoded signal value.

use crate::logic::Logic;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A vector of 4-state [`Logic`] values of arbitrary width.
///
/// Each logic value occupies 2 bits (encoding 4 states), with 32 values packed
/// per `u64` word. Index 0 is the least significant bit.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicVec {
    width: u32,
    /// Packed storage: 2 bits per logic value, 32 values per u64.
    data: Vec<u64>,
}

/// Number of logic values packed per u64 word.
const VALUES_PER_WORD: u32 = 32;

impl LogicVec {
    /// Creates a new `LogicVec` of the given width, initialized to all `Zero`.
    pub fn new(width: u32) -> Self {
        let num_words = word_count(width);
        Self {
            width,
            data: vec![0; num_words],
        }
    }

    /// Returns the number of logic values in this vector.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Gets the logic value at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn get(&self, index: u32) -> Logic {
        assert!(
            index < self.width,
            "index {index} out of bounds for width {}",
            self.width
        );
        let word_idx = (index / VALUES_PER_WORD) as usize;
        let bit_offset = (index % VALUES_PER_WORD) * 2;
        match (self.data[word_idx] >> bit_offset) & 0b11 {
            0 => Logic::Zero,
            1 => Logic::One,
            2 => Logic::X,
            _ => Logic::Z,
        }
    }

    /// Sets the logic value at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn set(&mut self, index: u32, value: Logic) {
        assert!(
            index < self.width,
            "index {index} out of bounds for width {}",
            self.width
        );
        let word_idx = (index / VALUES_PER_WORD) as usize;
        let bit_offset = (index % VALUES_PER_WORD) * 2;
        let mask = !(0b11u64 << bit_offset);
        self.data[word_idx] = (self.data[word_idx] & mask) | ((value as u64) << bit_offset);
    }

    /// Creates a `LogicVec` with every bit set to `value`.
    pub fn filled(width: u32, value: Logic) -> Self {
        let mut v = Self::new(width);
        for i in 0..width {
            v.set(i, value);
        }
        v
    }

    /// Creates a single-bit `LogicVec` from a boolean value.
    pub fn from_bool(value: bool) -> Self {
        let mut v = Self::new(1);
        v.set(0, Logic::from_bool(value));
        v
    }

    /// Creates a `LogicVec` from a `u64` value with the given width.
    ///
    /// Bits beyond the given width are ignored.
    pub fn from_u64(value: u64, width: u32) -> Self {
        Self::from_i128(value as i128, width)
    }

    /// Creates a `LogicVec` holding the two's complement of `value`.
    ///
    /// Bits above 128 replicate the sign bit; bits beyond `width` are dropped.
    /// Callers check that the value fits before relying on the result.
    pub fn from_i128(value: i128, width: u32) -> Self {
        let mut v = Self::new(width);
        for i in 0..width {
            let bit = if i < 128 {
                (value >> i) & 1 != 0
            } else {
                value < 0
            };
            if bit {
                v.set(i, Logic::One);
            }
        }
        v
    }

    /// Interprets the vector as an unsigned integer.
    ///
    /// Returns `None` if any bit is X or Z, or if a set bit lies beyond bit 127.
    pub fn to_u128(&self) -> Option<u128> {
        let mut result = 0u128;
        for i in 0..self.width {
            match self.get(i) {
                Logic::Zero => {}
                Logic::One if i < 128 => result |= 1 << i,
                _ => return None,
            }
        }
        Some(result)
    }

    /// Interprets the vector as a two's complement signed integer.
    ///
    /// Returns `None` if any bit is X or Z or the value does not fit an `i128`.
    pub fn to_i128_signed(&self) -> Option<i128> {
        if self.width == 0 {
            return Some(0);
        }
        if self.has_unknown() {
            return None;
        }
        let negative = self.get(self.width - 1) == Logic::One;
        // Bits at and above 127 must all equal the sign bit.
        for i in 127.min(self.width)..self.width {
            if (self.get(i) == Logic::One) != negative {
                return None;
            }
        }
        let mut result: i128 = if negative { -1 } else { 0 };
        for i in 0..self.width.min(127) {
            let mask = 1i128 << i;
            if self.get(i) == Logic::One {
                result |= mask;
            } else {
                result &= !mask;
            }
        }
        Some(result)
    }

    /// Interprets the vector as an unsigned integer that fits an `i128`.
    pub fn to_i128_unsigned(&self) -> Option<i128> {
        self.to_u128().and_then(|v| i128::try_from(v).ok())
    }

    /// Returns true if any bit is X or Z.
    pub fn has_unknown(&self) -> bool {
        (0..self.width).any(|i| !self.get(i).is_known())
    }

    /// Returns true if all bits are `Logic::Zero`.
    pub fn is_all_zero(&self) -> bool {
        (0..self.width).all(|i| self.get(i) == Logic::Zero)
    }

    /// Copies `width` bits starting at `low` into a new vector.
    ///
    /// # Panics
    ///
    /// Panics if the range runs past the end of the vector.
    pub fn slice(&self, low: u32, width: u32) -> LogicVec {
        let mut v = Self::new(width);
        for i in 0..width {
            v.set(i, self.get(low + i));
        }
        v
    }

    /// Overwrites the bits starting at `low` with the contents of `bits`.
    ///
    /// # Panics
    ///
    /// Panics if the range runs past the end of the vector.
    pub fn set_slice(&mut self, low: u32, bits: &LogicVec) {
        for i in 0..bits.width {
            self.set(low + i, bits.get(i));
        }
    }

    /// Returns the vector split into 32-bit words, least significant first.
    ///
    /// Returns `None` if any bit is X or Z.
    pub fn to_u32_words(&self) -> Option<Vec<u32>> {
        if self.has_unknown() {
            return None;
        }
        let count = self.width.div_ceil(32).max(1);
        let mut words = vec![0u32; count as usize];
        for i in 0..self.width {
            if self.get(i) == Logic::One {
                words[(i / 32) as usize] |= 1 << (i % 32);
            }
        }
        Some(words)
    }

    /// Parses a binary string like `"10XZ"` into a `LogicVec`.
    ///
    /// The leftmost character is the most significant bit (highest index).
    /// Underscores are ignored. Returns `None` if the string contains invalid
    /// characters.
    pub fn from_binary_str(s: &str) -> Option<Self> {
        let digits: Vec<char> = s.chars().filter(|c| *c != '_').collect();
        let mut v = Self::new(digits.len() as u32);
        for (i, c) in digits.iter().rev().enumerate() {
            v.set(i as u32, Logic::from_char(*c)?);
        }
        Some(v)
    }

    /// Parses a hex string into a `LogicVec`.
    ///
    /// Each hex digit represents 4 bits; `x` and `z` digits fill all 4 bits.
    /// Underscores are ignored. Returns `None` on any other character.
    pub fn from_hex_str(s: &str) -> Option<Self> {
        let digits: Vec<char> = s.chars().filter(|c| *c != '_').collect();
        let mut v = Self::new((digits.len() as u32) * 4);
        for (hex_idx, c) in digits.iter().rev().enumerate() {
            let base = (hex_idx as u32) * 4;
            if let Some(state @ (Logic::X | Logic::Z)) = Logic::from_char(*c) {
                for bit in 0..4 {
                    v.set(base + bit, state);
                }
                continue;
            }
            let nibble = c.to_digit(16)?;
            for bit in 0..4 {
                v.set(base + bit, Logic::from_bool(nibble & (1 << bit) != 0));
            }
        }
        Some(v)
    }

    /// Returns a copy resized to `width`, zero-extending or truncating.
    pub fn resized(&self, width: u32) -> LogicVec {
        let mut v = Self::new(width);
        for i in 0..width.min(self.width) {
            v.set(i, self.get(i));
        }
        v
    }

    /// Formats the vector as lowercase hex digits, most significant first.
    ///
    /// Returns `None` if any bit is X or Z.
    pub fn to_hex_string(&self) -> Option<String> {
        if self.has_unknown() {
            return None;
        }
        let digits = self.width.div_ceil(4).max(1);
        let mut s = String::with_capacity(digits as usize);
        for d in (0..digits).rev() {
            let mut nibble = 0u32;
            for bit in 0..4 {
                let i = d * 4 + bit;
                if i < self.width && self.get(i) == Logic::One {
                    nibble |= 1 << bit;
                }
            }
            s.push(std::char::from_digit(nibble, 16).unwrap_or('0'));
        }
        Some(s)
    }

    /// Formats the vector as lowercase binary digits, most significant first.
    pub fn to_binary_string(&self) -> String {
        (0..self.width).rev().map(|i| self.get(i).to_char()).collect()
    }
}

impl fmt::Display for LogicVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..self.width).rev() {
            write!(f, "{}", self.get(i))?;
        }
        Ok(())
    }
}

impl fmt::Debug for LogicVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogicVec({self})")
    }
}

/// Returns the number of u64 words needed to store `width` logic values.
fn word_count(width: u32) -> usize {
    width.div_ceil(VALUES_PER_WORD) as usize
}
