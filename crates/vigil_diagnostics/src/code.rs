//! Diagnostic codes with category prefixes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Structural errors in a test or its configuration, prefixed with `E`.
    Error,
    /// Warnings, prefixed with `W`.
    Warning,
    /// Verification outcomes such as failed expectations, prefixed with `V`.
    Verification,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
            Category::Verification => 'V',
        }
    }
}

/// A category prefix plus a numeric identifier, displayed as `E101`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }

    /// A signal path does not exist in the circuit.
    pub const INVALID_REFERENCE: Self = Self::new(Category::Error, 101);
    /// A backend's naming scheme cannot address a sub-element.
    pub const UNSUPPORTED_REFERENCE: Self = Self::new(Category::Error, 102);
    /// Two signals mangle to the same backend name.
    pub const NAME_COLLISION: Self = Self::new(Category::Error, 103);
    /// A value does not fit its signal.
    pub const VALUE_OUT_OF_RANGE: Self = Self::new(Category::Error, 104);
    /// A value's shape does not match its signal.
    pub const SHAPE_MISMATCH: Self = Self::new(Category::Error, 105);
    /// A literal could not be parsed.
    pub const INVALID_LITERAL: Self = Self::new(Category::Error, 106);
    /// An action was added to a finalized sequence, or a clock was invalid.
    pub const SEQUENCE: Self = Self::new(Category::Error, 107);
    /// The configuration or test file is invalid.
    pub const CONFIG: Self = Self::new(Category::Error, 110);
    /// A backend cannot carry the requested program.
    pub const UNSUPPORTED_STIMULUS: Self = Self::new(Category::Error, 111);
    /// A simulator or external tool failed.
    pub const TOOL_FAILURE: Self = Self::new(Category::Error, 120);
    /// A check printed nothing recognisable.
    pub const NO_VERDICT: Self = Self::new(Category::Warning, 121);
    /// Vigil broke one of its own invariants.
    pub const INTERNAL: Self = Self::new(Category::Error, 199);
    /// An expectation did not hold.
    pub const EXPECT_MISMATCH: Self = Self::new(Category::Verification, 201);
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}
