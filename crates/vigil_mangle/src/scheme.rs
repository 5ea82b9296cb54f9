//! Naming schemes and the presets for each backend family.

/// How an index into an array of single bits is named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitIndexRule {
    /// Append `[i]` to the name, as a bit-select of the port.
    InName,
    /// Name the whole parent array and report the bit separately in
    /// [`Address::bit`](crate::Address::bit).
    WholeWord,
}

/// How an index into an array of wider elements is named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementRule {
    /// Append `[i]`.
    Bracketed,
    /// Append `_i`.
    Underscore,
}

/// How a tuple field is named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRule {
    /// Append `_key`, or `__key` when the key is a pure integer.
    Underscore,
    /// Append `.key`.
    Dotted,
}

/// A complete naming scheme: one optional rule per segment kind.
///
/// A `None` rule means the backend cannot address that kind of sub-element
/// at all; mangling such a path fails with
/// [`MangleError::UnsupportedReferenceKind`](crate::MangleError::UnsupportedReferenceKind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NamingScheme {
    /// The scheme name, used in error messages.
    pub name: &'static str,
    /// Rule for indexing into arrays of single bits.
    pub bit_index: Option<BitIndexRule>,
    /// Rule for indexing into arrays of wider elements.
    pub element_index: Option<ElementRule>,
    /// Rule for tuple fields.
    pub field: Option<FieldRule>,
    /// Replacement for every `__` in the finished name.
    pub double_underscore_escape: Option<&'static str>,
}

impl NamingScheme {
    /// Flattened netlist names as written by Verilog emitters.
    pub const fn verilog() -> Self {
        Self {
            name: "verilog",
            bit_index: Some(BitIndexRule::InName),
            element_index: Some(ElementRule::Underscore),
            field: Some(FieldRule::Underscore),
            double_underscore_escape: None,
        }
    }

    /// Verilator's C++ member names: bits of packed arrays live in one word,
    /// and `__` is escaped to `___05F`.
    pub const fn verilator() -> Self {
        Self {
            name: "verilator",
            bit_index: Some(BitIndexRule::WholeWord),
            element_index: Some(ElementRule::Underscore),
            field: Some(FieldRule::Underscore),
            double_underscore_escape: Some("___05F"),
        }
    }

    /// Hierarchical names matching the path text, for display and for
    /// backends that understand structure.
    pub const fn hierarchical() -> Self {
        Self {
            name: "hierarchical",
            bit_index: Some(BitIndexRule::InName),
            element_index: Some(ElementRule::Bracketed),
            field: Some(FieldRule::Dotted),
            double_underscore_escape: None,
        }
    }

    /// Top-level port names only.
    pub const fn root_only() -> Self {
        Self {
            name: "root-only",
            bit_index: None,
            element_index: None,
            field: None,
            double_underscore_escape: None,
        }
    }
}
