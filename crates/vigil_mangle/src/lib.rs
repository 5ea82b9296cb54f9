//! Backend naming schemes for Vigil.
//!
//! Every backend refers to signals by a flat identifier. A [`NamingScheme`]
//! says how each kind of path segment (bit index, array element, tuple field)
//! turns into text for one backend family, and [`address`] applies it to a
//! [`ResolvedPath`](vigil_signal::ResolvedPath). Schemes that cannot express a
//! segment kind fail loudly rather than guessing. A [`NameTable`] records
//! every address an emission uses and rejects two distinct paths that would
//! share one.

#![warn(missing_docs)]

pub mod error;
pub mod mangle;
pub mod scheme;
pub mod table;

pub use error::{MangleError, ReferenceKind};
pub use mangle::{address, mangle, Address};
pub use scheme::{BitIndexRule, ElementRule, FieldRule, NamingScheme};
pub use table::NameTable;
