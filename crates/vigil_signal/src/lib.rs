//! Signal reference model for the Vigil test harness.
//!
//! A circuit is described by its ports, each with a [`SignalType`] tree of
//! scalars, bit-vectors, arrays, and tuples. Test actions address arbitrary
//! sub-elements of that tree through a [`SignalPath`], which [`resolve`]
//! checks against the circuit and normalizes into a [`ResolvedPath`]: an
//! in-order list of segments from the root port to the addressed element,
//! each annotated with its type.
//!
//! # Modules
//!
//! - `types`: Signal types and widths
//! - `path`: Signal paths, their text form, and normalized segments
//! - `circuit`: Circuit ports and port enumeration
//! - `resolve`: Path normalization against a circuit
//! - `error`: Reference errors

#![warn(missing_docs)]

pub mod circuit;
pub mod error;
pub mod path;
pub mod resolve;
pub mod types;

pub use circuit::{Circuit, Direction, Port};
pub use error::ReferenceError;
pub use path::{Segment, SignalPath};
pub use resolve::{resolve, ResolvedPath, ResolvedSegment};
pub use types::SignalType;
