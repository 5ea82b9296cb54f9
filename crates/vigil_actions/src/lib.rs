//! Recording backend-independent test action sequences.
//!
//! A test is an ordered list of [`Action`]s against one circuit. A
//! [`Sequence`] accepts them one at a time, checking every signal path
//! against the circuit as it arrives, and [`Sequence::finalize`] freezes the
//! result into an immutable [`Program`] that any number of backends can read
//! concurrently. Test files in JSON form load through [`load_test_file`].
//!
//! # Modules
//!
//! - `action`: Action and expectation types
//! - `sequence`: The recording state machine
//! - `program`: Frozen, resolved programs
//! - `test_file`: JSON test files
//! - `error`: Sequencing and loading errors

#![warn(missing_docs)]

pub mod action;
pub mod error;
pub mod program;
pub mod sequence;
pub mod test_file;

pub use action::{Action, Expected};
pub use error::{LoadError, SequenceError};
pub use program::{Node, NodeKind, Program, ResolvedExpected};
pub use sequence::{Sequence, SequenceState};
pub use test_file::{load_test_file, parse_test_file, TestFile};
