//! Test values and their backend-neutral encoding.
//!
//! A [`Value`] is what a test author writes: an integer, a boolean, raw bits,
//! or a list/record mirroring a composite signal. [`encode`] checks it
//! against a [`SignalType`](vigil_signal::SignalType) and produces a
//! [`Literal`], the wire-level shape every backend consumes; [`decode`] goes
//! back. The `format` module holds the Verilog-style text forms shared by
//! emitted artifacts, the interactive line protocol, and print output.

#![warn(missing_docs)]

pub mod codec;
pub mod error;
pub mod format;
pub mod literal;
pub mod value;

pub use codec::{decode, encode};
pub use error::CodecError;
pub use format::{format_display, format_word, parse_verilog_literal, verilog_literal};
pub use literal::{bits_match, Literal};
pub use value::Value;
