//! Structured diagnostics for test compilation and verification runs.
//!
//! A [`Diagnostic`] carries a severity, a [`DiagnosticCode`], a message, and
//! the action index and signal it concerns. The thread-safe
//! [`DiagnosticSink`] accumulates them across parallel emissions, and
//! [`DiagnosticRenderer`] implementations format them for a terminal or as
//! JSON.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
