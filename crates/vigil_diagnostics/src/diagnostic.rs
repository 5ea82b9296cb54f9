//! Structured diagnostic messages with severity, codes, and action context.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// A structured diagnostic message.
///
/// Instead of a source span, a diagnostic points at the test action that
/// triggered it and, when known, the signal and backend involved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level.
    pub severity: Severity,
    /// The code identifying the kind of diagnostic.
    pub code: DiagnosticCode,
    /// The main message.
    pub message: String,
    /// Index of the action this concerns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<usize>,
    /// The signal this concerns, in path text form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
    /// The backend that reported it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    /// Explanatory footnotes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    /// Actionable suggestions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub help: Vec<String>,
}

impl Diagnostic {
    fn new(severity: Severity, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            action: None,
            signal: None,
            backend: None,
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// Creates an error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    /// Creates a warning diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    /// Sets the action index.
    pub fn with_action(mut self, index: usize) -> Self {
        self.action = Some(index);
        self
    }

    /// Sets the signal.
    pub fn with_signal(mut self, signal: impl Into<String>) -> Self {
        self.signal = Some(signal.into());
        self
    }

    /// Sets the backend.
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }

    /// Adds a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Adds a help message.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_error() {
        let diag = Diagnostic::error(DiagnosticCode::INVALID_REFERENCE, "no port `Q`");
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.message, "no port `Q`");
        assert_eq!(diag.code.to_string(), "E101");
        assert!(diag.action.is_none());
    }

    #[test]
    fn builder_methods() {
        let diag = Diagnostic::error(DiagnosticCode::EXPECT_MISMATCH, "expectation failed")
            .with_action(3)
            .with_signal("O[1]")
            .with_backend("verilator")
            .with_note("expected 1, got 0")
            .with_help("check the reset sequence");
        assert_eq!(diag.action, Some(3));
        assert_eq!(diag.signal.as_deref(), Some("O[1]"));
        assert_eq!(diag.backend.as_deref(), Some("verilator"));
        assert_eq!(diag.notes.len(), 1);
        assert_eq!(diag.help.len(), 1);
    }

    #[test]
    fn json_skips_empty_context() {
        let diag = Diagnostic::warning(DiagnosticCode::NO_VERDICT, "no output");
        let json = serde_json::to_value(&diag).unwrap();
        assert!(json.get("action").is_none());
        assert!(json.get("notes").is_none());
        let back: Diagnostic = serde_json::from_value(json).unwrap();
        assert_eq!(back, diag);
    }
}
