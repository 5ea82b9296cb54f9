//! Diagnostic rendering for humans and for machines.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Formats a diagnostic into an output string.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic.
    fn render(&self, diag: &Diagnostic) -> String;
}

/// Renders diagnostics in a rustc-like terminal format.
///
/// ```text
/// error[E101]: invalid reference `O[3]`: index 3 out of range
///   --> action 4, signal O[3] (verilator)
///    = note: ...
///    = help: ...
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, severity: Severity, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        let code = match severity {
            Severity::Error => "31",
            Severity::Warning => "33",
            Severity::Note => "36",
            Severity::Help => "32",
        };
        format!("\x1b[1;{code}m{text}\x1b[0m")
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let mut out = String::new();

        let head = format!("{}[{}]", diag.severity, diag.code);
        out.push_str(&format!("{}: {}\n", self.paint(diag.severity, &head), diag.message));

        let mut location = Vec::new();
        if let Some(index) = diag.action {
            location.push(format!("action {index}"));
        }
        if let Some(signal) = &diag.signal {
            location.push(format!("signal {signal}"));
        }
        if !location.is_empty() || diag.backend.is_some() {
            let mut line = format!("  --> {}", location.join(", "));
            if let Some(backend) = &diag.backend {
                if location.is_empty() {
                    line.push_str(backend);
                } else {
                    line.push_str(&format!(" ({backend})"));
                }
            }
            out.push_str(&line);
            out.push('\n');
        }

        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }
        out
    }
}

/// Renders each diagnostic as one line of JSON.
pub struct JsonRenderer;

impl DiagnosticRenderer for JsonRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        match serde_json::to_string(diag) {
            Ok(json) => format!("{json}\n"),
            Err(e) => format!("{{\"error\":\"{e}\"}}\n"),
        }
    }
}
