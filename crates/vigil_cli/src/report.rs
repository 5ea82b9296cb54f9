//! Turning backend errors and verdicts into diagnostics, and printing them.

use vigil_backend::{BackendError, ExpectMismatch, LowerError};
use vigil_diagnostics::{
    Diagnostic, DiagnosticCode, DiagnosticRenderer, JsonRenderer, TerminalRenderer,
};
use vigil_mangle::MangleError;
use vigil_value::CodecError;

use crate::{GlobalArgs, ReportFormat};

/// Lines of tool stderr kept in a failure note.
const STDERR_TAIL: usize = 10;

/// The diagnostic for a failed emission or run.
pub fn backend_error(backend: &str, err: &BackendError) -> Diagnostic {
    let diag = match err {
        BackendError::Lowering {
            index,
            path,
            source,
        } => Diagnostic::error(lower_code(source), source.to_string())
            .with_action(*index)
            .with_signal(path.clone()),
        BackendError::Circuit(_) => {
            Diagnostic::error(DiagnosticCode::INVALID_REFERENCE, err.to_string())
        }
        BackendError::Port { path, source } => {
            Diagnostic::error(mangle_code(source), source.to_string()).with_signal(path.clone())
        }
        BackendError::StimulusNotSupported { .. } => {
            Diagnostic::error(DiagnosticCode::UNSUPPORTED_STIMULUS, err.to_string())
                .with_help("use `vigil lvs` to run layout-vs-schematic jobs")
        }
        BackendError::UnknownBackend(_) => {
            Diagnostic::error(DiagnosticCode::CONFIG, err.to_string())
                .with_help("run `vigil backends` to list the configured backends")
        }
        BackendError::Config(_) => Diagnostic::error(DiagnosticCode::CONFIG, err.to_string()),
        BackendError::ToolFailed { stderr, .. } => {
            let mut diag = Diagnostic::error(DiagnosticCode::TOOL_FAILURE, err.to_string());
            let lines: Vec<&str> = stderr.lines().collect();
            let start = lines.len().saturating_sub(STDERR_TAIL);
            for line in &lines[start..] {
                diag = diag.with_note(line.to_string());
            }
            diag
        }
        BackendError::Interrupted {
            index, transcript, ..
        } => Diagnostic::error(DiagnosticCode::TOOL_FAILURE, err.to_string())
            .with_action(*index)
            .with_note(format!(
                "{} action(s) ran before the failure",
                transcript.entries.len().saturating_sub(1)
            )),
        BackendError::Io { .. } | BackendError::Spawn { .. } | BackendError::Simulator(_) => {
            Diagnostic::error(DiagnosticCode::TOOL_FAILURE, err.to_string())
        }
    };
    diag.with_backend(backend)
}

fn lower_code(err: &LowerError) -> DiagnosticCode {
    match err {
        LowerError::Mangle(e) => mangle_code(e),
        LowerError::Codec(CodecError::OutOfRange { .. }) => DiagnosticCode::VALUE_OUT_OF_RANGE,
        LowerError::Codec(CodecError::ShapeMismatch { .. }) | LowerError::ShapeMismatch { .. } => {
            DiagnosticCode::SHAPE_MISMATCH
        }
        LowerError::Codec(CodecError::InvalidLiteral { .. }) => DiagnosticCode::INVALID_LITERAL,
        LowerError::Internal(_) => DiagnosticCode::INTERNAL,
    }
}

fn mangle_code(err: &MangleError) -> DiagnosticCode {
    match err {
        MangleError::UnsupportedReferenceKind { .. } => DiagnosticCode::UNSUPPORTED_REFERENCE,
        MangleError::Collision { .. } => DiagnosticCode::NAME_COLLISION,
    }
}

/// The diagnostic for one failed expectation.
pub fn mismatch(backend: &str, mismatch: &ExpectMismatch) -> Diagnostic {
    Diagnostic::error(
        DiagnosticCode::EXPECT_MISMATCH,
        format!(
            "expected `{}` == {}, got {}",
            mismatch.signal, mismatch.expected, mismatch.actual
        ),
    )
    .with_action(mismatch.action)
    .with_signal(mismatch.signal.clone())
    .with_backend(backend)
}

/// The warning for a run whose output never reached its completion marker.
pub fn no_verdict(backend: &str) -> Diagnostic {
    Diagnostic::warning(
        DiagnosticCode::NO_VERDICT,
        "the run ended without reporting completion",
    )
    .with_backend(backend)
    .with_help("check the tool output; the simulation may have crashed or timed out")
}

/// Prints diagnostics in the selected format: text to stderr, JSON lines to
/// stdout.
pub fn render(diagnostics: &[Diagnostic], global: &GlobalArgs) {
    match global.format {
        ReportFormat::Json => {
            for diag in diagnostics {
                print!("{}", JsonRenderer.render(diag));
            }
        }
        ReportFormat::Text => {
            let renderer = TerminalRenderer::new(global.color);
            for diag in diagnostics {
                eprint!("{}", renderer.render(diag));
            }
        }
    }
}
