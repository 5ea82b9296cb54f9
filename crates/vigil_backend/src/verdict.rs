//! Transcripts of observed values and pass/fail verdicts.
//!
//! Interactive runs build a [`Transcript`] as they execute. Static artifacts
//! print the same information as marker lines, which
//! [`Transcript::from_tool_output`] reads back, so both modes end in the same
//! [`Verdict`] for the same program.

use serde::{Deserialize, Serialize};
use std::fmt;
use vigil_common::LogicVec;
use vigil_value::{format_word, verilog_literal};

/// Prefix of the line an artifact prints for each failed check.
pub const FAIL_MARKER: &str = "VIGIL EXPECT FAIL";
/// Prefix of the line an artifact prints when it finishes normally.
pub const DONE_MARKER: &str = "VIGIL DONE";

/// Formats an observed word the way every backend prints it.
///
/// Words up to 64 bits print in decimal (signed when the signal is); wider
/// words print as a sized hex literal.
pub fn value_text(bits: &LogicVec, signed: bool) -> String {
    if bits.width() <= 64 {
        format_word(bits, signed)
    } else {
        verilog_literal(bits)
    }
}

/// One failed expectation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectMismatch {
    /// Index of the `Expect` action.
    pub action: usize,
    /// The checked leaf signal, as path text.
    pub signal: String,
    /// The expected value.
    pub expected: String,
    /// The observed value.
    pub actual: String,
}

impl ExpectMismatch {
    /// The marker line a static artifact prints for this mismatch.
    pub fn marker_line(&self) -> String {
        format!(
            "{FAIL_MARKER} action={} signal={} expected={} actual={}",
            self.action, self.signal, self.expected, self.actual
        )
    }

    /// Reads a failure marker line. Fields are located by their keys, so a
    /// signal name containing spaces still reads back; a field that cannot be
    /// found reads as `?` so the failure is never lost.
    fn from_marker_line(line: &str) -> Self {
        let rest = line.strip_prefix(FAIL_MARKER).unwrap_or(line);
        let actual_at = rest.rfind(" actual=");
        let expected_at = rest[..actual_at.unwrap_or(rest.len())].rfind(" expected=");
        let signal_at = rest[..expected_at.or(actual_at).unwrap_or(rest.len())].find(" signal=");

        let field = |at: Option<usize>, key: &str, end: Option<usize>| {
            at.map(|at| {
                let start = at + key.len();
                rest[start..end.unwrap_or(rest.len()).max(start)].trim().to_string()
            })
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "?".to_string())
        };
        let action = rest
            .split_whitespace()
            .find_map(|pair| pair.strip_prefix("action="))
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        Self {
            action,
            signal: field(signal_at, " signal=", expected_at.or(actual_at)),
            expected: field(expected_at, " expected=", actual_at),
            actual: field(actual_at, " actual=", None),
        }
    }
}

impl fmt::Display for ExpectMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "action {}: expected {} == {}, got {}",
            self.action, self.signal, self.expected, self.actual
        )
    }
}

/// A value read from the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// The leaf signal, as path text.
    pub signal: String,
    /// The observed value.
    pub value: String,
}

/// The record of one executed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// The action's position in the program.
    pub index: usize,
    /// The action as text.
    pub action: String,
    /// Values read while executing it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub observed: Vec<Observation>,
}

/// Everything a run observed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    /// The circuit under test.
    pub circuit: String,
    /// Executed actions, in order. Empty for transcripts read back from a
    /// static artifact's output.
    #[serde(default)]
    pub entries: Vec<TranscriptEntry>,
    /// Print lines, `<circuit>.<signal> = <value>`.
    #[serde(default)]
    pub prints: Vec<String>,
    /// Failed expectations, in order.
    #[serde(default)]
    pub mismatches: Vec<ExpectMismatch>,
    /// True once the run reached its normal end, including an early stop
    /// after a failure.
    pub finished: bool,
    /// The failure count a static artifact reported on its completion line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_failures: Option<usize>,
}

impl Transcript {
    /// An empty transcript for `circuit`.
    pub fn new(circuit: impl Into<String>) -> Self {
        Self {
            circuit: circuit.into(),
            ..Self::default()
        }
    }

    /// Reads the marker lines a static artifact printed.
    ///
    /// Lines that are not print, failure, or completion markers are tool
    /// chatter and are skipped.
    pub fn from_tool_output(circuit: &str, output: &str) -> Self {
        let mut transcript = Self::new(circuit);
        let print_prefix = format!("{circuit}.");
        for line in output.lines().map(str::trim) {
            if line.starts_with(FAIL_MARKER) {
                transcript
                    .mismatches
                    .push(ExpectMismatch::from_marker_line(line));
            } else if let Some(rest) = line.strip_prefix(DONE_MARKER) {
                transcript.finished = true;
                transcript.reported_failures = Some(
                    rest.split_whitespace()
                        .find_map(|pair| pair.strip_prefix("failures="))
                        .and_then(|n| n.parse().ok())
                        .unwrap_or(usize::MAX),
                );
            } else if line.starts_with(&print_prefix) && line.contains(" = ") {
                transcript.prints.push(line.to_string());
            }
        }
        transcript
    }

    /// The print line for `signal` holding `value`.
    pub fn print_line(&self, signal: &str, value: &str) -> String {
        format!("{}.{signal} = {value}", self.circuit)
    }

    /// The aggregate verdict. A run passes only if it finished, recorded no
    /// mismatch, and reported no failures of its own.
    pub fn verdict(&self) -> Verdict {
        Verdict {
            passed: self.finished
                && self.mismatches.is_empty()
                && self.reported_failures.unwrap_or(0) == 0,
            mismatches: self.mismatches.clone(),
        }
    }
}

/// The pass/fail outcome of a whole program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// True if the run finished and every expectation held.
    pub passed: bool,
    /// Every failed expectation.
    pub mismatches: Vec<ExpectMismatch>,
}

impl Verdict {
    /// Recovers the verdict from a static artifact's output.
    ///
    /// Output without a completion marker never passes: the run crashed or
    /// was cut short.
    pub fn from_tool_output(circuit: &str, output: &str) -> Self {
        Transcript::from_tool_output(circuit, output).verdict()
    }
}
