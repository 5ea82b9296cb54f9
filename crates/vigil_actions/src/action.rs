//! Test actions as recorded by the user.

use serde::{Deserialize, Serialize};
use std::fmt;
use vigil_signal::SignalPath;
use vigil_value::{format_display, Value};

/// One step of a test, in the order it must happen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Drive a value onto an input.
    Poke {
        /// The signal to drive.
        target: SignalPath,
        /// The value to drive.
        value: Value,
    },
    /// Check a signal against a constant or another signal.
    Expect {
        /// The signal to check.
        target: SignalPath,
        /// What it should equal.
        expected: Expected,
    },
    /// Settle combinational logic.
    Eval,
    /// Toggle a clock `count` times, settling after each toggle.
    Step {
        /// The clock signal.
        clock: SignalPath,
        /// The number of toggles.
        #[serde(default = "default_count")]
        count: u32,
    },
    /// Print a signal's current value.
    Print {
        /// The signal to print.
        target: SignalPath,
    },
    /// Read a signal's current value.
    Peek {
        /// The signal to read.
        target: SignalPath,
    },
}

fn default_count() -> u32 {
    1
}

/// The right-hand side of an [`Action::Expect`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expected {
    /// A constant value.
    Value(Value),
    /// The current value of another signal.
    Peek(SignalPath),
}

impl Action {
    /// Every signal path this action refers to, in the order they appear.
    pub fn paths(&self) -> Vec<&SignalPath> {
        match self {
            Action::Poke { target, .. } | Action::Print { target } | Action::Peek { target } => {
                vec![target]
            }
            Action::Expect {
                target,
                expected: Expected::Peek(other),
            } => vec![target, other],
            Action::Expect { target, .. } => vec![target],
            Action::Step { clock, .. } => vec![clock],
            Action::Eval => Vec::new(),
        }
    }

    /// A short lowercase name of the action kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Poke { .. } => "poke",
            Action::Expect { .. } => "expect",
            Action::Eval => "eval",
            Action::Step { .. } => "step",
            Action::Print { .. } => "print",
            Action::Peek { .. } => "peek",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Poke { target, value } => write!(f, "poke {target} = {}", format_display(value)),
            Action::Expect { target, expected } => write!(f, "expect {target} == {expected}"),
            Action::Eval => write!(f, "eval"),
            Action::Step { clock, count } => write!(f, "step {clock} x{count}"),
            Action::Print { target } => write!(f, "print {target}"),
            Action::Peek { target } => write!(f, "peek {target}"),
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Value(v) => write!(f, "{}", format_display(v)),
            Expected::Peek(p) => write!(f, "{p}"),
        }
    }
}
