//! The recording state machine.

use crate::action::{Action, Expected};
use crate::error::SequenceError;
use crate::program::{Node, NodeKind, Program, ResolvedExpected};
use tracing::debug;
use vigil_signal::{resolve, Circuit, ResolvedPath, SignalPath};
use vigil_value::Value;

/// The externally visible state of a [`Sequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceState {
    /// Nothing recorded yet.
    Idle,
    /// Accepting actions.
    Sequencing,
    /// Frozen into a program.
    Finalized,
}

enum State {
    Idle,
    Sequencing,
    Finalized(Program),
}

/// Records actions against a circuit and freezes them into a [`Program`].
///
/// Paths are resolved as each action is pushed, so a bad reference is
/// reported at the call that introduced it. Once finalized the sequence
/// rejects further actions with [`SequenceError::Frozen`].
pub struct Sequence {
    circuit: Circuit,
    actions: Vec<Action>,
    nodes: Vec<Node>,
    state: State,
}

impl Sequence {
    /// Creates an idle sequence for `circuit`.
    pub fn new(circuit: Circuit) -> Self {
        Self {
            circuit,
            actions: Vec::new(),
            nodes: Vec::new(),
            state: State::Idle,
        }
    }

    /// The circuit actions are recorded against.
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Returns the current state.
    pub fn state(&self) -> SequenceState {
        match self.state {
            State::Idle => SequenceState::Idle,
            State::Sequencing => SequenceState::Sequencing,
            State::Finalized(_) => SequenceState::Finalized,
        }
    }

    /// Starts recording. Beginning an already started sequence does nothing.
    pub fn begin(&mut self) -> Result<(), SequenceError> {
        match self.state {
            State::Finalized(_) => Err(SequenceError::Frozen),
            _ => {
                self.state = State::Sequencing;
                Ok(())
            }
        }
    }

    /// Appends an action, beginning the sequence if it is idle.
    ///
    /// Returns the action's index.
    pub fn push(&mut self, action: Action) -> Result<usize, SequenceError> {
        self.begin()?;
        let index = self.nodes.len();
        let kind = self.resolve_action(index, &action)?;
        debug!(index, %action, "recorded action");
        self.nodes.push(Node { index, kind });
        self.actions.push(action);
        Ok(index)
    }

    /// Records [`Action::Poke`].
    pub fn poke(&mut self, target: SignalPath, value: impl Into<Value>) -> Result<&mut Self, SequenceError> {
        self.push(Action::Poke {
            target,
            value: value.into(),
        })?;
        Ok(self)
    }

    /// Records [`Action::Expect`] against a constant.
    pub fn expect(&mut self, target: SignalPath, value: impl Into<Value>) -> Result<&mut Self, SequenceError> {
        self.push(Action::Expect {
            target,
            expected: Expected::Value(value.into()),
        })?;
        Ok(self)
    }

    /// Records [`Action::Expect`] against another signal.
    pub fn expect_peek(&mut self, target: SignalPath, other: SignalPath) -> Result<&mut Self, SequenceError> {
        self.push(Action::Expect {
            target,
            expected: Expected::Peek(other),
        })?;
        Ok(self)
    }

    /// Records [`Action::Eval`].
    pub fn eval(&mut self) -> Result<&mut Self, SequenceError> {
        self.push(Action::Eval)?;
        Ok(self)
    }

    /// Records [`Action::Step`].
    pub fn step(&mut self, clock: SignalPath, count: u32) -> Result<&mut Self, SequenceError> {
        self.push(Action::Step { clock, count })?;
        Ok(self)
    }

    /// Records [`Action::Print`].
    pub fn print(&mut self, target: SignalPath) -> Result<&mut Self, SequenceError> {
        self.push(Action::Print { target })?;
        Ok(self)
    }

    /// Records [`Action::Peek`].
    pub fn peek(&mut self, target: SignalPath) -> Result<&mut Self, SequenceError> {
        self.push(Action::Peek { target })?;
        Ok(self)
    }

    /// Freezes the sequence into a program.
    ///
    /// Finalizing again returns the same program.
    pub fn finalize(&mut self) -> Program {
        if let State::Finalized(program) = &self.state {
            return program.clone();
        }
        let program = Program::new(
            self.circuit.clone(),
            std::mem::take(&mut self.actions),
            std::mem::take(&mut self.nodes),
        );
        debug!(actions = program.len(), circuit = %self.circuit.name, "finalized sequence");
        self.state = State::Finalized(program.clone());
        program
    }

    /// Number of actions recorded so far, or in the finalized program.
    pub fn len(&self) -> usize {
        match &self.state {
            State::Finalized(program) => program.len(),
            _ => self.nodes.len(),
        }
    }

    /// Returns true if no actions have been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn resolve_action(&self, index: usize, action: &Action) -> Result<NodeKind, SequenceError> {
        let r = |path: &SignalPath| -> Result<ResolvedPath, SequenceError> {
            resolve(&self.circuit, path).map_err(|source| SequenceError::Reference { index, source })
        };
        Ok(match action {
            Action::Poke { target, value } => NodeKind::Poke {
                target: r(target)?,
                value: value.clone(),
            },
            Action::Expect { target, expected } => NodeKind::Expect {
                target: r(target)?,
                expected: match expected {
                    Expected::Value(v) => ResolvedExpected::Value(v.clone()),
                    Expected::Peek(other) => ResolvedExpected::Peek(r(other)?),
                },
            },
            Action::Eval => NodeKind::Eval,
            Action::Step { clock, count } => {
                let clock = r(clock)?;
                if !clock.ty().is_digital() {
                    return Err(SequenceError::InvalidClock {
                        index,
                        path: clock.to_string(),
                        ty: clock.ty().to_string(),
                    });
                }
                NodeKind::Step {
                    clock,
                    count: *count,
                }
            }
            Action::Print { target } => NodeKind::Print { target: r(target)? },
            Action::Peek { target } => NodeKind::Peek { target: r(target)? },
        })
    }
}

impl Program {
    /// Builds a program from a complete action list in one go.
    pub fn from_actions(
        circuit: Circuit,
        actions: impl IntoIterator<Item = Action>,
    ) -> Result<Program, SequenceError> {
        let mut seq = Sequence::new(circuit);
        for action in actions {
            seq.push(action)?;
        }
        Ok(seq.finalize())
    }
}
