//! Frozen programs: resolved action lists shared read-only by backends.

use crate::action::Action;
use std::sync::Arc;
use vigil_signal::{Circuit, ResolvedPath};
use vigil_value::Value;

/// An action with every signal path resolved against the circuit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Drive `value` onto `target`.
    Poke {
        /// The driven signal.
        target: ResolvedPath,
        /// The value to drive.
        value: Value,
    },
    /// Check `target` against `expected`.
    Expect {
        /// The checked signal.
        target: ResolvedPath,
        /// The expected value or signal.
        expected: ResolvedExpected,
    },
    /// Settle combinational logic.
    Eval,
    /// Toggle `clock` `count` times.
    Step {
        /// The clock signal.
        clock: ResolvedPath,
        /// The number of toggles.
        count: u32,
    },
    /// Print `target`.
    Print {
        /// The printed signal.
        target: ResolvedPath,
    },
    /// Read `target`.
    Peek {
        /// The read signal.
        target: ResolvedPath,
    },
}

/// The resolved right-hand side of an expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedExpected {
    /// A constant value.
    Value(Value),
    /// The current value of another signal.
    Peek(ResolvedPath),
}

/// One entry of a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Position in the sequence, starting at 0.
    pub index: usize,
    /// The resolved action.
    pub kind: NodeKind,
}

#[derive(Debug)]
struct ProgramInner {
    circuit: Circuit,
    actions: Vec<Action>,
    nodes: Vec<Node>,
}

/// An immutable, ordered, resolved action list for one circuit.
///
/// Cloning is cheap and clones share storage, so a program can be handed to
/// several emitters at once.
#[derive(Debug, Clone)]
pub struct Program {
    inner: Arc<ProgramInner>,
}

impl Program {
    pub(crate) fn new(circuit: Circuit, actions: Vec<Action>, nodes: Vec<Node>) -> Self {
        Self {
            inner: Arc::new(ProgramInner {
                circuit,
                actions,
                nodes,
            }),
        }
    }

    /// The circuit under test.
    pub fn circuit(&self) -> &Circuit {
        &self.inner.circuit
    }

    /// The resolved nodes in order.
    pub fn nodes(&self) -> &[Node] {
        &self.inner.nodes
    }

    /// The actions as originally recorded.
    pub fn actions(&self) -> &[Action] {
        &self.inner.actions
    }

    /// The number of actions.
    pub fn len(&self) -> usize {
        self.inner.nodes.len()
    }

    /// Returns true if the program has no actions.
    pub fn is_empty(&self) -> bool {
        self.inner.nodes.is_empty()
    }

    /// Returns true if both handles share the same storage.
    pub fn ptr_eq(&self, other: &Program) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
