//! JSON test files: a circuit's port list plus its actions.

use crate::action::Action;
use crate::error::LoadError;
use crate::program::Program;
use serde::{Deserialize, Serialize};
use std::path::Path;
use vigil_signal::Circuit;

/// A complete test description.
///
/// ```json
/// {
///   "circuit": {"name": "Inv", "ports": [
///     {"name": "I", "direction": "in", "type": "digital"},
///     {"name": "O", "direction": "out", "type": "digital"}]},
///   "actions": [
///     {"action": "poke", "target": "I", "value": 1},
///     {"action": "eval"},
///     {"action": "expect", "target": "O", "expected": {"value": 0}}]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestFile {
    /// The circuit under test.
    pub circuit: Circuit,
    /// The actions, in order.
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl TestFile {
    /// Resolves every action and freezes them into a program.
    pub fn into_program(self) -> Result<Program, LoadError> {
        self.circuit.validate().map_err(LoadError::Circuit)?;
        Ok(Program::from_actions(self.circuit, self.actions)?)
    }
}

/// Reads and parses a test file from disk.
pub fn load_test_file(path: &Path) -> Result<TestFile, LoadError> {
    let content = std::fs::read_to_string(path)?;
    parse_test_file(&content)
}

/// Parses a test file from a JSON string.
pub fn parse_test_file(content: &str) -> Result<TestFile, LoadError> {
    serde_json::from_str(content).map_err(|e| LoadError::Parse(e.to_string()))
}
