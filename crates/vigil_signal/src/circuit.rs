//! Circuit port descriptions and port enumeration.

use crate::error::ReferenceError;
use crate::path::SignalPath;
use crate::resolve::{resolve, ResolvedPath};
use crate::types::SignalType;
use serde::{Deserialize, Serialize};

/// The direction of a top-level port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Driven by the test.
    In,
    /// Driven by the circuit.
    Out,
    /// Bidirectional.
    InOut,
}

/// A single top-level port of a circuit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    /// The port name.
    pub name: String,
    /// The port direction.
    pub direction: Direction,
    /// The port's type tree.
    #[serde(rename = "type")]
    pub ty: SignalType,
}

/// A circuit under test: a name and its typed ports.
///
/// The port list is supplied by whatever compiled the hardware description;
/// Vigil only reads it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circuit {
    /// The circuit (top module) name.
    pub name: String,
    /// The top-level ports in declaration order.
    pub ports: Vec<Port>,
}

impl Circuit {
    /// Creates a circuit with no ports.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ports: Vec::new(),
        }
    }

    /// Adds a port and returns the circuit, for builder-style construction.
    pub fn with_port(mut self, name: impl Into<String>, direction: Direction, ty: SignalType) -> Self {
        self.ports.push(Port {
            name: name.into(),
            direction,
            ty,
        });
        self
    }

    /// Looks up a port by name.
    pub fn port(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Returns the flattened port set: every packed leaf of every port, in
    /// declaration order.
    pub fn packed_ports(&self) -> Vec<ResolvedPath> {
        let mut out = Vec::new();
        for port in &self.ports {
            if let Ok(root) = resolve(self, &SignalPath::root(port.name.clone())) {
                out.extend(root.leaves());
            }
        }
        out
    }

    /// Checks that every port and sub-element holds at least one bit.
    ///
    /// Circuits arrive from outside as JSON, so this runs before a circuit is
    /// sequenced or emitted.
    pub fn validate(&self) -> Result<(), ReferenceError> {
        for port in &self.ports {
            check_nonempty(&SignalPath::root(port.name.clone()), &port.ty)?;
        }
        Ok(())
    }

    /// Enumerates every valid path into the circuit, parents before children.
    pub fn all_paths(&self) -> Vec<SignalPath> {
        let mut out = Vec::new();
        for port in &self.ports {
            walk(SignalPath::root(port.name.clone()), &port.ty, &mut out);
        }
        out
    }
}

fn check_nonempty(path: &SignalPath, ty: &SignalType) -> Result<(), ReferenceError> {
    let empty = |reason: &str| ReferenceError::InvalidReference {
        path: path.to_string(),
        reason: reason.to_string(),
    };
    match ty {
        SignalType::Digital => Ok(()),
        SignalType::Bits { width: 0, .. } => Err(empty("bit vector of width 0")),
        SignalType::Bits { .. } => Ok(()),
        SignalType::Array { length: 0, .. } => Err(empty("array of length 0")),
        SignalType::Array { element, .. } => check_nonempty(&path.clone().index(0), element),
        SignalType::Tuple { fields } if fields.is_empty() => Err(empty("tuple with no fields")),
        SignalType::Tuple { fields } => fields
            .iter()
            .try_for_each(|(key, field_ty)| check_nonempty(&path.clone().field(key.clone()), field_ty)),
    }
}

fn walk(path: SignalPath, ty: &SignalType, out: &mut Vec<SignalPath>) {
    out.push(path.clone());
    match ty {
        SignalType::Digital | SignalType::Bits { .. } => {}
        SignalType::Array { element, length } => {
            for i in 0..*length {
                walk(path.clone().index(i), element, out);
            }
        }
        SignalType::Tuple { fields } => {
            for (key, field_ty) in fields {
                walk(path.clone().field(key.clone()), field_ty, out);
            }
        }
    }
}
