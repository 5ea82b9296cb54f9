//! Error types for emission and live execution.

use crate::verdict::Transcript;
use std::io;
use std::path::PathBuf;
use vigil_common::InternalError;
use vigil_mangle::MangleError;
use vigil_signal::ReferenceError;
use vigil_value::CodecError;

/// Why one action could not be lowered to backend operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LowerError {
    /// The backend's naming scheme cannot address a referenced signal, or
    /// two signals collided on one address.
    #[error(transparent)]
    Mangle(#[from] MangleError),

    /// A value does not fit the signal it is driven onto or compared with.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Lowering broke one of its own invariants.
    #[error(transparent)]
    Internal(#[from] InternalError),

    /// An expectation compares two signals of different shapes.
    #[error("cannot compare `{target}` with `{other}`: {reason}")]
    ShapeMismatch {
        /// The checked signal.
        target: String,
        /// The signal it is compared with.
        other: String,
        /// What differs.
        reason: String,
    },
}

/// Errors raised by a [`LiveSim`](crate::LiveSim) while driving a running
/// simulation.
#[derive(Debug, thiserror::Error)]
pub enum LiveSimError {
    /// Reading from or writing to the simulator failed.
    #[error("simulator I/O error: {0}")]
    Io(#[from] io::Error),

    /// The simulator sent something the line protocol does not allow.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The simulator rejected a request.
    #[error("simulator error: {0}")]
    Simulator(String),

    /// The simulator has no signal with this name.
    #[error("unknown signal `{0}`")]
    UnknownSignal(String),
}

/// Errors that abort an emission.
///
/// Failed expectations are not errors; they are recorded in a
/// [`Verdict`](crate::Verdict).
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// An action could not be lowered.
    #[error("action {index} (`{path}`): {source}")]
    Lowering {
        /// The action's position in the program.
        index: usize,
        /// The offending signal path.
        path: String,
        /// The underlying failure.
        #[source]
        source: LowerError,
    },

    /// The circuit declares a port or element with no bits.
    #[error("invalid circuit: {0}")]
    Circuit(#[source] ReferenceError),

    /// A circuit port cannot be named by the backend.
    #[error("port `{path}`: {source}")]
    Port {
        /// The port leaf that failed.
        path: String,
        /// The naming failure.
        #[source]
        source: MangleError,
    },

    /// Writing or reading an artifact file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A live simulation failed part-way; `transcript` holds every action
    /// that completed before the failure.
    #[error("interactive run interrupted at action {index}: {source}")]
    Interrupted {
        /// The action that was executing.
        index: usize,
        /// The actions completed so far.
        transcript: Box<Transcript>,
        /// The simulator failure.
        #[source]
        source: LiveSimError,
    },

    /// The backend cannot apply stimulus but the program has actions.
    #[error("backend `{backend}` takes no stimulus, but the program has {actions} action(s)")]
    StimulusNotSupported {
        /// The backend name.
        backend: String,
        /// The number of actions in the program.
        actions: usize,
    },

    /// No backend is registered under this name.
    #[error("unknown backend `{0}`")]
    UnknownBackend(String),

    /// The backend's settings are incomplete or inconsistent.
    #[error("backend configuration error: {0}")]
    Config(String),

    /// An external tool could not be started.
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        /// The program that failed to start.
        program: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// An external tool exited unsuccessfully.
    #[error("`{program}` failed ({status})")]
    ToolFailed {
        /// The program that failed.
        program: String,
        /// Its exit status.
        status: String,
        /// What it wrote to stderr.
        stderr: String,
    },

    /// Starting a live simulation failed.
    #[error(transparent)]
    Simulator(#[from] LiveSimError),
}

impl BackendError {
    /// The action index this error points at, if any.
    pub fn action_index(&self) -> Option<usize> {
        match self {
            BackendError::Lowering { index, .. } | BackendError::Interrupted { index, .. } => {
                Some(*index)
            }
            _ => None,
        }
    }
}
