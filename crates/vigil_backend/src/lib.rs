//! Backends that turn a finalized test program into something that runs.
//!
//! Static backends write a complete artifact (a C++ driver, a SystemVerilog
//! testbench, AMS control files, or an LVS job) plus the commands that build
//! and run it. The interactive backend instead executes each action against
//! a [`LiveSim`] as it goes and records a [`Transcript`].
//!
//! Every backend lowers the program through [`lower`], so references
//! resolve, mangle, and encode identically across targets, and every run
//! ends in the same [`Verdict`] shape.
//!
//! # Usage
//!
//! ```ignore
//! use vigil_backend::{BackendRegistry, BackendContext};
//!
//! let registry = BackendRegistry::with_defaults(&config, project_dir);
//! let backend = registry.get("verilator")?;
//! let mut ctx = BackendContext::from_config("build/verilator", &config);
//! let artifact = backend.emit(&program, &mut ctx)?;
//! ```
//!
//! # Modules
//!
//! - `backend`: The backend trait and registry
//! - `context`: Per-emission state and emitted artifacts
//! - `lower`: Shared lowering to per-leaf operations
//! - `verilator`: C++ driver emission
//! - `system_verilog`: SystemVerilog testbench emission
//! - `verilog_ams`: Mixed-signal testbench and control files
//! - `lvs`: Layout-vs-schematic job control
//! - `interactive`: Live execution against a simulation
//! - `sim`: Live simulation implementations
//! - `protocol`: The simulator line protocol
//! - `tool`: External tool invocation
//! - `verdict`: Transcripts and pass/fail verdicts
//! - `error`: Backend error types

#![warn(missing_docs)]

pub mod backend;
pub mod context;
pub mod error;
pub mod interactive;
pub mod lower;
pub mod lvs;
pub mod protocol;
pub mod sim;
pub mod system_verilog;
pub mod tool;
pub mod verdict;
pub mod verilator;
pub mod verilog_ams;

pub use backend::{Backend, BackendRegistry, EmissionMode};
pub use context::{Artifact, BackendContext};
pub use error::{BackendError, LiveSimError, LowerError};
pub use interactive::{run, InteractiveBackend, LiveSim, SimFactory};
pub use lower::{lower, Lowered};
pub use lvs::{LvsBackend, LvsJob};
pub use protocol::{parse_request, parse_response, Request, Response};
pub use sim::{ModelSim, PortValues, ProcessSim, SpawnedSim};
pub use system_verilog::SystemVerilogBackend;
pub use tool::{run_artifact, run_tool, RunOutcome, ToolInvocation, ToolOutput};
pub use verdict::{
    value_text, ExpectMismatch, Observation, Transcript, TranscriptEntry, Verdict, DONE_MARKER,
    FAIL_MARKER,
};
pub use verilator::VerilatorBackend;
pub use verilog_ams::VerilogAmsBackend;
