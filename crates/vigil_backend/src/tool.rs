//! Running the external tools a static artifact names.

use crate::context::Artifact;
use crate::error::BackendError;
use crate::verdict::Transcript;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};

/// One external command: program, arguments, working directory, and extra
/// environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolInvocation {
    /// The executable.
    pub program: String,
    /// Its arguments.
    pub args: Vec<String>,
    /// The directory it runs in.
    pub cwd: PathBuf,
    /// Variables added to the inherited environment.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl ToolInvocation {
    /// An invocation of `program` with no arguments.
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            env: BTreeMap::new(),
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Adds environment variables.
    pub fn envs(mut self, env: &BTreeMap<String, String>) -> Self {
        self.env
            .extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{key}={value} ")?;
        }
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// What a finished tool reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// The exit code, or `None` if the tool was killed by a signal.
    pub code: Option<i32>,
    /// True if the tool exited successfully.
    pub success: bool,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

/// Runs one invocation to completion and captures its output.
pub fn run_tool(invocation: &ToolInvocation) -> Result<ToolOutput, BackendError> {
    debug!(command = %invocation, cwd = %invocation.cwd.display(), "running tool");
    let output = Command::new(&invocation.program)
        .args(&invocation.args)
        .current_dir(&invocation.cwd)
        .envs(&invocation.env)
        .output()
        .map_err(|source| BackendError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;
    Ok(ToolOutput {
        code: output.status.code(),
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// The result of running an artifact's tools.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Output of each tool, in order.
    pub outputs: Vec<ToolOutput>,
    /// What the run observed, for artifacts that report checks.
    pub transcript: Option<Transcript>,
}

/// Runs every tool an artifact names, in order.
///
/// A tool that exits unsuccessfully stops the pipeline with
/// [`BackendError::ToolFailed`]. For artifacts that report checks, the
/// verdict is recovered from the combined standard output. Interactive
/// artifacts already carry their transcript and run nothing.
pub fn run_artifact(artifact: &Artifact) -> Result<RunOutcome, BackendError> {
    if let Some(transcript) = &artifact.transcript {
        return Ok(RunOutcome {
            outputs: Vec::new(),
            transcript: Some(transcript.clone()),
        });
    }

    let mut outputs = Vec::with_capacity(artifact.invocations.len());
    for invocation in &artifact.invocations {
        info!(backend = %artifact.backend, program = %invocation.program, "running");
        let output = run_tool(invocation)?;
        if !output.success {
            return Err(BackendError::ToolFailed {
                program: invocation.program.clone(),
                status: match output.code {
                    Some(code) => format!("exit code {code}"),
                    None => "terminated by signal".to_string(),
                },
                stderr: output.stderr,
            });
        }
        outputs.push(output);
    }

    let transcript = artifact.reports_checks.then(|| {
        let stdout: String = outputs.iter().map(|o| o.stdout.as_str()).collect();
        Transcript::from_tool_output(&artifact.circuit, &stdout)
    });
    Ok(RunOutcome {
        outputs,
        transcript,
    })
}
