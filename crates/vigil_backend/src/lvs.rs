//! Layout-vs-schematic job-control emission.
//!
//! An LVS job compares a layout database against a schematic netlist. It
//! takes no stimulus, so the only program it accepts is an empty one.

use crate::backend::{Backend, EmissionMode};
use crate::context::{Artifact, BackendContext};
use crate::error::BackendError;
use crate::tool::ToolInvocation;
use std::path::{Path, PathBuf};
use tracing::info;
use vigil_actions::Program;
use vigil_config::LvsConfig;
use vigil_mangle::NamingScheme;

/// Inputs to one LVS job, with every path resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LvsJob {
    /// Layout database path.
    pub layout: String,
    /// Schematic netlist path.
    pub schematic: String,
    /// Rule files to source.
    pub rules: Vec<String>,
    /// Report path.
    pub report: String,
    /// Layout database format.
    pub layout_system: String,
    /// Schematic netlist format.
    pub source_system: String,
    /// Layout top cell.
    pub layout_primary: String,
    /// Schematic top cell.
    pub source_primary: String,
}

impl LvsJob {
    /// Builds a job from configuration, defaulting each primary to its
    /// file's stem.
    pub fn from_config(config: &LvsConfig, project_dir: &Path) -> Result<Self, BackendError> {
        if config.layout.is_empty() {
            return Err(BackendError::Config("lvs.layout is not set".to_string()));
        }
        if config.schematic.is_empty() {
            return Err(BackendError::Config("lvs.schematic is not set".to_string()));
        }
        let resolve = |p: &str| project_dir.join(p).display().to_string();
        Ok(Self {
            layout: resolve(&config.layout),
            schematic: resolve(&config.schematic),
            rules: config.rules.iter().map(|r| resolve(r)).collect(),
            report: config.report.clone(),
            layout_system: config.layout_system.clone(),
            source_system: config.source_system.clone(),
            layout_primary: config
                .layout_primary
                .clone()
                .unwrap_or_else(|| file_stem(&config.layout)),
            source_primary: config
                .source_primary
                .clone()
                .unwrap_or_else(|| file_stem(&config.schematic)),
        })
    }

    /// The job-control file text.
    pub fn control_file(&self) -> String {
        let mut out = String::new();
        out.push_str("#!tvf\n\n");
        out.push_str(&format!("LAYOUT SYSTEM {}\n", self.layout_system));
        out.push_str(&format!("LAYOUT PRIMARY \"{}\"\n", self.layout_primary));
        out.push_str(&format!("LAYOUT PATH \"{}\"\n", self.layout));
        out.push_str(&format!("SOURCE SYSTEM {}\n", self.source_system));
        out.push_str(&format!("SOURCE PRIMARY \"{}\"\n", self.source_primary));
        out.push_str(&format!("SOURCE PATH \"{}\"\n", self.schematic));
        out.push_str(&format!("LVS REPORT \"{}\"\n\n", self.report));
        for rule in &self.rules {
            out.push_str(&format!("source \"{rule}\"\n"));
        }
        out
    }
}

fn file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Emits the LVS job-control file and the `calibre` command that runs it.
#[derive(Debug, Clone)]
pub struct LvsBackend {
    config: LvsConfig,
    project_dir: PathBuf,
    naming: NamingScheme,
}

impl LvsBackend {
    /// A backend with the given settings. Relative paths resolve against
    /// `project_dir`.
    pub fn from_config(config: &LvsConfig, project_dir: &Path) -> Self {
        Self {
            config: config.clone(),
            project_dir: project_dir.to_path_buf(),
            naming: NamingScheme::root_only(),
        }
    }
}

impl Backend for LvsBackend {
    fn name(&self) -> &str {
        "lvs"
    }

    fn mode(&self) -> EmissionMode {
        EmissionMode::Static
    }

    fn naming(&self) -> &NamingScheme {
        &self.naming
    }

    fn accepts_stimulus(&self) -> bool {
        false
    }

    fn emit(&self, program: &Program, ctx: &mut BackendContext) -> Result<Artifact, BackendError> {
        if !program.is_empty() {
            return Err(BackendError::StimulusNotSupported {
                backend: self.name().to_string(),
                actions: program.len(),
            });
        }
        let job = LvsJob::from_config(&self.config, &self.project_dir)?;
        let control = ctx.files.lvs_control.clone();
        ctx.write_file(&control, &job.control_file())?;
        info!(layout = %job.layout_primary, source = %job.source_primary, file = %control, "wrote LVS job");

        let invocation = ToolInvocation::new("calibre", ctx.dir())
            .args(["-hier", "-lvs"])
            .arg(&control)
            .envs(&self.config.env);
        Ok(Artifact {
            backend: self.name().to_string(),
            circuit: program.circuit().name.clone(),
            mode: self.mode(),
            dir: ctx.dir().to_path_buf(),
            files: ctx.take_written(),
            invocations: vec![invocation],
            transcript: None,
            reports_checks: false,
        })
    }
}
