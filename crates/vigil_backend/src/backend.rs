//! The backend capability interface and the registry that composes backends.

use crate::context::{Artifact, BackendContext};
use crate::error::BackendError;
use crate::interactive::InteractiveBackend;
use crate::lvs::LvsBackend;
use crate::system_verilog::SystemVerilogBackend;
use crate::verilator::VerilatorBackend;
use crate::verilog_ams::VerilogAmsBackend;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use tracing::info;
use vigil_actions::Program;
use vigil_config::{FileNames, VigilConfig};
use vigil_mangle::NamingScheme;

/// How a backend consumes a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmissionMode {
    /// The whole program is written into an artifact before anything runs.
    Static,
    /// Each action executes against a live simulation as it is emitted.
    Interactive,
}

impl fmt::Display for EmissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmissionMode::Static => write!(f, "static"),
            EmissionMode::Interactive => write!(f, "interactive"),
        }
    }
}

/// One target a program can be emitted for.
pub trait Backend: Send + Sync {
    /// The registry name.
    fn name(&self) -> &str;

    /// Whether emission writes an artifact or drives a live simulation.
    fn mode(&self) -> EmissionMode;

    /// How this backend names signals.
    fn naming(&self) -> &NamingScheme;

    /// Whether the backend can apply stimulus. Backends that cannot only
    /// accept empty programs.
    fn accepts_stimulus(&self) -> bool {
        true
    }

    /// Emits `program` using `ctx` for names and files.
    fn emit(&self, program: &Program, ctx: &mut BackendContext) -> Result<Artifact, BackendError>;
}

/// Backends by name.
#[derive(Default)]
pub struct BackendRegistry {
    backends: BTreeMap<String, Box<dyn Backend>>,
}

impl BackendRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in backends configured from `config`.
    ///
    /// Relative paths in the configuration resolve against `project_dir`.
    /// The `process` backend is registered only when a simulator command is
    /// configured.
    pub fn with_defaults(config: &VigilConfig, project_dir: &Path) -> Self {
        let mut registry = Self::new();
        registry.register(VerilatorBackend::from_config(&config.verilator, project_dir));
        registry.register(SystemVerilogBackend::from_config(
            &config.system_verilog,
            project_dir,
        ));
        registry.register(VerilogAmsBackend::from_config(&config.ams, project_dir));
        registry.register(LvsBackend::from_config(&config.lvs, project_dir));
        if !config.interactive.command.is_empty() {
            registry.register(InteractiveBackend::process(
                config.interactive.command.clone(),
            ));
        }
        registry
    }

    /// Adds a backend, replacing any backend of the same name.
    pub fn register(&mut self, backend: impl Backend + 'static) {
        self.backends
            .insert(backend.name().to_string(), Box::new(backend));
    }

    /// Looks up a backend.
    pub fn get(&self, name: &str) -> Result<&dyn Backend, BackendError> {
        self.backends
            .get(name)
            .map(|b| b.as_ref())
            .ok_or_else(|| BackendError::UnknownBackend(name.to_string()))
    }

    /// Registered names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.backends.keys().map(String::as_str)
    }

    /// Registered backends in name order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Backend> {
        self.backends.values().map(|b| b.as_ref())
    }

    /// Emits `program` once per selected backend, in parallel.
    ///
    /// Each emission gets its own context writing into `build_dir/<name>`.
    /// A name selected twice is emitted once. Results come back in the
    /// order of first selection.
    pub fn emit_all(
        &self,
        selected: &[String],
        program: &Program,
        build_dir: &Path,
        files: &FileNames,
        stop_on_first_failure: bool,
    ) -> Vec<(String, Result<Artifact, BackendError>)> {
        let mut seen = HashSet::new();
        let unique: Vec<&String> = selected
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .collect();
        unique
            .into_par_iter()
            .map(|name| {
                let result = self.get(name).and_then(|backend| {
                    let mut ctx = BackendContext::new(build_dir.join(name))
                        .with_files(files.clone())
                        .with_stop_on_first_failure(stop_on_first_failure);
                    info!(
                        backend = name.as_str(),
                        mode = %backend.mode(),
                        circuit = %program.circuit().name,
                        dir = %ctx.dir().display(),
                        "emitting"
                    );
                    backend.emit(program, &mut ctx)
                });
                (name.clone(), result)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_actions::Sequence;
    use vigil_signal::{Circuit, Direction, SignalType};

    fn program() -> Program {
        let c = Circuit::new("Inv")
            .with_port("I", Direction::In, SignalType::Digital)
            .with_port("O", Direction::Out, SignalType::Digital);
        let mut seq = Sequence::new(c);
        seq.poke("I".parse().unwrap(), 1).unwrap();
        seq.eval().unwrap();
        seq.expect("O".parse().unwrap(), 0).unwrap();
        seq.finalize()
    }

    #[test]
    fn defaults_without_interactive_command() {
        let config = VigilConfig::for_project("inv");
        let registry = BackendRegistry::with_defaults(&config, Path::new("."));
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["lvs", "system-verilog", "verilator", "verilog-ams"]);
        assert!(matches!(
            registry.get("process"),
            Err(BackendError::UnknownBackend(_))
        ));
    }

    #[test]
    fn interactive_registered_with_command() {
        let mut config = VigilConfig::for_project("inv");
        config.interactive.command = vec!["./sim".into()];
        let registry = BackendRegistry::with_defaults(&config, Path::new("."));
        let process = registry.get("process").unwrap();
        assert_eq!(process.mode(), EmissionMode::Interactive);
    }

    #[test]
    fn modes_and_schemes() {
        let registry =
            BackendRegistry::with_defaults(&VigilConfig::for_project("inv"), Path::new("."));
        for backend in registry.iter() {
            assert_eq!(backend.mode(), EmissionMode::Static);
        }
        assert_eq!(registry.get("verilator").unwrap().naming().name, "verilator");
        assert_eq!(registry.get("system-verilog").unwrap().naming().name, "verilog");
        assert_eq!(registry.get("lvs").unwrap().naming().name, "root-only");
    }

    #[test]
    fn emit_all_uses_separate_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let registry =
            BackendRegistry::with_defaults(&VigilConfig::for_project("inv"), tmp.path());
        let selected = vec![
            "verilator".to_string(),
            "system-verilog".to_string(),
            "nope".to_string(),
        ];
        let results = registry.emit_all(
            &selected,
            &program(),
            tmp.path(),
            &FileNames::default(),
            false,
        );
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0, "verilator");
        let verilator = results[0].1.as_ref().unwrap();
        assert_eq!(verilator.dir, tmp.path().join("verilator"));
        assert!(tmp.path().join("verilator/Inv_driver.cpp").exists());
        assert!(tmp.path().join("system-verilog/Inv_tb.sv").exists());
        assert!(matches!(results[2].1, Err(BackendError::UnknownBackend(_))));
    }

    #[test]
    fn emit_all_runs_each_backend_once() {
        let tmp = tempfile::tempdir().unwrap();
        let registry =
            BackendRegistry::with_defaults(&VigilConfig::for_project("inv"), tmp.path());
        let selected = vec![
            "verilator".to_string(),
            "system-verilog".to_string(),
            "verilator".to_string(),
        ];
        let results = registry.emit_all(
            &selected,
            &program(),
            tmp.path(),
            &FileNames::default(),
            false,
        );
        let names: Vec<&str> = results.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["verilator", "system-verilog"]);
        let dirs: HashSet<_> = results
            .iter()
            .map(|(_, r)| r.as_ref().unwrap().dir.clone())
            .collect();
        assert_eq!(dirs.len(), 2);
    }

    #[test]
    fn display_mode() {
        assert_eq!(EmissionMode::Static.to_string(), "static");
        assert_eq!(
            serde_json::to_string(&EmissionMode::Interactive).unwrap(),
            "\"interactive\""
        );
    }
}
