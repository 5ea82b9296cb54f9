//! Per-emission state and the artifacts emissions produce.

use crate::backend::EmissionMode;
use crate::error::BackendError;
use crate::tool::ToolInvocation;
use crate::verdict::{Transcript, Verdict};
use serde::Serialize;
use std::path::{Path, PathBuf};
use vigil_config::{FileNames, VigilConfig};
use vigil_mangle::NameTable;

/// Mutable state for exactly one emission.
///
/// A context is created per emission and never shared, so parallel
/// emissions cannot collide on names or files.
#[derive(Debug)]
pub struct BackendContext {
    dir: PathBuf,
    /// Addresses claimed so far.
    pub names: NameTable,
    /// Names of the files backends write.
    pub files: FileNames,
    /// Stop at the first failed expectation.
    pub stop_on_first_failure: bool,
    written: Vec<PathBuf>,
}

impl BackendContext {
    /// A context writing into `dir` with default file names.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            names: NameTable::new(),
            files: FileNames::default(),
            stop_on_first_failure: false,
            written: Vec::new(),
        }
    }

    /// A context writing into `dir` with the configured file names and run
    /// settings.
    pub fn from_config(dir: impl Into<PathBuf>, config: &VigilConfig) -> Self {
        Self::new(dir)
            .with_files(config.files.clone())
            .with_stop_on_first_failure(config.run.stop_on_first_failure)
    }

    /// Replaces the file names.
    pub fn with_files(mut self, files: FileNames) -> Self {
        self.files = files;
        self
    }

    /// Sets whether to stop at the first failed expectation.
    pub fn with_stop_on_first_failure(mut self, stop: bool) -> Self {
        self.stop_on_first_failure = stop;
        self
    }

    /// The working directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the working directory if it does not exist.
    pub fn ensure_dir(&self) -> Result<(), BackendError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| BackendError::Io {
            path: self.dir.clone(),
            source,
        })
    }

    /// Writes `contents` to `name` inside the working directory.
    pub fn write_file(&mut self, name: &str, contents: &str) -> Result<PathBuf, BackendError> {
        self.ensure_dir()?;
        let path = self.dir.join(name);
        std::fs::write(&path, contents).map_err(|source| BackendError::Io {
            path: path.clone(),
            source,
        })?;
        self.written.push(path.clone());
        Ok(path)
    }

    /// Files written so far, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Takes the list of written files, leaving it empty.
    pub fn take_written(&mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.written)
    }
}

/// What one emission produced.
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    /// The backend that produced it.
    pub backend: String,
    /// The circuit under test.
    pub circuit: String,
    /// Static or interactive.
    pub mode: EmissionMode,
    /// The working directory.
    pub dir: PathBuf,
    /// Files written.
    pub files: Vec<PathBuf>,
    /// Commands that consume the files, in order.
    pub invocations: Vec<ToolInvocation>,
    /// The observed run, for interactive emissions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Transcript>,
    /// True if running the tools prints check markers a verdict can be read
    /// from.
    pub reports_checks: bool,
}

impl Artifact {
    /// The verdict of an interactive emission, if it has one.
    pub fn verdict(&self) -> Option<Verdict> {
        self.transcript.as_ref().map(Transcript::verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_file_creates_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let mut ctx = BackendContext::new(tmp.path().join("a/b"));
        let path = ctx.write_file("x.sv", "module x; endmodule\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "module x; endmodule\n");
        assert_eq!(ctx.written(), &[path.clone()]);
        assert_eq!(ctx.take_written(), vec![path]);
        assert!(ctx.written().is_empty());
    }

    #[test]
    fn from_config_copies_settings() {
        let mut config = VigilConfig::for_project("t");
        config.run.stop_on_first_failure = true;
        config.files.lvs_control = "job.tvf".into();
        let ctx = BackendContext::from_config("/tmp/x", &config);
        assert!(ctx.stop_on_first_failure);
        assert_eq!(ctx.files.lvs_control, "job.tvf");
        assert_eq!(ctx.dir(), Path::new("/tmp/x"));
    }

    #[test]
    fn write_into_file_path_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let mut ctx = BackendContext::new(blocker.join("sub"));
        let err = ctx.write_file("x", "y").unwrap_err();
        assert!(matches!(err, BackendError::Io { .. }));
    }
}
