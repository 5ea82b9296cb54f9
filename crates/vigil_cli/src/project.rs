//! Project discovery and loading shared by every command.

use std::error::Error;
use std::path::{Path, PathBuf};

use vigil_actions::{load_test_file, Program};
use vigil_config::{load_config, load_config_file, VigilConfig};

use crate::GlobalArgs;

/// A loaded project: its root directory and validated configuration.
pub struct Project {
    /// The directory holding `vigil.toml`. Relative config paths resolve
    /// against it.
    pub root: PathBuf,
    /// The validated configuration.
    pub config: VigilConfig,
}

impl Project {
    /// Where artifacts go: `out_dir` if given, else the configured build
    /// directory under the root.
    pub fn build_dir(&self, out_dir: Option<&Path>) -> PathBuf {
        match out_dir {
            Some(dir) => dir.to_path_buf(),
            None => self.root.join(&self.config.project.build_dir),
        }
    }
}

/// Walks up from `start` looking for the nearest directory containing
/// `vigil.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join("vigil.toml").exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find vigil.toml in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Loads the project named by `--config` (a file or its directory), or the
/// nearest one above the current directory.
pub fn load_project(global: &GlobalArgs) -> Result<Project, Box<dyn Error>> {
    match &global.config {
        Some(path) => {
            let path = PathBuf::from(path);
            if path.is_file() {
                let root = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                let config = load_config_file(&path)?;
                Ok(Project { root, config })
            } else {
                let config = load_config(&path)?;
                Ok(Project { root: path, config })
            }
        }
        None => {
            let root = find_project_root(&std::env::current_dir()?)?;
            let config = load_config(&root)?;
            Ok(Project { root, config })
        }
    }
}

/// Reads a JSON test file and freezes it into a program.
pub fn load_program(path: &Path) -> Result<Program, Box<dyn Error>> {
    let file = load_test_file(path).map_err(|e| format!("{}: {e}", path.display()))?;
    Ok(file.into_program()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReportFormat;
    use std::fs;
    use tempfile::TempDir;

    fn global(config: Option<String>) -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            config,
            format: ReportFormat::Text,
        }
    }

    #[test]
    fn find_root_in_parent() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("vigil.toml"), "[project]\nname = \"t\"\n").unwrap();
        let nested = tmp.path().join("tests/unit");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_project_root(&nested).unwrap(), tmp.path());
    }

    #[test]
    fn load_from_config_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("vigil.toml");
        fs::write(&path, "[project]\nname = \"adder\"\nbuild_dir = \"out\"\n").unwrap();
        let project = load_project(&global(Some(path.to_str().unwrap().to_string()))).unwrap();
        assert_eq!(project.root, tmp.path());
        assert_eq!(project.config.project.name, "adder");
        assert_eq!(project.build_dir(None), tmp.path().join("out"));
        assert_eq!(
            project.build_dir(Some(Path::new("/elsewhere"))),
            PathBuf::from("/elsewhere")
        );
    }

    #[test]
    fn load_from_config_dir() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("vigil.toml"), "[project]\nname = \"inv\"\n").unwrap();
        let project = load_project(&global(Some(tmp.path().to_str().unwrap().to_string()))).unwrap();
        assert_eq!(project.root, tmp.path());
        assert_eq!(project.build_dir(None), tmp.path().join("build"));
    }

    #[test]
    fn invalid_config_is_an_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("vigil.toml"), "[project]\nname = \"\"\n").unwrap();
        assert!(load_project(&global(Some(tmp.path().to_str().unwrap().to_string()))).is_err());
    }

    #[test]
    fn load_program_reports_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.json");
        fs::write(&path, "{").unwrap();
        let err = load_program(&path).err().unwrap().to_string();
        assert!(err.contains("broken.json"));
    }
}
