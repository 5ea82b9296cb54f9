//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::{Simulator, VigilConfig, BUS_DELIMITERS};
use std::path::Path;

/// Loads and validates `<project_dir>/vigil.toml`.
pub fn load_config(project_dir: &Path) -> Result<VigilConfig, ConfigError> {
    load_config_file(&project_dir.join("vigil.toml"))
}

/// Loads and validates a configuration file at an explicit path.
pub fn load_config_file(path: &Path) -> Result<VigilConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<VigilConfig, ConfigError> {
    let config: VigilConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks required fields and value ranges.
pub fn validate_config(config: &VigilConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    if !BUS_DELIMITERS.contains(&config.ams.bus_delim.as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "ams.bus_delim must be one of {}, got '{}'",
            BUS_DELIMITERS.join(", "),
            config.ams.bus_delim
        )));
    }
    if config.ams.simulator != Simulator::Ncsim {
        return Err(ConfigError::ValidationError(format!(
            "ams.simulator must be ncsim, got '{}'",
            config.ams.simulator.name()
        )));
    }
    for (name, v) in [
        ("ams.stop_time", config.ams.stop_time),
        ("ams.vsup", config.ams.vsup),
        ("ams.rout", config.ams.rout),
    ] {
        if !(v.is_finite() && v > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "{name} must be positive, got {v}"
            )));
        }
    }
    for (name, file) in [
        ("files.ams_control", &config.files.ams_control),
        ("files.lvs_control", &config.files.lvs_control),
    ] {
        if file.is_empty() {
            return Err(ConfigError::MissingField(name.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let config = load_config_from_str("[project]\nname = \"adder\"\n").unwrap();
        assert_eq!(config.project.name, "adder");
        assert_eq!(config.project.build_dir, "build");
        assert_eq!(config.files.ams_control, "amscf.scs");
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[project]
name = "adder"
build_dir = "out"

[run]
stop_on_first_failure = true

[verilator]
flags = ["-Wno-lint"]
sources = ["rtl/adder.v"]

[system_verilog]
simulator = "iverilog"
flags = ["-g2012"]
ext_srcs = ["rtl/adder.v"]
use_input_wires = true

[ams]
stop_time = 2.5
vsup = 1.2
rout = 10.0
bus_delim = "[]"
use_spice = ["inv"]
model_paths = ["models"]
vams_code = "wrap.vams"

[lvs]
layout = "gds/top.gds"
schematic = "sch/top.sp"
rules = ["rules.cal"]
report = "out.report"

[lvs.env]
CALIBRE_HOME = "/opt/calibre"

[interactive]
command = ["./sim_server", "--port", "0"]

[files]
lvs_control = "job.tvf"
testbench = "top_tb.sv"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.project.build_dir, "out");
        assert!(config.run.stop_on_first_failure);
        assert_eq!(config.verilator.flags, vec!["-Wno-lint"]);
        assert_eq!(config.verilator.binary, "verilator");
        assert_eq!(config.system_verilog.ext_srcs, vec!["rtl/adder.v"]);
        assert_eq!(config.ams.stop_time, 2.5);
        assert_eq!(config.ams.bus_delim, "[]");
        assert_eq!(config.ams.vams_code.as_deref(), Some("wrap.vams"));
        assert_eq!(config.lvs.rules, vec!["rules.cal"]);
        assert_eq!(config.lvs.layout_system, "GDSII");
        assert_eq!(config.lvs.env["CALIBRE_HOME"], "/opt/calibre");
        assert_eq!(config.interactive.command.len(), 3);
        assert_eq!(config.files.lvs_control, "job.tvf");
        assert_eq!(config.files.testbench.as_deref(), Some("top_tb.sv"));
    }

    #[test]
    fn missing_name_errors() {
        let err = load_config_from_str("[project]\nname = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn missing_project_section_errors() {
        let err = load_config_from_str("[run]\nstop_on_first_failure = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn bad_bus_delim() {
        let toml = "[project]\nname = \"t\"\n[ams]\nbus_delim = \"()\"\n";
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn ams_requires_ncsim() {
        let toml = "[project]\nname = \"t\"\n[ams]\nsimulator = \"iverilog\"\n";
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn non_positive_stop_time() {
        for v in ["0.0", "-1.0", "nan"] {
            let toml = format!("[project]\nname = \"t\"\n[ams]\nstop_time = {v}\n");
            let err = load_config_from_str(&toml).unwrap_err();
            assert!(matches!(err, ConfigError::ValidationError(_)), "{v}");
        }
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("vigil.toml"), "[project]\nname = \"x\"\n").unwrap();
        assert_eq!(load_config(dir.path()).unwrap().project.name, "x");
    }

    #[test]
    fn io_error_from_nonexistent_dir() {
        let err = load_config(Path::new("/nonexistent/dir")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
