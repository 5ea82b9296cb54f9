//! Configuration types deserialized from `vigil.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// The top-level configuration parsed from `vigil.toml`.
///
/// Only `[project]` is required; every backend section falls back to its
/// defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct VigilConfig {
    /// Project metadata.
    pub project: ProjectMeta,
    /// Settings shared by every run.
    #[serde(default)]
    pub run: RunConfig,
    /// Settings for the compiled C++ simulator backend.
    #[serde(default)]
    pub verilator: VerilatorConfig,
    /// Settings for the SystemVerilog testbench backend.
    #[serde(default)]
    pub system_verilog: SystemVerilogConfig,
    /// Settings for the mixed-signal backend.
    #[serde(default)]
    pub ams: AmsConfig,
    /// Settings for layout-vs-schematic jobs.
    #[serde(default)]
    pub lvs: LvsConfig,
    /// Settings for the interactive subprocess backend.
    #[serde(default)]
    pub interactive: InteractiveConfig,
    /// Names of the files backends write.
    #[serde(default)]
    pub files: FileNames,
}

impl VigilConfig {
    /// A configuration with every section at its default.
    pub fn for_project(name: impl Into<String>) -> Self {
        Self {
            project: ProjectMeta {
                name: name.into(),
                build_dir: default_build_dir(),
            },
            run: RunConfig::default(),
            verilator: VerilatorConfig::default(),
            system_verilog: SystemVerilogConfig::default(),
            ams: AmsConfig::default(),
            lvs: LvsConfig::default(),
            interactive: InteractiveConfig::default(),
            files: FileNames::default(),
        }
    }
}

/// Core project metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// Directory artifacts are written under, relative to the project.
    #[serde(default = "default_build_dir")]
    pub build_dir: String,
}

fn default_build_dir() -> String {
    "build".to_string()
}

/// Settings shared by every run.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Stop at the first failed expectation instead of recording all of them.
    pub stop_on_first_failure: bool,
}

/// Settings for the compiled C++ simulator backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VerilatorConfig {
    /// The verilator executable.
    pub binary: String,
    /// Extra flags passed to verilator.
    #[serde(deserialize_with = "deserialize_string_or_vec")]
    pub flags: Vec<String>,
    /// HDL sources to compile, relative to the project.
    pub sources: Vec<String>,
}

impl Default for VerilatorConfig {
    fn default() -> Self {
        Self {
            binary: "verilator".to_string(),
            flags: Vec::new(),
            sources: Vec::new(),
        }
    }
}

/// The event-driven simulator that runs a SystemVerilog testbench.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Simulator {
    /// Cadence Incisive, invoked through `irun`.
    #[default]
    Ncsim,
    /// Icarus Verilog, compiled with `iverilog` and run with `vvp`.
    Iverilog,
}

impl Simulator {
    /// The simulator's configuration name.
    pub fn name(self) -> &'static str {
        match self {
            Simulator::Ncsim => "ncsim",
            Simulator::Iverilog => "iverilog",
        }
    }
}

/// Settings for the SystemVerilog testbench backend.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SystemVerilogConfig {
    /// Which simulator runs the testbench.
    pub simulator: Simulator,
    /// Extra flags passed to the simulator.
    #[serde(deserialize_with = "deserialize_string_or_vec")]
    pub flags: Vec<String>,
    /// Extra source files compiled with the testbench.
    pub ext_srcs: Vec<String>,
    /// Drive inputs through wires assigned from regs.
    pub use_input_wires: bool,
}

/// Settings for the mixed-signal backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AmsConfig {
    /// The mixed-signal simulator; only ncsim supports AMS control files.
    pub simulator: Simulator,
    /// Analog transient stop time in seconds; must outlast the digital run.
    pub stop_time: f64,
    /// Supply voltage for D/A and A/D conversion.
    pub vsup: f64,
    /// Output resistance for D/A conversion.
    pub rout: f64,
    /// Bus delimiter style: `<>`, `[]`, or `_`.
    pub bus_delim: String,
    /// Cells that should use their SPICE model.
    pub use_spice: Vec<String>,
    /// Directories searched for SPICE/Spectre models.
    pub model_paths: Vec<String>,
    /// A file of Verilog-AMS wrapper code copied next to the testbench.
    pub vams_code: Option<String>,
    /// Drive inputs through wires assigned from regs.
    pub use_input_wires: bool,
    /// Extra flags passed to the simulator.
    #[serde(deserialize_with = "deserialize_string_or_vec")]
    pub flags: Vec<String>,
    /// Extra source files compiled with the testbench.
    pub ext_srcs: Vec<String>,
}

impl Default for AmsConfig {
    fn default() -> Self {
        Self {
            simulator: Simulator::Ncsim,
            stop_time: 1.0,
            vsup: 1.0,
            rout: 1.0,
            bus_delim: "<>".to_string(),
            use_spice: Vec::new(),
            model_paths: Vec::new(),
            vams_code: None,
            use_input_wires: true,
            flags: Vec::new(),
            ext_srcs: Vec::new(),
        }
    }
}

/// The bus delimiter styles an AMS portmap accepts.
pub const BUS_DELIMITERS: [&str; 3] = ["<>", "[]", "_"];

/// Settings for layout-vs-schematic jobs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LvsConfig {
    /// The layout database.
    pub layout: String,
    /// The schematic netlist.
    pub schematic: String,
    /// Rule files sourced by the job.
    pub rules: Vec<String>,
    /// Where the tool writes its report.
    pub report: String,
    /// Layout database format.
    pub layout_system: String,
    /// Schematic netlist format.
    pub source_system: String,
    /// Top cell of the layout; defaults to the layout file stem.
    pub layout_primary: Option<String>,
    /// Top cell of the schematic; defaults to the schematic file stem.
    pub source_primary: Option<String>,
    /// Extra environment variables for the tool.
    pub env: BTreeMap<String, String>,
}

impl Default for LvsConfig {
    fn default() -> Self {
        Self {
            layout: String::new(),
            schematic: String::new(),
            rules: Vec::new(),
            report: "lvs.report".to_string(),
            layout_system: "GDSII".to_string(),
            source_system: "SPICE".to_string(),
            layout_primary: None,
            source_primary: None,
            env: BTreeMap::new(),
        }
    }
}

/// Settings for the interactive subprocess backend.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InteractiveConfig {
    /// The simulator server command and its arguments.
    ///
    /// When empty, the interactive backend is not registered.
    #[serde(deserialize_with = "deserialize_string_or_vec")]
    pub command: Vec<String>,
}

/// Names of the files backends write.
///
/// Names left unset are derived from the circuit name.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileNames {
    /// SystemVerilog testbench; defaults to `<circuit>_tb.sv`.
    pub testbench: Option<String>,
    /// C++ driver; defaults to `<circuit>_driver.cpp`.
    pub driver: Option<String>,
    /// AMS control file.
    pub ams_control: String,
    /// Verilog-AMS wrapper; defaults to `<circuit>.vams`.
    pub ams_wrapper: Option<String>,
    /// LVS job-control file.
    pub lvs_control: String,
}

impl Default for FileNames {
    fn default() -> Self {
        Self {
            testbench: None,
            driver: None,
            ams_control: "amscf.scs".to_string(),
            ams_wrapper: None,
            lvs_control: "cmd.tvf".to_string(),
        }
    }
}

impl FileNames {
    /// The testbench file name for `circuit`.
    pub fn testbench_for(&self, circuit: &str) -> String {
        self.testbench
            .clone()
            .unwrap_or_else(|| format!("{circuit}_tb.sv"))
    }

    /// The C++ driver file name for `circuit`.
    pub fn driver_for(&self, circuit: &str) -> String {
        self.driver
            .clone()
            .unwrap_or_else(|| format!("{circuit}_driver.cpp"))
    }

    /// The Verilog-AMS wrapper file name for `circuit`.
    pub fn ams_wrapper_for(&self, circuit: &str) -> String {
        self.ams_wrapper
            .clone()
            .unwrap_or_else(|| format!("{circuit}.vams"))
    }
}

/// Deserializes a field that can be either a single string or a list of strings.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.split_whitespace().map(str::to_string).collect())
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}
