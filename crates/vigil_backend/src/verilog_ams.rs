//! Mixed-signal emission: a SystemVerilog testbench plus the AMS control
//! file the analog solver reads.

use crate::backend::{Backend, EmissionMode};
use crate::context::{Artifact, BackendContext};
use crate::error::BackendError;
use crate::lower::lower;
use crate::system_verilog::{resolve_all, simulator_invocations, testbench_module, testbench_source};
use std::path::{Path, PathBuf};
use tracing::info;
use vigil_actions::Program;
use vigil_config::{AmsConfig, Simulator};
use vigil_mangle::NamingScheme;

/// Emits the testbench, `amscf.scs`, and an optional Verilog-AMS wrapper.
#[derive(Debug, Clone)]
pub struct VerilogAmsBackend {
    config: AmsConfig,
    ext_srcs: Vec<String>,
    model_paths: Vec<String>,
    vams_code: Option<PathBuf>,
    naming: NamingScheme,
}

impl VerilogAmsBackend {
    /// A backend with the given settings. Relative paths resolve against
    /// `project_dir`.
    pub fn from_config(config: &AmsConfig, project_dir: &Path) -> Self {
        Self {
            config: config.clone(),
            ext_srcs: resolve_all(&config.ext_srcs, project_dir),
            model_paths: resolve_all(&config.model_paths, project_dir),
            vams_code: config.vams_code.as_ref().map(|p| project_dir.join(p)),
            naming: NamingScheme::verilog(),
        }
    }
}

impl Backend for VerilogAmsBackend {
    fn name(&self) -> &str {
        "verilog-ams"
    }

    fn mode(&self) -> EmissionMode {
        EmissionMode::Static
    }

    fn naming(&self) -> &NamingScheme {
        &self.naming
    }

    fn emit(&self, program: &Program, ctx: &mut BackendContext) -> Result<Artifact, BackendError> {
        if self.config.simulator != Simulator::Ncsim {
            return Err(BackendError::Config(format!(
                "verilog-ams requires the ncsim simulator, not {}",
                self.config.simulator.name()
            )));
        }

        let lowered = lower(program, &self.naming, ctx)?;
        let tb_file = ctx.files.testbench_for(&lowered.circuit);
        let source = testbench_source(
            &lowered,
            self.config.use_input_wires,
            ctx.stop_on_first_failure,
        );
        ctx.write_file(&tb_file, &source)?;

        let control = ctx.files.ams_control.clone();
        ctx.write_file(&control, &control_file(&self.config))?;

        let mut ext_srcs = self.ext_srcs.clone();
        ext_srcs.push(control);
        if let Some(code_path) = &self.vams_code {
            let code = std::fs::read_to_string(code_path).map_err(|source| BackendError::Io {
                path: code_path.clone(),
                source,
            })?;
            let wrapper = ctx.files.ams_wrapper_for(&lowered.circuit);
            ctx.write_file(&wrapper, &code)?;
            ext_srcs.push(wrapper);
        }

        let mut flags = self.config.flags.clone();
        for path in &self.model_paths {
            flags.push("-modelpath".to_string());
            flags.push(path.clone());
        }

        info!(circuit = %lowered.circuit, stop_time = self.config.stop_time, "wrote AMS testbench");
        let invocations = simulator_invocations(
            Simulator::Ncsim,
            ctx.dir(),
            &tb_file,
            &testbench_module(&lowered.circuit),
            &ext_srcs,
            &flags,
        );
        Ok(Artifact {
            backend: self.name().to_string(),
            circuit: lowered.circuit,
            mode: self.mode(),
            dir: ctx.dir().to_path_buf(),
            files: ctx.take_written(),
            invocations,
            transcript: None,
            reports_checks: true,
        })
    }
}

/// Generates the AMS control file.
///
/// The transient stop time must outlast the digital run, or the analog
/// solver ends the simulation before the testbench reaches `$finish`.
pub fn control_file(config: &AmsConfig) -> String {
    let mut out = String::new();
    out.push_str(&format!("tranSweep tran stop={}s\n", config.stop_time));
    out.push_str("amsd {\n");
    out.push_str(&format!("    ie vsup={} rout={}\n", config.vsup, config.rout));
    for cell in &config.use_spice {
        out.push_str(&format!("    config cell={cell} use=spice\n"));
        out.push_str(&format!(
            "    portmap subckt={cell} autobus=yes busdelim=\"{}\"\n",
            config.bus_delim
        ));
    }
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_actions::Sequence;
    use vigil_signal::{Circuit, Direction, SignalType};

    fn program() -> Program {
        let c = Circuit::new("Buf")
            .with_port("I", Direction::In, SignalType::Digital)
            .with_port("O", Direction::Out, SignalType::Digital);
        let mut seq = Sequence::new(c);
        seq.poke("I".parse().unwrap(), 1).unwrap();
        seq.eval().unwrap();
        seq.expect("O".parse().unwrap(), 1).unwrap();
        seq.finalize()
    }

    #[test]
    fn control_file_defaults() {
        assert_eq!(
            control_file(&AmsConfig::default()),
            "tranSweep tran stop=1s\namsd {\n    ie vsup=1 rout=1\n}\n"
        );
    }

    #[test]
    fn control_file_spice_cells() {
        let config = AmsConfig {
            stop_time: 2.5,
            vsup: 1.2,
            use_spice: vec!["inv".into()],
            bus_delim: "[]".into(),
            ..AmsConfig::default()
        };
        let text = control_file(&config);
        assert!(text.starts_with("tranSweep tran stop=2.5s\n"));
        assert!(text.contains("    ie vsup=1.2 rout=1\n"));
        assert!(text.contains("    config cell=inv use=spice\n"));
        assert!(text.contains("    portmap subckt=inv autobus=yes busdelim=\"[]\"\n"));
    }

    #[test]
    fn emit_writes_all_files() {
        let project = tempfile::tempdir().unwrap();
        std::fs::write(project.path().join("wrap.vams"), "module wrap; endmodule\n").unwrap();
        let config = AmsConfig {
            vams_code: Some("wrap.vams".into()),
            model_paths: vec!["models".into()],
            ..AmsConfig::default()
        };
        let backend = VerilogAmsBackend::from_config(&config, project.path());
        let out = project.path().join("build");
        let mut ctx = BackendContext::new(&out);
        let artifact = backend.emit(&program(), &mut ctx).unwrap();

        assert_eq!(
            artifact.files,
            vec![out.join("Buf_tb.sv"), out.join("amscf.scs"), out.join("Buf.vams")]
        );
        assert_eq!(
            std::fs::read_to_string(out.join("Buf.vams")).unwrap(),
            "module wrap; endmodule\n"
        );
        let tb = std::fs::read_to_string(out.join("Buf_tb.sv")).unwrap();
        assert!(tb.contains("assign I = I_vigil_reg;"));

        let irun = &artifact.invocations[0];
        assert_eq!(irun.program, "irun");
        let args = irun.args.join(" ");
        assert!(args.contains("Buf_tb.sv amscf.scs Buf.vams -modelpath"));
        assert!(args.ends_with(&format!("-modelpath {}", project.path().join("models").display())));
    }

    #[test]
    fn missing_wrapper_is_io_error() {
        let project = tempfile::tempdir().unwrap();
        let config = AmsConfig {
            vams_code: Some("missing.vams".into()),
            ..AmsConfig::default()
        };
        let backend = VerilogAmsBackend::from_config(&config, project.path());
        let mut ctx = BackendContext::new(project.path().join("build"));
        let err = backend.emit(&program(), &mut ctx).unwrap_err();
        assert!(matches!(err, BackendError::Io { .. }));
    }

    #[test]
    fn rejects_other_simulators() {
        let config = AmsConfig {
            simulator: Simulator::Iverilog,
            ..AmsConfig::default()
        };
        let backend = VerilogAmsBackend::from_config(&config, Path::new("."));
        let mut ctx = BackendContext::new("unused");
        let err = backend.emit(&program(), &mut ctx).unwrap_err();
        assert!(matches!(err, BackendError::Config(_)));
    }
}
