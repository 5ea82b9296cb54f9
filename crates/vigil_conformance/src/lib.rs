//! Conformance test helpers for Vigil backends.
//!
//! Provides reference circuits, an in-process mirror model (every `O*`
//! output follows the `I*` input of the same suffix), and functions that
//! push one program through a static or interactive backend so integration
//! tests can compare what each produces. Static runs need Icarus Verilog and
//! are skipped without it.

#![warn(missing_docs)]

use std::path::Path;

use vigil_actions::{Program, Sequence};
use vigil_backend::{
    lower, run_artifact, run_tool, Artifact, Backend, BackendContext, BackendError,
    BackendRegistry, InteractiveBackend, LiveSim, LiveSimError, ModelSim, PortValues,
    ToolInvocation, Transcript,
};
use vigil_config::{Simulator, VigilConfig};
use vigil_mangle::NamingScheme;
use vigil_signal::{Circuit, Direction, SignalType};

/// A circuit with input `I` and output `O` of the same type.
pub fn loopback(name: &str, ty: SignalType) -> Circuit {
    Circuit::new(name)
        .with_port("I", Direction::In, ty.clone())
        .with_port("O", Direction::Out, ty)
}

/// `I`/`O` as 3-bit digital arrays.
pub fn array3() -> Circuit {
    loopback("Array3", SignalType::array(SignalType::Digital, 3))
}

/// `I`/`O` as tuples with 8-bit fields `a` and `b`.
pub fn tuple_ab() -> Circuit {
    loopback(
        "TupleAB",
        SignalType::tuple([("a", SignalType::bits(8)), ("b", SignalType::bits(8))]),
    )
}

/// `I`/`O` as `outer` arrays of `inner` arrays of `width`-bit words.
pub fn nested(outer: u32, inner: u32, width: u32) -> Circuit {
    loopback(
        "Nested",
        SignalType::array(SignalType::array(SignalType::bits(width), inner), outer),
    )
}

/// Copies every input port onto the output port of the same suffix.
pub fn mirror(ports: &mut PortValues) {
    let outputs: Vec<String> = ports
        .names()
        .filter(|n| n.starts_with('O'))
        .map(str::to_string)
        .collect();
    for out in outputs {
        let input = format!("I{}", &out[1..]);
        if let Some(value) = ports.get(&input).cloned() {
            ports.set(&out, value);
        }
    }
}

/// An interactive backend named `model` that runs [`mirror`] in process.
pub fn mirror_backend() -> InteractiveBackend {
    InteractiveBackend::with_factory("model", |program, _ctx| {
        let sim = ModelSim::new(program.circuit(), mirror)
            .map_err(|e| LiveSimError::Protocol(e.to_string()))?;
        Ok(Box::new(sim) as Box<dyn LiveSim>)
    })
}

/// Runs `program` against the mirror model, writing into `dir`.
pub fn run_interactive(program: &Program, dir: &Path, stop: bool) -> Result<Transcript, BackendError> {
    let mut ctx = BackendContext::new(dir).with_stop_on_first_failure(stop);
    let artifact = mirror_backend().emit(program, &mut ctx)?;
    Ok(artifact.transcript.unwrap_or_default())
}

/// Emits `program` with the default-configured backend `name` into `dir`.
pub fn emit_static(name: &str, program: &Program, dir: &Path) -> Result<Artifact, BackendError> {
    let config = VigilConfig::for_project("conformance");
    let registry = BackendRegistry::with_defaults(&config, dir);
    let backend = registry.get(name)?;
    let mut ctx = BackendContext::from_config(dir.join(name), &config);
    backend.emit(program, &mut ctx)
}

/// The text of every file an artifact wrote, concatenated.
pub fn artifact_text(artifact: &Artifact) -> String {
    artifact
        .files
        .iter()
        .filter_map(|f| std::fs::read_to_string(f).ok())
        .collect()
}

/// A Verilog module for `circuit` that drives every `O*` port from the
/// `I*` port of the same suffix, the RTL counterpart of [`mirror`].
pub fn mirror_rtl(circuit: &Circuit) -> Result<String, BackendError> {
    let program = Sequence::new(circuit.clone()).finalize();
    let mut ctx = BackendContext::new("unused");
    let lowered = lower(&program, &NamingScheme::verilog(), &mut ctx)?;

    let declarations: Vec<String> = lowered
        .ports
        .iter()
        .map(|p| {
            let direction = match p.direction {
                Direction::In => "input",
                Direction::Out => "output",
                Direction::InOut => "inout",
            };
            let signed = if p.signed { "signed " } else { "" };
            format!("    {direction} wire {signed}[{}:0] {}", p.width - 1, p.name)
        })
        .collect();

    let mut out = format!("module {}(\n{}\n);\n", lowered.circuit, declarations.join(",\n"));
    for port in lowered.ports.iter().filter(|p| p.direction == Direction::Out) {
        if let Some(suffix) = port.name.strip_prefix('O') {
            out.push_str(&format!("    assign {} = I{suffix};\n", port.name));
        }
    }
    out.push_str("endmodule\n");
    Ok(out)
}

/// Compiles and runs `program`'s SystemVerilog testbench with Icarus
/// Verilog against [`mirror_rtl`], writing into `dir`.
///
/// Returns `Ok(None)` when `iverilog` is not installed.
pub fn run_iverilog(program: &Program, dir: &Path) -> Result<Option<Transcript>, BackendError> {
    std::fs::create_dir_all(dir).map_err(|source| BackendError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    if run_tool(&ToolInvocation::new("iverilog", dir).arg("-V")).is_err() {
        return Ok(None);
    }

    let rtl_path = dir.join(format!("{}.v", program.circuit().name));
    std::fs::write(&rtl_path, mirror_rtl(program.circuit())?).map_err(|source| {
        BackendError::Io {
            path: rtl_path.clone(),
            source,
        }
    })?;

    let mut config = VigilConfig::for_project("conformance");
    config.system_verilog.simulator = Simulator::Iverilog;
    config.system_verilog.ext_srcs = vec![rtl_path.display().to_string()];
    let registry = BackendRegistry::with_defaults(&config, dir);
    let mut ctx = BackendContext::from_config(dir.join("system-verilog"), &config);
    let artifact = registry.get("system-verilog")?.emit(program, &mut ctx)?;
    Ok(run_artifact(&artifact)?.transcript)
}

/// The names of the built-in static backends that take stimulus.
pub const STIMULUS_BACKENDS: [&str; 3] = ["verilator", "system-verilog", "verilog-ams"];
