//! `vigil emit` and `vigil run`: compile a test file for each selected
//! backend, and optionally run the results.
//!
//! Emissions run in parallel, one directory per backend under the build
//! directory. Print lines go to stdout; status lines and diagnostics go to
//! stderr. The exit code is 1 if any emission failed or any run did not pass.

use std::collections::HashSet;
use std::error::Error;

use vigil_actions::Program;
use vigil_backend::{run_artifact, BackendRegistry, EmissionMode, Transcript};
use vigil_diagnostics::DiagnosticSink;

use crate::project::{load_program, load_project};
use crate::report;
use crate::{EmitArgs, GlobalArgs};

/// Runs `vigil emit` (`execute == false`) or `vigil run`.
///
/// Interactive backends execute as they emit, so their verdict is reported
/// either way.
pub fn run(args: &EmitArgs, execute: bool, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let project = load_project(global)?;
    let program = load_program(&args.test)?;
    let registry = BackendRegistry::with_defaults(&project.config, &project.root);

    let selected = select_backends(&registry, &args.backends, &program);
    if selected.is_empty() {
        return Err("no backend can take this program".into());
    }

    let build_dir = project.build_dir(args.out_dir.as_deref());
    let stop = args.stop_on_first_failure || project.config.run.stop_on_first_failure;
    if !global.quiet {
        eprintln!(
            "   Emitting {} ({} action(s)) for {}",
            program.circuit().name,
            program.len(),
            selected.join(", ")
        );
    }

    let results = registry.emit_all(&selected, &program, &build_dir, &project.config.files, stop);

    let sink = DiagnosticSink::new();
    let mut failed = false;
    for (name, result) in results {
        let artifact = match result {
            Ok(artifact) => artifact,
            Err(e) => {
                sink.emit(report::backend_error(&name, &e));
                continue;
            }
        };
        if !global.quiet {
            for file in &artifact.files {
                eprintln!("      Wrote {}", file.display());
            }
        }

        if !execute && artifact.mode == EmissionMode::Static {
            if !global.quiet {
                for invocation in &artifact.invocations {
                    eprintln!("        Run {invocation}");
                }
            }
            continue;
        }

        match run_artifact(&artifact).map(|outcome| outcome.transcript) {
            Ok(Some(transcript)) => {
                failed |= !report_transcript(&name, &transcript, &sink, global);
            }
            Ok(None) => {
                if !global.quiet {
                    eprintln!("   Completed {name}");
                }
            }
            Err(e) => sink.emit(report::backend_error(&name, &e)),
        }
    }

    let code = if sink.has_errors() || failed { 1 } else { 0 };
    report::render(&sink.take_all(), global);
    Ok(code)
}

/// The backends named on the command line, each once and in order, or
/// every static backend that can take `program`.
fn select_backends(registry: &BackendRegistry, requested: &[String], program: &Program) -> Vec<String> {
    if !requested.is_empty() {
        let mut seen = HashSet::new();
        return requested
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .cloned()
            .collect();
    }
    registry
        .iter()
        .filter(|b| b.mode() == EmissionMode::Static)
        .filter(|b| b.accepts_stimulus() || program.is_empty())
        .map(|b| b.name().to_string())
        .collect()
}

/// Prints a run's output and reports its verdict. Returns true if it passed.
fn report_transcript(
    backend: &str,
    transcript: &Transcript,
    sink: &DiagnosticSink,
    global: &GlobalArgs,
) -> bool {
    for line in &transcript.prints {
        println!("{line}");
    }
    let verdict = transcript.verdict();
    for mismatch in &verdict.mismatches {
        sink.emit(report::mismatch(backend, mismatch));
    }
    if !transcript.finished {
        sink.emit(report::no_verdict(backend));
    }
    if !global.quiet {
        if verdict.passed {
            eprintln!("      Passed {backend}");
        } else {
            eprintln!(
                "      Failed {backend} ({} mismatch(es))",
                verdict.mismatches.len()
            );
        }
    }
    verdict.passed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReportFormat;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;
    use vigil_actions::Sequence;
    use vigil_config::VigilConfig;
    use vigil_signal::{Circuit, Direction, SignalType};

    const INVERTER: &str = r#"{
        "circuit": {"name": "Inv", "ports": [
            {"name": "I", "direction": "in", "type": "digital"},
            {"name": "O", "direction": "out", "type": "digital"}]},
        "actions": [
            {"action": "poke", "target": "I", "value": 1},
            {"action": "eval"},
            {"action": "expect", "target": "O", "expected": {"value": 0}}]
    }"#;

    fn global(dir: &TempDir) -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            config: Some(dir.path().to_str().unwrap().to_string()),
            format: ReportFormat::Text,
        }
    }

    fn project() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("vigil.toml"), "[project]\nname = \"inv\"\n").unwrap();
        fs::write(tmp.path().join("inv.json"), INVERTER).unwrap();
        tmp
    }

    fn args(tmp: &TempDir, backends: &[&str]) -> EmitArgs {
        EmitArgs {
            test: tmp.path().join("inv.json"),
            backends: backends.iter().map(|s| s.to_string()).collect(),
            out_dir: None,
            stop_on_first_failure: false,
        }
    }

    #[test]
    fn default_selection_skips_lvs_for_stimulus() {
        let registry = BackendRegistry::with_defaults(&VigilConfig::for_project("inv"), Path::new("."));
        let circuit = Circuit::new("Inv").with_port("I", Direction::In, SignalType::Digital);
        let mut seq = Sequence::new(circuit.clone());
        seq.poke("I".parse().unwrap(), 1).unwrap();
        assert_eq!(
            select_backends(&registry, &[], &seq.finalize()),
            vec!["system-verilog", "verilator", "verilog-ams"]
        );
        assert_eq!(
            select_backends(&registry, &[], &Sequence::new(circuit).finalize()),
            vec!["lvs", "system-verilog", "verilator", "verilog-ams"]
        );
        assert_eq!(
            select_backends(
                &registry,
                &["verilator".to_string()],
                &Sequence::new(Circuit::new("x")).finalize()
            ),
            vec!["verilator"]
        );
    }

    #[test]
    fn repeated_backend_is_selected_once() {
        let registry = BackendRegistry::with_defaults(&VigilConfig::for_project("inv"), Path::new("."));
        let requested: Vec<String> = ["verilator", "lvs", "verilator"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            select_backends(&registry, &requested, &Sequence::new(Circuit::new("x")).finalize()),
            vec!["verilator", "lvs"]
        );
    }

    #[test]
    fn emit_writes_every_backend() {
        let tmp = project();
        let code = run(&args(&tmp, &[]), false, &global(&tmp)).unwrap();
        assert_eq!(code, 0);
        let build = tmp.path().join("build");
        assert!(build.join("verilator/Inv_driver.cpp").is_file());
        assert!(build.join("system-verilog/Inv_tb.sv").is_file());
        assert!(build.join("verilog-ams/Inv_tb.sv").is_file());
        assert!(build.join("verilog-ams/amscf.scs").is_file());
        assert!(!build.join("lvs").exists());
    }

    #[test]
    fn unknown_backend_fails() {
        let tmp = project();
        let code = run(&args(&tmp, &["spice"]), false, &global(&tmp)).unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn lvs_with_stimulus_fails() {
        let tmp = project();
        let code = run(&args(&tmp, &["lvs"]), false, &global(&tmp)).unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn missing_test_file_is_an_error() {
        let tmp = project();
        let mut a = args(&tmp, &[]);
        a.test = tmp.path().join("nope.json");
        assert!(run(&a, false, &global(&tmp)).is_err());
    }

    #[test]
    fn transcript_verdicts() {
        let tmp = project();
        let g = global(&tmp);
        let sink = DiagnosticSink::new();
        let mut transcript = Transcript::new("Inv");
        assert!(!report_transcript("process", &transcript, &sink, &g));
        assert_eq!(sink.take_all().len(), 1);

        transcript.finished = true;
        assert!(report_transcript("process", &transcript, &sink, &g));
        assert!(sink.take_all().is_empty());
    }
}
