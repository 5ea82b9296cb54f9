//! Mangled names across backends: determinism, injectivity, and escapes.

use std::collections::HashSet;

use vigil_actions::Sequence;
use vigil_conformance::{artifact_text, emit_static, loopback, run_interactive};
use vigil_mangle::{mangle, NamingScheme};
use vigil_signal::{resolve, Circuit, Direction, SignalType};

fn rich() -> Circuit {
    Circuit::new("Rich")
        .with_port("a__b", Direction::In, SignalType::bits(2))
        .with_port(
            "T",
            Direction::In,
            SignalType::tuple([
                ("1", SignalType::bits(3)),
                ("x", SignalType::array(SignalType::bits(2), 2)),
            ]),
        )
        .with_port("N", Direction::Out, SignalType::array(SignalType::Digital, 4))
}

#[test]
fn deterministic_and_injective_per_scheme() {
    let circuit = rich();
    let paths = circuit.all_paths();
    assert_eq!(paths.len(), 11);
    for scheme in [
        NamingScheme::verilog(),
        NamingScheme::verilator(),
        NamingScheme::hierarchical(),
    ] {
        let mut seen = HashSet::new();
        for path in &paths {
            let resolved = resolve(&circuit, path).unwrap();
            let first = vigil_mangle::address(&scheme, &resolved).unwrap();
            let second = vigil_mangle::address(&scheme, &resolved).unwrap();
            assert_eq!(first, second);
            assert!(seen.insert(first), "{} collides under {}", path, scheme.name);
        }
    }
}

#[test]
fn integer_field_is_escaped() {
    let circuit = rich();
    let resolved = resolve(&circuit, &"T.1".parse().unwrap()).unwrap();
    assert_eq!(mangle(&NamingScheme::verilog(), &resolved).unwrap(), "T__1");
    assert_eq!(
        mangle(&NamingScheme::verilator(), &resolved).unwrap(),
        "T___05F1"
    );
}

#[test]
fn double_underscore_is_escaped_for_verilator() {
    let circuit = rich();
    let resolved = resolve(&circuit, &"a__b".parse().unwrap()).unwrap();
    let name = mangle(&NamingScheme::verilator(), &resolved).unwrap();
    assert_eq!(name, "a___05Fb");
    assert!(!name.replace("___05F", "").contains("__"));
}

#[test]
fn escaped_names_reach_the_artifacts() {
    let mut seq = Sequence::new(rich());
    seq.poke("T.1".parse().unwrap(), 5).unwrap();
    seq.poke("a__b".parse().unwrap(), 2).unwrap();
    let program = seq.finalize();
    let tmp = tempfile::tempdir().unwrap();

    let driver = artifact_text(&emit_static("verilator", &program, tmp.path()).unwrap());
    assert!(driver.contains("top->T___05F1 = 0x5ULL;"));
    assert!(driver.contains("top->a___05Fb = 0x2ULL;"));

    let tb = artifact_text(&emit_static("system-verilog", &program, tmp.path()).unwrap());
    assert!(tb.contains("T__1"));
}

#[test]
fn escaped_ports_run_live() {
    let circuit = loopback("Esc", SignalType::tuple([("0", SignalType::bits(4))]));
    let mut seq = Sequence::new(circuit);
    seq.poke("I.0".parse().unwrap(), 9).unwrap();
    seq.eval().unwrap();
    seq.expect("O.0".parse().unwrap(), 9).unwrap();
    let tmp = tempfile::tempdir().unwrap();
    let transcript = run_interactive(&seq.finalize(), tmp.path(), false).unwrap();
    assert!(transcript.verdict().passed);
}
