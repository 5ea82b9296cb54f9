//! SystemVerilog testbench emission for event-driven simulators.

use crate::backend::{Backend, EmissionMode};
use crate::context::{Artifact, BackendContext};
use crate::error::BackendError;
use crate::lower::{lower, Check, Leaf, Lowered, Op, Operand, PortDecl};
use crate::tool::ToolInvocation;
use crate::verdict::{value_text, DONE_MARKER, FAIL_MARKER};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;
use vigil_actions::Program;
use vigil_config::{Simulator, SystemVerilogConfig};
use vigil_mangle::NamingScheme;
use vigil_signal::Direction;
use vigil_value::verilog_literal;

/// Emits `<circuit>_tb.sv` and the simulator commands that run it.
#[derive(Debug, Clone)]
pub struct SystemVerilogBackend {
    simulator: Simulator,
    flags: Vec<String>,
    ext_srcs: Vec<String>,
    use_input_wires: bool,
    naming: NamingScheme,
}

impl SystemVerilogBackend {
    /// A backend with the given settings. Relative sources resolve against
    /// `project_dir`.
    pub fn from_config(config: &SystemVerilogConfig, project_dir: &Path) -> Self {
        Self {
            simulator: config.simulator,
            flags: config.flags.clone(),
            ext_srcs: resolve_all(&config.ext_srcs, project_dir),
            use_input_wires: config.use_input_wires,
            naming: NamingScheme::verilog(),
        }
    }
}

impl Backend for SystemVerilogBackend {
    fn name(&self) -> &str {
        "system-verilog"
    }

    fn mode(&self) -> EmissionMode {
        EmissionMode::Static
    }

    fn naming(&self) -> &NamingScheme {
        &self.naming
    }

    fn emit(&self, program: &Program, ctx: &mut BackendContext) -> Result<Artifact, BackendError> {
        let lowered = lower(program, &self.naming, ctx)?;
        let tb_file = ctx.files.testbench_for(&lowered.circuit);
        let source = testbench_source(&lowered, self.use_input_wires, ctx.stop_on_first_failure);
        ctx.write_file(&tb_file, &source)?;
        info!(circuit = %lowered.circuit, simulator = self.simulator.name(), file = %tb_file, "wrote testbench");

        let invocations = simulator_invocations(
            self.simulator,
            ctx.dir(),
            &tb_file,
            &testbench_module(&lowered.circuit),
            &self.ext_srcs,
            &self.flags,
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

pub(crate) fn resolve_all(paths: &[String], project_dir: &Path) -> Vec<String> {
    paths
        .iter()
        .map(|p| project_dir.join(p).display().to_string())
        .collect()
}

/// The testbench module name for `circuit`.
pub fn testbench_module(circuit: &str) -> String {
    format!("{circuit}_tb")
}

/// The commands that compile and run a testbench.
pub fn simulator_invocations(
    simulator: Simulator,
    dir: &Path,
    tb_file: &str,
    tb_module: &str,
    ext_srcs: &[String],
    flags: &[String],
) -> Vec<ToolInvocation> {
    match simulator {
        Simulator::Ncsim => vec![ToolInvocation::new("irun", dir)
            .args(["-top", tb_module, "-timescale", "1ns/1ns", "-notimingchecks"])
            .arg(tb_file)
            .args(ext_srcs.iter().cloned())
            .args(flags.iter().cloned())],
        Simulator::Iverilog => {
            let image = format!("{tb_module}.vvp");
            vec![
                ToolInvocation::new("iverilog", dir)
                    .args(["-g2012", "-o"])
                    .arg(&image)
                    .args(["-s", tb_module])
                    .arg(tb_file)
                    .args(ext_srcs.iter().cloned())
                    .args(flags.iter().cloned()),
                ToolInvocation::new("vvp", dir).arg("-n").arg(image),
            ]
        }
    }
}

/// Generates the testbench for a program lowered with the verilog scheme.
///
/// Each `eval` advances one time unit. Checks use `!==`, and a constant or
/// signal with X or Z bits never satisfies an expectation.
pub fn testbench_source(lowered: &Lowered, use_input_wires: bool, stop: bool) -> String {
    let circuit = &lowered.circuit;
    let module = testbench_module(circuit);

    let wired: BTreeSet<&str> = lowered
        .ports
        .iter()
        .filter(|p| match p.direction {
            Direction::In => use_input_wires,
            Direction::InOut => true,
            Direction::Out => false,
        })
        .map(|p| p.name.as_str())
        .collect();

    let mut out = String::new();
    out.push_str("// Generated by vigil. Do not edit.\n");
    out.push_str("`timescale 1ns/1ns\n\n");
    out.push_str(&format!("module {module};\n"));
    out.push_str("    integer vigil_failures = 0;\n\n");

    for port in &lowered.ports {
        let range = declaration_range(port);
        if wired.contains(port.name.as_str()) {
            out.push_str(&format!("    reg {range}{};\n", driver_reg(&port.name)));
            out.push_str(&format!("    wire {range}{};\n", port.name));
            out.push_str(&format!("    assign {} = {};\n", port.name, driver_reg(&port.name)));
        } else if port.direction == Direction::In {
            out.push_str(&format!("    reg {range}{};\n", port.name));
        } else {
            out.push_str(&format!("    wire {range}{};\n", port.name));
        }
    }

    out.push_str(&format!("\n    {circuit} dut (\n"));
    let connections: Vec<String> = lowered
        .ports
        .iter()
        .map(|p| format!("        .{0}({0})", p.name))
        .collect();
    out.push_str(&connections.join(",\n"));
    out.push_str("\n    );\n\n");

    out.push_str("    initial begin\n");
    for port in lowered.ports.iter().filter(|p| p.direction != Direction::Out) {
        out.push_str(&format!(
            "        {} = {}'h0;\n",
            drive_target(&port.name, &wired),
            port.width
        ));
    }
    for step in &lowered.steps {
        out.push_str(&format!("        // {}: {}\n", step.index, step.text.replace('\n', " ")));
        match &step.op {
            Op::Poke(writes) => {
                for write in writes {
                    out.push_str(&format!(
                        "        {} = {};\n",
                        drive_target(&write.leaf.address.name, &wired),
                        verilog_literal(&write.bits)
                    ));
                }
            }
            Op::Eval => out.push_str("        #1;\n"),
            Op::Step { clock, count } => {
                let clk = drive_target(&clock.address.name, &wired);
                out.push_str(&format!("        repeat ({count}) begin\n"));
                out.push_str(&format!("            {clk} = ~{clk};\n"));
                out.push_str("            #1;\n");
                out.push_str("        end\n");
            }
            Op::Expect(checks) => {
                for check in checks {
                    out.push_str(&expect(step.index, check, stop));
                }
            }
            Op::Print(leaves) => {
                for leaf in leaves {
                    out.push_str(&format!(
                        "        $display(\"{}.{} = {}\", {});\n",
                        sv_string(circuit),
                        sv_string(&leaf.display),
                        display_spec(leaf),
                        leaf.address.name
                    ));
                }
            }
            Op::Peek(_) => {}
        }
    }
    out.push_str(&format!(
        "        $display(\"{DONE_MARKER} failures=%0d\", vigil_failures);\n"
    ));
    out.push_str("        $finish;\n");
    out.push_str("    end\n");
    out.push_str("endmodule\n");
    out
}

fn declaration_range(port: &PortDecl) -> String {
    let signed = if port.signed { "signed " } else { "" };
    if port.width == 1 {
        signed.to_string()
    } else {
        format!("{signed}[{}:0] ", port.width - 1)
    }
}

fn driver_reg(port: &str) -> String {
    format!("{port}_vigil_reg")
}

/// The identifier to assign when driving `name`: the port itself, or the
/// reg behind its input wire. Bit selects keep their suffix.
fn drive_target(name: &str, wired: &BTreeSet<&str>) -> String {
    let (base, select) = match name.find('[') {
        Some(at) => name.split_at(at),
        None => (name, ""),
    };
    if wired.contains(base) {
        format!("{}{select}", driver_reg(base))
    } else {
        name.to_string()
    }
}

fn expect(index: usize, check: &Check, stop: bool) -> String {
    let leaf = &check.leaf;
    let actual = &leaf.address.name;
    let (condition, expected_spec, expected_arg) = match &check.expected {
        Operand::Const(bits) if bits.has_unknown() => (
            "1'b1".to_string(),
            sv_string(&value_text(bits, leaf.signed)),
            None,
        ),
        Operand::Const(bits) => (
            format!("{actual} !== {}", verilog_literal(bits)),
            sv_string(&value_text(bits, leaf.signed)),
            None,
        ),
        Operand::Signal(other) => {
            let theirs = &other.address.name;
            (
                format!("({actual} !== {theirs}) || (^({actual}) === 1'bx)"),
                display_spec(other),
                Some(theirs.clone()),
            )
        }
    };

    let mut args: Vec<String> = expected_arg.into_iter().collect();
    args.push(actual.clone());

    let mut out = String::new();
    out.push_str(&format!("        if ({condition}) begin\n"));
    out.push_str("            vigil_failures = vigil_failures + 1;\n");
    out.push_str(&format!(
        "            $display(\"{FAIL_MARKER} action={index} signal={} expected={expected_spec} actual={}\", {});\n",
        sv_string(&leaf.display),
        display_spec(leaf),
        args.join(", ")
    ));
    if stop {
        out.push_str(&format!(
            "            $display(\"{DONE_MARKER} failures=%0d\", vigil_failures);\n"
        ));
        out.push_str("            $finish;\n");
    }
    out.push_str("        end\n");
    out
}

/// Decimal up to 64 bits, a sized hex literal above.
fn display_spec(leaf: &Leaf) -> String {
    if leaf.width <= 64 {
        "%0d".to_string()
    } else {
        format!("{}'h%h", leaf.width)
    }
}

fn sv_string(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('%', "%%")
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_actions::Sequence;
    use vigil_signal::{Circuit, SignalPath, SignalType};
    use vigil_value::Value;

    fn path(text: &str) -> SignalPath {
        text.parse().unwrap()
    }

    fn circuit() -> Circuit {
        Circuit::new("Top")
            .with_port("CLK", Direction::In, SignalType::Digital)
            .with_port("I", Direction::In, SignalType::array(SignalType::Digital, 3))
            .with_port("O", Direction::Out, SignalType::array(SignalType::Digital, 3))
            .with_port("S", Direction::Out, SignalType::sint(3))
            .with_port("B", Direction::InOut, SignalType::bits(2))
            .with_port(
                "T",
                Direction::In,
                SignalType::tuple([("a", SignalType::bits(4)), ("b", SignalType::bits(4))]),
            )
    }

    fn source(build: impl FnOnce(&mut Sequence), wires: bool, stop: bool) -> String {
        let mut seq = Sequence::new(circuit());
        build(&mut seq);
        let program = seq.finalize();
        let mut ctx = BackendContext::new("unused");
        let lowered = lower(&program, &NamingScheme::verilog(), &mut ctx).unwrap();
        testbench_source(&lowered, wires, stop)
    }

    #[test]
    fn declarations_and_instance() {
        let src = source(|_| {}, false, false);
        assert!(src.contains("module Top_tb;\n"));
        assert!(src.contains("    reg CLK;\n"));
        assert!(src.contains("    reg [2:0] I;\n"));
        assert!(src.contains("    wire [2:0] O;\n"));
        assert!(src.contains("    wire signed [2:0] S;\n"));
        assert!(src.contains("    reg [1:0] B_vigil_reg;\n    wire [1:0] B;\n    assign B = B_vigil_reg;\n"));
        assert!(src.contains("    reg [3:0] T_a;\n"));
        assert!(src.contains("    Top dut (\n        .CLK(CLK),\n        .I(I),"));
        assert!(src.contains("        .T_b(T_b)\n    );\n"));
        assert!(src.ends_with("        $display(\"VIGIL DONE failures=%0d\", vigil_failures);\n        $finish;\n    end\nendmodule\n"));
    }

    #[test]
    fn driven_regs_start_at_zero() {
        let src = source(|s| { s.step(path("CLK"), 1).unwrap(); }, false, false);
        assert!(src.contains(
            "    initial begin\n        CLK = 1'h0;\n        I = 3'h0;\n        B_vigil_reg = 2'h0;\n        T_a = 4'h0;\n        T_b = 4'h0;\n        // 0: step CLK"
        ));
        assert!(!src.contains("O = 3'h0;"));

        let wired = source(|_| {}, true, false);
        assert!(wired.contains("        CLK_vigil_reg = 1'h0;\n"));
    }

    #[test]
    fn basic_sequence() {
        let src = source(
            |s| {
                s.poke(path("I"), 0).unwrap();
                s.eval().unwrap();
                s.expect(path("O"), 1).unwrap();
            },
            false,
            false,
        );
        assert!(src.contains("        // 0: poke I = 0\n        I = 3'h0;\n"));
        assert!(src.contains("        // 1: eval\n        #1;\n"));
        assert!(src.contains("        if (O !== 3'h1) begin\n"));
        assert!(src.contains(
            "$display(\"VIGIL EXPECT FAIL action=2 signal=O expected=1 actual=%0d\", O);"
        ));
    }

    #[test]
    fn input_wires_drive_the_reg() {
        let src = source(
            |s| {
                s.poke(path("I[1]"), 1).unwrap();
                s.step(path("CLK"), 2).unwrap();
            },
            true,
            false,
        );
        assert!(src.contains("    assign I = I_vigil_reg;\n"));
        assert!(src.contains("        I_vigil_reg[1] = 1'h1;\n"));
        assert!(src.contains(
            "        repeat (2) begin\n            CLK_vigil_reg = ~CLK_vigil_reg;\n            #1;\n        end\n"
        ));
    }

    #[test]
    fn tuple_poke_and_print() {
        let src = source(
            |s| {
                s.poke(path("T"), Value::tuple([("a", 5.into()), ("b", 11.into())]))
                    .unwrap();
                s.print(path("T")).unwrap();
            },
            false,
            false,
        );
        assert!(src.contains("        T_a = 4'h5;\n        T_b = 4'hb;\n"));
        assert!(src.contains("        $display(\"Top.T.a = %0d\", T_a);\n"));
        assert!(src.contains("        $display(\"Top.T.b = %0d\", T_b);\n"));
    }

    #[test]
    fn signed_expectation_text() {
        let src = source(
            |s| {
                s.expect(path("S"), -2).unwrap();
            },
            false,
            false,
        );
        assert!(src.contains("if (S !== 3'h6) begin"));
        assert!(src.contains("signal=S expected=-2 actual=%0d\", S);"));
    }

    #[test]
    fn peek_expectation_rejects_unknowns() {
        let src = source(
            |s| {
                s.expect_peek(path("O"), path("I")).unwrap();
            },
            false,
            false,
        );
        assert!(src.contains("if ((O !== I) || (^(O) === 1'bx)) begin"));
        assert!(src.contains("expected=%0d actual=%0d\", I, O);"));
    }

    #[test]
    fn stop_on_first_failure_finishes() {
        let src = source(
            |s| {
                s.expect(path("O"), 1).unwrap();
            },
            false,
            true,
        );
        assert!(src.contains(
            "            $display(\"VIGIL DONE failures=%0d\", vigil_failures);\n            $finish;\n        end\n"
        ));
    }

    #[test]
    fn simulator_commands() {
        let dir = Path::new("/b");
        let ext = vec!["/p/top.v".to_string()];
        let flags = vec!["-sv".to_string()];
        let ncsim = simulator_invocations(Simulator::Ncsim, dir, "Top_tb.sv", "Top_tb", &ext, &flags);
        assert_eq!(
            ncsim[0].to_string(),
            "irun -top Top_tb -timescale 1ns/1ns -notimingchecks Top_tb.sv /p/top.v -sv"
        );
        let iv = simulator_invocations(Simulator::Iverilog, dir, "Top_tb.sv", "Top_tb", &ext, &flags);
        assert_eq!(
            iv[0].to_string(),
            "iverilog -g2012 -o Top_tb.vvp -s Top_tb Top_tb.sv /p/top.v -sv"
        );
        assert_eq!(iv[1].to_string(), "vvp -n Top_tb.vvp");
    }

    #[test]
    fn emit_uses_configured_file_name() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = SystemVerilogBackend::from_config(&SystemVerilogConfig::default(), Path::new("."));
        let mut ctx = BackendContext::new(tmp.path()).with_files(vigil_config::FileNames {
            testbench: Some("bench.sv".into()),
            ..vigil_config::FileNames::default()
        });
        let artifact = backend.emit(&Sequence::new(circuit()).finalize(), &mut ctx).unwrap();
        assert_eq!(artifact.files, vec![tmp.path().join("bench.sv")]);
        assert!(artifact.invocations[0].args.contains(&"bench.sv".to_string()));
    }
}
