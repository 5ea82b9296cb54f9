//! C++ driver emission for Verilator-compiled models.
//!
//! Verilator exposes every port as a member of the generated `V<circuit>`
//! class: ports up to 64 bits are plain integers and wider ports are arrays
//! of 32-bit words. Bits of packed arrays have no member of their own, so
//! the verilator naming scheme addresses them within the whole word and the
//! driver reads and writes them with masks.

use crate::backend::{Backend, EmissionMode};
use crate::context::{Artifact, BackendContext};
use crate::error::BackendError;
use crate::lower::{lower, Check, Leaf, Lowered, Op, Operand, Write};
use crate::tool::ToolInvocation;
use crate::verdict::{value_text, DONE_MARKER, FAIL_MARKER};
use std::path::Path;
use tracing::info;
use vigil_actions::Program;
use vigil_common::{Logic, LogicVec};
use vigil_config::VerilatorConfig;
use vigil_mangle::NamingScheme;

/// Emits `<circuit>_driver.cpp` and the commands that build and run it.
#[derive(Debug, Clone)]
pub struct VerilatorBackend {
    binary: String,
    flags: Vec<String>,
    sources: Vec<String>,
    naming: NamingScheme,
}

impl VerilatorBackend {
    /// A backend with the given settings. Relative sources resolve against
    /// `project_dir`.
    pub fn from_config(config: &VerilatorConfig, project_dir: &Path) -> Self {
        Self {
            binary: config.binary.clone(),
            flags: config.flags.clone(),
            sources: config
                .sources
                .iter()
                .map(|s| project_dir.join(s).display().to_string())
                .collect(),
            naming: NamingScheme::verilator(),
        }
    }
}

impl Default for VerilatorBackend {
    fn default() -> Self {
        Self::from_config(&VerilatorConfig::default(), Path::new("."))
    }
}

impl Backend for VerilatorBackend {
    fn name(&self) -> &str {
        "verilator"
    }

    fn mode(&self) -> EmissionMode {
        EmissionMode::Static
    }

    fn naming(&self) -> &NamingScheme {
        &self.naming
    }

    fn emit(&self, program: &Program, ctx: &mut BackendContext) -> Result<Artifact, BackendError> {
        let lowered = lower(program, &self.naming, ctx)?;
        let driver = ctx.files.driver_for(&lowered.circuit);
        ctx.write_file(&driver, &driver_source(&lowered, ctx.stop_on_first_failure))?;

        let model = format!("V{}", lowered.circuit);
        let dir = ctx.dir().to_path_buf();
        let invocations = vec![
            ToolInvocation::new(&self.binary, &dir)
                .arg("--cc")
                .args(self.sources.iter().cloned())
                .arg("--exe")
                .arg(&driver)
                .arg("--top-module")
                .arg(&lowered.circuit)
                .args(self.flags.iter().cloned()),
            ToolInvocation::new("make", &dir)
                .args(["-C", "obj_dir", "-f"])
                .arg(format!("{model}.mk"))
                .arg(&model),
            ToolInvocation::new(format!("./obj_dir/{model}"), &dir),
        ];
        info!(circuit = %lowered.circuit, actions = lowered.steps.len(), file = %driver, "wrote verilator driver");

        Ok(Artifact {
            backend: self.name().to_string(),
            circuit: lowered.circuit,
            mode: self.mode(),
            dir,
            files: ctx.take_written(),
            invocations,
            transcript: None,
            reports_checks: true,
        })
    }
}

const PRELUDE: &str = r#"// Generated by vigil. Do not edit.
#include "@MODEL@.h"
#include "verilated.h"
#include <cstdint>
#include <cstdio>
#include <string>

static unsigned long long vigil_bits(unsigned long long v, int lo, int w) {
    unsigned long long mask = w >= 64 ? ~0ULL : ((1ULL << w) - 1);
    return (v >> lo) & mask;
}

static long long vigil_sext(unsigned long long v, int w) {
    if (w >= 64) return (long long)v;
    return (long long)(v << (64 - w)) >> (64 - w);
}

static uint32_t vigil_top_mask(int k, int n, int w) {
    return (k == n - 1 && w % 32) ? ((1u << (w % 32)) - 1) : 0xffffffffu;
}

static bool vigil_wide_eq(const uint32_t* a, const uint32_t* b, int w) {
    int n = (w + 31) / 32;
    for (int k = 0; k < n; k++) {
        uint32_t mask = vigil_top_mask(k, n, w);
        if ((a[k] & mask) != (b[k] & mask)) return false;
    }
    return true;
}

static std::string vigil_hex(const uint32_t* words, int w) {
    char buf[32];
    int n = (w + 31) / 32;
    std::snprintf(buf, sizeof buf, "%d'h", w);
    std::string out = buf;
    int top_digits = (w - 32 * (n - 1) + 3) / 4;
    std::snprintf(buf, sizeof buf, "%0*x", top_digits, words[n - 1] & vigil_top_mask(n - 1, n, w));
    out += buf;
    for (int k = n - 2; k >= 0; k--) {
        std::snprintf(buf, sizeof buf, "%08x", words[k]);
        out += buf;
    }
    return out;
}

static int vigil_finish(@MODEL@* top, int failures) {
    top->final();
    delete top;
    std::printf("@DONE@ failures=%d\n", failures);
    return 0;
}

int main(int argc, char** argv) {
    Verilated::commandArgs(argc, argv);
    @MODEL@* top = new @MODEL@;
    int failures = 0;
"#;

/// Generates the C++ driver for a program lowered with the verilator scheme.
///
/// The driver always exits 0; failures are reported as marker lines on
/// stdout followed by a completion line.
pub fn driver_source(lowered: &Lowered, stop_on_first_failure: bool) -> String {
    let model = format!("V{}", lowered.circuit);
    let mut out = PRELUDE
        .replace("@MODEL@", &model)
        .replace("@DONE@", DONE_MARKER);

    for step in &lowered.steps {
        out.push_str(&format!("\n    // {}: {}\n", step.index, c_comment(&step.text)));
        match &step.op {
            Op::Poke(writes) => {
                for write in writes {
                    out.push_str(&format!("    {}\n", poke(write)));
                }
            }
            Op::Eval => out.push_str("    top->eval();\n"),
            Op::Step { clock, count } => {
                out.push_str(&format!("    for (int i = 0; i < {count}; i++) {{\n"));
                out.push_str(&format!("        {}\n", toggle(clock)));
                out.push_str("        top->eval();\n");
                out.push_str("    }\n");
            }
            Op::Expect(checks) => {
                for check in checks {
                    out.push_str(&expect(step.index, check, stop_on_first_failure));
                }
            }
            Op::Print(leaves) => {
                for leaf in leaves {
                    let (spec, arg) = printf_arg(leaf);
                    out.push_str(&format!(
                        "    std::printf(\"{}.{} = {spec}\\n\", {arg});\n",
                        c_string(&lowered.circuit),
                        c_string(&leaf.display)
                    ));
                }
            }
            Op::Peek(_) => {}
        }
    }

    out.push_str("\n    return vigil_finish(top, failures);\n}\n");
    out
}

/// A leaf as one 64-bit integer expression, or a pointer to its words.
enum Access {
    Narrow(String),
    Wide { words: String },
}

fn access(leaf: &Leaf) -> Access {
    let name = &leaf.address.name;
    match leaf.address.bit {
        Some(bit) if leaf.word_width > 64 => Access::Narrow(format!(
            "(unsigned long long)((top->{name}[{}] >> {}) & 1u)",
            bit / 32,
            bit % 32
        )),
        Some(bit) => Access::Narrow(format!("vigil_bits(top->{name}, {bit}, 1)")),
        None if leaf.width > 64 => Access::Wide {
            words: format!("&top->{name}[0]"),
        },
        None => Access::Narrow(format!("vigil_bits(top->{name}, 0, {})", leaf.width)),
    }
}

fn poke(write: &Write) -> String {
    let leaf = &write.leaf;
    let name = &leaf.address.name;
    match leaf.address.bit {
        Some(bit) => {
            let v = u8::from(write.bits.get(0) == Logic::One);
            if leaf.word_width > 64 {
                let (k, s) = (bit / 32, bit % 32);
                format!("top->{name}[{k}] = (top->{name}[{k}] & ~(1u << {s})) | ({v}u << {s});")
            } else {
                format!("top->{name} = (top->{name} & ~(1ULL << {bit})) | ({v}ULL << {bit});")
            }
        }
        None if leaf.width > 64 => two_state_words(&write.bits)
            .iter()
            .enumerate()
            .map(|(k, word)| format!("top->{name}[{k}] = 0x{word:08x}u;"))
            .collect::<Vec<_>>()
            .join("\n    "),
        None => format!("top->{name} = 0x{:x}ULL;", two_state_u64(&write.bits)),
    }
}

fn toggle(clock: &Leaf) -> String {
    let name = &clock.address.name;
    match clock.address.bit {
        Some(bit) if clock.word_width > 64 => {
            format!("top->{name}[{}] ^= (1u << {});", bit / 32, bit % 32)
        }
        Some(bit) => format!("top->{name} ^= (1ULL << {bit});"),
        None => format!("top->{name} = !top->{name};"),
    }
}

fn expect(index: usize, check: &Check, stop: bool) -> String {
    let leaf = &check.leaf;
    let mut out = String::new();
    let mut scoped = false;
    let actual = access(leaf);

    let (condition, expected_spec, expected_arg) = match (&check.expected, &actual) {
        (Operand::Const(bits), _) if bits.has_unknown() => {
            ("true".to_string(), c_string(&value_text(bits, leaf.signed)), None)
        }
        (Operand::Const(bits), Access::Narrow(a)) => (
            format!("{a} != 0x{:x}ULL", two_state_u64(bits)),
            c_string(&value_text(bits, leaf.signed)),
            None,
        ),
        (Operand::Const(bits), Access::Wide { words }) => {
            let items: Vec<String> = two_state_words(bits)
                .iter()
                .map(|w| format!("0x{w:08x}u"))
                .collect();
            out.push_str(&format!(
                "    {{\n    const uint32_t vigil_expected[] = {{{}}};\n",
                items.join(", ")
            ));
            scoped = true;
            (
                format!("!vigil_wide_eq({words}, vigil_expected, {})", leaf.width),
                c_string(&value_text(bits, leaf.signed)),
                None,
            )
        }
        (Operand::Signal(other), _) => {
            let condition = match (&actual, access(other)) {
                (Access::Narrow(a), Access::Narrow(b)) => format!("{a} != {b}"),
                (Access::Wide { words: a }, Access::Wide { words: b }) => {
                    format!("!vigil_wide_eq({a}, {b}, {})", leaf.width)
                }
                (Access::Narrow(a), Access::Wide { words: b }) => {
                    format!("{a} != (unsigned long long)({b})[0]")
                }
                (Access::Wide { words: a }, Access::Narrow(b)) => {
                    format!("(unsigned long long)({a})[0] != {b}")
                }
            };
            let (spec, arg) = printf_arg(other);
            (condition, spec.to_string(), Some(arg))
        }
    };

    let (actual_spec, actual_arg) = printf_arg(leaf);
    let mut args = Vec::new();
    args.extend(expected_arg);
    args.push(actual_arg);

    out.push_str(&format!("    if ({condition}) {{\n"));
    out.push_str("        failures++;\n");
    out.push_str(&format!(
        "        std::printf(\"{FAIL_MARKER} action={index} signal={} expected={expected_spec} actual={actual_spec}\\n\", {});\n",
        c_string(&leaf.display),
        args.join(", ")
    ));
    if stop {
        out.push_str("        return vigil_finish(top, failures);\n");
    }
    out.push_str("    }\n");
    if scoped {
        out.push_str("    }\n");
    }
    out
}

fn printf_arg(leaf: &Leaf) -> (&'static str, String) {
    match access(leaf) {
        Access::Narrow(expr) if leaf.signed => ("%lld", format!("vigil_sext({expr}, {})", leaf.width)),
        Access::Narrow(expr) => ("%llu", expr),
        Access::Wide { words } => ("%s", format!("vigil_hex({words}, {}).c_str()", leaf.width)),
    }
}

/// Verilator models are two-state; X and Z drive as 0.
fn two_state_words(bits: &LogicVec) -> Vec<u32> {
    let mut words = vec![0u32; bits.width().div_ceil(32).max(1) as usize];
    for i in 0..bits.width() {
        if bits.get(i) == Logic::One {
            words[(i / 32) as usize] |= 1 << (i % 32);
        }
    }
    words
}

fn two_state_u64(bits: &LogicVec) -> u64 {
    two_state_words(bits)
        .iter()
        .take(2)
        .enumerate()
        .fold(0u64, |acc, (k, w)| acc | (u64::from(*w) << (32 * k)))
}

fn c_string(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('%', "%%")
}

fn c_comment(text: &str) -> String {
    text.replace(['\n', '\r'], " ")
}
