//! Interactive emission: each action executes against a live simulation as
//! it is emitted.

use crate::backend::{Backend, EmissionMode};
use crate::context::{Artifact, BackendContext};
use crate::error::{BackendError, LiveSimError};
use crate::lower::{lower, Leaf, Lowered, Op, Operand, Step};
use crate::sim::SpawnedSim;
use crate::verdict::{value_text, ExpectMismatch, Observation, Transcript, TranscriptEntry};
use tracing::{debug, info, warn};
use vigil_actions::Program;
use vigil_common::{Logic, LogicVec};
use vigil_mangle::NamingScheme;
use vigil_value::bits_match;

/// A simulation the interactive backend can drive.
///
/// Names are verilator-scheme identifiers of whole words.
pub trait LiveSim {
    /// Drives `name` with `value`, which has the word's full width.
    fn poke(&mut self, name: &str, value: &LogicVec) -> Result<(), LiveSimError>;

    /// Reads the current value of `name`.
    fn peek(&mut self, name: &str) -> Result<LogicVec, LiveSimError>;

    /// Settles combinational logic.
    fn eval(&mut self) -> Result<(), LiveSimError>;

    /// Toggles bit 0 of `clock` `count` times, settling after each toggle.
    fn step(&mut self, clock: &str, count: u32) -> Result<(), LiveSimError>;
}

/// Builds the live simulation for one emission.
pub type SimFactory = Box<
    dyn Fn(&Program, &BackendContext) -> Result<Box<dyn LiveSim>, LiveSimError> + Send + Sync,
>;

/// Drives a live simulation created per emission.
pub struct InteractiveBackend {
    name: String,
    factory: SimFactory,
    naming: NamingScheme,
}

impl InteractiveBackend {
    /// The `process` backend: each emission starts `command` in the
    /// emission directory and speaks the line protocol with it.
    pub fn process(command: Vec<String>) -> Self {
        Self::with_factory("process", move |_program, ctx| {
            ctx.ensure_dir()
                .map_err(|e| LiveSimError::Protocol(e.to_string()))?;
            let sim = SpawnedSim::spawn(&command, ctx.dir())?;
            Ok(Box::new(sim) as Box<dyn LiveSim>)
        })
    }

    /// A backend named `name` whose simulations come from `factory`.
    pub fn with_factory<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&Program, &BackendContext) -> Result<Box<dyn LiveSim>, LiveSimError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            factory: Box::new(factory),
            naming: NamingScheme::verilator(),
        }
    }
}

impl Backend for InteractiveBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn mode(&self) -> EmissionMode {
        EmissionMode::Interactive
    }

    fn naming(&self) -> &NamingScheme {
        &self.naming
    }

    fn emit(&self, program: &Program, ctx: &mut BackendContext) -> Result<Artifact, BackendError> {
        let lowered = lower(program, &self.naming, ctx)?;
        let mut sim = (self.factory)(program, &*ctx)?;
        let transcript = run(&lowered, sim.as_mut(), ctx.stop_on_first_failure)?;
        info!(
            backend = %self.name,
            circuit = %lowered.circuit,
            mismatches = transcript.mismatches.len(),
            "interactive run finished"
        );
        Ok(Artifact {
            backend: self.name.clone(),
            circuit: lowered.circuit,
            mode: self.mode(),
            dir: ctx.dir().to_path_buf(),
            files: ctx.take_written(),
            invocations: Vec::new(),
            transcript: Some(transcript),
            reports_checks: true,
        })
    }
}

/// Executes a lowered program against `sim`.
///
/// A failed expectation is recorded and the run continues, unless `stop` is
/// set. A simulator failure ends the run with
/// [`BackendError::Interrupted`], carrying everything observed before it.
pub fn run(lowered: &Lowered, sim: &mut dyn LiveSim, stop: bool) -> Result<Transcript, BackendError> {
    let mut transcript = Transcript::new(lowered.circuit.clone());
    for step in &lowered.steps {
        let mut entry = TranscriptEntry {
            index: step.index,
            action: step.text.clone(),
            observed: Vec::new(),
        };
        debug!(index = step.index, action = %step.text, "executing");
        match execute(step, sim, stop, &mut transcript, &mut entry) {
            Ok(failed) => {
                transcript.entries.push(entry);
                if failed && stop {
                    transcript.finished = true;
                    return Ok(transcript);
                }
            }
            Err(source) => {
                transcript.entries.push(entry);
                return Err(BackendError::Interrupted {
                    index: step.index,
                    transcript: Box::new(transcript),
                    source,
                });
            }
        }
    }
    transcript.finished = true;
    Ok(transcript)
}

/// Runs one step. Returns true if an expectation failed.
fn execute(
    step: &Step,
    sim: &mut dyn LiveSim,
    stop: bool,
    transcript: &mut Transcript,
    entry: &mut TranscriptEntry,
) -> Result<bool, LiveSimError> {
    let mut failed = false;
    match &step.op {
        Op::Poke(writes) => {
            for write in writes {
                write_leaf(sim, &write.leaf, &write.bits)?;
            }
        }
        Op::Eval => sim.eval()?,
        Op::Step { clock, count } => match clock.address.bit {
            None => sim.step(&clock.address.name, *count)?,
            Some(bit) => {
                for _ in 0..*count {
                    let mut word = read_word(sim, clock)?;
                    let next = match word.get(bit) {
                        Logic::One => Logic::Zero,
                        _ => Logic::One,
                    };
                    word.set(bit, next);
                    sim.poke(&clock.address.name, &word)?;
                    sim.eval()?;
                }
            }
        },
        Op::Expect(checks) => {
            for check in checks {
                let (expected, expected_signed) = match &check.expected {
                    Operand::Const(bits) => (bits.clone(), check.leaf.signed),
                    Operand::Signal(other) => (read_leaf(sim, other)?, other.signed),
                };
                let actual = read_leaf(sim, &check.leaf)?;
                let actual_text = value_text(&actual, check.leaf.signed);
                entry.observed.push(Observation {
                    signal: check.leaf.display.clone(),
                    value: actual_text.clone(),
                });
                if !bits_match(&expected, &actual) {
                    let mismatch = ExpectMismatch {
                        action: step.index,
                        signal: check.leaf.display.clone(),
                        expected: value_text(&expected, expected_signed),
                        actual: actual_text,
                    };
                    warn!("{mismatch}");
                    transcript.mismatches.push(mismatch);
                    failed = true;
                    if stop {
                        break;
                    }
                }
            }
        }
        Op::Print(leaves) => {
            for leaf in leaves {
                let value = value_text(&read_leaf(sim, leaf)?, leaf.signed);
                let line = transcript.print_line(&leaf.display, &value);
                transcript.prints.push(line);
                entry.observed.push(Observation {
                    signal: leaf.display.clone(),
                    value,
                });
            }
        }
        Op::Peek(leaves) => {
            for leaf in leaves {
                let value = value_text(&read_leaf(sim, leaf)?, leaf.signed);
                entry.observed.push(Observation {
                    signal: leaf.display.clone(),
                    value,
                });
            }
        }
    }
    Ok(failed)
}

fn read_leaf(sim: &mut dyn LiveSim, leaf: &Leaf) -> Result<LogicVec, LiveSimError> {
    let word = read_word(sim, leaf)?;
    match leaf.address.bit {
        Some(bit) => Ok(word.slice(bit, 1)),
        None => Ok(word),
    }
}

fn write_leaf(sim: &mut dyn LiveSim, leaf: &Leaf, bits: &LogicVec) -> Result<(), LiveSimError> {
    match leaf.address.bit {
        Some(bit) => {
            let mut word = read_word(sim, leaf)?;
            word.set_slice(bit, bits);
            sim.poke(&leaf.address.name, &word)
        }
        None => sim.poke(&leaf.address.name, bits),
    }
}

/// Peeks the whole word behind `leaf`, rejecting replies of the wrong width.
fn read_word(sim: &mut dyn LiveSim, leaf: &Leaf) -> Result<LogicVec, LiveSimError> {
    let word = sim.peek(&leaf.address.name)?;
    if word.width() != leaf.word_width {
        return Err(LiveSimError::Protocol(format!(
            "`{}` read back {} bits, expected {}",
            leaf.address.name,
            word.width(),
            leaf.word_width
        )));
    }
    Ok(word)
}
