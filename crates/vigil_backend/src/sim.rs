//! Live simulations the interactive backend can drive.
//!
//! - [`ProcessSim`] speaks the line protocol over any reader and writer.
//! - [`SpawnedSim`] starts a simulator server as a child process.
//! - [`ModelSim`] evaluates a user-supplied model closure in process, and can
//!   serve the line protocol itself.

use crate::error::LiveSimError;
use crate::interactive::LiveSim;
use crate::protocol::{parse_request, parse_response, Request, Response};
use std::collections::BTreeMap;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use tracing::debug;
use vigil_common::{Logic, LogicVec};
use vigil_mangle::{mangle, MangleError, NamingScheme};
use vigil_signal::Circuit;

/// A simulator reached through the line protocol.
pub struct ProcessSim<R, W> {
    reader: R,
    writer: W,
    line: String,
}

impl<R: BufRead, W: Write> ProcessSim<R, W> {
    /// Wraps a connected reader and writer.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            line: String::new(),
        }
    }

    /// Sends one request and reads its response.
    pub fn request(&mut self, request: &Request) -> Result<Response, LiveSimError> {
        writeln!(self.writer, "{request}")?;
        self.writer.flush()?;
        self.line.clear();
        if self.reader.read_line(&mut self.line)? == 0 {
            return Err(LiveSimError::Protocol(format!(
                "simulator closed the connection after `{request}`"
            )));
        }
        parse_response(&self.line).map_err(LiveSimError::Protocol)
    }

    fn expect_ok(&mut self, request: &Request) -> Result<(), LiveSimError> {
        match self.request(request)? {
            Response::Ok => Ok(()),
            Response::Error(msg) => Err(LiveSimError::Simulator(msg)),
            Response::Value(v) => Err(LiveSimError::Protocol(format!(
                "expected `ok` after `{request}`, got a value of {} bits",
                v.width()
            ))),
        }
    }
}

impl<R: BufRead, W: Write> LiveSim for ProcessSim<R, W> {
    fn poke(&mut self, name: &str, value: &LogicVec) -> Result<(), LiveSimError> {
        self.expect_ok(&Request::Poke {
            name: name.to_string(),
            value: value.clone(),
        })
    }

    fn peek(&mut self, name: &str) -> Result<LogicVec, LiveSimError> {
        let request = Request::Peek {
            name: name.to_string(),
        };
        match self.request(&request)? {
            Response::Value(v) => Ok(v),
            Response::Error(msg) => Err(LiveSimError::Simulator(msg)),
            Response::Ok => Err(LiveSimError::Protocol(format!(
                "expected a value after `{request}`, got `ok`"
            ))),
        }
    }

    fn eval(&mut self) -> Result<(), LiveSimError> {
        self.expect_ok(&Request::Eval)
    }

    fn step(&mut self, clock: &str, count: u32) -> Result<(), LiveSimError> {
        self.expect_ok(&Request::Step {
            clock: clock.to_string(),
            count,
        })
    }
}

/// A simulator server running as a child process.
///
/// Dropping it sends `quit` and waits for the child to exit.
pub struct SpawnedSim {
    child: Child,
    inner: ProcessSim<BufReader<ChildStdout>, ChildStdin>,
}

impl SpawnedSim {
    /// Starts `command` in `cwd` with piped stdin and stdout.
    pub fn spawn(command: &[String], cwd: &Path) -> Result<Self, LiveSimError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| LiveSimError::Protocol("empty simulator command".to_string()))?;
        debug!(program = %program, cwd = %cwd.display(), "starting simulator");
        let mut child = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;
        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        match (stdin, stdout) {
            (Some(stdin), Some(stdout)) => Ok(Self {
                child,
                inner: ProcessSim::new(BufReader::new(stdout), stdin),
            }),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                Err(LiveSimError::Protocol(
                    "simulator pipes were not captured".to_string(),
                ))
            }
        }
    }
}

impl LiveSim for SpawnedSim {
    fn poke(&mut self, name: &str, value: &LogicVec) -> Result<(), LiveSimError> {
        self.inner.poke(name, value)
    }

    fn peek(&mut self, name: &str) -> Result<LogicVec, LiveSimError> {
        self.inner.peek(name)
    }

    fn eval(&mut self) -> Result<(), LiveSimError> {
        self.inner.eval()
    }

    fn step(&mut self, clock: &str, count: u32) -> Result<(), LiveSimError> {
        self.inner.step(clock, count)
    }
}

impl Drop for SpawnedSim {
    fn drop(&mut self) {
        let _ = self.inner.request(&Request::Quit);
        let _ = self.child.wait();
    }
}

/// Port values of an in-process model, keyed by verilator-scheme names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortValues {
    values: BTreeMap<String, LogicVec>,
}

impl PortValues {
    /// The current value of `name`.
    pub fn get(&self, name: &str) -> Option<&LogicVec> {
        self.values.get(name)
    }

    /// Replaces the value of an existing port. The width is adjusted to the
    /// port's width; unknown names are ignored and return `false`.
    pub fn set(&mut self, name: &str, value: LogicVec) -> bool {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value.resized(slot.width());
                true
            }
            None => false,
        }
    }

    /// The value of `name` as an unsigned integer, if fully known.
    pub fn get_int(&self, name: &str) -> Option<i128> {
        self.get(name).and_then(LogicVec::to_i128_unsigned)
    }

    /// The value of `name` as a two's-complement signed integer, if fully
    /// known.
    pub fn get_signed(&self, name: &str) -> Option<i128> {
        self.get(name).and_then(LogicVec::to_i128_signed)
    }

    /// Sets `name` to the low bits of `value`.
    pub fn set_int(&mut self, name: &str, value: i128) -> bool {
        match self.values.get(name).map(LogicVec::width) {
            Some(width) => self.set(name, LogicVec::from_i128(value, width)),
            None => false,
        }
    }

    /// Port names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

type Model = Box<dyn FnMut(&mut PortValues) + Send>;

/// An in-process evaluator: port storage plus a model closure run on every
/// `eval`.
///
/// Ports start at zero. The model reads inputs and writes outputs through
/// [`PortValues`]; it performs no logic simulation of its own.
pub struct ModelSim {
    ports: PortValues,
    model: Model,
}

impl ModelSim {
    /// Creates storage for every packed port of `circuit`.
    pub fn new<F>(circuit: &Circuit, model: F) -> Result<Self, MangleError>
    where
        F: FnMut(&mut PortValues) + Send + 'static,
    {
        let scheme = NamingScheme::verilator();
        let mut values = BTreeMap::new();
        for port in circuit.packed_ports() {
            values.insert(mangle(&scheme, &port)?, LogicVec::new(port.ty().width()));
        }
        Ok(Self {
            ports: PortValues { values },
            model: Box::new(model),
        })
    }

    /// The current port values.
    pub fn ports(&self) -> &PortValues {
        &self.ports
    }

    /// Answers line-protocol requests from `input` until `quit` or end of
    /// input.
    pub fn serve<R: BufRead, W: Write>(&mut self, input: &mut R, output: &mut W) -> io::Result<()> {
        let mut line = String::new();
        loop {
            line.clear();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }
            let response = match parse_request(&line) {
                Ok(Request::Quit) => {
                    writeln!(output, "{}", Response::Ok)?;
                    output.flush()?;
                    break;
                }
                Ok(request) => self.handle(&request),
                Err(err) => Response::Error(err),
            };
            writeln!(output, "{response}")?;
            output.flush()?;
        }
        Ok(())
    }

    fn handle(&mut self, request: &Request) -> Response {
        let result = match request {
            Request::Poke { name, value } => self.poke(name, value).map(|()| Response::Ok),
            Request::Peek { name } => self.peek(name).map(Response::Value),
            Request::Eval => self.eval().map(|()| Response::Ok),
            Request::Step { clock, count } => self.step(clock, *count).map(|()| Response::Ok),
            Request::Quit => Ok(Response::Ok),
        };
        result.unwrap_or_else(|e| Response::Error(e.to_string()))
    }
}

impl LiveSim for ModelSim {
    fn poke(&mut self, name: &str, value: &LogicVec) -> Result<(), LiveSimError> {
        let slot = self
            .ports
            .values
            .get_mut(name)
            .ok_or_else(|| LiveSimError::UnknownSignal(name.to_string()))?;
        if slot.width() != value.width() {
            return Err(LiveSimError::Simulator(format!(
                "`{name}` is {} bits, got {}",
                slot.width(),
                value.width()
            )));
        }
        *slot = value.clone();
        Ok(())
    }

    fn peek(&mut self, name: &str) -> Result<LogicVec, LiveSimError> {
        self.ports
            .get(name)
            .cloned()
            .ok_or_else(|| LiveSimError::UnknownSignal(name.to_string()))
    }

    fn eval(&mut self) -> Result<(), LiveSimError> {
        (self.model)(&mut self.ports);
        Ok(())
    }

    fn step(&mut self, clock: &str, count: u32) -> Result<(), LiveSimError> {
        for _ in 0..count {
            let slot = self
                .ports
                .values
                .get_mut(clock)
                .ok_or_else(|| LiveSimError::UnknownSignal(clock.to_string()))?;
            let next = match slot.get(0) {
                Logic::One => Logic::Zero,
                _ => Logic::One,
            };
            slot.set(0, next);
            self.eval()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use vigil_signal::{Direction, SignalType};

    fn circuit() -> Circuit {
        Circuit::new("Inc")
            .with_port("CLK", Direction::In, SignalType::Digital)
            .with_port("I", Direction::In, SignalType::bits(4))
            .with_port("O", Direction::Out, SignalType::bits(4))
            .with_port("Q", Direction::Out, SignalType::bits(4))
    }

    /// O = I + 1, and Q counts rising clock edges.
    fn model() -> ModelSim {
        let mut last_clk = 0;
        ModelSim::new(&circuit(), move |ports| {
            let i = ports.get_int("I").unwrap_or(0);
            ports.set_int("O", i + 1);
            let clk = ports.get_int("CLK").unwrap_or(0);
            if clk == 1 && last_clk == 0 {
                let q = ports.get_int("Q").unwrap_or(0);
                ports.set_int("Q", q + 1);
            }
            last_clk = clk;
        })
        .unwrap()
    }

    #[test]
    fn ports_start_at_zero() {
        let sim = model();
        let names: Vec<&str> = sim.ports().names().collect();
        assert_eq!(names, vec!["CLK", "I", "O", "Q"]);
        assert_eq!(sim.ports().get_int("O"), Some(0));
    }

    #[test]
    fn poke_eval_peek() {
        let mut sim = model();
        sim.poke("I", &LogicVec::from_u64(4, 4)).unwrap();
        sim.eval().unwrap();
        assert_eq!(sim.peek("O").unwrap(), LogicVec::from_u64(5, 4));
    }

    #[test]
    fn step_toggles_and_evaluates() {
        let mut sim = model();
        sim.step("CLK", 4).unwrap();
        assert_eq!(sim.ports().get_int("Q"), Some(2));
        assert_eq!(sim.ports().get_int("CLK"), Some(0));
    }

    #[test]
    fn unknown_and_mis_sized_signals() {
        let mut sim = model();
        assert!(matches!(sim.peek("Z"), Err(LiveSimError::UnknownSignal(_))));
        assert!(matches!(
            sim.poke("I", &LogicVec::from_u64(1, 3)),
            Err(LiveSimError::Simulator(_))
        ));
    }

    #[test]
    fn serve_line_protocol() {
        let mut sim = model();
        let mut input = Cursor::new("poke I 4'h2\neval\npeek O\nbogus\npeek Z\nquit\npeek O\n");
        let mut output = Vec::new();
        sim.serve(&mut input, &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ok");
        assert_eq!(lines[1], "ok");
        assert_eq!(lines[2], "4'h3");
        assert!(lines[3].starts_with("error: unknown request"));
        assert_eq!(lines[4], "error: unknown signal `Z`");
        assert_eq!(lines[5], "ok");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn process_sim_against_served_model() {
        let mut served = model();
        let mut requests = Cursor::new("poke I 4'h7\neval\npeek O\n");
        let mut responses = Vec::new();
        served.serve(&mut requests, &mut responses).unwrap();

        let mut client = ProcessSim::new(Cursor::new(responses), Vec::new());
        client.poke("I", &LogicVec::from_u64(7, 4)).unwrap();
        client.eval().unwrap();
        assert_eq!(client.peek("O").unwrap(), LogicVec::from_u64(8, 4));
        let sent = String::from_utf8(client.writer.clone()).unwrap();
        assert_eq!(sent, "poke I 4'h7\neval\npeek O\n");
        assert!(matches!(client.eval(), Err(LiveSimError::Protocol(_))));
    }

    #[test]
    fn process_sim_surfaces_simulator_errors() {
        let mut client = ProcessSim::new(Cursor::new("error: no such port\n4'h1\n"), Vec::new());
        assert!(matches!(
            client.poke("X", &LogicVec::from_u64(1, 1)),
            Err(LiveSimError::Simulator(msg)) if msg == "no such port"
        ));
        assert!(matches!(client.eval(), Err(LiveSimError::Protocol(_))));
    }

    #[test]
    fn spawn_empty_command_fails() {
        let err = SpawnedSim::spawn(&[], Path::new(".")).err().unwrap();
        assert!(matches!(err, LiveSimError::Protocol(_)));
    }
}
