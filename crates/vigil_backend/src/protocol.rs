//! The line protocol spoken between the interactive driver and a simulator
//! server.
//!
//! One request per line, one response per request:
//!
//! ```text
//! poke <name> <literal>   -> ok
//! peek <name>             -> <literal>
//! eval                    -> ok
//! step <clock> <count>    -> ok
//! quit                    -> ok
//! ```
//!
//! Literals are sized Verilog literals such as `3'h5` or `4'b1x01`. Any
//! request may instead be answered with `error: <message>`.

use std::fmt;
use vigil_common::LogicVec;
use vigil_value::{parse_verilog_literal, verilog_literal};

/// A request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Drive a signal.
    Poke {
        /// The signal name.
        name: String,
        /// The value, at the signal's width.
        value: LogicVec,
    },
    /// Read a signal.
    Peek {
        /// The signal name.
        name: String,
    },
    /// Settle combinational logic.
    Eval,
    /// Toggle a clock `count` times, settling after each toggle.
    Step {
        /// The clock name.
        clock: String,
        /// The number of toggles.
        count: u32,
    },
    /// End the session.
    Quit,
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Poke { name, value } => write!(f, "poke {name} {}", verilog_literal(value)),
            Request::Peek { name } => write!(f, "peek {name}"),
            Request::Eval => write!(f, "eval"),
            Request::Step { clock, count } => write!(f, "step {clock} {count}"),
            Request::Quit => write!(f, "quit"),
        }
    }
}

/// Parses one request line.
pub fn parse_request(input: &str) -> Result<Request, String> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    let Some((cmd, args)) = parts.split_first() else {
        return Err("empty request".to_string());
    };

    match (*cmd, args) {
        ("poke", [name, literal]) => {
            let value = parse_verilog_literal(literal).map_err(|e| e.to_string())?;
            Ok(Request::Poke {
                name: name.to_string(),
                value,
            })
        }
        ("poke", _) => Err("poke requires a signal name and a literal".to_string()),
        ("peek", [name]) => Ok(Request::Peek {
            name: name.to_string(),
        }),
        ("peek", _) => Err("peek requires a signal name".to_string()),
        ("eval", []) => Ok(Request::Eval),
        ("step", [clock, count]) => {
            let count = count
                .parse()
                .map_err(|_| format!("invalid step count: '{count}'"))?;
            Ok(Request::Step {
                clock: clock.to_string(),
                count,
            })
        }
        ("step", _) => Err("step requires a clock name and a count".to_string()),
        ("quit", []) => Ok(Request::Quit),
        ("eval" | "quit", _) => Err(format!("{cmd} takes no arguments")),
        _ => Err(format!("unknown request: '{cmd}'")),
    }
}

/// A response line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The request succeeded.
    Ok,
    /// The value a `peek` read.
    Value(LogicVec),
    /// The request failed.
    Error(String),
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Ok => write!(f, "ok"),
            Response::Value(v) => write!(f, "{}", verilog_literal(v)),
            Response::Error(msg) => write!(f, "error: {msg}"),
        }
    }
}

/// Parses one response line.
pub fn parse_response(input: &str) -> Result<Response, String> {
    let trimmed = input.trim();
    if trimmed == "ok" {
        return Ok(Response::Ok);
    }
    if let Some(msg) = trimmed.strip_prefix("error:") {
        return Ok(Response::Error(msg.trim().to_string()));
    }
    if trimmed.is_empty() {
        return Err("empty response".to_string());
    }
    parse_verilog_literal(trimmed)
        .map(Response::Value)
        .map_err(|e| format!("unexpected response '{trimmed}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_poke() {
        assert_eq!(
            parse_request("poke I 3'h5").unwrap(),
            Request::Poke {
                name: "I".into(),
                value: LogicVec::from_u64(5, 3),
            }
        );
    }

    #[test]
    fn parse_simple_requests() {
        assert_eq!(
            parse_request("peek O_a").unwrap(),
            Request::Peek { name: "O_a".into() }
        );
        assert_eq!(parse_request("  eval ").unwrap(), Request::Eval);
        assert_eq!(
            parse_request("step CLK 4").unwrap(),
            Request::Step {
                clock: "CLK".into(),
                count: 4
            }
        );
        assert_eq!(parse_request("quit").unwrap(), Request::Quit);
    }

    #[test]
    fn parse_request_errors() {
        assert!(parse_request("").is_err());
        assert!(parse_request("poke I").is_err());
        assert!(parse_request("poke I 5").is_err());
        assert!(parse_request("peek").is_err());
        assert!(parse_request("step CLK many").is_err());
        assert!(parse_request("eval now").is_err());
        let err = parse_request("frobnicate").unwrap_err();
        assert!(err.contains("unknown request"));
    }

    #[test]
    fn request_lines() {
        let poke = Request::Poke {
            name: "I".into(),
            value: LogicVec::from_binary_str("1x0").unwrap(),
        };
        assert_eq!(poke.to_string(), "poke I 3'b1x0");
        assert_eq!(parse_request(&poke.to_string()).unwrap(), poke);
        assert_eq!(
            Request::Step {
                clock: "CLK".into(),
                count: 2
            }
            .to_string(),
            "step CLK 2"
        );
    }

    #[test]
    fn parse_responses() {
        assert_eq!(parse_response("ok\n").unwrap(), Response::Ok);
        assert_eq!(
            parse_response("4'hb").unwrap(),
            Response::Value(LogicVec::from_u64(11, 4))
        );
        assert_eq!(
            parse_response("error: unknown signal Q").unwrap(),
            Response::Error("unknown signal Q".into())
        );
        assert!(parse_response("").is_err());
        assert!(parse_response("banana").is_err());
    }
}
