//! Vigil CLI: compiles hardware test programs for simulation backends.
//!
//! Provides `vigil emit` to write backend artifacts for a test file, `vigil
//! run` to emit and execute them and report the verdict, `vigil lvs` to
//! write and run a layout-vs-schematic job, and `vigil backends` to list
//! what is configured.

#![warn(missing_docs)]

mod backends;
mod emit;
mod lvs;
mod project;
mod report;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Vigil: one test program, many simulators.
#[derive(Parser, Debug)]
#[command(name = "vigil", version, about = "Backend-independent hardware test compiler")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `vigil.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Output format for diagnostics.
    #[arg(long, global = true, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write backend artifacts for a test file.
    Emit(EmitArgs),
    /// Emit, run the backend tools, and report the verdict.
    Run(EmitArgs),
    /// Write the layout-vs-schematic job and optionally run it.
    Lvs(LvsArgs),
    /// List the configured backends.
    Backends,
}

/// Arguments shared by `vigil emit` and `vigil run`.
#[derive(Parser, Debug)]
pub struct EmitArgs {
    /// JSON test file describing the circuit and its actions.
    pub test: PathBuf,

    /// Backends to target (repeatable). Defaults to every static backend
    /// that accepts stimulus.
    #[arg(short, long = "backend")]
    pub backends: Vec<String>,

    /// Directory to write artifacts under (default: the project build dir).
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Stop at the first failed expectation.
    #[arg(long)]
    pub stop_on_first_failure: bool,
}

/// Arguments for the `vigil lvs` subcommand.
#[derive(Parser, Debug)]
pub struct LvsArgs {
    /// Directory to write the job under (default: the project build dir).
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Run `calibre` on the job after writing it.
    #[arg(long)]
    pub run: bool,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output, one object per line.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
    /// How diagnostics are printed.
    pub format: ReportFormat,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::env::var("TERM").is_ok() && std::env::var("NO_COLOR").is_err(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
        format: cli.format,
    };
    init_logging(&global);

    let result = match cli.command {
        Command::Emit(ref args) => emit::run(args, false, &global),
        Command::Run(ref args) => emit::run(args, true, &global),
        Command::Lvs(ref args) => lvs::run(args, &global),
        Command::Backends => backends::run(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the log subscriber. `RUST_LOG` overrides the level the flags
/// select.
fn init_logging(global: &GlobalArgs) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(global.quiet, global.verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn default_filter(quiet: bool, verbose: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_emit_default() {
        let cli = Cli::parse_from(["vigil", "emit", "inv.json"]);
        match cli.command {
            Command::Emit(ref args) => {
                assert_eq!(args.test, PathBuf::from("inv.json"));
                assert!(args.backends.is_empty());
                assert!(args.out_dir.is_none());
                assert!(!args.stop_on_first_failure);
            }
            _ => panic!("expected Emit command"),
        }
    }

    #[test]
    fn parse_run_with_backends() {
        let cli = Cli::parse_from([
            "vigil",
            "run",
            "adder.json",
            "-b",
            "verilator",
            "--backend",
            "system-verilog",
            "--out-dir",
            "out",
            "--stop-on-first-failure",
        ]);
        match cli.command {
            Command::Run(ref args) => {
                assert_eq!(args.backends, vec!["verilator", "system-verilog"]);
                assert_eq!(args.out_dir.as_deref(), Some(std::path::Path::new("out")));
                assert!(args.stop_on_first_failure);
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn parse_lvs() {
        let cli = Cli::parse_from(["vigil", "lvs", "--run"]);
        match cli.command {
            Command::Lvs(ref args) => {
                assert!(args.run);
                assert!(args.out_dir.is_none());
            }
            _ => panic!("expected Lvs command"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from([
            "vigil", "--quiet", "--color", "never", "--format", "json", "backends",
        ]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
        assert_eq!(cli.format, ReportFormat::Json);
        assert!(matches!(cli.command, Command::Backends));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["vigil", "backends", "--verbose", "--config", "x/vigil.toml"]);
        assert!(cli.verbose);
        assert_eq!(cli.config.as_deref(), Some("x/vigil.toml"));
    }

    #[test]
    fn emit_requires_test_file() {
        assert!(Cli::try_parse_from(["vigil", "emit"]).is_err());
    }

    #[test]
    fn log_levels_follow_flags() {
        assert_eq!(default_filter(true, false), "error");
        assert_eq!(default_filter(false, true), "debug");
        assert_eq!(default_filter(false, false), "warn");
        assert_eq!(default_filter(true, true), "error");
    }
}
