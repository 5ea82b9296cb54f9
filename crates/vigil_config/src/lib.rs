//! Parsing and validation of `vigil.toml` configuration files.
//!
//! This crate reads the project configuration and produces a strongly-typed
//! [`VigilConfig`] holding per-backend settings and the names of the files
//! each backend writes.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, validate_config};
pub use types::*;
