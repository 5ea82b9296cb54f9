//! Shared foundational types used across the Vigil test harness.
//!
//! This crate provides 4-state logic values, packed logic vectors with
//! two's-complement helpers, and the internal error type.

#![warn(missing_docs)]

pub mod logic;
pub mod logic_vec;
pub mod result;

pub use logic::Logic;
pub use logic_vec::LogicVec;
pub use result::{InternalError, VigilResult};
