//! Command-line interface module
//!
//! Argument parsing and command dispatch for the lalink binary.

pub mod commands;

pub use commands::*;
