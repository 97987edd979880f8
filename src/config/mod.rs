//! Configuration management module
//!
//! This module handles configuration loading and validation from
//! environment variables, configuration files and default values, and the
//! persisted local state of managed resources.

pub mod settings;
pub mod state;

pub use settings::*;
pub use state::*;
