//! lalink - Log Analytics linked storage account management
//!
//! Create, refresh, update and delete the association between a Log
//! Analytics workspace data source type and the storage accounts that hold
//! its data, through Azure Resource Manager.

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod linked_storage;
pub mod utils;

// Re-export commonly used types
pub use error::{LalinkError, Result};
