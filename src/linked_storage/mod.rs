//! Log Analytics linked storage accounts
//!
//! Identifiers, validation, the management-plane client and the lifecycle
//! hooks for associating storage accounts with a workspace data source type.

pub mod client;
pub mod ids;
pub mod manager;
pub mod models;
pub mod resource;
pub mod schema;

pub use client::*;
pub use ids::*;
pub use manager::*;
pub use models::*;
pub use resource::*;
pub use schema::{Plan, ValidatedConfig};
