//! Authentication module for Azure Resource Manager
//!
//! Credential providers used to obtain bearer tokens for management-plane
//! calls, via DefaultAzureCredential or a client secret.

pub mod provider;

pub use provider::*;
