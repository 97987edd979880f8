//! Utility functions module
//!
//! HTTP client construction, network error classification, retry with
//! backoff, and output formatting.

pub mod format;
pub mod network;
pub mod retry;

pub use format::*;
pub use network::*;
pub use retry::*;
