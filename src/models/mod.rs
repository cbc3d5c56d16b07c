//! Models Module - Data Structures & Configuration
//!
//! Shared records, configuration and the error taxonomy.

pub mod chain;
pub mod config;
pub mod errors;
pub mod types;

pub use chain::*;
pub use config::*;
pub use errors::*;
pub use types::*;
