//! Providers Module - External Data Sources
//!
//! Chain nodes, the completion API and block explorers.

pub mod explorer;
pub mod llm;
pub mod rpc;

pub use explorer::*;
pub use llm::*;
pub use rpc::*;
