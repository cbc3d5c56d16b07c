//! TrustMesh Library
//!
//! Smart contract risk backend over EVM JSON-RPC:
//! - Keyword heuristics over bytecode and source, scored by a clamped aggregator
//! - Cross-chain bridge probes and chain presence maps
//! - Transaction, token flow and whale scans over recent blocks
//! - LLM reports and DAO proposal analysis

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod reports;
pub mod utils;

pub use crate::core::risk_engine::{audit_contract, ContractAudit, ContractType};
pub use crate::core::risk_score::{aggregate, LevelScale, RiskScore, ScoreAggregator};
pub use crate::models::{AppConfig, AppError, ErrorCode, Finding, RiskLevel};
pub use crate::providers::{ChainRpc, LlmClient, RpcRegistry};
