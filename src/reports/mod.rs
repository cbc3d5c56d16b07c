//! Report assemblers: cross-chain reports, LLM reports and proposal analysis

pub mod cross_chain;
pub mod governance;
pub mod llm_report;
pub mod prose;

pub use cross_chain::*;
pub use governance::*;
pub use llm_report::*;
pub use prose::*;
