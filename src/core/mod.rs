//! Core Module - Detection & Scoring
//!
//! Pattern tables, the score aggregator and the detectors built on them.

pub mod cross_chain;
pub mod patterns;
pub mod risk_engine;
pub mod risk_score;
pub mod scanner;
pub mod whale;

pub use cross_chain::*;
pub use patterns::*;
pub use risk_engine::*;
pub use risk_score::*;
pub use scanner::*;
pub use whale::*;
