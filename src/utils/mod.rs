//! Utils Module - shared helpers
//!
//! Constants, ABI decoding, the audit cache and in-memory telemetry.

pub mod cache;
pub mod constants;
pub mod decoder;
pub mod telemetry;

pub use cache::*;
pub use constants::*;
pub use decoder::*;
pub use telemetry::*;
