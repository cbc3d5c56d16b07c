//! API Request/Response Types

use serde::{Deserialize, Serialize};

use crate::core::scanner::{InteractionPatterns, TokenFlow, TransactionRecord};
use crate::core::whale::WhaleAlert;
use crate::models::{AppError, ErrorCode};
use crate::reports::governance::ProposalDetails;
use crate::utils::cache::CacheStats;
use crate::utils::constants::{DEFAULT_CHAIN_KEY, MAX_SCAN_BLOCKS};
use crate::utils::telemetry::TelemetryStats;

/// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// API Error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn rate_limited(retry_after: u64) -> Self {
        Self {
            code: ErrorCode::ApiRateLimited.as_str().to_string(),
            message: format!("Rate limit exceeded. Retry after {} seconds", retry_after),
            details: Some(format!("retry_after: {}", retry_after)),
        }
    }
}

impl From<&AppError> for ApiError {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code_str().to_string(),
            message: err.message.clone(),
            details: None,
        }
    }
}

// ============================================
// Requests
// ============================================

pub fn default_chain() -> String {
    DEFAULT_CHAIN_KEY.to_string()
}

/// Address on one chain
#[derive(Debug, Clone, Deserialize)]
pub struct ChainRequest {
    pub address: String,
    #[serde(default = "default_chain")]
    pub chain: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuditRequest {
    pub address: String,
    #[serde(default = "default_chain")]
    pub chain: String,
    /// Verified source; looked up on the explorer when absent
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrossChainRequest {
    pub address: String,
    pub source_chain: String,
    #[serde(default)]
    pub target_chains: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportRequest {
    pub contract_address: String,
    /// security, governance or activity
    pub report_type: String,
    #[serde(default = "default_chain")]
    pub chain: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProposalRequest {
    pub proposal_id: String,
    pub dao_address: String,
    #[serde(default)]
    pub details: Option<ProposalDetails>,
}

/// `?max_blocks=` on the scan endpoints, 1..=5000
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MaxBlocksQuery {
    pub max_blocks: Option<u64>,
}

impl MaxBlocksQuery {
    pub fn validate(&self) -> Result<Option<u64>, AppError> {
        match self.max_blocks {
            Some(n) if n == 0 || n > MAX_SCAN_BLOCKS => Err(AppError::bad_request(format!(
                "max_blocks must be between 1 and {}",
                MAX_SCAN_BLOCKS
            ))),
            other => Ok(other),
        }
    }
}

/// `?chain=` on the whale alert endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChainQuery {
    pub chain: Option<String>,
}

// ============================================
// Responses
// ============================================

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionsData {
    pub transactions: Vec<TransactionRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenFlowsData {
    pub token_flows: Vec<TokenFlow>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InteractionsData {
    pub interaction_patterns: InteractionPatterns,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WhaleAlertsData {
    pub chain: String,
    pub min_amount: f64,
    pub lookback_blocks: u64,
    pub alerts: Vec<WhaleAlert>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsData {
    pub telemetry: TelemetryStats,
    pub cache: CacheStats,
    pub chains: Vec<String>,
    pub llm_configured: bool,
    pub uptime_seconds: u64,
    pub api_version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_defaults_to_avalanche() {
        let req: ChainRequest = serde_json::from_str(r#"{"address":"0x00"}"#).unwrap();
        assert_eq!(req.chain, "avalanche");
    }

    #[test]
    fn test_max_blocks_bounds() {
        assert_eq!(MaxBlocksQuery { max_blocks: None }.validate().unwrap(), None);
        assert_eq!(MaxBlocksQuery { max_blocks: Some(1) }.validate().unwrap(), Some(1));
        assert_eq!(MaxBlocksQuery { max_blocks: Some(5000) }.validate().unwrap(), Some(5000));
        assert!(MaxBlocksQuery { max_blocks: Some(0) }.validate().is_err());
        assert!(MaxBlocksQuery { max_blocks: Some(5001) }.validate().is_err());
    }

    #[test]
    fn test_error_envelope() {
        let err = AppError::bad_request("nope");
        let json = serde_json::to_value(ApiResponse::error(ApiError::from(&err), 1.5)).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "API_BAD_REQUEST");
        assert!(json.get("data").is_none());
    }
}
