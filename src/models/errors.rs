//! Centralized Error Handling Module
//!
//! Every failure that reaches the API edge carries a unique error code so it
//! can be grepped in logs and mapped to an HTTP status.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - RPC_xxx: chain node errors
//! - LLM_xxx: completion API errors
//! - API_xxx: request errors
//! - CFG_xxx: configuration errors

use std::fmt;

use crate::providers::rpc::{HttpStatusError, RpcError};

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // RPC Errors
    // ============================================
    /// RPC connection failed
    RpcConnectionFailed,
    /// RPC request timeout
    RpcTimeout,
    /// RPC rate limited (HTTP 429 or node rate limit error)
    RpcRateLimited,
    /// RPC returned error response
    RpcError,
    /// RPC body could not be decoded
    RpcInvalidResponse,

    // ============================================
    // LLM Errors
    // ============================================
    /// No completion API configured
    LlmNotConfigured,
    /// Completion API returned an error or no content
    LlmError,

    // ============================================
    // API Errors
    // ============================================
    /// Invalid request format
    ApiBadRequest,
    /// Rate limit exceeded
    ApiRateLimited,
    /// Endpoint intentionally not implemented
    ApiNotImplemented,

    // ============================================
    // Input Errors
    // ============================================
    /// Unknown chain identifier
    ConfigUnsupportedChain,
    /// Invalid contract / account address
    InvalidAddress,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RpcConnectionFailed => "RPC_CONNECTION_FAILED",
            Self::RpcTimeout => "RPC_TIMEOUT",
            Self::RpcRateLimited => "RPC_RATE_LIMITED",
            Self::RpcError => "RPC_ERROR",
            Self::RpcInvalidResponse => "RPC_INVALID_RESPONSE",

            Self::LlmNotConfigured => "LLM_NOT_CONFIGURED",
            Self::LlmError => "LLM_ERROR",

            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiRateLimited => "API_RATE_LIMITED",
            Self::ApiNotImplemented => "API_NOT_IMPLEMENTED",

            Self::ConfigUnsupportedChain => "CFG_UNSUPPORTED_CHAIN",
            Self::InvalidAddress => "INVALID_ADDRESS",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest | Self::InvalidAddress | Self::ConfigUnsupportedChain => 400,
            Self::ApiRateLimited => 429,
            Self::ApiNotImplemented => 501,
            Self::RpcConnectionFailed
            | Self::RpcError
            | Self::RpcInvalidResponse
            | Self::RpcRateLimited
            | Self::LlmError => 502,
            Self::LlmNotConfigured => 503,
            Self::RpcTimeout => 504,
        }
    }
}

/// Most specific RPC code found anywhere in the report chain
fn classify_rpc(err: &eyre::Report) -> ErrorCode {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<reqwest::Error>() {
            if e.is_timeout() {
                return ErrorCode::RpcTimeout;
            }
            if e.is_connect() {
                return ErrorCode::RpcConnectionFailed;
            }
            if e.is_decode() {
                return ErrorCode::RpcInvalidResponse;
            }
        }
        if let Some(e) = cause.downcast_ref::<HttpStatusError>() {
            if e.is_rate_limit() {
                return ErrorCode::RpcRateLimited;
            }
        }
        if let Some(e) = cause.downcast_ref::<RpcError>() {
            if e.is_rate_limit() {
                return ErrorCode::RpcRateLimited;
            }
        }
    }
    ErrorCode::RpcError
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// Chain node failure; the report chain is kept in the message
    pub fn rpc(err: eyre::Report) -> Self {
        Self::new(classify_rpc(&err), format!("{:#}", err))
    }

    pub fn llm(err: eyre::Report) -> Self {
        Self::new(ErrorCode::LlmError, format!("{:#}", err))
    }

    pub fn llm_not_configured() -> Self {
        Self::new(
            ErrorCode::LlmNotConfigured,
            "No LLM API key configured (set OPENAI_API_KEY)",
        )
    }

    pub fn invalid_address(address: &str) -> Self {
        Self::new(
            ErrorCode::InvalidAddress,
            format!("Invalid address format: {}", address),
        )
    }

    pub fn unsupported_chain(chain: &str) -> Self {
        Self::new(
            ErrorCode::ConfigUnsupportedChain,
            format!("Unsupported chain: {}", chain),
        )
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }

    pub fn not_implemented(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiNotImplemented, msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::unsupported_chain("solana");
        assert_eq!(err.code, ErrorCode::ConfigUnsupportedChain);
        assert_eq!(err.code_str(), "CFG_UNSUPPORTED_CHAIN");
        assert!(err.to_string().contains("solana"));
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::ApiBadRequest.http_status(), 400);
        assert_eq!(ErrorCode::InvalidAddress.http_status(), 400);
        assert_eq!(ErrorCode::RpcError.http_status(), 502);
        assert_eq!(ErrorCode::RpcTimeout.http_status(), 504);
        assert_eq!(ErrorCode::LlmNotConfigured.http_status(), 503);
        assert_eq!(ErrorCode::ApiNotImplemented.http_status(), 501);
    }

    #[test]
    fn test_rpc_error_keeps_context() {
        let report = eyre::eyre!("connection refused").wrap_err("eth_blockNumber failed");
        let err = AppError::rpc(report);
        assert_eq!(err.code, ErrorCode::RpcError);
        assert!(err.message.contains("eth_blockNumber failed"));
        assert!(err.message.contains("connection refused"));
    }

    #[test]
    fn test_rpc_rate_limits_are_classified() {
        let http = eyre::Report::new(HttpStatusError { status: 429 })
            .wrap_err("All RPC endpoints failed for avalanche (eth_blockNumber)");
        assert_eq!(AppError::rpc(http).code, ErrorCode::RpcRateLimited);

        let node = eyre::Report::new(RpcError { code: -32005, message: "limit".to_string() })
            .wrap_err("eth_getLogs failed on ethereum");
        assert_eq!(AppError::rpc(node).code, ErrorCode::RpcRateLimited);

        let other = eyre::Report::new(HttpStatusError { status: 503 });
        assert_eq!(AppError::rpc(other).code, ErrorCode::RpcError);
    }
}
