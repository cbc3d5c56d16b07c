//! RPC Client Module - Multi-Chain JSON-RPC
//!
//! 1. `ChainRpc` is the seam every scanner and analyzer talks to
//! 2. `RpcProvider` speaks JSON-RPC over HTTP with gzip, a user agent,
//!    exponential backoff with jitter and a public fallback endpoint
//! 3. Block windows are fetched as batches of at most 50 requests
//! 4. `RpcRegistry` holds one client per configured chain
//!
//! Chain metadata comes from utils/constants.rs via `AppConfig`.

use alloy_primitives::{Address, Bytes, B256, U64};
use async_trait::async_trait;
use eyre::{eyre, Result, WrapErr};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::models::{AppConfig, Block, ChainConfig, Log, LogFilter, Receipt};
use crate::utils::constants::{chain_id_from_key, chain_key, USER_AGENT as USER_AGENT_CONST};

// ============================================
// RETRY CONSTANTS
// ============================================

/// Maximum batch size per HTTP request
pub const MAX_BATCH_SIZE: usize = 50;

/// Base retry delay in milliseconds
pub const BASE_RETRY_MS: u64 = 500;

/// Maximum retry delay in milliseconds
pub const MAX_RETRY_MS: u64 = 4000;

/// Attempts per endpoint (first try included)
pub const MAX_RETRIES: u32 = 3;

/// Jitter percentage applied to every retry delay
pub const RETRY_JITTER_PERCENT: u64 = 20;

/// Delay before retry `attempt` (1-based): 500ms → 1s → 2s → 4s, ±20%
pub fn retry_delay(attempt: u32) -> Duration {
    let base_delay = BASE_RETRY_MS.saturating_mul(2_u64.saturating_pow(attempt.saturating_sub(1)));
    let capped_delay = base_delay.min(MAX_RETRY_MS);

    let jitter_range = (capped_delay * RETRY_JITTER_PERCENT) / 100;
    let jitter: i64 = rand::thread_rng().gen_range(-(jitter_range as i64)..=(jitter_range as i64));
    let final_delay = (capped_delay as i64 + jitter).max(100) as u64;

    Duration::from_millis(final_delay)
}

// ============================================
// CHAIN RPC SEAM
// ============================================

/// Read-only view of one chain node.
///
/// Every method may fail; callers walking a block window skip failed items.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Chain key this client talks to, e.g. "avalanche"
    fn chain(&self) -> &str;

    async fn latest_block_number(&self) -> Result<u64>;

    async fn get_block(&self, number: u64, include_transactions: bool) -> Result<Block>;

    /// Fetch several blocks; one result per requested number, same order
    async fn get_blocks(&self, numbers: &[u64], include_transactions: bool) -> Vec<Result<Block>> {
        let mut blocks = Vec::with_capacity(numbers.len());
        for &number in numbers {
            blocks.push(self.get_block(number, include_transactions).await);
        }
        blocks
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<Log>>;

    async fn get_transaction_receipt(&self, hash: B256) -> Result<Receipt>;

    /// Deployed bytecode; empty for externally owned accounts
    async fn get_code(&self, address: Address) -> Result<Bytes>;

    /// Read-only `eth_call` against the latest block
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;
}

// ============================================
// JSON-RPC WIRE TYPES
// ============================================

/// Batch JSON-RPC request item
#[derive(Debug, Clone, Serialize)]
pub struct BatchRequestItem {
    pub jsonrpc: &'static str,
    pub method: String,
    pub params: serde_json::Value,
    pub id: u64,
}

/// Batch JSON-RPC response item
#[derive(Debug, Clone, Deserialize)]
pub struct BatchResponseItem<T> {
    pub result: Option<T>,
    pub error: Option<RpcError>,
    pub id: u64,
}

/// JSON-RPC response structure
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

/// JSON-RPC error structure
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    /// Rate limit error (code -32005 or message)
    pub fn is_rate_limit(&self) -> bool {
        self.code == -32005 || self.message.to_lowercase().contains("rate limit")
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RPC error: {} (code: {})", self.message, self.code)
    }
}

impl std::error::Error for RpcError {}

/// Non-success HTTP status from a node endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpStatusError {
    pub status: u16,
}

impl HttpStatusError {
    pub fn is_rate_limit(&self) -> bool {
        self.status == 429
    }
}

impl fmt::Display for HttpStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_rate_limit() {
            write!(f, "Rate limited (HTTP 429)")
        } else {
            write!(f, "HTTP error: {}", self.status)
        }
    }
}

impl std::error::Error for HttpStatusError {}

/// Order batch results by request id; missing ids become errors
fn collect_batch<T>(items: Vec<BatchResponseItem<T>>, expected: usize) -> Vec<Result<T>> {
    let mut by_id: HashMap<u64, BatchResponseItem<T>> =
        items.into_iter().map(|item| (item.id, item)).collect();

    (1..=expected as u64)
        .map(|id| match by_id.remove(&id) {
            Some(BatchResponseItem { error: Some(error), .. }) => Err(eyre::Report::new(error)),
            Some(BatchResponseItem { result: Some(result), .. }) => Ok(result),
            Some(_) => Err(eyre!("No result in response for id {}", id)),
            None => Err(eyre!("Missing batch response for id {}", id)),
        })
        .collect()
}

// ============================================
// HTTP PROVIDER
// ============================================

/// JSON-RPC over HTTP with retry logic and fallback support
#[derive(Clone)]
pub struct RpcProvider {
    primary_url: String,
    fallback_url: Option<String>,
    /// HTTP client with custom headers (gzip enabled)
    client: reqwest::Client,
    chain_id: u64,
    chain: String,
}

impl RpcProvider {
    /// Create a provider for a configured chain
    pub fn new(chain: &ChainConfig, timeout: Duration) -> Result<Self> {
        let client = Self::build_client(timeout)?;

        Ok(Self {
            primary_url: chain.rpc_url.clone(),
            fallback_url: chain.fallback_url.clone(),
            client,
            chain_id: chain.chain_id,
            chain: chain.key.clone(),
        })
    }

    /// Build HTTP client with custom headers and gzip decompression
    fn build_client(timeout: Duration) -> Result<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {}", e))
    }

    /// Execute JSON-RPC call with retry logic and fallback
    pub async fn request<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let primary_err = match self.call_with_retry(&self.primary_url, &payload).await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        // A node-level error (revert, bad params) would repeat on the fallback
        if primary_err.downcast_ref::<RpcError>().is_some() {
            return Err(primary_err.wrap_err(format!("{} failed on {}", method, self.chain)));
        }
        warn!("⚠️ Primary RPC failed on {} ({}): {:#}", self.chain, method, primary_err);

        if let Some(ref fallback) = self.fallback_url {
            info!("🔄 Trying fallback RPC for {}", self.chain);
            match self.call_with_retry(fallback, &payload).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    warn!("⚠️ Fallback RPC also failed: {:#}", e);
                }
            }
        }

        Err(primary_err.wrap_err(format!("All RPC endpoints failed for {} ({})", self.chain, method)))
    }

    /// Exponential backoff with jitter; deterministic node errors are not retried
    async fn call_with_retry<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<T> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = retry_delay(attempt);
                debug!("⏳ Retry {}/{} after {}ms", attempt + 1, MAX_RETRIES, delay.as_millis());
                tokio::time::sleep(delay).await;
            }

            match self.execute_call::<T>(url, payload).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if let Some(rpc_err) = e.downcast_ref::<RpcError>() {
                        if !rpc_err.is_rate_limit() {
                            return Err(e);
                        }
                        warn!("⏳ Rate limited by node, backing off (attempt {}/{})", attempt + 1, MAX_RETRIES);
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| eyre!("Unknown error after {} retries", MAX_RETRIES)))
    }

    /// Execute single RPC call
    async fn execute_call<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<T> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .wrap_err("Request failed")?;

        let status = response.status();
        if !status.is_success() {
            return Err(eyre::Report::new(HttpStatusError { status: status.as_u16() }));
        }

        let json: RpcResponse<T> = response.json().await.wrap_err("Failed to parse response")?;

        if let Some(error) = json.error {
            return Err(eyre::Report::new(error));
        }

        json.result.ok_or_else(|| eyre!("No result in response"))
    }

    /// Execute batch JSON-RPC calls, at most 50 per HTTP request
    pub async fn batch_request<T: for<'de> Deserialize<'de>>(
        &self,
        requests: Vec<(&str, serde_json::Value)>,
    ) -> Result<Vec<Result<T>>> {
        let mut all_results = Vec::with_capacity(requests.len());

        for chunk in requests.chunks(MAX_BATCH_SIZE) {
            let batch_payload: Vec<BatchRequestItem> = chunk
                .iter()
                .enumerate()
                .map(|(idx, (method, params))| BatchRequestItem {
                    jsonrpc: "2.0",
                    method: method.to_string(),
                    params: params.clone(),
                    id: idx as u64 + 1,
                })
                .collect();

            let results = self.execute_batch::<T>(&batch_payload).await?;
            all_results.extend(results);
        }

        Ok(all_results)
    }

    /// Execute batch request with retry against the primary endpoint
    async fn execute_batch<T: for<'de> Deserialize<'de>>(
        &self,
        batch_payload: &[BatchRequestItem],
    ) -> Result<Vec<Result<T>>> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                tokio::time::sleep(retry_delay(attempt)).await;
            }

            let response = self.client.post(&self.primary_url).json(batch_payload).send().await;

            match response {
                Ok(resp) => {
                    let status = resp.status();
                    if !status.is_success() {
                        last_error = Some(eyre::Report::new(HttpStatusError { status: status.as_u16() }));
                        continue;
                    }

                    let batch_response: Vec<BatchResponseItem<T>> =
                        resp.json().await.wrap_err("Failed to parse batch response")?;

                    return Ok(collect_batch(batch_response, batch_payload.len()));
                }
                Err(e) => {
                    last_error = Some(eyre::Report::new(e).wrap_err("Request failed"));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| eyre!("Batch request failed after {} retries", MAX_RETRIES)))
    }

    /// Get RPC URL (masked for logging)
    pub fn masked_url(&self) -> String {
        mask_url(&self.primary_url)
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

/// Hide API keys embedded in provider URLs
pub fn mask_url(url: &str) -> String {
    if let Some((head, _)) = url.split_once("/v2/") {
        return format!("{}/v2/***HIDDEN***", head);
    }
    if let Some((head, _)) = url.split_once('?') {
        return format!("{}?***HIDDEN***", head);
    }
    url.to_string()
}

fn block_params(number: u64, include_transactions: bool) -> serde_json::Value {
    serde_json::json!([format!("0x{:x}", number), include_transactions])
}

#[async_trait]
impl ChainRpc for RpcProvider {
    fn chain(&self) -> &str {
        &self.chain
    }

    async fn latest_block_number(&self) -> Result<u64> {
        let number: U64 = self.request("eth_blockNumber", serde_json::json!([])).await?;
        Ok(number.to::<u64>())
    }

    async fn get_block(&self, number: u64, include_transactions: bool) -> Result<Block> {
        self.request("eth_getBlockByNumber", block_params(number, include_transactions))
            .await
            .wrap_err_with(|| format!("block {} unavailable", number))
    }

    async fn get_blocks(&self, numbers: &[u64], include_transactions: bool) -> Vec<Result<Block>> {
        let requests: Vec<(&str, serde_json::Value)> = numbers
            .iter()
            .map(|&n| ("eth_getBlockByNumber", block_params(n, include_transactions)))
            .collect();

        match self.batch_request::<Block>(requests).await {
            Ok(blocks) => blocks,
            Err(e) => {
                warn!("⚠️ Batch block fetch failed on {}, falling back to single requests: {:#}", self.chain, e);
                let mut blocks = Vec::with_capacity(numbers.len());
                for &number in numbers {
                    blocks.push(self.get_block(number, include_transactions).await);
                }
                blocks
            }
        }
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<Log>> {
        self.request("eth_getLogs", serde_json::json!([filter.to_params()])).await
    }

    async fn get_transaction_receipt(&self, hash: B256) -> Result<Receipt> {
        self.request("eth_getTransactionReceipt", serde_json::json!([hash])).await
    }

    async fn get_code(&self, address: Address) -> Result<Bytes> {
        self.request("eth_getCode", serde_json::json!([address, "latest"])).await
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let params = serde_json::json!([{ "to": to, "data": data }, "latest"]);
        self.request("eth_call", params).await
    }
}

// ============================================
// REGISTRY
// ============================================

/// One RPC client per chain key
#[derive(Clone, Default)]
pub struct RpcRegistry {
    providers: HashMap<String, Arc<dyn ChainRpc>>,
}

impl RpcRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// HTTP providers for every configured chain
    pub fn from_config(config: &AppConfig) -> Self {
        let mut registry = Self::new();

        for chain in config.chains.values() {
            match RpcProvider::new(chain, config.rpc_timeout) {
                Ok(provider) => {
                    info!("✅ Initialized RPC for {} ({})", chain.name, provider.masked_url());
                    registry.insert(chain.key.clone(), Arc::new(provider));
                }
                Err(e) => {
                    warn!("⚠️ Failed to initialize RPC for {}: {}", chain.name, e);
                }
            }
        }

        registry
    }

    pub fn insert(&mut self, key: impl Into<String>, provider: Arc<dyn ChainRpc>) {
        self.providers.insert(key.into(), provider);
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, provider: Arc<dyn ChainRpc>) -> Self {
        self.insert(key, provider);
        self
    }

    /// Look up by key, alias or numeric chain id
    pub fn get(&self, name: &str) -> Option<Arc<dyn ChainRpc>> {
        if let Some(provider) = self.providers.get(name) {
            return Some(provider.clone());
        }
        let key = chain_id_from_key(name).and_then(chain_key)?;
        self.providers.get(key).cloned()
    }

    /// Configured chain keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.providers.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
