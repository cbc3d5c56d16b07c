//! Configuration module for TrustMesh
//!
//! One explicit `AppConfig` is built at startup and handed to every
//! collaborator at construction time. Nothing reads the environment after
//! that point. Chain metadata comes from `utils/constants.rs`.

use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, warn};

use crate::utils::constants::{
    chain_id_from_key, chain_key, get_chain_name, get_explorer_api_url, get_native_symbol,
    get_public_rpc_fallback, rpc_env_keys, DEFAULT_CACHE_TTL_SECS, DEFAULT_CHAIN_KEY,
    DEFAULT_LLM_TIMEOUT_SECS, DEFAULT_RPC_TIMEOUT_SECS, DEFAULT_SCAN_BLOCKS,
    DEFAULT_WHALE_LOOKBACK_BLOCKS, DEFAULT_WHALE_MIN_AMOUNT, GAS_SCAN_BLOCKS, MAX_SCAN_BLOCKS,
    BRIDGE_EVENT_BLOCKS, SUPPORTED_CHAIN_IDS,
};

/// Per-chain RPC configuration
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Lowercase key, e.g. "avalanche"
    pub key: String,
    pub chain_id: u64,
    pub name: String,
    pub symbol: String,
    pub rpc_url: String,
    /// Public endpoint tried when the primary fails
    pub fallback_url: Option<String>,
    /// Etherscan-compatible API for verified source lookups
    pub explorer_api_url: Option<String>,
}

impl ChainConfig {
    /// Config pointing at the public endpoint of a supported chain
    pub fn public(chain_id: u64) -> Option<Self> {
        let key = chain_key(chain_id)?;
        let rpc_url = get_public_rpc_fallback(chain_id)?.to_string();
        Some(Self {
            key: key.to_string(),
            chain_id,
            name: get_chain_name(chain_id).to_string(),
            symbol: get_native_symbol(chain_id).to_string(),
            rpc_url,
            fallback_url: None,
            explorer_api_url: get_explorer_api_url(chain_id).map(String::from),
        })
    }
}

/// Completion API configuration (OpenAI-compatible)
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Never logged
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4".to_string(),
            timeout: Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
        }
    }
}

impl LlmConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().map(|k| !k.is_empty()).unwrap_or(false)
    }
}

/// Verified source lookups; disabled without an API key
#[derive(Debug, Clone, Default)]
pub struct ExplorerConfig {
    pub api_key: Option<String>,
    /// Overrides the per-chain explorer URL when set
    pub api_url: Option<String>,
}

/// Whale detection and the long-running monitor
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Minimum value in native units
    pub min_whale_amount: f64,
    pub lookback_blocks: u64,
    pub poll_interval: Duration,
    pub error_backoff_base: Duration,
    pub error_backoff_max: Duration,
    /// Monitor gives up after this many failed polls in a row
    pub max_consecutive_failures: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            min_whale_amount: DEFAULT_WHALE_MIN_AMOUNT,
            lookback_blocks: DEFAULT_WHALE_LOOKBACK_BLOCKS,
            poll_interval: Duration::from_secs(1),
            error_backoff_base: Duration::from_secs(5),
            error_backoff_max: Duration::from_secs(60),
            max_consecutive_failures: 10,
        }
    }
}

/// Block windows for the linear scanners
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub default_blocks: u64,
    pub max_blocks: u64,
    pub gas_blocks: u64,
    pub bridge_event_blocks: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            default_blocks: DEFAULT_SCAN_BLOCKS,
            max_blocks: MAX_SCAN_BLOCKS,
            gas_blocks: GAS_SCAN_BLOCKS,
            bridge_event_blocks: BRIDGE_EVENT_BLOCKS,
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rate_limit_per_minute: u32,
    pub cache_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            rate_limit_per_minute: 100,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    /// Chain used when a request does not name one
    pub default_chain: String,
    /// Keyed by lowercase chain key
    pub chains: BTreeMap<String, ChainConfig>,
    /// Chains probed by the chain communication map
    pub probe_chains: Vec<String>,
    pub rpc_timeout: Duration,
    pub llm: LlmConfig,
    pub explorer: ExplorerConfig,
    pub monitor: MonitorConfig,
    pub scan: ScanConfig,
}

impl Default for AppConfig {
    /// Public endpoints only, no API keys
    fn default() -> Self {
        let chains: BTreeMap<String, ChainConfig> = SUPPORTED_CHAIN_IDS
            .iter()
            .filter_map(|&id| ChainConfig::public(id))
            .map(|c| (c.key.clone(), c))
            .collect();
        let probe_chains = chains.keys().cloned().collect();

        Self {
            server: ServerConfig::default(),
            default_chain: DEFAULT_CHAIN_KEY.to_string(),
            chains,
            probe_chains,
            rpc_timeout: Duration::from_secs(DEFAULT_RPC_TIMEOUT_SECS),
            llm: LlmConfig::default(),
            explorer: ExplorerConfig::default(),
            monitor: MonitorConfig::default(),
            scan: ScanConfig::default(),
        }
    }
}

impl AppConfig {
    /// Build configuration from process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        // Server
        if let Some(host) = get("TRUSTMESH_HOST") {
            config.server.host = host;
        }
        if let Some(port) = get("PORT").or_else(|| get("TRUSTMESH_PORT")) {
            match port.parse() {
                Ok(p) => config.server.port = p,
                Err(_) => warn!(value = %port, "Ignoring invalid port"),
            }
        }
        if let Some(limit) = get("RATE_LIMIT_PER_MINUTE").and_then(|v| v.parse().ok()) {
            config.server.rate_limit_per_minute = limit;
        }

        // Chains: env override first, public endpoint as fallback
        for chain in config.chains.values_mut() {
            let override_url = rpc_env_keys(chain.chain_id).iter().find_map(|k| get(k));
            if let Some(url) = override_url {
                if url != chain.rpc_url {
                    chain.fallback_url = Some(std::mem::replace(&mut chain.rpc_url, url));
                }
            }
        }

        if let Some(default_chain) = get("DEFAULT_CHAIN") {
            match chain_id_from_key(&default_chain).and_then(chain_key) {
                Some(key) => config.default_chain = key.to_string(),
                None => warn!(chain = %default_chain, "Unsupported DEFAULT_CHAIN, keeping avalanche"),
            }
        }

        if let Some(list) = get("CROSS_CHAIN_PROBE_CHAINS") {
            let probe: Vec<String> = list
                .split(',')
                .filter_map(|c| chain_id_from_key(c).and_then(chain_key))
                .map(String::from)
                .collect();
            if probe.is_empty() {
                warn!(value = %list, "CROSS_CHAIN_PROBE_CHAINS named no supported chain");
            } else {
                config.probe_chains = probe;
            }
        }

        // LLM
        config.llm.api_key = get("OPENAI_API_KEY");
        if config.llm.is_configured() {
            info!("🔑 OPENAI_API_KEY configured (key hidden)");
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            config.llm.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = get("LLM_MODEL") {
            config.llm.model = model;
        }

        // Explorer
        config.explorer.api_key = get("EXPLORER_API_KEY");
        config.explorer.api_url = get("EXPLORER_API_URL");

        // Monitor
        if let Some(amount) = get("WHALE_MIN_AMOUNT").and_then(|v| v.parse().ok()) {
            config.monitor.min_whale_amount = amount;
        }
        if let Some(blocks) = get("WHALE_LOOKBACK_BLOCKS").and_then(|v| v.parse().ok()) {
            config.monitor.lookback_blocks = blocks;
        }

        config
    }

    /// Look up a chain by key, alias or numeric id
    pub fn chain(&self, name: &str) -> Option<&ChainConfig> {
        let key = chain_id_from_key(name).and_then(chain_key)?;
        self.chains.get(key)
    }

    pub fn default_chain(&self) -> Option<&ChainConfig> {
        self.chains.get(&self.default_chain)
    }

    /// Clamp a requested scan window into `[1, max_blocks]`
    pub fn scan_window(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.scan.default_blocks)
            .clamp(1, self.scan.max_blocks)
    }
}
