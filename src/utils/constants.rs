//! Constants Module - Single Source of Truth
//!
//! Chain identifiers, public RPC endpoints, scan limits and unit conversions.
//! Other modules must not hardcode any of these.

use alloy_primitives::U256;

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "TrustMesh";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for outgoing HTTP requests
pub const USER_AGENT: &str = concat!("TrustMesh/", env!("CARGO_PKG_VERSION"));

// ============================================
// RPC / SCAN CONSTANTS
// ============================================

/// Default timeout for RPC requests (seconds)
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 10;

/// Default timeout for LLM completions (seconds)
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

/// Default audit cache TTL (seconds)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Default block window for history / flow / interaction scans
pub const DEFAULT_SCAN_BLOCKS: u64 = 500;

/// Largest block window a caller may request
pub const MAX_SCAN_BLOCKS: u64 = 5000;

/// Block window used by the gas usage summary
pub const GAS_SCAN_BLOCKS: u64 = 200;

/// Block window searched for bridge deposit/withdrawal events
pub const BRIDGE_EVENT_BLOCKS: u64 = 100;

/// Whale threshold in native units (AVAX on the default chain)
pub const DEFAULT_WHALE_MIN_AMOUNT: f64 = 1000.0;

/// Blocks inspected by a one-shot whale alert query
pub const DEFAULT_WHALE_LOOKBACK_BLOCKS: u64 = 100;

/// Base score for cross-chain scoring
pub const CROSS_CHAIN_BASE_SCORE: u32 = 50;

/// Base score for the contract risk engine
pub const CONTRACT_AUDIT_BASE_SCORE: u32 = 0;

// ============================================
// CHAIN IDS
// ============================================

/// Ethereum Mainnet
pub const CHAIN_ID_ETHEREUM: u64 = 1;
/// BNB Smart Chain
pub const CHAIN_ID_BSC: u64 = 56;
/// Polygon
pub const CHAIN_ID_POLYGON: u64 = 137;
/// Arbitrum One
pub const CHAIN_ID_ARBITRUM: u64 = 42161;
/// Optimism
pub const CHAIN_ID_OPTIMISM: u64 = 10;
/// Avalanche C-Chain (primary network)
pub const CHAIN_ID_AVALANCHE: u64 = 43114;
/// Base
pub const CHAIN_ID_BASE: u64 = 8453;

/// All supported EVM chain IDs, primary chain first
pub const SUPPORTED_CHAIN_IDS: [u64; 7] = [
    CHAIN_ID_AVALANCHE,
    CHAIN_ID_ETHEREUM,
    CHAIN_ID_POLYGON,
    CHAIN_ID_BSC,
    CHAIN_ID_ARBITRUM,
    CHAIN_ID_OPTIMISM,
    CHAIN_ID_BASE,
];

/// Chain identifier used when a request does not name one
pub const DEFAULT_CHAIN_KEY: &str = "avalanche";

// ============================================
// CHAIN KEYS
// ============================================

/// Canonical lowercase key for a chain (used in requests and chain maps)
pub fn chain_key(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        CHAIN_ID_ETHEREUM => Some("ethereum"),
        CHAIN_ID_BSC => Some("bsc"),
        CHAIN_ID_POLYGON => Some("polygon"),
        CHAIN_ID_ARBITRUM => Some("arbitrum"),
        CHAIN_ID_OPTIMISM => Some("optimism"),
        CHAIN_ID_AVALANCHE => Some("avalanche"),
        CHAIN_ID_BASE => Some("base"),
        _ => None,
    }
}

/// Resolve a user-supplied chain name (key, alias or numeric id)
pub fn chain_id_from_key(key: &str) -> Option<u64> {
    let key = key.trim().to_lowercase();
    let id = match key.as_str() {
        "ethereum" | "eth" | "mainnet" => CHAIN_ID_ETHEREUM,
        "bsc" | "bnb" | "binance" => CHAIN_ID_BSC,
        "polygon" | "matic" => CHAIN_ID_POLYGON,
        "arbitrum" | "arb" => CHAIN_ID_ARBITRUM,
        "optimism" | "op" => CHAIN_ID_OPTIMISM,
        "avalanche" | "avax" | "avalanche_c" | "c-chain" => CHAIN_ID_AVALANCHE,
        "base" => CHAIN_ID_BASE,
        other => other.parse::<u64>().ok()?,
    };
    is_chain_supported(id).then_some(id)
}

/// Environment variables that may override the RPC URL of a chain, in order
pub fn rpc_env_keys(chain_id: u64) -> &'static [&'static str] {
    match chain_id {
        CHAIN_ID_ETHEREUM => &["ETH_HTTP_URL", "ETHEREUM_RPC"],
        CHAIN_ID_BSC => &["BSC_HTTP_URL", "BSC_RPC"],
        CHAIN_ID_POLYGON => &["POLYGON_HTTP_URL", "POLYGON_RPC"],
        CHAIN_ID_ARBITRUM => &["ARBITRUM_HTTP_URL", "ARBITRUM_RPC"],
        CHAIN_ID_OPTIMISM => &["OPTIMISM_HTTP_URL", "OPTIMISM_RPC"],
        CHAIN_ID_AVALANCHE => &["AVALANCHE_HTTP_URL", "AVALANCHE_RPC"],
        CHAIN_ID_BASE => &["BASE_HTTP_URL", "BASE_RPC"],
        _ => &[],
    }
}

// ============================================
// PUBLIC RPC FALLBACKS
// ============================================

/// Get public RPC fallback URL for a chain
pub fn get_public_rpc_fallback(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        CHAIN_ID_ETHEREUM => Some("https://eth.llamarpc.com"),
        CHAIN_ID_BSC => Some("https://bsc-dataseed.binance.org"),
        CHAIN_ID_POLYGON => Some("https://polygon-rpc.com"),
        CHAIN_ID_ARBITRUM => Some("https://arb1.arbitrum.io/rpc"),
        CHAIN_ID_OPTIMISM => Some("https://mainnet.optimism.io"),
        CHAIN_ID_AVALANCHE => Some("https://api.avax.network/ext/bc/C/rpc"),
        CHAIN_ID_BASE => Some("https://mainnet.base.org"),
        _ => None,
    }
}

// ============================================
// CHAIN METADATA
// ============================================

pub fn get_chain_name(chain_id: u64) -> &'static str {
    match chain_id {
        CHAIN_ID_ETHEREUM => "Ethereum",
        CHAIN_ID_BSC => "BNB Smart Chain",
        CHAIN_ID_POLYGON => "Polygon",
        CHAIN_ID_ARBITRUM => "Arbitrum One",
        CHAIN_ID_OPTIMISM => "Optimism",
        CHAIN_ID_AVALANCHE => "Avalanche C-Chain",
        CHAIN_ID_BASE => "Base",
        _ => "Unknown",
    }
}

pub fn get_native_symbol(chain_id: u64) -> &'static str {
    match chain_id {
        CHAIN_ID_BSC => "BNB",
        CHAIN_ID_POLYGON => "MATIC",
        CHAIN_ID_AVALANCHE => "AVAX",
        _ => "ETH",
    }
}

/// Etherscan-compatible explorer API used for verified source lookups
pub fn get_explorer_api_url(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        CHAIN_ID_ETHEREUM => Some("https://api.etherscan.io/api"),
        CHAIN_ID_BSC => Some("https://api.bscscan.com/api"),
        CHAIN_ID_POLYGON => Some("https://api.polygonscan.com/api"),
        CHAIN_ID_ARBITRUM => Some("https://api.arbiscan.io/api"),
        CHAIN_ID_OPTIMISM => Some("https://api-optimistic.etherscan.io/api"),
        CHAIN_ID_AVALANCHE => Some("https://api.snowtrace.io/api"),
        CHAIN_ID_BASE => Some("https://api.basescan.org/api"),
        _ => None,
    }
}

// ============================================
// CONVERSION UTILITIES
// ============================================

/// Convert wei to native units (18 decimals on every supported chain)
#[inline]
pub fn wei_to_native(wei: U256) -> f64 {
    let wei_u128: u128 = wei.try_into().unwrap_or(u128::MAX);
    wei_u128 as f64 / 1e18
}

/// Convert native units to wei
#[inline]
pub fn native_to_wei(amount: f64) -> U256 {
    U256::from((amount * 1e18) as u128)
}

#[inline]
pub fn is_chain_supported(chain_id: u64) -> bool {
    SUPPORTED_CHAIN_IDS.contains(&chain_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wei_to_native() {
        let one = U256::from(1_000_000_000_000_000_000u128);
        assert!((wei_to_native(one) - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_native_to_wei() {
        assert_eq!(native_to_wei(1.5), U256::from(1_500_000_000_000_000_000u128));
    }

    #[test]
    fn test_chain_key_aliases() {
        assert_eq!(chain_id_from_key("avalanche"), Some(CHAIN_ID_AVALANCHE));
        assert_eq!(chain_id_from_key("AVAX"), Some(CHAIN_ID_AVALANCHE));
        assert_eq!(chain_id_from_key("137"), Some(CHAIN_ID_POLYGON));
        assert_eq!(chain_id_from_key("solana"), None);
        assert_eq!(chain_id_from_key("999"), None);
    }

    #[test]
    fn test_every_supported_chain_has_metadata() {
        for id in SUPPORTED_CHAIN_IDS {
            assert!(chain_key(id).is_some());
            assert!(get_public_rpc_fallback(id).is_some());
            assert!(!rpc_env_keys(id).is_empty());
            assert_ne!(get_chain_name(id), "Unknown");
        }
    }
}
