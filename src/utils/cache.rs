//! In-memory audit cache
//!
//! DashMap keyed by `chain:lowercase address` with a fixed TTL. Only
//! successful audits are stored.

use alloy_primitives::Address;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::core::risk_engine::ContractAudit;
use crate::utils::constants::DEFAULT_CACHE_TTL_SECS;

#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub audit: ContractAudit,
    pub created_at: Instant,
    pub ttl_secs: u64,
}

impl CacheEntry {
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > Duration::from_secs(self.ttl_secs)
    }

    pub fn remaining_ttl(&self) -> u64 {
        self.ttl_secs.saturating_sub(self.created_at.elapsed().as_secs())
    }
}

#[derive(Clone)]
pub struct AuditCache {
    store: Arc<DashMap<String, CacheEntry>>,
    ttl_secs: u64,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl Default for AuditCache {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_CACHE_TTL_SECS)
    }
}

impl AuditCache {
    pub fn with_ttl(ttl_secs: u64) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            ttl_secs,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// `avalanche:0xabc...`
    pub fn key(chain: &str, address: &Address) -> String {
        format!("{}:0x{}", chain.to_lowercase(), hex::encode(address))
    }

    pub fn get(&self, chain: &str, address: &Address) -> Option<ContractAudit> {
        let key = Self::key(chain, address);

        let Some(entry) = self.store.get(&key) else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!("📭 CACHE MISS: {}", key);
            return None;
        };

        if entry.is_expired() {
            drop(entry);
            self.store.remove(&key);
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!("📭 CACHE MISS (expired): {}", key);
            return None;
        }

        self.hits.fetch_add(1, Ordering::Relaxed);
        info!("✅ CACHE HIT: {} (TTL: {}s remaining)", key, entry.remaining_ttl());
        Some(entry.audit.clone())
    }

    pub fn set(&self, audit: ContractAudit) {
        let key = Self::key(&audit.chain, &audit.address);
        self.store.insert(
            key.clone(),
            CacheEntry {
                audit,
                created_at: Instant::now(),
                ttl_secs: self.ttl_secs,
            },
        );
        debug!("💾 CACHE SET: {} (TTL: {}s)", key, self.ttl_secs);
    }

    pub fn cleanup_expired(&self) -> usize {
        let before = self.store.len();
        self.store.retain(|_, entry| !entry.is_expired());
        let removed = before - self.store.len();
        if removed > 0 {
            info!("🧹 CACHE CLEANUP: {} expired entries removed", removed);
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            entries: self.store.len(),
            hits,
            misses,
            hit_rate,
            ttl_secs: self.ttl_secs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub ttl_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::risk_engine::ContractType;
    use crate::models::RiskLevel;
    use chrono::Utc;

    fn audit(chain: &str, address: Address) -> ContractAudit {
        ContractAudit {
            address,
            chain: chain.to_string(),
            risk_score: 25,
            risk_level: RiskLevel::Low,
            findings: vec![],
            contract_type: ContractType::Other,
            is_contract: true,
            bytecode_size: 2,
            source_verified: false,
            recommendation: String::new(),
            analyzed_at: Utc::now(),
        }
    }

    #[test]
    fn test_cache_set_get() {
        let cache = AuditCache::default();
        let address = Address::repeat_byte(0xab);
        cache.set(audit("avalanche", address));

        assert!(cache.get("avalanche", &address).is_some());
        assert!(cache.get("AVALANCHE", &address).is_some());
        assert!(cache.get("ethereum", &address).is_none());
    }

    #[test]
    fn test_key_is_lowercase() {
        let address = Address::repeat_byte(0xAB);
        assert_eq!(
            AuditCache::key("Avalanche", &address),
            format!("avalanche:0x{}", "ab".repeat(20))
        );
    }

    #[test]
    fn test_zero_ttl_expires() {
        let cache = AuditCache::with_ttl(0);
        let address = Address::repeat_byte(0x01);
        cache.set(audit("avalanche", address));
        std::thread::sleep(Duration::from_millis(1100));
        assert!(cache.get("avalanche", &address).is_none());
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_cache_stats() {
        let cache = AuditCache::default();
        let address = Address::repeat_byte(0x02);
        cache.set(audit("avalanche", address));
        cache.get("avalanche", &address);
        cache.get("avalanche", &Address::ZERO);

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 50.0).abs() < 0.001);
    }
}
