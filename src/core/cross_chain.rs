//! Cross-chain analyzer
//!
//! Bridge probes, message-passing, asset-transfer and security keyword
//! checks over one contract's bytecode, scored from base 50 on the 4-level
//! table. The chain communication map probes every configured chain
//! concurrently for deployed code.

use alloy_primitives::{Address, Bytes};
use chrono::{DateTime, Utc};
use eyre::{eyre, Result};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::core::patterns::{
    match_keywords, matching_rules, ASSET_TRANSFER_PATTERNS, MESSAGE_PASSING_PATTERNS,
    SECURITY_PATTERNS,
};
use crate::core::risk_score::ScoreAggregator;
use crate::models::{Finding, LogFilter, RiskLevel};
use crate::providers::{ChainRpc, RpcRegistry};
use crate::utils::decoder::{
    bridge_deposit_topic, bridge_status_calldata, bridge_withdrawal_topic, decode_bool,
};

/// Result of a cross-chain risk analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossChainAnalysis {
    pub address: Address,
    pub source_chain: String,
    pub target_chains: Vec<String>,
    pub risks: Vec<Finding>,
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub analysis_timestamp: DateTime<Utc>,
}

/// Presence of a contract on one chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainPresence {
    pub exists: bool,
    pub interactions: Vec<Finding>,
}

impl ChainPresence {
    fn absent() -> Self {
        Self {
            exists: false,
            interactions: Vec::new(),
        }
    }
}

/// Chain key → presence
pub type ChainCommunicationMap = BTreeMap<String, ChainPresence>;

// ============================================
// CHECKS
// ============================================

/// `getBridgeStatus()` and bridge event probes; every probe failure is swallowed
pub async fn check_bridge_interactions(
    rpc: &dyn ChainRpc,
    address: Address,
    event_window: u64,
) -> Vec<Finding> {
    let mut interactions = Vec::new();

    match rpc.call(address, bridge_status_calldata()).await {
        Ok(output) if decode_bool(&output) => interactions.push(Finding::new(
            "bridge_status_check",
            RiskLevel::Low,
            format!("getBridgeStatus() returned true for {}", address),
        )),
        Ok(_) => {}
        Err(e) => debug!("getBridgeStatus probe failed for {}: {:#}", address, e),
    }

    let latest = match rpc.latest_block_number().await {
        Ok(latest) => latest,
        Err(e) => {
            debug!("Skipping bridge event probes on {}: {:#}", rpc.chain(), e);
            return interactions;
        }
    };
    let from = latest.saturating_sub(event_window);

    let probes = [
        (bridge_deposit_topic(), "bridge_deposit", "Contract has bridge deposit events"),
        (bridge_withdrawal_topic(), "bridge_withdrawal", "Contract has bridge withdrawal events"),
    ];
    for (topic, kind, description) in probes {
        let filter = LogFilter::new(from, latest).address(address).topic0(topic);
        match rpc.get_logs(&filter).await {
            Ok(logs) if !logs.is_empty() => {
                interactions.push(Finding::new(kind, RiskLevel::High, description));
            }
            Ok(_) => {}
            Err(e) => debug!("{} probe failed for {}: {:#}", kind, address, e),
        }
    }

    interactions
}

/// All message-passing hits collapse into one Medium finding
pub fn check_message_passing(bytecode_hex: &str) -> Option<Finding> {
    let hits = matching_rules(bytecode_hex, MESSAGE_PASSING_PATTERNS);
    if hits.is_empty() {
        return None;
    }
    let patterns: Vec<&str> = hits.iter().map(|r| r.description).collect();
    Some(Finding::new(
        "message_passing",
        RiskLevel::Medium,
        format!("Message passing patterns: {}", patterns.join(", ")),
    ))
}

pub fn check_asset_transfers(bytecode_hex: &str) -> Vec<Finding> {
    match_keywords(bytecode_hex, ASSET_TRANSFER_PATTERNS)
}

pub fn check_security_patterns(bytecode_hex: &str) -> Vec<Finding> {
    match_keywords(bytecode_hex, SECURITY_PATTERNS)
}

/// Keyword findings over bytecode, in check order
pub fn bytecode_findings(bytecode: &Bytes) -> Vec<Finding> {
    let bytecode_hex = hex::encode(bytecode);
    let mut findings = Vec::new();
    findings.extend(check_message_passing(&bytecode_hex));
    findings.extend(check_asset_transfers(&bytecode_hex));
    findings.extend(check_security_patterns(&bytecode_hex));
    findings
}

// ============================================
// ANALYZER
// ============================================

pub struct CrossChainAnalyzer {
    rpcs: RpcRegistry,
    probe_chains: Vec<String>,
    bridge_event_blocks: u64,
}

impl CrossChainAnalyzer {
    pub fn new(rpcs: RpcRegistry, probe_chains: Vec<String>, bridge_event_blocks: u64) -> Self {
        Self {
            rpcs,
            probe_chains,
            bridge_event_blocks,
        }
    }

    pub async fn analyze_cross_chain_risk(
        &self,
        address: Address,
        source_chain: &str,
        target_chains: Vec<String>,
    ) -> Result<CrossChainAnalysis> {
        let rpc = self
            .rpcs
            .get(source_chain)
            .ok_or_else(|| eyre!("Unsupported chain: {}", source_chain))?;

        let mut risks = check_bridge_interactions(rpc.as_ref(), address, self.bridge_event_blocks).await;
        let code = rpc.get_code(address).await?;
        risks.extend(bytecode_findings(&code));

        let score = ScoreAggregator::cross_chain().aggregate(&risks);
        info!(
            "{} Cross-chain analysis {} on {}: score {} ({}), {} risks",
            score.level.emoji(),
            address,
            rpc.chain(),
            score.value,
            score.level,
            risks.len()
        );

        Ok(CrossChainAnalysis {
            address,
            source_chain: rpc.chain().to_string(),
            target_chains,
            risks,
            risk_score: score.value,
            risk_level: score.level,
            analysis_timestamp: Utc::now(),
        })
    }

    /// Probe every configured chain concurrently
    pub async fn get_chain_communication_map(&self, address: Address) -> ChainCommunicationMap {
        let probes = self.probe_chains.iter().map(|chain| async move {
            let presence = match self.rpcs.get(chain) {
                Some(rpc) => self.probe_chain(rpc.as_ref(), address).await,
                None => ChainPresence::absent(),
            };
            (chain.clone(), presence)
        });

        join_all(probes).await.into_iter().collect()
    }

    async fn probe_chain(&self, rpc: &dyn ChainRpc, address: Address) -> ChainPresence {
        match rpc.get_code(address).await {
            Ok(code) if !code.is_empty() => ChainPresence {
                exists: true,
                interactions: check_bridge_interactions(rpc, address, self.bridge_event_blocks).await,
            },
            Ok(_) => ChainPresence::absent(),
            Err(e) => {
                debug!("Chain probe failed on {}: {:#}", rpc.chain(), e);
                ChainPresence::absent()
            }
        }
    }

    pub fn probe_chains(&self) -> &[String] {
        &self.probe_chains
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_passing_collapses() {
        let finding = check_message_passing("relay|verify|signature").unwrap();
        assert_eq!(finding.kind, "message_passing");
        assert_eq!(finding.severity, RiskLevel::Medium);
        assert!(finding.description.contains("Relay message pattern"));
        assert!(finding.description.contains("Message signature pattern"));
        assert!(check_message_passing("6080604052").is_none());
    }

    #[test]
    fn test_hex_bytecode_never_spells_keywords() {
        let code = Bytes::from(vec![0x60, 0x80, 0x60, 0x40, 0x52, 0xf1, 0xfd]);
        assert!(bytecode_findings(&code).is_empty());
    }

    #[test]
    fn test_security_patterns() {
        let findings = check_security_patterns("SELFDESTRUCT and delegatecall");
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.severity == RiskLevel::High));
    }
}
