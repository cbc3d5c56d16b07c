//! Contract Risk Engine
//!
//! Four textual checks over lowercased bytecode hex and optional source:
//!
//! | check                      | severity | weight |
//! |----------------------------|----------|--------|
//! | access control             | High     | 25     |
//! | upgradeable / proxy        | Medium   | 15     |
//! | economic security          | Medium   | 20     |
//! | cross-contract interaction | Medium   | 15     |
//!
//! Scored from base 0 on the 3-level table.
//!
//! The access control check looks for `onlyowner` in bytecode hex, which can
//! never contain it, so that check fires for every contract.

use alloy_primitives::Address;
use alloy_sol_types::{sol, SolCall};
use chrono::{DateTime, Utc};
use eyre::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::patterns::{
    contains_any, CROSS_CONTRACT_OPCODES, ECONOMIC_KEYWORDS, UPGRADEABLE_BYTECODE_KEYWORDS,
    UPGRADEABLE_SOURCE_KEYWORDS,
};
use crate::core::risk_score::{RiskScoreBuilder, ScoreAggregator, ScoredFindings};
use crate::models::{Finding, RiskLevel};
use crate::providers::ChainRpc;
use crate::utils::decoder::getBridgeStatusCall;

sol! {
    function transfer(address to, uint256 amount) external returns (bool);
    function balanceOf(address owner) external view returns (uint256);
    function propose(address[] targets, uint256[] values, bytes[] calldatas, string description) external returns (uint256);
    function castVote(uint256 proposalId, uint8 support) external returns (uint256);
}

// ============================================
// FINDINGS
// ============================================

fn access_control_finding() -> Finding {
    Finding::weighted(
        "access_control",
        RiskLevel::High,
        25,
        "Access Control Issues: contract has public/unprotected functions or missing access modifiers.",
    )
}

fn upgradeable_finding() -> Finding {
    Finding::weighted(
        "upgradeable_proxy",
        RiskLevel::Medium,
        15,
        "Upgradeable/Proxy Pattern Detected: review upgrade logic for security.",
    )
}

fn economic_finding() -> Finding {
    Finding::weighted(
        "economic_security",
        RiskLevel::Medium,
        20,
        "Economic Security Issues: contract has fee logic, inflation, or economic risks.",
    )
}

fn cross_contract_finding() -> Finding {
    Finding::weighted(
        "cross_contract_interaction",
        RiskLevel::Medium,
        15,
        "Cross-Contract Interaction: contract makes external calls to other contracts.",
    )
}

// ============================================
// CHECKS
// ============================================

/// Source is matched case-sensitively, as Solidity identifiers are
fn check_access_control(bytecode: &str, source: Option<&str>) -> bool {
    if let Some(src) = source {
        if src.contains("public") && !src.contains("onlyOwner") {
            return true;
        }
    }
    !bytecode.to_lowercase().contains("onlyowner")
}

fn check_upgradeable(bytecode: &str, source: Option<&str>) -> bool {
    contains_any(bytecode, UPGRADEABLE_BYTECODE_KEYWORDS)
        || source.map(|s| contains_any(s, UPGRADEABLE_SOURCE_KEYWORDS)).unwrap_or(false)
}

fn check_economic(bytecode: &str, source: Option<&str>) -> bool {
    source.map(|s| contains_any(s, ECONOMIC_KEYWORDS)).unwrap_or(false)
        || contains_any(bytecode, ECONOMIC_KEYWORDS)
}

fn check_cross_contract(bytecode: &str) -> bool {
    contains_any(bytecode, CROSS_CONTRACT_OPCODES)
}

/// Run the four checks and score them
pub fn assess_contract(bytecode_hex: &str, source: Option<&str>) -> ScoredFindings {
    RiskScoreBuilder::new(ScoreAggregator::contract_audit())
        .with_check(check_access_control(bytecode_hex, source), access_control_finding)
        .with_check(check_upgradeable(bytecode_hex, source), upgradeable_finding)
        .with_check(check_economic(bytecode_hex, source), economic_finding)
        .with_check(check_cross_contract(bytecode_hex), cross_contract_finding)
        .build()
}

// ============================================
// CLASSIFICATION
// ============================================

/// Coarse contract category used by aggregate analytics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractType {
    #[serde(rename = "ERC20")]
    Erc20,
    Bridge,
    Governance,
    Other,
}

impl ContractType {
    pub const ALL: [ContractType; 4] = [
        ContractType::Erc20,
        ContractType::Bridge,
        ContractType::Governance,
        ContractType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::Erc20 => "ERC20",
            ContractType::Bridge => "Bridge",
            ContractType::Governance => "Governance",
            ContractType::Other => "Other",
        }
    }
}

/// Selector and keyword heuristics; first match wins (Bridge, Governance, ERC20)
pub fn classify_contract(bytecode_hex: &str, source: Option<&str>) -> ContractType {
    let code = bytecode_hex.to_lowercase();
    let has = |selector: [u8; 4]| code.contains(&hex::encode(selector));
    let source_has = |keywords: &[&str]| source.map(|s| contains_any(s, keywords)).unwrap_or(false);

    if has(getBridgeStatusCall::SELECTOR) || source_has(&["bridge", "crosschain"]) {
        ContractType::Bridge
    } else if has(proposeCall::SELECTOR) || has(castVoteCall::SELECTOR) || source_has(&["governor", "proposal"]) {
        ContractType::Governance
    } else if has(transferCall::SELECTOR) && has(balanceOfCall::SELECTOR) {
        ContractType::Erc20
    } else {
        ContractType::Other
    }
}

// ============================================
// AUDIT
// ============================================

/// Contract audit result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractAudit {
    pub address: Address,
    pub chain: String,
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub findings: Vec<Finding>,
    pub contract_type: ContractType,
    /// False for accounts without code
    pub is_contract: bool,
    pub bytecode_size: usize,
    pub source_verified: bool,
    pub recommendation: String,
    pub analyzed_at: DateTime<Utc>,
}

/// Fetch bytecode and run the risk checks
pub async fn audit_contract(
    rpc: &dyn ChainRpc,
    address: Address,
    source: Option<&str>,
) -> Result<ContractAudit> {
    let code = rpc.get_code(address).await?;
    let bytecode_hex = hex::encode(&code);

    debug!("🔬 Auditing {} on {} ({} bytes)", address, rpc.chain(), code.len());

    let scored = assess_contract(&bytecode_hex, source);
    let contract_type = classify_contract(&bytecode_hex, source);

    info!(
        "{} Audit {} on {}: score {} ({}), {} findings",
        scored.score.level.emoji(),
        address,
        rpc.chain(),
        scored.score.value,
        scored.score.level,
        scored.findings.len()
    );

    Ok(ContractAudit {
        address,
        chain: rpc.chain().to_string(),
        risk_score: scored.score.value,
        risk_level: scored.score.level,
        recommendation: scored.score.recommendation(),
        findings: scored.findings,
        contract_type,
        is_contract: !code.is_empty(),
        bytecode_size: code.len(),
        source_verified: source.is_some(),
        analyzed_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(scored: &ScoredFindings) -> Vec<&str> {
        scored.findings.iter().map(|f| f.kind.as_str()).collect()
    }

    #[test]
    fn test_access_control_always_fires_on_bytecode() {
        let scored = assess_contract("6080604052", None);
        assert_eq!(kinds(&scored), vec!["access_control"]);
        assert_eq!(scored.score.value, 25);
        assert_eq!(scored.score.level, RiskLevel::Low);
    }

    #[test]
    fn test_empty_bytecode_still_flags_access_control() {
        let scored = assess_contract("", None);
        assert_eq!(kinds(&scored), vec!["access_control"]);
    }

    #[test]
    fn test_cross_contract_opcodes() {
        let scored = assess_contract("6080f1", None);
        assert!(kinds(&scored).contains(&"cross_contract_interaction"));
        assert_eq!(scored.score.value, 40);
        assert_eq!(scored.score.level, RiskLevel::Medium);
    }

    #[test]
    fn test_all_checks_fire() {
        let source = "contract Proxy { uint fee; function mint() public {} }";
        let scored = assess_contract("60fa", Some(source));
        assert_eq!(
            kinds(&scored),
            vec!["access_control", "upgradeable_proxy", "economic_security", "cross_contract_interaction"]
        );
        assert_eq!(scored.score.raw, 75);
        assert_eq!(scored.score.value, 75);
        assert_eq!(scored.score.level, RiskLevel::High);
    }

    #[test]
    fn test_source_checks_are_case_aware() {
        assert!(check_upgradeable("", Some("TransparentUpgradeableProxy")));
        assert!(check_economic("", Some("INFLATION_RATE")));
        assert!(check_access_control("", Some("function f() public onlyOwner {}")));
    }

    #[test]
    fn test_classification() {
        let erc20 = format!("6080{}00{}", hex::encode(transferCall::SELECTOR), hex::encode(balanceOfCall::SELECTOR));
        assert_eq!(classify_contract(&erc20, None), ContractType::Erc20);

        let bridge = hex::encode(getBridgeStatusCall::SELECTOR);
        assert_eq!(classify_contract(&bridge, None), ContractType::Bridge);

        assert_eq!(classify_contract("", Some("contract MyGovernor {}")), ContractType::Governance);
        assert_eq!(classify_contract("6080", None), ContractType::Other);
    }

    #[test]
    fn test_contract_type_serializes() {
        assert_eq!(serde_json::to_value(ContractType::Erc20).unwrap(), "ERC20");
    }
}
