//! Pattern Matcher
//!
//! Case-insensitive substring search of bytecode hex or source text against
//! fixed keyword tables. One finding per keyword present, no positions, no
//! occurrence counts.
//!
//! Known limitation: matching is textual. Opcode bytes such as `f1` also
//! match inside addresses or push data, and English keywords like "bridge"
//! can only ever match hex if the bytes happen to spell them. Both are kept
//! as-is; this is a heuristic, not a disassembler.

use crate::models::{Finding, RiskLevel};

/// One keyword and the finding it produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternRule {
    /// Lowercase needle
    pub keyword: &'static str,
    pub kind: &'static str,
    pub severity: RiskLevel,
    /// Explicit score impact; `None` uses the severity table
    pub weight: Option<u32>,
    pub description: &'static str,
}

impl PatternRule {
    pub const fn new(
        keyword: &'static str,
        kind: &'static str,
        severity: RiskLevel,
        description: &'static str,
    ) -> Self {
        Self {
            keyword,
            kind,
            severity,
            weight: None,
            description,
        }
    }

    pub fn to_finding(&self) -> Finding {
        Finding {
            kind: self.kind.to_string(),
            severity: self.severity,
            weight: self.weight,
            description: self.description.to_string(),
        }
    }
}

/// One finding per rule whose keyword occurs in `haystack`, in table order
pub fn match_keywords(haystack: &str, table: &[PatternRule]) -> Vec<Finding> {
    if haystack.is_empty() || table.is_empty() {
        return Vec::new();
    }
    let haystack = haystack.to_lowercase();
    table
        .iter()
        .filter(|rule| haystack.contains(&rule.keyword.to_lowercase()))
        .map(PatternRule::to_finding)
        .collect()
}

/// Rules whose keyword occurs in `haystack`
pub fn matching_rules<'a>(haystack: &str, table: &'a [PatternRule]) -> Vec<&'a PatternRule> {
    let haystack = haystack.to_lowercase();
    table
        .iter()
        .filter(|rule| !haystack.is_empty() && haystack.contains(&rule.keyword.to_lowercase()))
        .collect()
}

/// True when any keyword occurs in `haystack` (case-insensitive)
pub fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    let haystack = haystack.to_lowercase();
    keywords
        .iter()
        .any(|k| !k.is_empty() && haystack.contains(&k.to_lowercase()))
}

// ============================================
// CROSS-CHAIN TABLES
// ============================================

/// Message passing; hits are collapsed into a single `message_passing` finding
pub const MESSAGE_PASSING_PATTERNS: &[PatternRule] = &[
    PatternRule::new("crosschain", "crosschain", RiskLevel::Medium, "Cross-chain message pattern"),
    PatternRule::new("bridge", "bridge", RiskLevel::Medium, "Bridge message pattern"),
    PatternRule::new("relay", "relay", RiskLevel::Medium, "Relay message pattern"),
    PatternRule::new("verify", "verify", RiskLevel::Medium, "Message verification pattern"),
    PatternRule::new("signature", "signature", RiskLevel::Medium, "Message signature pattern"),
];

pub const ASSET_TRANSFER_PATTERNS: &[PatternRule] = &[
    PatternRule::new("transfer", "transfer_transfer", RiskLevel::Medium, "Basic transfer"),
    PatternRule::new("bridge", "bridge_transfer", RiskLevel::High, "Bridge transfer"),
    PatternRule::new("crosschain", "crosschain_transfer", RiskLevel::High, "Cross-chain transfer"),
    PatternRule::new("lock", "lock_transfer", RiskLevel::Medium, "Asset locking"),
    PatternRule::new("unlock", "unlock_transfer", RiskLevel::Medium, "Asset unlocking"),
    PatternRule::new("mint", "mint_transfer", RiskLevel::Medium, "Cross-chain minting"),
    PatternRule::new("burn", "burn_transfer", RiskLevel::Medium, "Cross-chain burning"),
];

pub const SECURITY_PATTERNS: &[PatternRule] = &[
    PatternRule::new("reentrancy", "reentrancy", RiskLevel::High, "Potential reentrancy vulnerability"),
    PatternRule::new("overflow", "overflow", RiskLevel::High, "Potential integer overflow"),
    PatternRule::new("unchecked", "unchecked", RiskLevel::High, "Unchecked external calls"),
    PatternRule::new("selfdestruct", "selfdestruct", RiskLevel::High, "Self-destruct functionality"),
    PatternRule::new("delegatecall", "delegatecall", RiskLevel::High, "Delegate call usage"),
];

// ============================================
// CONTRACT RISK ENGINE KEYWORDS
// ============================================

/// Upgradeability markers searched in bytecode
pub const UPGRADEABLE_BYTECODE_KEYWORDS: &[&str] = &["delegatecall"];

/// Upgradeability markers searched in source
pub const UPGRADEABLE_SOURCE_KEYWORDS: &[&str] = &["proxy"];

pub const ECONOMIC_KEYWORDS: &[&str] = &["fee", "mint", "burn", "inflation"];

/// CALL, DELEGATECALL, STATICCALL and REVERT opcode bytes
pub const CROSS_CONTRACT_OPCODES: &[&str] = &["f1", "f4", "fa", "fd"];

// ============================================
// GOVERNANCE TABLE
// ============================================

/// Applied to the risk paragraph of a proposal analysis
pub const GOVERNANCE_RISK_PATTERNS: &[PatternRule] = &[
    PatternRule::new("treasury", "treasury_risk", RiskLevel::High, "Proposal touches treasury funds"),
    PatternRule::new("upgrade", "upgrade_risk", RiskLevel::High, "Proposal changes contract logic"),
    PatternRule::new("admin", "admin_risk", RiskLevel::Medium, "Proposal changes privileged roles"),
    PatternRule::new("mint", "mint_risk", RiskLevel::Medium, "Proposal mints new supply"),
    PatternRule::new("emergency", "emergency_risk", RiskLevel::Medium, "Proposal uses emergency powers"),
    PatternRule::new("quorum", "quorum_risk", RiskLevel::Low, "Proposal depends on quorum settings"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_table_matches_nothing() {
        assert!(match_keywords("delegatecall bridge", &[]).is_empty());
    }

    #[test]
    fn test_empty_haystack_matches_nothing() {
        assert!(match_keywords("", SECURITY_PATTERNS).is_empty());
        assert!(match_keywords("", ASSET_TRANSFER_PATTERNS).is_empty());
    }

    #[test]
    fn test_case_insensitive() {
        let findings = match_keywords("0xDELEGATECALL6080", SECURITY_PATTERNS);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, "delegatecall");
        assert_eq!(findings[0].severity, RiskLevel::High);
    }

    #[test]
    fn test_one_finding_per_keyword() {
        let findings = match_keywords("overflow overflow overflow", SECURITY_PATTERNS);
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_overlapping_keywords_both_fire() {
        // "unlock" contains "lock"
        let kinds: Vec<String> = match_keywords("unlock", ASSET_TRANSFER_PATTERNS)
            .into_iter()
            .map(|f| f.kind)
            .collect();
        assert_eq!(kinds, vec!["lock_transfer", "unlock_transfer"]);
    }

    #[test]
    fn test_asset_transfer_severity() {
        let findings = match_keywords("bridge mint", ASSET_TRANSFER_PATTERNS);
        let bridge = findings.iter().find(|f| f.kind == "bridge_transfer").unwrap();
        let mint = findings.iter().find(|f| f.kind == "mint_transfer").unwrap();
        assert_eq!(bridge.severity, RiskLevel::High);
        assert_eq!(mint.severity, RiskLevel::Medium);
    }

    #[test]
    fn test_malformed_hex_is_plain_text() {
        assert!(contains_any("0xzz-not-hex-f1", CROSS_CONTRACT_OPCODES));
        assert!(!contains_any("0x6080", CROSS_CONTRACT_OPCODES));
    }

    #[test]
    fn test_opcode_collision_is_preserved() {
        // f1 inside an address-like run still counts
        assert!(contains_any("0x73aaf1bb", CROSS_CONTRACT_OPCODES));
    }

    #[test]
    fn test_matching_rules() {
        let rules = matching_rules("relay and verify", MESSAGE_PASSING_PATTERNS);
        let keywords: Vec<&str> = rules.iter().map(|r| r.keyword).collect();
        assert_eq!(keywords, vec!["relay", "verify"]);
    }
}
