//! Risk Scoring Module
//!
//! `raw = base + Σ weight`, clamped once to 100 at the end. The level is a
//! pure function of the clamped value:
//! - 3-level: 0-29 Low, 30-69 Medium, 70-100 High
//! - 4-level: as 3-level, plus 80-100 Critical
//!
//! Contract audits start from base 0 on the 3-level table, cross-chain
//! analysis from base 50 on the 4-level table.

use serde::{Deserialize, Serialize};

use crate::models::{Finding, RiskLevel};
use crate::utils::constants::{CONTRACT_AUDIT_BASE_SCORE, CROSS_CHAIN_BASE_SCORE};

/// Threshold table used to label a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelScale {
    ThreeTier,
    FourTier,
}

impl RiskLevel {
    /// Label a clamped score; thresholds are inclusive on the lower bound
    pub fn from_score(score: u8, scale: LevelScale) -> Self {
        match score {
            s if s >= 80 && scale == LevelScale::FourTier => RiskLevel::Critical,
            s if s >= 70 => RiskLevel::High,
            s if s >= 30 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }
}

/// Aggregated score (0-100)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskScore {
    pub value: u8,
    pub level: RiskLevel,
    /// Unclamped sum, kept for transparency
    pub raw: u64,
}

impl RiskScore {
    /// Human-readable recommendation
    pub fn recommendation(&self) -> String {
        let action = match self.level {
            RiskLevel::Low => "Proceed with standard caution.",
            RiskLevel::Medium => "Manual review recommended before interacting.",
            RiskLevel::High => "High probability of loss. Avoid unless you understand the risks.",
            RiskLevel::Critical => "Do not interact until the findings are resolved.",
        };
        format!("{} {} RISK ({}/100) - {}", self.level.emoji(), self.level.as_str().to_uppercase(), self.value, action)
    }

    pub fn color_code(&self) -> &'static str {
        self.level.color_code()
    }
}

/// `raw = base + Σ effective weight`, saturating
fn raw_sum(findings: &[Finding], base: u32) -> u64 {
    findings
        .iter()
        .fold(base as u64, |acc, f| acc.saturating_add(f.effective_weight() as u64))
}

/// Aggregate on the 3-level table
pub fn aggregate(findings: &[Finding], base: u32) -> RiskScore {
    aggregate_with_scale(findings, base, LevelScale::ThreeTier)
}

pub fn aggregate_with_scale(findings: &[Finding], base: u32, scale: LevelScale) -> RiskScore {
    let raw = raw_sum(findings, base);
    let value = raw.min(100) as u8;
    RiskScore {
        value,
        level: RiskLevel::from_score(value, scale),
        raw,
    }
}

/// A base score paired with a threshold table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreAggregator {
    pub base: u32,
    pub scale: LevelScale,
}

impl ScoreAggregator {
    pub const fn new(base: u32, scale: LevelScale) -> Self {
        Self { base, scale }
    }

    /// Contract risk engine: base 0, 3-level
    pub const fn contract_audit() -> Self {
        Self::new(CONTRACT_AUDIT_BASE_SCORE, LevelScale::ThreeTier)
    }

    /// Cross-chain analysis: base 50, 4-level
    pub const fn cross_chain() -> Self {
        Self::new(CROSS_CHAIN_BASE_SCORE, LevelScale::FourTier)
    }

    pub fn aggregate(&self, findings: &[Finding]) -> RiskScore {
        aggregate_with_scale(findings, self.base, self.scale)
    }
}

/// Findings together with the score they produce
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredFindings {
    pub score: RiskScore,
    pub findings: Vec<Finding>,
}

/// Builder collecting detector output before scoring
pub struct RiskScoreBuilder {
    aggregator: ScoreAggregator,
    findings: Vec<Finding>,
}

impl RiskScoreBuilder {
    pub fn new(aggregator: ScoreAggregator) -> Self {
        Self {
            aggregator,
            findings: Vec::new(),
        }
    }

    pub fn with_finding(mut self, finding: Finding) -> Self {
        self.findings.push(finding);
        self
    }

    /// Add a finding only when its check fired
    pub fn with_check(self, fired: bool, finding: impl FnOnce() -> Finding) -> Self {
        if fired {
            self.with_finding(finding())
        } else {
            self
        }
    }

    pub fn with_findings(mut self, findings: impl IntoIterator<Item = Finding>) -> Self {
        self.findings.extend(findings);
        self
    }

    /// Build final risk score
    pub fn build(self) -> ScoredFindings {
        ScoredFindings {
            score: self.aggregator.aggregate(&self.findings),
            findings: self.findings,
        }
    }
}

impl Default for RiskScoreBuilder {
    fn default() -> Self {
        Self::new(ScoreAggregator::contract_audit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn high() -> Finding {
        Finding::new("reentrancy", RiskLevel::High, "reentrancy")
    }

    fn medium() -> Finding {
        Finding::new("relay", RiskLevel::Medium, "relay")
    }

    fn low() -> Finding {
        Finding::new("bridge_status_check", RiskLevel::Low, "status")
    }

    #[test]
    fn test_empty_base_zero() {
        let score = aggregate(&[], 0);
        assert_eq!(score.value, 0);
        assert_eq!(score.level, RiskLevel::Low);
    }

    #[test]
    fn test_empty_returns_clamped_base() {
        for base in [0, 29, 50, 100, 150, u32::MAX] {
            assert_eq!(aggregate(&[], base).value as u32, base.min(100));
        }
    }

    #[test]
    fn test_high_plus_medium_on_base_50() {
        let findings = [
            Finding::weighted("bridge_deposit", RiskLevel::High, 25, "deposit"),
            Finding::weighted("message_passing", RiskLevel::Medium, 15, "relay"),
        ];
        let four = aggregate_with_scale(&findings, 50, LevelScale::FourTier);
        assert_eq!(four.value, 90);
        assert_eq!(four.level, RiskLevel::Critical);
        let three = aggregate(&findings, 50);
        assert_eq!(three.value, 90);
        assert_eq!(three.level, RiskLevel::High);
    }

    #[test]
    fn test_ten_high_findings_clamp() {
        let findings: Vec<Finding> = (0..10).map(|_| high()).collect();
        let three = aggregate(&findings, 0);
        assert_eq!(three.raw, 250);
        assert_eq!(three.value, 100);
        assert_eq!(three.level, RiskLevel::High);
        assert_eq!(aggregate_with_scale(&findings, 0, LevelScale::FourTier).level, RiskLevel::Critical);
    }

    #[test]
    fn test_level_boundaries() {
        let three = |s| RiskLevel::from_score(s, LevelScale::ThreeTier);
        let four = |s| RiskLevel::from_score(s, LevelScale::FourTier);
        assert_eq!(three(29), RiskLevel::Low);
        assert_eq!(three(30), RiskLevel::Medium);
        assert_eq!(three(69), RiskLevel::Medium);
        assert_eq!(three(70), RiskLevel::High);
        assert_eq!(three(100), RiskLevel::High);
        assert_eq!(four(79), RiskLevel::High);
        assert_eq!(four(80), RiskLevel::Critical);
        assert_eq!(four(29), RiskLevel::Low);
    }

    #[test]
    fn test_order_does_not_matter() {
        let findings = vec![high(), medium(), low(), high(), low()];
        let expected = aggregate(&findings, 10);
        let mut reversed = findings.clone();
        reversed.reverse();
        assert_eq!(aggregate(&reversed, 10), expected);
        for shift in 0..findings.len() {
            let mut rotated = findings.clone();
            rotated.rotate_left(shift);
            assert_eq!(aggregate(&rotated, 10), expected);
        }
    }

    #[test]
    fn test_value_always_in_range() {
        let big = Finding::weighted("custom", RiskLevel::Low, u32::MAX, "huge");
        for n in 0..20 {
            let findings: Vec<Finding> = (0..n).map(|_| big.clone()).collect();
            for base in [0, 50, u32::MAX] {
                assert!(aggregate(&findings, base).value <= 100);
            }
        }
    }

    #[test]
    fn test_explicit_weight_over_100_clamped_at_end() {
        let findings = [Finding::weighted("custom", RiskLevel::Low, 150, "big")];
        let score = aggregate(&findings, 0);
        assert_eq!(score.raw, 150);
        assert_eq!(score.value, 100);
    }

    #[test]
    fn test_builder_with_checks() {
        let scored = RiskScoreBuilder::default()
            .with_check(true, || Finding::weighted("access_control", RiskLevel::High, 25, "a"))
            .with_check(false, || Finding::weighted("upgradeable", RiskLevel::Medium, 15, "b"))
            .with_check(true, || Finding::weighted("economic_security", RiskLevel::Medium, 20, "c"))
            .build();
        assert_eq!(scored.findings.len(), 2);
        assert_eq!(scored.score.value, 45);
        assert_eq!(scored.score.level, RiskLevel::Medium);
    }

    #[test]
    fn test_recommendation_mentions_level() {
        let score = ScoreAggregator::cross_chain().aggregate(&[]);
        assert_eq!(score.value, 50);
        assert!(score.recommendation().contains("MEDIUM"));
    }
}
