//! Type definitions for TrustMesh
//! Core data structures shared by the detectors, the scorer and the reports

use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk level, used both as finding severity and as score level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Minor concern
    Low,
    /// Review recommended
    Medium,
    /// Likely dangerous
    High,
    /// Only produced by the 4-level score table or by explicit detectors
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }

    /// Weight used when a finding carries only a severity
    pub fn default_weight(&self) -> u32 {
        match self {
            RiskLevel::Low => 5,
            RiskLevel::Medium => 15,
            RiskLevel::High | RiskLevel::Critical => 25,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            RiskLevel::Low => "🟡",
            RiskLevel::Medium => "🟠",
            RiskLevel::High => "🔴",
            RiskLevel::Critical => "💀",
        }
    }

    /// Color code for dashboards
    pub fn color_code(&self) -> &'static str {
        match self {
            RiskLevel::Low => "#22c55e",
            RiskLevel::Medium => "#eab308",
            RiskLevel::High => "#ef4444",
            RiskLevel::Critical => "#7c2d12",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single detected pattern.
///
/// Findings are immutable once built and are kept in sequences: duplicates
/// are allowed and each one counts toward the aggregate score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: RiskLevel,
    /// Explicit score impact; `None` falls back to the severity table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
    pub description: String,
}

impl Finding {
    /// Severity-only finding
    pub fn new(kind: impl Into<String>, severity: RiskLevel, description: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            severity,
            weight: None,
            description: description.into(),
        }
    }

    /// Finding with an explicit score impact
    pub fn weighted(
        kind: impl Into<String>,
        severity: RiskLevel,
        weight: u32,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            severity,
            weight: Some(weight),
            description: description.into(),
        }
    }

    /// Weight this finding contributes to an aggregate score
    pub fn effective_weight(&self) -> u32 {
        self.weight.unwrap_or_else(|| self.severity.default_weight())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }

    #[test]
    fn test_severity_weight_table() {
        assert_eq!(RiskLevel::High.default_weight(), 25);
        assert_eq!(RiskLevel::Medium.default_weight(), 15);
        assert_eq!(RiskLevel::Low.default_weight(), 5);
    }

    #[test]
    fn test_explicit_weight_wins() {
        let f = Finding::weighted("economic_security", RiskLevel::Medium, 20, "fee logic");
        assert_eq!(f.effective_weight(), 20);
        let f = Finding::new("reentrancy", RiskLevel::High, "reentrancy");
        assert_eq!(f.effective_weight(), 25);
    }

    #[test]
    fn test_finding_serializes_type_field() {
        let f = Finding::new("overflow", RiskLevel::High, "Potential integer overflow");
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["type"], "overflow");
        assert_eq!(json["severity"], "High");
        assert!(json.get("weight").is_none());
    }
}
