//! Cross-chain report assembler
//!
//! Runs the cross-chain analyzer and the chain communication map, then lays
//! the results out in four fixed sections. An LLM narrative is attached when
//! a client is configured; a failed completion leaves it out.

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use eyre::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::cross_chain::{ChainCommunicationMap, CrossChainAnalysis, CrossChainAnalyzer};
use crate::models::{Finding, RiskLevel};
use crate::providers::{CompletionRequest, LlmClient};
use crate::reports::prose::{segment_prose, ProseSections};

const GENERIC_RECOMMENDATION: &str =
    "Review and implement appropriate security measures based on the specific risk.";

/// Advice for a finding type. `bridge_*` and `crosschain_*` share the bridge
/// advice, other `*_transfer` types the asset transfer advice.
pub fn recommendation_for(kind: &str) -> &'static str {
    match kind {
        k if k.starts_with("bridge_") || k.starts_with("crosschain_") => "Implement additional security checks for bridge interactions and consider using a time-lock mechanism for large transfers.",
        "message_passing" => "Add message verification and replay protection mechanisms for cross-chain messages.",
        k if k.ends_with("_transfer") => "Implement a gradual release mechanism for cross-chain asset transfers and add emergency pause functionality.",
        "reentrancy" => "Implement reentrancy guards and follow the checks-effects-interactions pattern.",
        "overflow" => "Use SafeMath or similar libraries for arithmetic operations.",
        "unchecked" => "Add proper error handling and validation for external calls.",
        "selfdestruct" => "Consider implementing a multi-signature requirement for self-destruct operations.",
        "delegatecall" => "Limit delegatecall usage and implement proper access controls.",
        _ => GENERIC_RECOMMENDATION,
    }
}

// ============================================
// REPORT TYPES
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossChainReport {
    pub report_id: String,
    pub generated_at: DateTime<Utc>,
    pub contract_address: Address,
    pub source_chain: String,
    pub target_chains: Vec<String>,
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub sections: ReportSections,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<ProseSections>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSections {
    pub executive_summary: ExecutiveSummary,
    pub risk_analysis: RiskAnalysisSection,
    pub chain_communication: ChainCommunicationSection,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub overview: String,
    pub risk_score: u8,
    /// High and Critical findings
    pub key_findings: Vec<Finding>,
    pub timestamp: DateTime<Utc>,
}

/// Findings bucketed by severity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeverityBuckets<T> {
    pub critical: T,
    pub high: T,
    pub medium: T,
    pub low: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAnalysisSection {
    pub risk_categories: SeverityBuckets<Vec<Finding>>,
    pub risk_distribution: SeverityBuckets<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceSummary {
    pub exists: bool,
    pub interaction_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionPattern {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: RiskLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainCommunicationSection {
    pub chain_presence: BTreeMap<String, PresenceSummary>,
    /// Only chains where the contract exists
    pub communication_patterns: BTreeMap<String, Vec<InteractionPattern>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub risk_type: String,
    pub priority: RiskLevel,
    pub recommendation: String,
}

// ============================================
// SECTION BUILDERS
// ============================================

fn executive_summary(analysis: &CrossChainAnalysis) -> ExecutiveSummary {
    ExecutiveSummary {
        overview: format!("Cross-chain analysis of contract {}", analysis.address),
        risk_score: analysis.risk_score,
        key_findings: analysis
            .risks
            .iter()
            .filter(|r| r.severity >= RiskLevel::High)
            .cloned()
            .collect(),
        timestamp: analysis.analysis_timestamp,
    }
}

fn risk_analysis(risks: &[Finding]) -> RiskAnalysisSection {
    let mut categories: SeverityBuckets<Vec<Finding>> = SeverityBuckets::default();
    for risk in risks {
        let bucket = match risk.severity {
            RiskLevel::Critical => &mut categories.critical,
            RiskLevel::High => &mut categories.high,
            RiskLevel::Medium => &mut categories.medium,
            RiskLevel::Low => &mut categories.low,
        };
        bucket.push(risk.clone());
    }

    let risk_distribution = SeverityBuckets {
        critical: categories.critical.len(),
        high: categories.high.len(),
        medium: categories.medium.len(),
        low: categories.low.len(),
    };

    RiskAnalysisSection {
        risk_categories: categories,
        risk_distribution,
    }
}

fn chain_communication(chain_map: &ChainCommunicationMap) -> ChainCommunicationSection {
    let chain_presence = chain_map
        .iter()
        .map(|(chain, presence)| {
            (
                chain.clone(),
                PresenceSummary {
                    exists: presence.exists,
                    interaction_count: presence.interactions.len(),
                },
            )
        })
        .collect();

    let communication_patterns = chain_map
        .iter()
        .filter(|(_, presence)| presence.exists)
        .map(|(chain, presence)| {
            let patterns = presence
                .interactions
                .iter()
                .map(|i| InteractionPattern {
                    kind: i.kind.clone(),
                    severity: i.severity,
                })
                .collect();
            (chain.clone(), patterns)
        })
        .collect();

    ChainCommunicationSection {
        chain_presence,
        communication_patterns,
    }
}

/// One entry per Medium-or-worse finding, in finding order
fn recommendations(risks: &[Finding]) -> Vec<Recommendation> {
    risks
        .iter()
        .filter(|r| r.severity >= RiskLevel::Medium)
        .map(|r| Recommendation {
            risk_type: r.kind.clone(),
            priority: r.severity,
            recommendation: recommendation_for(&r.kind).to_string(),
        })
        .collect()
}

pub fn report_id(at: DateTime<Utc>) -> String {
    format!("ccr_{}", at.format("%Y%m%d_%H%M%S"))
}

/// Lay out an analysis and a chain map as a report
pub fn assemble_report(
    analysis: &CrossChainAnalysis,
    chain_map: &ChainCommunicationMap,
    generated_at: DateTime<Utc>,
) -> CrossChainReport {
    CrossChainReport {
        report_id: report_id(generated_at),
        generated_at,
        contract_address: analysis.address,
        source_chain: analysis.source_chain.clone(),
        target_chains: analysis.target_chains.clone(),
        risk_score: analysis.risk_score,
        risk_level: analysis.risk_level,
        sections: ReportSections {
            executive_summary: executive_summary(analysis),
            risk_analysis: risk_analysis(&analysis.risks),
            chain_communication: chain_communication(chain_map),
            recommendations: recommendations(&analysis.risks),
        },
        narrative: None,
    }
}

fn narrative_prompt(analysis: &CrossChainAnalysis) -> String {
    let findings: Vec<String> = analysis
        .risks
        .iter()
        .map(|r| format!("- [{}] {}: {}", r.severity, r.kind, r.description))
        .collect();
    format!(
        "Summarize the cross-chain risk of contract {} on {} (score {}/100, {}).\n\nFindings:\n{}\n\nPlease provide:\n1. A concise summary\n2. Risk analysis\n3. Specific recommendations",
        analysis.address,
        analysis.source_chain,
        analysis.risk_score,
        analysis.risk_level,
        if findings.is_empty() { "- none".to_string() } else { findings.join("\n") }
    )
}

// ============================================
// GENERATOR
// ============================================

pub struct CrossChainReportGenerator {
    analyzer: Arc<CrossChainAnalyzer>,
    llm: Option<Arc<dyn LlmClient>>,
}

impl CrossChainReportGenerator {
    pub fn new(analyzer: Arc<CrossChainAnalyzer>, llm: Option<Arc<dyn LlmClient>>) -> Self {
        Self { analyzer, llm }
    }

    pub async fn generate_report(
        &self,
        address: Address,
        source_chain: &str,
        target_chains: Vec<String>,
    ) -> Result<CrossChainReport> {
        let analysis = self
            .analyzer
            .analyze_cross_chain_risk(address, source_chain, target_chains)
            .await?;
        let chain_map = self.analyzer.get_chain_communication_map(address).await;

        let mut report = assemble_report(&analysis, &chain_map, Utc::now());

        if let Some(llm) = &self.llm {
            let request = CompletionRequest::new("You are a blockchain security expert.", narrative_prompt(&analysis));
            match llm.complete(request).await {
                Ok(text) => report.narrative = Some(segment_prose(&text)),
                Err(e) => warn!("⚠️ Report narrative skipped for {}: {:#}", address, e),
            }
        }

        info!(
            "📄 Cross-chain report {} for {} ({} recommendations)",
            report.report_id,
            address,
            report.sections.recommendations.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cross_chain::ChainPresence;
    use chrono::TimeZone;

    fn analysis(risks: Vec<Finding>) -> CrossChainAnalysis {
        CrossChainAnalysis {
            address: Address::repeat_byte(0x42),
            source_chain: "avalanche".to_string(),
            target_chains: vec!["ethereum".to_string()],
            risks,
            risk_score: 90,
            risk_level: RiskLevel::Critical,
            analysis_timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_recommendation_table() {
        assert!(recommendation_for("reentrancy").contains("reentrancy guards"));
        assert!(recommendation_for("bridge_deposit").contains("bridge interactions"));
        assert!(recommendation_for("bridge_transfer").contains("bridge interactions"));
        assert!(recommendation_for("crosschain_transfer").contains("bridge interactions"));
        assert!(recommendation_for("lock_transfer").contains("gradual release"));
        assert!(recommendation_for("mint_transfer").contains("gradual release"));
        assert_eq!(recommendation_for("economic_security"), GENERIC_RECOMMENDATION);
    }

    #[test]
    fn test_sections() {
        let risks = vec![
            Finding::new("bridge_deposit", RiskLevel::High, "deposits"),
            Finding::new("message_passing", RiskLevel::Medium, "relay"),
            Finding::new("bridge_status_check", RiskLevel::Low, "status"),
        ];
        let mut map = ChainCommunicationMap::new();
        map.insert(
            "avalanche".to_string(),
            ChainPresence {
                exists: true,
                interactions: vec![Finding::new("bridge_withdrawal", RiskLevel::High, "w")],
            },
        );
        map.insert(
            "ethereum".to_string(),
            ChainPresence {
                exists: false,
                interactions: vec![],
            },
        );

        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap();
        let report = assemble_report(&analysis(risks), &map, at);

        assert_eq!(report.report_id, "ccr_20240301_123005");
        assert_eq!(report.sections.executive_summary.key_findings.len(), 1);
        assert_eq!(report.sections.risk_analysis.risk_distribution.high, 1);
        assert_eq!(report.sections.risk_analysis.risk_distribution.medium, 1);
        assert_eq!(report.sections.risk_analysis.risk_distribution.low, 1);

        let comm = &report.sections.chain_communication;
        assert_eq!(comm.chain_presence["avalanche"].interaction_count, 1);
        assert!(!comm.chain_presence["ethereum"].exists);
        assert!(comm.communication_patterns.contains_key("avalanche"));
        assert!(!comm.communication_patterns.contains_key("ethereum"));

        let recs = &report.sections.recommendations;
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].priority, RiskLevel::High);
        assert_eq!(recs[1].risk_type, "message_passing");
        assert!(recs[1].recommendation.contains("replay protection"));
    }

    #[test]
    fn test_report_serializes_without_narrative() {
        let report = assemble_report(&analysis(vec![]), &ChainCommunicationMap::new(), Utc::now());
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("narrative").is_none());
        assert!(json["sections"]["recommendations"].as_array().unwrap().is_empty());
    }
}
