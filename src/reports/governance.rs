//! DAO proposal analysis
//!
//! The LLM writes the analysis; the overall risk comes from running the
//! governance keyword table over its risk paragraph (base 0, 3-level).
//! Proposal data is not read from chain: callers pass details or get the
//! placeholder proposal.

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use eyre::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::patterns::{match_keywords, GOVERNANCE_RISK_PATTERNS};
use crate::core::risk_score::{RiskScoreBuilder, ScoreAggregator, ScoredFindings};
use crate::models::{Finding, RiskLevel};
use crate::providers::{CompletionRequest, LlmClient};
use crate::reports::prose::segment_prose;

pub const GOVERNANCE_EXPERT_PROMPT: &str = "You are a DAO governance expert.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProposalDetails {
    pub title: String,
    pub description: String,
    pub actions: Vec<String>,
    pub voting_period: String,
    pub quorum: String,
}

impl Default for ProposalDetails {
    fn default() -> Self {
        Self {
            title: "Sample Proposal".to_string(),
            description: "This is a placeholder for the actual proposal data".to_string(),
            actions: vec!["Action 1".to_string(), "Action 2".to_string()],
            voting_period: "7 days".to_string(),
            quorum: "1000 tokens".to_string(),
        }
    }
}

pub fn build_proposal_prompt(details: &ProposalDetails) -> String {
    format!(
        "Analyze the following DAO proposal:\n\n\
         Title: {}\n\
         Description: {}\n\
         Actions: {}\n\
         Voting Period: {}\n\
         Quorum: {}\n\n\
         Please provide:\n\
         1. A concise summary\n\
         2. Risk analysis\n\
         3. Specific recommendations",
        details.title,
        details.description,
        details.actions.join(", "),
        details.voting_period,
        details.quorum
    )
}

/// Governance keyword findings scored from base 0
pub fn assess_proposal_risk(risk_text: &str) -> ScoredFindings {
    RiskScoreBuilder::new(ScoreAggregator::contract_audit())
        .with_findings(match_keywords(risk_text, GOVERNANCE_RISK_PATTERNS))
        .build()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalRiskAnalysis {
    pub overall_risk: RiskLevel,
    pub risk_score: u8,
    pub details: String,
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalAnalysis {
    pub proposal_id: String,
    pub dao_address: Address,
    pub summary: String,
    pub risk_analysis: ProposalRiskAnalysis,
    pub recommendations: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

pub async fn analyze_proposal(
    llm: &dyn LlmClient,
    proposal_id: &str,
    dao_address: Address,
    details: Option<ProposalDetails>,
) -> Result<ProposalAnalysis> {
    let details = details.unwrap_or_default();
    let request = CompletionRequest::new(GOVERNANCE_EXPERT_PROMPT, build_proposal_prompt(&details))
        .temperature(0.7)
        .max_tokens(1500);

    let text = llm.complete(request).await?;
    let sections = segment_prose(&text);
    let scored = assess_proposal_risk(&sections.risk_analysis);

    info!(
        "🗳️ Proposal {} on {}: {} governance risk ({} keywords)",
        proposal_id,
        dao_address,
        scored.score.level,
        scored.findings.len()
    );

    Ok(ProposalAnalysis {
        proposal_id: proposal_id.to_string(),
        dao_address,
        summary: sections.summary,
        risk_analysis: ProposalRiskAnalysis {
            overall_risk: scored.score.level,
            risk_score: scored.score.value,
            details: sections.risk_analysis,
            findings: scored.findings,
        },
        recommendations: sections.recommendations,
        analyzed_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_prompt() {
        let prompt = build_proposal_prompt(&ProposalDetails::default());
        assert!(prompt.contains("Title: Sample Proposal"));
        assert!(prompt.contains("Actions: Action 1, Action 2"));
        assert!(prompt.contains("Quorum: 1000 tokens"));
        assert!(prompt.ends_with("3. Specific recommendations"));
    }

    #[test]
    fn test_partial_details_deserialize() {
        let details: ProposalDetails = serde_json::from_str(r#"{"title":"Raise fees"}"#).unwrap();
        assert_eq!(details.title, "Raise fees");
        assert_eq!(details.voting_period, "7 days");
    }

    #[test]
    fn test_proposal_risk_levels() {
        assert_eq!(assess_proposal_risk("").score.level, RiskLevel::Low);
        assert_eq!(assess_proposal_risk("Quorum is low").score.value, 5);

        let scored = assess_proposal_risk("Treasury transfer via admin upgrade");
        assert_eq!(scored.findings.len(), 3);
        assert_eq!(scored.score.value, 65);
        assert_eq!(scored.score.level, RiskLevel::Medium);

        let scored = assess_proposal_risk("treasury upgrade admin mint emergency");
        assert_eq!(scored.score.value, 95);
        assert_eq!(scored.score.level, RiskLevel::High);
    }
}
