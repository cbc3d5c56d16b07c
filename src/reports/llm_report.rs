//! Free-text contract reports
//!
//! One prompt per report type, sent as-is to the LLM. The answer is returned
//! verbatim.

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use eyre::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::providers::{CompletionRequest, LlmClient};

pub const SECURITY_EXPERT_PROMPT: &str = "You are a blockchain security expert.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Security,
    Governance,
    Activity,
}

impl ReportType {
    /// Unknown names fall back to an activity report
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "security" => ReportType::Security,
            "governance" => ReportType::Governance,
            _ => ReportType::Activity,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Security => "security",
            ReportType::Governance => "governance",
            ReportType::Activity => "activity",
        }
    }

    fn intro(&self) -> &'static str {
        match self {
            ReportType::Security => "Analyze the following smart contract for security vulnerabilities:",
            ReportType::Governance => "Analyze the following smart contract for governance aspects:",
            ReportType::Activity => "Analyze the following contract's on-chain activity:",
        }
    }

    fn focus(&self) -> [&'static str; 4] {
        match self {
            ReportType::Security => [
                "Common vulnerabilities (reentrancy, overflow, etc.)",
                "Access control issues",
                "Gas optimization opportunities",
                "Best practices compliance",
            ],
            ReportType::Governance => [
                "Voting mechanisms",
                "Proposal handling",
                "Access control",
                "Upgradeability",
            ],
            ReportType::Activity => [
                "Transaction patterns",
                "User interactions",
                "Value flow",
                "Notable events",
            ],
        }
    }
}

/// Source when known, otherwise just the address
pub fn build_prompt(report_type: ReportType, contract_address: Address, source: Option<&str>) -> String {
    let subject = match source {
        Some(src) if !src.trim().is_empty() => src.to_string(),
        _ => format!("Contract at {}", contract_address),
    };
    let focus: Vec<String> = report_type
        .focus()
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect();

    format!("{}\n{}\n\nFocus on:\n{}", report_type.intro(), subject, focus.join("\n"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmReport {
    pub report_id: String,
    pub report_type: ReportType,
    pub contract_address: Address,
    pub content: String,
    pub model: String,
    pub generated_at: DateTime<Utc>,
}

pub async fn generate_report(
    llm: &dyn LlmClient,
    contract_address: Address,
    report_type: ReportType,
    source: Option<&str>,
) -> Result<LlmReport> {
    let request = CompletionRequest::new(
        SECURITY_EXPERT_PROMPT,
        build_prompt(report_type, contract_address, source),
    )
    .temperature(0.7)
    .max_tokens(2000);

    let content = llm.complete(request).await?;
    let generated_at = Utc::now();
    let report_id = format!("report_{}", generated_at.format("%Y%m%d_%H%M%S"));

    info!("📝 {} report {} for {}", report_type.as_str(), report_id, contract_address);

    Ok(LlmReport {
        report_id,
        report_type,
        contract_address,
        content,
        model: llm.model().to_string(),
        generated_at,
    })
}
