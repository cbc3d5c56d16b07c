//! Telemetry Module for TrustMesh
//!
//! In-memory statistics about analyses run since process start. Feeds the
//! stats, aggregate and timeline endpoints. Nothing is persisted and no
//! addresses are stored.

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::core::risk_engine::ContractType;
use crate::models::Finding;

/// Events kept in memory; older ones are dropped first
const MAX_EVENTS: usize = 10_000;

/// Days covered by the risk timeline
pub const TIMELINE_DAYS: i64 = 7;

pub const AGGREGATE_DISCLAIMER: &str =
    "Aggregate data is based on analyzed contracts and may not represent the entire ecosystem.";

pub const TIMELINE_DISCLAIMER: &str =
    "Timeline data is based on available analysis and may not capture all events.";

// ============================================
// RISK CATEGORIES
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskCategory {
    Bridge,
    Message,
    Security,
    Value,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 4] = [
        RiskCategory::Bridge,
        RiskCategory::Message,
        RiskCategory::Security,
        RiskCategory::Value,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RiskCategory::Bridge => "Bridge Risks",
            RiskCategory::Message => "Message Risks",
            RiskCategory::Security => "Security Risks",
            RiskCategory::Value => "Value Risks",
        }
    }

    /// Category of a finding kind
    pub fn of(kind: &str) -> RiskCategory {
        match kind {
            k if k.starts_with("bridge") || k == "crosschain_transfer" => RiskCategory::Bridge,
            "message_passing" => RiskCategory::Message,
            k if k.ends_with("_transfer") || k == "economic_security" || k.ends_with("_risk") => {
                RiskCategory::Value
            }
            _ => RiskCategory::Security,
        }
    }
}

// ============================================
// EVENTS & RESPONSES
// ============================================

/// Which analysis produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    ContractAudit,
    CrossChain,
    Governance,
}

/// Single analysis event (anonymized)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: AnalysisKind,
    pub contract_type: Option<ContractType>,
    pub risk_score: u8,
    pub categories: Vec<RiskCategory>,
    pub finding_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelemetryStats {
    pub total_audits: u64,
    pub total_cross_chain: u64,
    pub total_governance: u64,
    pub total_reports: u64,
    pub whale_alerts: u64,
    pub avg_latency_ms: f64,
    pub session_start: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractTypeCount {
    #[serde(rename = "type")]
    pub contract_type: ContractType,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskCategoryCount {
    pub category: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateAnalysis {
    pub contract_types: Vec<ContractTypeCount>,
    pub risk_categories: Vec<RiskCategoryCount>,
    pub disclaimer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub date: NaiveDate,
    #[serde(rename = "riskScore")]
    pub risk_score: u8,
    pub findings: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskTimeline {
    pub timeline: Vec<TimelinePoint>,
    pub disclaimer: String,
}

// ============================================
// COLLECTOR
// ============================================

/// Main telemetry collector
pub struct TelemetryCollector {
    events: RwLock<VecDeque<AnalysisEvent>>,
    total_audits: AtomicU64,
    total_cross_chain: AtomicU64,
    total_governance: AtomicU64,
    total_reports: AtomicU64,
    whale_alerts: AtomicU64,
    total_latency_ms: AtomicU64,
    timed_requests: AtomicU64,
    session_start: DateTime<Utc>,
}

impl TelemetryCollector {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(VecDeque::new()),
            total_audits: AtomicU64::new(0),
            total_cross_chain: AtomicU64::new(0),
            total_governance: AtomicU64::new(0),
            total_reports: AtomicU64::new(0),
            whale_alerts: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
            timed_requests: AtomicU64::new(0),
            session_start: Utc::now(),
        }
    }

    /// Record a scored analysis
    pub fn record_analysis(
        &self,
        kind: AnalysisKind,
        contract_type: Option<ContractType>,
        risk_score: u8,
        findings: &[Finding],
        latency_ms: u64,
    ) {
        self.record_event(AnalysisEvent {
            timestamp: Utc::now(),
            kind,
            contract_type,
            risk_score,
            categories: findings.iter().map(|f| RiskCategory::of(&f.kind)).collect(),
            finding_count: findings.len(),
        });
        self.record_latency(latency_ms);
    }

    /// Record an event with an explicit timestamp
    pub fn record_event(&self, event: AnalysisEvent) {
        let counter = match event.kind {
            AnalysisKind::ContractAudit => &self.total_audits,
            AnalysisKind::CrossChain => &self.total_cross_chain,
            AnalysisKind::Governance => &self.total_governance,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut events) = self.events.write() {
            if events.len() >= MAX_EVENTS {
                events.pop_front();
            }
            events.push_back(event);
        }
    }

    pub fn record_report(&self, latency_ms: u64) {
        self.total_reports.fetch_add(1, Ordering::Relaxed);
        self.record_latency(latency_ms);
    }

    pub fn record_whale_alerts(&self, count: usize) {
        self.whale_alerts.fetch_add(count as u64, Ordering::Relaxed);
    }

    fn record_latency(&self, latency_ms: u64) {
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
        self.timed_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> TelemetryStats {
        let timed = self.timed_requests.load(Ordering::Relaxed);
        let total_latency = self.total_latency_ms.load(Ordering::Relaxed);
        let avg_latency_ms = if timed > 0 {
            total_latency as f64 / timed as f64
        } else {
            0.0
        };

        TelemetryStats {
            total_audits: self.total_audits.load(Ordering::Relaxed),
            total_cross_chain: self.total_cross_chain.load(Ordering::Relaxed),
            total_governance: self.total_governance.load(Ordering::Relaxed),
            total_reports: self.total_reports.load(Ordering::Relaxed),
            whale_alerts: self.whale_alerts.load(Ordering::Relaxed),
            avg_latency_ms,
            session_start: Some(self.session_start),
        }
    }

    /// Contract type and risk category counts over recorded events
    pub fn aggregate(&self) -> AggregateAnalysis {
        let mut types: HashMap<ContractType, u64> = HashMap::new();
        let mut categories: HashMap<RiskCategory, u64> = HashMap::new();

        if let Ok(events) = self.events.read() {
            for event in events.iter() {
                if let Some(t) = event.contract_type {
                    *types.entry(t).or_insert(0) += 1;
                }
                for c in &event.categories {
                    *categories.entry(*c).or_insert(0) += 1;
                }
            }
        }

        AggregateAnalysis {
            contract_types: ContractType::ALL
                .iter()
                .map(|t| ContractTypeCount {
                    contract_type: *t,
                    count: types.get(t).copied().unwrap_or(0),
                })
                .collect(),
            risk_categories: RiskCategory::ALL
                .iter()
                .map(|c| RiskCategoryCount {
                    category: c.label().to_string(),
                    count: categories.get(c).copied().unwrap_or(0),
                })
                .collect(),
            disclaimer: AGGREGATE_DISCLAIMER.to_string(),
        }
    }

    /// Daily average score and finding count for the last 7 days up to `today`
    pub fn timeline(&self, today: NaiveDate) -> RiskTimeline {
        let mut buckets: HashMap<NaiveDate, (u64, u64, u64)> = HashMap::new();

        if let Ok(events) = self.events.read() {
            for event in events.iter() {
                let bucket = buckets.entry(event.timestamp.date_naive()).or_insert((0, 0, 0));
                bucket.0 += event.risk_score as u64;
                bucket.1 += 1;
                bucket.2 += event.finding_count as u64;
            }
        }

        let timeline = (0..TIMELINE_DAYS)
            .map(|i| {
                let date = today - ChronoDuration::days(TIMELINE_DAYS - 1 - i);
                let (score_sum, count, findings) = buckets.get(&date).copied().unwrap_or((0, 0, 0));
                let risk_score = if count > 0 {
                    (score_sum as f64 / count as f64).round() as u8
                } else {
                    0
                };
                TimelinePoint {
                    date,
                    risk_score,
                    findings,
                }
            })
            .collect();

        RiskTimeline {
            timeline,
            disclaimer: TIMELINE_DISCLAIMER.to_string(),
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskLevel;

    fn finding(kind: &str) -> Finding {
        Finding::new(kind, RiskLevel::Medium, kind)
    }

    #[test]
    fn test_risk_category_mapping() {
        assert_eq!(RiskCategory::of("bridge_deposit"), RiskCategory::Bridge);
        assert_eq!(RiskCategory::of("bridge_transfer"), RiskCategory::Bridge);
        assert_eq!(RiskCategory::of("crosschain_transfer"), RiskCategory::Bridge);
        assert_eq!(RiskCategory::of("message_passing"), RiskCategory::Message);
        assert_eq!(RiskCategory::of("mint_transfer"), RiskCategory::Value);
        assert_eq!(RiskCategory::of("economic_security"), RiskCategory::Value);
        assert_eq!(RiskCategory::of("reentrancy"), RiskCategory::Security);
        assert_eq!(RiskCategory::of("access_control"), RiskCategory::Security);
    }

    #[test]
    fn test_collector_counts() {
        let collector = TelemetryCollector::new();
        collector.record_analysis(
            AnalysisKind::ContractAudit,
            Some(ContractType::Erc20),
            40,
            &[finding("access_control"), finding("cross_contract_interaction")],
            10,
        );
        collector.record_analysis(AnalysisKind::CrossChain, None, 65, &[finding("bridge_deposit")], 30);
        collector.record_whale_alerts(3);

        let stats = collector.get_stats();
        assert_eq!(stats.total_audits, 1);
        assert_eq!(stats.total_cross_chain, 1);
        assert_eq!(stats.whale_alerts, 3);
        assert!((stats.avg_latency_ms - 20.0).abs() < 0.001);

        let aggregate = collector.aggregate();
        assert_eq!(aggregate.contract_types.len(), 4);
        assert_eq!(aggregate.contract_types[0].count, 1);
        let security = aggregate.risk_categories.iter().find(|c| c.category == "Security Risks").unwrap();
        assert_eq!(security.count, 2);
        let bridge = aggregate.risk_categories.iter().find(|c| c.category == "Bridge Risks").unwrap();
        assert_eq!(bridge.count, 1);
    }

    #[test]
    fn test_timeline_buckets() {
        let collector = TelemetryCollector::new();
        let now = Utc::now();
        let yesterday = now - ChronoDuration::days(1);
        for (ts, score) in [(now, 40u8), (now, 60), (yesterday, 90)] {
            collector.record_event(AnalysisEvent {
                timestamp: ts,
                kind: AnalysisKind::ContractAudit,
                contract_type: None,
                risk_score: score,
                categories: vec![],
                finding_count: 2,
            });
        }

        let timeline = collector.timeline(now.date_naive()).timeline;
        assert_eq!(timeline.len(), 7);
        assert_eq!(timeline[6].date, now.date_naive());
        assert_eq!(timeline[6].risk_score, 50);
        assert_eq!(timeline[6].findings, 4);
        assert_eq!(timeline[5].risk_score, 90);
        assert_eq!(timeline[0].risk_score, 0);
    }

    #[test]
    fn test_event_log_drops_oldest_when_full() {
        let collector = TelemetryCollector::new();
        let now = Utc::now();
        let event = |timestamp, risk_score| AnalysisEvent {
            timestamp,
            kind: AnalysisKind::ContractAudit,
            contract_type: None,
            risk_score,
            categories: vec![],
            finding_count: 0,
        };

        collector.record_event(event(now - ChronoDuration::days(2), 99));
        for _ in 0..MAX_EVENTS {
            collector.record_event(event(now, 10));
        }

        assert_eq!(collector.events.read().unwrap().len(), MAX_EVENTS);
        assert_eq!(collector.get_stats().total_audits, MAX_EVENTS as u64 + 1);
        let timeline = collector.timeline(now.date_naive()).timeline;
        assert_eq!(timeline[4].risk_score, 0);
        assert_eq!(timeline[6].risk_score, 10);
    }

    #[test]
    fn test_timeline_serializes_camel_score() {
        let point = TimelinePoint {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            risk_score: 10,
            findings: 1,
        };
        let json = serde_json::to_value(point).unwrap();
        assert_eq!(json["riskScore"], 10);
        assert_eq!(json["date"], "2024-01-01");
    }
}
