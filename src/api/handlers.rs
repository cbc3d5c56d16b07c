//! API Request Handlers

use alloy_primitives::Address;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, warn};

use super::middleware::{RateLimitConfig, RateLimiter};
use super::types::*;
use crate::core::cross_chain::{ChainCommunicationMap, CrossChainAnalysis, CrossChainAnalyzer};
use crate::core::risk_engine::{audit_contract as run_audit, ContractAudit};
use crate::core::scanner::{
    analyze_gas_usage, get_interaction_patterns, get_token_flows, get_transaction_history,
    GasUsageSummary,
};
use crate::core::whale::get_whale_alerts;
use crate::models::{AppConfig, AppError};
use crate::providers::{ChainRpc, ExplorerClient, LlmClient, OpenAiClient, RpcRegistry};
use crate::reports::cross_chain::{CrossChainReport, CrossChainReportGenerator};
use crate::reports::governance::{analyze_proposal, ProposalAnalysis};
use crate::reports::llm_report::{generate_report, LlmReport, ReportType};
use crate::utils::cache::AuditCache;
use crate::utils::telemetry::{AggregateAnalysis, AnalysisKind, RiskTimeline, TelemetryCollector};

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    pub rpcs: RpcRegistry,
    pub llm: Option<Arc<dyn LlmClient>>,
    pub explorer: ExplorerClient,
    pub cross_chain: Arc<CrossChainAnalyzer>,
    pub cache: AuditCache,
    pub telemetry: Arc<TelemetryCollector>,
    pub rate_limiter: Arc<RateLimiter>,
    pub start_time: Instant,
}

impl AppState {
    /// State over explicit collaborators
    pub fn new(config: AppConfig, rpcs: RpcRegistry, llm: Option<Arc<dyn LlmClient>>) -> Self {
        let cross_chain = Arc::new(CrossChainAnalyzer::new(
            rpcs.clone(),
            config.probe_chains.clone(),
            config.scan.bridge_event_blocks,
        ));
        let rate_limiter = Arc::new(RateLimiter::new(RateLimitConfig::per_minute(
            config.server.rate_limit_per_minute,
        )));

        Self {
            explorer: ExplorerClient::new(&config),
            cache: AuditCache::with_ttl(config.server.cache_ttl_secs),
            telemetry: Arc::new(TelemetryCollector::new()),
            cross_chain,
            rate_limiter,
            rpcs,
            llm,
            config,
            start_time: Instant::now(),
        }
    }

    /// HTTP RPC providers for every chain, OpenAI client when a key is set
    pub fn from_config(config: AppConfig) -> Self {
        let rpcs = RpcRegistry::from_config(&config);
        let llm: Option<Arc<dyn LlmClient>> = if config.llm.is_configured() {
            match OpenAiClient::new(&config.llm) {
                Ok(client) => Some(Arc::new(client)),
                Err(e) => {
                    warn!("⚠️ LLM client disabled: {:#}", e);
                    None
                }
            }
        } else {
            warn!("⚠️ OPENAI_API_KEY not set, report endpoints will return 503");
            None
        };
        Self::new(config, rpcs, llm)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

// ============================================
// Helpers
// ============================================

type HandlerError = (StatusCode, Json<ApiResponse<()>>);
type HandlerResult<T> = Result<Json<ApiResponse<T>>, HandlerError>;

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn respond<T: Serialize>(data: T, start: Instant) -> HandlerResult<T> {
    Ok(Json(ApiResponse::success(data, elapsed_ms(start))))
}

fn fail(err: AppError, start: Instant) -> HandlerError {
    let status = StatusCode::from_u16(err.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(code = err.code_str(), "❌ {}", err.message);
    } else {
        warn!(code = err.code_str(), "⚠️ {}", err.message);
    }
    (status, Json(ApiResponse::error(ApiError::from(&err), elapsed_ms(start))))
}

fn parse_address(raw: &str, start: Instant) -> Result<Address, HandlerError> {
    raw.trim()
        .parse::<Address>()
        .map_err(|_| fail(AppError::invalid_address(raw), start))
}

fn rpc_for(state: &AppState, chain: &str, start: Instant) -> Result<Arc<dyn ChainRpc>, HandlerError> {
    state
        .rpcs
        .get(chain)
        .ok_or_else(|| fail(AppError::unsupported_chain(chain), start))
}

fn llm_for(state: &AppState, start: Instant) -> Result<Arc<dyn LlmClient>, HandlerError> {
    state
        .llm
        .clone()
        .ok_or_else(|| fail(AppError::llm_not_configured(), start))
}

fn max_blocks(state: &AppState, query: &MaxBlocksQuery, start: Instant) -> Result<u64, HandlerError> {
    let requested = query.validate().map_err(|e| fail(e, start))?;
    Ok(state.config.scan_window(requested))
}

/// Explorer source when enabled; lookup failures only cost the source
async fn lookup_source(state: &AppState, chain: &str, address: Address) -> Option<String> {
    let chain = state.config.chain(chain)?;
    match state.explorer.get_source(chain, address).await {
        Ok(source) => source,
        Err(e) => {
            warn!("⚠️ Source lookup failed for {} on {}: {:#}", address, chain.key, e);
            None
        }
    }
}

// ============================================
// Health & Stats
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    };

    Json(ApiResponse::success(data, elapsed_ms(start)))
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StatsData>> {
    let start = Instant::now();

    let data = StatsData {
        telemetry: state.telemetry.get_stats(),
        cache: state.cache.stats(),
        chains: state.rpcs.keys(),
        llm_configured: state.llm.is_some(),
        uptime_seconds: state.uptime_seconds(),
        api_version: "v1".to_string(),
    };

    Json(ApiResponse::success(data, elapsed_ms(start)))
}

// ============================================
// Contract Audit
// ============================================

pub async fn audit_contract(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AuditRequest>,
) -> HandlerResult<ContractAudit> {
    let start = Instant::now();
    let address = parse_address(&req.address, start)?;
    let rpc = rpc_for(&state, &req.chain, start)?;

    // Audits with caller-supplied source bypass the cache
    let cacheable = req.source.is_none();
    if cacheable {
        if let Some(audit) = state.cache.get(rpc.chain(), &address) {
            return respond(audit, start);
        }
    }

    let source = match req.source {
        Some(source) => Some(source),
        None if state.explorer.is_enabled() => lookup_source(&state, rpc.chain(), address).await,
        None => None,
    };

    let audit = run_audit(rpc.as_ref(), address, source.as_deref())
        .await
        .map_err(|e| fail(AppError::rpc(e), start))?;

    state.telemetry.record_analysis(
        AnalysisKind::ContractAudit,
        Some(audit.contract_type),
        audit.risk_score,
        &audit.findings,
        start.elapsed().as_millis() as u64,
    );
    if cacheable {
        state.cache.set(audit.clone());
    }

    respond(audit, start)
}

// ============================================
// Whale Monitor
// ============================================

pub async fn whale_alerts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChainQuery>,
) -> HandlerResult<WhaleAlertsData> {
    let start = Instant::now();
    let chain = query.chain.unwrap_or_else(|| state.config.default_chain.clone());
    let rpc = rpc_for(&state, &chain, start)?;

    let symbol = state
        .config
        .chain(rpc.chain())
        .map(|c| c.symbol.clone())
        .unwrap_or_default();
    let monitor = &state.config.monitor;

    let alerts = get_whale_alerts(rpc.as_ref(), monitor.lookback_blocks, monitor.min_whale_amount, &symbol)
        .await
        .map_err(|e| fail(AppError::rpc(e), start))?;
    state.telemetry.record_whale_alerts(alerts.len());

    respond(
        WhaleAlertsData {
            chain: rpc.chain().to_string(),
            min_amount: monitor.min_whale_amount,
            lookback_blocks: monitor.lookback_blocks,
            alerts,
        },
        start,
    )
}

// ============================================
// LLM Reports & Governance
// ============================================

pub async fn generate_llm_report(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReportRequest>,
) -> HandlerResult<LlmReport> {
    let start = Instant::now();
    let address = parse_address(&req.contract_address, start)?;
    let llm = llm_for(&state, start)?;

    let source = if state.explorer.is_enabled() {
        lookup_source(&state, &req.chain, address).await
    } else {
        None
    };

    let report = generate_report(llm.as_ref(), address, ReportType::parse(&req.report_type), source.as_deref())
        .await
        .map_err(|e| fail(AppError::llm(e), start))?;
    state.telemetry.record_report(start.elapsed().as_millis() as u64);

    respond(report, start)
}

pub async fn analyze_governance_proposal(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProposalRequest>,
) -> HandlerResult<ProposalAnalysis> {
    let start = Instant::now();
    let dao_address = parse_address(&req.dao_address, start)?;
    let llm = llm_for(&state, start)?;

    let analysis = analyze_proposal(llm.as_ref(), &req.proposal_id, dao_address, req.details)
        .await
        .map_err(|e| fail(AppError::llm(e), start))?;

    state.telemetry.record_analysis(
        AnalysisKind::Governance,
        None,
        analysis.risk_analysis.risk_score,
        &analysis.risk_analysis.findings,
        start.elapsed().as_millis() as u64,
    );

    respond(analysis, start)
}

pub async fn submit_vote() -> HandlerResult<()> {
    let start = Instant::now();
    Err(fail(AppError::not_implemented("AI voting not implemented yet"), start))
}

// ============================================
// Chain Analysis
// ============================================

pub async fn transaction_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MaxBlocksQuery>,
    Json(req): Json<ChainRequest>,
) -> HandlerResult<TransactionsData> {
    let start = Instant::now();
    let window = max_blocks(&state, &query, start)?;
    let address = parse_address(&req.address, start)?;
    let rpc = rpc_for(&state, &req.chain, start)?;

    let transactions = get_transaction_history(rpc.as_ref(), address, window)
        .await
        .map_err(|e| fail(AppError::rpc(e), start))?;

    respond(TransactionsData { transactions }, start)
}

pub async fn token_flows(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MaxBlocksQuery>,
    Json(req): Json<ChainRequest>,
) -> HandlerResult<TokenFlowsData> {
    let start = Instant::now();
    let window = max_blocks(&state, &query, start)?;
    let address = parse_address(&req.address, start)?;
    let rpc = rpc_for(&state, &req.chain, start)?;

    let token_flows = get_token_flows(rpc.as_ref(), address, window)
        .await
        .map_err(|e| fail(AppError::rpc(e), start))?;

    respond(TokenFlowsData { token_flows }, start)
}

pub async fn gas_usage(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChainRequest>,
) -> HandlerResult<GasUsageSummary> {
    let start = Instant::now();
    let address = parse_address(&req.address, start)?;
    let rpc = rpc_for(&state, &req.chain, start)?;

    let summary = analyze_gas_usage(rpc.as_ref(), address, state.config.scan.gas_blocks)
        .await
        .map_err(|e| fail(AppError::rpc(e), start))?;

    respond(summary, start)
}

pub async fn interaction_patterns(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MaxBlocksQuery>,
    Json(req): Json<ChainRequest>,
) -> HandlerResult<InteractionsData> {
    let start = Instant::now();
    let window = max_blocks(&state, &query, start)?;
    let address = parse_address(&req.address, start)?;
    let rpc = rpc_for(&state, &req.chain, start)?;

    let interaction_patterns = get_interaction_patterns(rpc.as_ref(), address, window)
        .await
        .map_err(|e| fail(AppError::rpc(e), start))?;

    respond(InteractionsData { interaction_patterns }, start)
}

// ============================================
// Cross-Chain
// ============================================

pub async fn cross_chain_analysis(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CrossChainRequest>,
) -> HandlerResult<CrossChainAnalysis> {
    let start = Instant::now();
    let address = parse_address(&req.address, start)?;
    rpc_for(&state, &req.source_chain, start)?;

    let analysis = state
        .cross_chain
        .analyze_cross_chain_risk(address, &req.source_chain, req.target_chains)
        .await
        .map_err(|e| fail(AppError::rpc(e), start))?;

    state.telemetry.record_analysis(
        AnalysisKind::CrossChain,
        None,
        analysis.risk_score,
        &analysis.risks,
        start.elapsed().as_millis() as u64,
    );

    respond(analysis, start)
}

pub async fn chain_map(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> HandlerResult<ChainCommunicationMap> {
    let start = Instant::now();
    let address = parse_address(&address, start)?;
    let map = state.cross_chain.get_chain_communication_map(address).await;
    respond(map, start)
}

pub async fn cross_chain_report(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CrossChainRequest>,
) -> HandlerResult<CrossChainReport> {
    let start = Instant::now();
    let address = parse_address(&req.address, start)?;
    rpc_for(&state, &req.source_chain, start)?;

    let generator = CrossChainReportGenerator::new(state.cross_chain.clone(), state.llm.clone());
    let report = generator
        .generate_report(address, &req.source_chain, req.target_chains)
        .await
        .map_err(|e| fail(AppError::rpc(e), start))?;

    state.telemetry.record_report(start.elapsed().as_millis() as u64);

    respond(report, start)
}

// ============================================
// Analytics
// ============================================

pub async fn aggregate_analysis(State(state): State<Arc<AppState>>) -> Json<ApiResponse<AggregateAnalysis>> {
    let start = Instant::now();
    Json(ApiResponse::success(state.telemetry.aggregate(), elapsed_ms(start)))
}

pub async fn risk_timeline(State(state): State<Arc<AppState>>) -> Json<ApiResponse<RiskTimeline>> {
    let start = Instant::now();
    let timeline = state.telemetry.timeline(Utc::now().date_naive());
    Json(ApiResponse::success(timeline, elapsed_ms(start)))
}
