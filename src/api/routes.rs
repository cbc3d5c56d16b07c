//! API Route Configuration

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{self, AppState};
use super::middleware::{logging_middleware, rate_limit_middleware};

/// Create the API router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health & Status
        .route("/health", get(handlers::health_check))
        .route("/stats", get(handlers::get_stats))
        // Contract risk
        .route("/audit/contract", post(handlers::audit_contract))
        .route("/monitor/whale-alerts", get(handlers::whale_alerts))
        // LLM
        .route("/report/generate", post(handlers::generate_llm_report))
        .route("/governance/analyze", post(handlers::analyze_governance_proposal))
        .route("/governance/vote", post(handlers::submit_vote))
        // Chain scans
        .route("/analysis/transactions", post(handlers::transaction_history))
        .route("/analysis/token-flows", post(handlers::token_flows))
        .route("/analysis/gas-usage", post(handlers::gas_usage))
        .route("/analysis/interactions", post(handlers::interaction_patterns))
        // Cross-chain
        .route("/analysis/cross-chain", post(handlers::cross_chain_analysis))
        .route("/analysis/chain-map/:address", get(handlers::chain_map))
        .route("/reports/cross-chain", post(handlers::cross_chain_report))
        // Analytics
        .route("/analysis/aggregate", get(handlers::aggregate_analysis))
        .route("/analysis/timeline", get(handlers::risk_timeline));

    Router::new()
        .nest("/api/v1", api_v1)
        .route("/health", get(handlers::health_check))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
        // Middleware (order matters - bottom runs first)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(logging_middleware))
}
