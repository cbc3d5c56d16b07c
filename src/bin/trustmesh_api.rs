//! TrustMesh API Server
//!
//! Usage:
//!   cargo run --bin trustmesh_api
//!
//! Environment:
//!   PORT / TRUSTMESH_PORT - Server port (default: 8000)
//!   TRUSTMESH_HOST        - Server host (default: 0.0.0.0)
//!   OPENAI_API_KEY        - Enables report and governance endpoints
//!   RUST_LOG              - Log level (default: info)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use trustmesh::api::{create_router, start_cleanup_task, AppState};
use trustmesh::models::AppConfig;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    print_banner();

    let config = AppConfig::from_env();
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let state = Arc::new(AppState::from_config(config));
    let telemetry = state.telemetry.clone();

    let cleanup = start_cleanup_task(state.clone());
    info!("🧹 Background cleanup task started");

    info!("🚀 TrustMesh API starting on http://{}", addr);
    info!("   Default chain: {}", state.config.default_chain);
    info!("   Chains: {}", state.rpcs.keys().join(", "));
    info!("   Health check: http://{}/api/v1/health", addr);
    info!("Press Ctrl+C for graceful shutdown");

    let app = create_router(state);
    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cleanup.abort();

    info!("🛑 Shutdown signal received, cleaning up...");
    let stats = telemetry.get_stats();
    info!("   Contract audits: {}", stats.total_audits);
    info!("   Cross-chain analyses: {}", stats.total_cross_chain);
    info!("   Reports: {}", stats.total_reports);
    info!("👋 TrustMesh API shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("⚠️ Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
}

fn print_banner() {
    println!(
        r#"
    ╔══════════════════════════════════════════════╗
    ║                                              ║
    ║          T R U S T M E S H   A P I           ║
    ║     Contract risk scoring & chain reports    ║
    ║                                              ║
    ╚══════════════════════════════════════════════╝
    "#
    );
}
