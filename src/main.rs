//! TrustMesh whale monitor
//!
//! Polls the default chain for new blocks and logs every transaction at or
//! above the whale threshold until Ctrl+C.
//!
//! Environment:
//!   DEFAULT_CHAIN          - chain to watch (default: avalanche)
//!   <CHAIN>_HTTP_URL       - RPC endpoint (public endpoint otherwise)
//!   WHALE_MIN_AMOUNT       - threshold in native units (default: 1000)
//!   WHALE_LOOKBACK_BLOCKS  - max blocks scanned per poll (default: 100)
//!   RUST_LOG               - log level (default: info)

use eyre::{eyre, Result};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use trustmesh::core::whale::{spawn_monitor, stop_monitor, WhaleMonitor};
use trustmesh::models::AppConfig;
use trustmesh::providers::{ChainRpc, RpcProvider};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    print_banner();

    let config = AppConfig::from_env();
    let chain = config
        .default_chain()
        .ok_or_else(|| eyre!("default chain {} is not configured", config.default_chain))?;
    let rpc: Arc<dyn ChainRpc> = Arc::new(RpcProvider::new(chain, config.rpc_timeout)?);

    info!(
        "🐋 Watching {} for transfers of at least {} {}",
        chain.name, config.monitor.min_whale_amount, chain.symbol
    );

    let monitor = WhaleMonitor::new(rpc, config.monitor.clone(), chain.symbol.clone());
    let (stop, mut alerts, handle) = spawn_monitor(monitor);

    let printer = tokio::spawn(async move {
        while let Some(batch) = alerts.recv().await {
            for alert in batch {
                info!(
                    block = alert.block_number,
                    tx = %alert.tx_hash,
                    "🐋 {:.2} {} {} -> {}",
                    alert.value,
                    alert.symbol,
                    alert.from,
                    alert.to
                );
            }
        }
    });

    let signal = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("🛑 Shutting down whale monitor...");
            if let Err(e) = stop_monitor(&stop) {
                warn!("⚠️ {:#}", e);
            }
        }
    });

    match handle.await {
        Ok(Ok(stats)) => info!(
            "📊 Final statistics: {} polls, {} blocks, {} alerts, {} failures",
            stats.polls, stats.blocks_scanned, stats.alerts_sent, stats.failures
        ),
        Ok(Err(e)) => error!("❌ Whale monitor failed: {:#}", e),
        Err(e) => warn!("⚠️ Whale monitor task aborted: {}", e),
    }
    signal.abort();
    printer.abort();

    Ok(())
}

fn print_banner() {
    println!(
        r#"
    ╔══════════════════════════════════════════════╗
    ║                                              ║
    ║        T R U S T M E S H   W H A L E         ║
    ║        On-chain whale activity monitor       ║
    ║                                              ║
    ╚══════════════════════════════════════════════╝
    "#
    );
}
