//! Whale monitor
//!
//! One-shot alert query over the last N blocks, plus a long-running poller
//! with an explicit stop signal and bounded exponential backoff.

use alloy_primitives::{Address, B256, U256};
use chrono::{DateTime, TimeZone, Utc};
use eyre::{eyre, Result, WrapErr};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::core::scanner::{block_window, for_each_block};
use crate::models::{Block, MonitorConfig};
use crate::providers::ChainRpc;
use crate::utils::constants::{native_to_wei, wei_to_native};

/// A transaction moving at least the whale threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhaleAlert {
    pub tx_hash: B256,
    pub from: Address,
    pub to: Address,
    /// Native units
    pub value: f64,
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub block_number: u64,
}

/// Whale transactions in one block; contract creations are skipped
pub fn whale_alerts_in_block(block: &Block, min_wei: U256, symbol: &str) -> Vec<WhaleAlert> {
    let timestamp = Utc
        .timestamp_opt(block.timestamp() as i64, 0)
        .single()
        .unwrap_or_default();

    block
        .transactions
        .full()
        .iter()
        .filter_map(|tx| {
            let to = tx.to?;
            (tx.value >= min_wei).then(|| WhaleAlert {
                tx_hash: tx.hash,
                from: tx.from,
                to,
                value: wei_to_native(tx.value),
                symbol: symbol.to_string(),
                timestamp,
                block_number: block.number(),
            })
        })
        .collect()
}

/// Scan an explicit block range
pub async fn scan_range(
    rpc: &dyn ChainRpc,
    range: std::ops::RangeInclusive<u64>,
    min_amount: f64,
    symbol: &str,
) -> Vec<WhaleAlert> {
    let min_wei = native_to_wei(min_amount);
    let mut alerts = Vec::new();
    for_each_block(rpc, range, true, |block| {
        alerts.extend(whale_alerts_in_block(block, min_wei, symbol));
    })
    .await;
    alerts
}

/// Whale transactions in the last `lookback` blocks
pub async fn get_whale_alerts(
    rpc: &dyn ChainRpc,
    lookback: u64,
    min_amount: f64,
    symbol: &str,
) -> Result<Vec<WhaleAlert>> {
    let latest = rpc
        .latest_block_number()
        .await
        .wrap_err_with(|| format!("cannot read latest block on {}", rpc.chain()))?;
    let alerts = scan_range(rpc, block_window(latest, lookback), min_amount, symbol).await;
    if !alerts.is_empty() {
        info!("🐋 {} whale transactions in last {} blocks on {}", alerts.len(), lookback, rpc.chain());
    }
    Ok(alerts)
}

// ============================================
// MONITOR
// ============================================

/// Counters reported when the monitor stops
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub polls: u64,
    pub blocks_scanned: u64,
    pub alerts_sent: u64,
    pub failures: u64,
}

/// Exponential backoff: base * 2^(failures - 1), capped, ±20% jitter
pub fn backoff_delay(config: &MonitorConfig, consecutive_failures: u32) -> Duration {
    let base = config.error_backoff_base.as_millis() as u64;
    let cap = config.error_backoff_max.as_millis() as u64;
    let exp = consecutive_failures.saturating_sub(1).min(16);
    let delay = base.saturating_mul(1u64 << exp).min(cap);

    let jitter_range = delay / 5;
    let jitter: i64 = rand::thread_rng().gen_range(-(jitter_range as i64)..=(jitter_range as i64));
    Duration::from_millis((delay as i64 + jitter).max(0) as u64)
}

/// Polls for new blocks and pushes whale alerts over a channel
pub struct WhaleMonitor {
    rpc: Arc<dyn ChainRpc>,
    config: MonitorConfig,
    symbol: String,
}

impl WhaleMonitor {
    pub fn new(rpc: Arc<dyn ChainRpc>, config: MonitorConfig, symbol: impl Into<String>) -> Self {
        Self {
            rpc,
            config,
            symbol: symbol.into(),
        }
    }

    /// Run until `stop` flips to true, its sender is dropped, the alert
    /// receiver is dropped, or too many polls fail in a row.
    pub async fn run(
        &self,
        mut stop: watch::Receiver<bool>,
        alerts: mpsc::Sender<Vec<WhaleAlert>>,
    ) -> Result<MonitorStats> {
        let mut stats = MonitorStats::default();
        let mut last_block: Option<u64> = None;
        let mut consecutive_failures: u32 = 0;

        info!(
            "🐋 Whale monitor started on {} (threshold: {} {}, poll: {:?})",
            self.rpc.chain(),
            self.config.min_whale_amount,
            self.symbol,
            self.config.poll_interval
        );

        loop {
            if *stop.borrow() {
                break;
            }

            let wait = match self.poll(&mut last_block, &alerts, &mut stop, &mut stats).await {
                Ok(PollOutcome::Continue) => {
                    consecutive_failures = 0;
                    self.config.poll_interval
                }
                Ok(PollOutcome::ReceiverClosed) => {
                    info!("🐋 Alert receiver closed, stopping whale monitor");
                    break;
                }
                Ok(PollOutcome::Stopped) => break,
                Err(e) => {
                    consecutive_failures += 1;
                    stats.failures += 1;
                    if consecutive_failures >= self.config.max_consecutive_failures {
                        error!(
                            "❌ Whale monitor giving up after {} consecutive failures: {:#}",
                            consecutive_failures, e
                        );
                        return Err(e.wrap_err("whale monitor exceeded failure budget"));
                    }
                    let delay = backoff_delay(&self.config, consecutive_failures);
                    warn!(
                        "⚠️ Whale monitor poll failed ({}/{}), retrying in {:?}: {:#}",
                        consecutive_failures, self.config.max_consecutive_failures, delay, e
                    );
                    delay
                }
            };

            tokio::select! {
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }

        info!(
            "🛑 Whale monitor stopped ({} polls, {} blocks, {} alerts)",
            stats.polls, stats.blocks_scanned, stats.alerts_sent
        );
        Ok(stats)
    }

    /// Scan blocks after `last_block`, at most the lookback window.
    /// A full alert channel never blocks the stop signal.
    async fn poll(
        &self,
        last_block: &mut Option<u64>,
        alerts: &mpsc::Sender<Vec<WhaleAlert>>,
        stop: &mut watch::Receiver<bool>,
        stats: &mut MonitorStats,
    ) -> Result<PollOutcome> {
        stats.polls += 1;
        let current = self.rpc.latest_block_number().await?;

        let Some(last) = *last_block else {
            // First poll only sets the starting point
            *last_block = Some(current);
            return Ok(PollOutcome::Continue);
        };
        if current <= last {
            return Ok(PollOutcome::Continue);
        }

        let from = (last + 1).max(current.saturating_sub(self.config.lookback_blocks.saturating_sub(1)));
        debug!("🔍 Whale scan {}..={} on {}", from, current, self.rpc.chain());

        let min_wei = native_to_wei(self.config.min_whale_amount);
        let mut found = Vec::new();
        stats.blocks_scanned += for_each_block(self.rpc.as_ref(), from..=current, true, |block| {
            found.extend(whale_alerts_in_block(block, min_wei, &self.symbol));
        })
        .await;
        *last_block = Some(current);

        if found.is_empty() {
            return Ok(PollOutcome::Continue);
        }

        info!("🐋 {} new whale transactions up to block {}", found.len(), current);
        let count = found.len() as u64;
        loop {
            tokio::select! {
                permit = alerts.reserve() => {
                    let Ok(permit) = permit else {
                        return Ok(PollOutcome::ReceiverClosed);
                    };
                    permit.send(found);
                    stats.alerts_sent += count;
                    return Ok(PollOutcome::Continue);
                }
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        warn!("🛑 Stop requested with {} whale alerts undelivered", count);
                        return Ok(PollOutcome::Stopped);
                    }
                }
            }
        }
    }
}

enum PollOutcome {
    Continue,
    ReceiverClosed,
    Stopped,
}

/// Spawn a monitor; returns the stop handle, the alert stream and the task
pub fn spawn_monitor(
    monitor: WhaleMonitor,
) -> (
    watch::Sender<bool>,
    mpsc::Receiver<Vec<WhaleAlert>>,
    tokio::task::JoinHandle<Result<MonitorStats>>,
) {
    let (stop_tx, stop_rx) = watch::channel(false);
    let (alert_tx, alert_rx) = mpsc::channel(64);
    let handle = tokio::spawn(async move { monitor.run(stop_rx, alert_tx).await });
    (stop_tx, alert_rx, handle)
}

/// Flip the stop flag; a monitor that already exited is not an error
pub fn stop_monitor(stop: &watch::Sender<bool>) -> Result<()> {
    match stop.send(true) {
        Ok(()) => Ok(()),
        Err(_) if stop.is_closed() => Ok(()),
        Err(e) => Err(eyre!("failed to signal whale monitor: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlockTransactions, Transaction};
    use alloy_primitives::U64;

    fn tx(value_native: u128, to: Option<Address>) -> Transaction {
        Transaction {
            hash: B256::repeat_byte(value_native as u8),
            from: Address::repeat_byte(0x11),
            to,
            value: U256::from(value_native) * U256::from(1_000_000_000_000_000_000u128),
            gas: None,
            block_number: None,
        }
    }

    fn block(txs: Vec<Transaction>) -> Block {
        Block {
            number: U64::from(7),
            timestamp: U64::from(1_700_000_000u64),
            transactions: BlockTransactions::Full(txs),
        }
    }

    #[test]
    fn test_whale_filter() {
        let to = Some(Address::repeat_byte(0x22));
        let b = block(vec![tx(5_000, to), tx(999, to), tx(1_000, to), tx(50_000, None)]);
        let alerts = whale_alerts_in_block(&b, native_to_wei(1000.0), "AVAX");
        assert_eq!(alerts.len(), 2);
        assert!(alerts.iter().all(|a| a.value >= 1000.0));
        assert_eq!(alerts[0].block_number, 7);
        assert_eq!(alerts[0].symbol, "AVAX");
        assert_eq!(alerts[0].timestamp.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let config = MonitorConfig::default();
        let first = backoff_delay(&config, 1).as_millis();
        assert!((4_000..=6_000).contains(&first));
        let third = backoff_delay(&config, 3).as_millis();
        assert!((16_000..=24_000).contains(&third));
        for n in 5..40 {
            assert!(backoff_delay(&config, n) <= Duration::from_secs(72));
        }
    }
}
