//! Transaction and log scanners
//!
//! Linear walks over `[max(latest - width, 0), latest]`. Nothing is indexed
//! and nothing is resumed: every call rescans its whole window. A failure to
//! read the latest block aborts the scan; failures on individual blocks or
//! receipts are logged and skipped.

use alloy_primitives::{Address, B256};
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use tracing::{debug, warn};

use crate::models::{Block, LogFilter};
use crate::providers::{ChainRpc, MAX_BATCH_SIZE};
use crate::utils::constants::wei_to_native;
use crate::utils::decoder::{decode_transfer, transfer_topic};

// ============================================
// RESULT RECORDS
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub hash: B256,
    pub from: Address,
    pub to: Option<Address>,
    /// Native units
    pub value: f64,
    pub block_number: u64,
    /// Block timestamp (unix seconds)
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenFlow {
    pub tx_hash: Option<B256>,
    /// Token contract that emitted the event
    pub token: Address,
    pub from: Address,
    pub to: Address,
    /// Raw token amount as a decimal string
    pub value: String,
    pub block_number: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GasUsageSummary {
    pub average_gas: f64,
    pub max_gas: u64,
    pub min_gas: u64,
    pub tx_count: usize,
}

/// Transactions per sender (lowercase hex) whose `to` is the address
pub type InteractionPatterns = BTreeMap<String, u64>;

// ============================================
// BLOCK WALK
// ============================================

/// `[max(latest - width, 0), latest]`
pub fn block_window(latest: u64, width: u64) -> RangeInclusive<u64> {
    latest.saturating_sub(width)..=latest
}

/// Visit every readable block in `range`; unreadable blocks are skipped.
/// Returns how many blocks were visited.
pub async fn for_each_block<F>(
    rpc: &dyn ChainRpc,
    range: RangeInclusive<u64>,
    include_transactions: bool,
    mut visit: F,
) -> u64
where
    F: FnMut(&Block) + Send,
{
    let numbers: Vec<u64> = range.collect();
    let mut visited = 0;
    for chunk in numbers.chunks(MAX_BATCH_SIZE) {
        let blocks = rpc.get_blocks(chunk, include_transactions).await;
        for (number, block) in chunk.iter().zip(blocks) {
            match block {
                Ok(block) => {
                    visit(&block);
                    visited += 1;
                }
                Err(e) => warn!("⚠️ Skipping block {} on {}: {:#}", number, rpc.chain(), e),
            }
        }
    }
    visited
}

async fn latest_window(rpc: &dyn ChainRpc, width: u64) -> Result<RangeInclusive<u64>> {
    let latest = rpc
        .latest_block_number()
        .await
        .wrap_err_with(|| format!("cannot read latest block on {}", rpc.chain()))?;
    Ok(block_window(latest, width))
}

// ============================================
// SCANS
// ============================================

/// Transactions sent from or to `address`
pub async fn get_transaction_history(
    rpc: &dyn ChainRpc,
    address: Address,
    max_blocks: u64,
) -> Result<Vec<TransactionRecord>> {
    let window = latest_window(rpc, max_blocks).await?;
    debug!("📜 Scanning blocks {:?} on {} for {}", window, rpc.chain(), address);

    let mut records = Vec::new();
    for_each_block(rpc, window, true, |block| {
        for tx in block.transactions.full() {
            if tx.from == address || tx.to == Some(address) {
                records.push(TransactionRecord {
                    hash: tx.hash,
                    from: tx.from,
                    to: tx.to,
                    value: wei_to_native(tx.value),
                    block_number: block.number(),
                    timestamp: block.timestamp(),
                });
            }
        }
    })
    .await;

    Ok(records)
}

/// ERC-20 `Transfer` events where `address` is sender or recipient
pub async fn get_token_flows(
    rpc: &dyn ChainRpc,
    address: Address,
    max_blocks: u64,
) -> Result<Vec<TokenFlow>> {
    let window = latest_window(rpc, max_blocks).await?;
    let filter = LogFilter::new(*window.start(), *window.end()).topic0(transfer_topic());
    let logs = rpc.get_logs(&filter).await?;

    let flows = logs
        .iter()
        .filter_map(|log| decode_transfer(log).map(|t| (log, t)))
        .filter(|(_, t)| t.from == address || t.to == address)
        .map(|(log, t)| TokenFlow {
            tx_hash: log.transaction_hash,
            token: log.address,
            from: t.from,
            to: t.to,
            value: t.value.to_string(),
            block_number: log.block_number.map(|n| n.to::<u64>()),
        })
        .collect();

    Ok(flows)
}

/// Receipt gas over the recent transaction history of `address`
pub async fn analyze_gas_usage(
    rpc: &dyn ChainRpc,
    address: Address,
    window: u64,
) -> Result<GasUsageSummary> {
    let txs = get_transaction_history(rpc, address, window).await?;
    if txs.is_empty() {
        return Ok(GasUsageSummary::default());
    }

    let mut gas_used = Vec::with_capacity(txs.len());
    for tx in &txs {
        match rpc.get_transaction_receipt(tx.hash).await {
            Ok(receipt) => gas_used.push(receipt.gas_used()),
            Err(e) => debug!("Skipping receipt {}: {:#}", tx.hash, e),
        }
    }

    Ok(summarize_gas(&gas_used, txs.len()))
}

/// With no readable receipts the count falls back to the number of transactions
pub fn summarize_gas(gas_used: &[u64], tx_count: usize) -> GasUsageSummary {
    if gas_used.is_empty() {
        return GasUsageSummary {
            tx_count,
            ..Default::default()
        };
    }
    let total: u128 = gas_used.iter().map(|&g| g as u128).sum();
    GasUsageSummary {
        average_gas: total as f64 / gas_used.len() as f64,
        max_gas: gas_used.iter().copied().max().unwrap_or(0),
        min_gas: gas_used.iter().copied().min().unwrap_or(0),
        tx_count: gas_used.len(),
    }
}

/// Count of transactions per sender calling `address`
pub async fn get_interaction_patterns(
    rpc: &dyn ChainRpc,
    address: Address,
    max_blocks: u64,
) -> Result<InteractionPatterns> {
    let window = latest_window(rpc, max_blocks).await?;

    let mut interactions = InteractionPatterns::new();
    for_each_block(rpc, window, true, |block| {
        for tx in block.transactions.full() {
            if tx.to == Some(address) {
                let sender = format!("0x{}", hex::encode(tx.from));
                *interactions.entry(sender).or_insert(0) += 1;
            }
        }
    })
    .await;

    Ok(interactions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_window() {
        assert_eq!(block_window(1000, 500), 500..=1000);
        assert_eq!(block_window(100, 500), 0..=100);
        assert_eq!(block_window(0, 1), 0..=0);
    }

    #[test]
    fn test_summarize_gas() {
        let summary = summarize_gas(&[21_000, 50_000, 100_000], 3);
        assert_eq!(summary.max_gas, 100_000);
        assert_eq!(summary.min_gas, 21_000);
        assert_eq!(summary.tx_count, 3);
        assert!((summary.average_gas - 57_000.0).abs() < 0.001);
    }

    #[test]
    fn test_summarize_gas_without_receipts() {
        let summary = summarize_gas(&[], 4);
        assert_eq!(summary.tx_count, 4);
        assert_eq!(summary.average_gas, 0.0);
        assert_eq!(summary.max_gas, 0);
    }
}
