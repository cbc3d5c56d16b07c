//! Chain data records as returned by the JSON-RPC node
//!
//! Only the fields the scanners read are modelled; everything else in the
//! node's response is ignored.

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use serde::{Deserialize, Serialize};

/// Block body (`eth_getBlockByNumber`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub number: U64,
    pub timestamp: U64,
    #[serde(default)]
    pub transactions: BlockTransactions,
}

impl Block {
    pub fn number(&self) -> u64 {
        self.number.to::<u64>()
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp.to::<u64>()
    }
}

/// Either full transaction objects or bare hashes, depending on the
/// `include_transactions` flag of the request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockTransactions {
    Full(Vec<Transaction>),
    Hashes(Vec<B256>),
}

impl Default for BlockTransactions {
    fn default() -> Self {
        BlockTransactions::Hashes(Vec::new())
    }
}

impl BlockTransactions {
    /// Full transactions, empty when the block was fetched with hashes only
    pub fn full(&self) -> &[Transaction] {
        match self {
            BlockTransactions::Full(txs) => txs,
            BlockTransactions::Hashes(_) => &[],
        }
    }

    pub fn len(&self) -> usize {
        match self {
            BlockTransactions::Full(txs) => txs.len(),
            BlockTransactions::Hashes(hashes) => hashes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: B256,
    pub from: Address,
    /// `None` for contract creation
    #[serde(default)]
    pub to: Option<Address>,
    pub value: U256,
    #[serde(default)]
    pub gas: Option<U64>,
    #[serde(default)]
    pub block_number: Option<U64>,
}

impl Transaction {
    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub address: Address,
    #[serde(default)]
    pub topics: Vec<B256>,
    #[serde(default)]
    pub data: Bytes,
    #[serde(default)]
    pub block_number: Option<U64>,
    #[serde(default)]
    pub transaction_hash: Option<B256>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub transaction_hash: B256,
    pub gas_used: U64,
    #[serde(default)]
    pub status: Option<U64>,
}

impl Receipt {
    pub fn gas_used(&self) -> u64 {
        self.gas_used.to::<u64>()
    }
}

/// `eth_getLogs` filter; `None` topics are wildcards
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub from_block: u64,
    pub to_block: u64,
    pub address: Option<Address>,
    pub topics: Vec<Option<B256>>,
}

impl LogFilter {
    pub fn new(from_block: u64, to_block: u64) -> Self {
        Self {
            from_block,
            to_block,
            ..Default::default()
        }
    }

    pub fn address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    pub fn topic0(mut self, topic: B256) -> Self {
        if self.topics.is_empty() {
            self.topics.push(Some(topic));
        } else {
            self.topics[0] = Some(topic);
        }
        self
    }

    /// JSON-RPC parameter object
    pub fn to_params(&self) -> serde_json::Value {
        let mut filter = serde_json::json!({
            "fromBlock": format!("0x{:x}", self.from_block),
            "toBlock": format!("0x{:x}", self.to_block),
        });
        if let Some(address) = self.address {
            filter["address"] = serde_json::json!(address);
        }
        if !self.topics.is_empty() {
            filter["topics"] = serde_json::json!(self.topics);
        }
        filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_block_deserializes() {
        let json = serde_json::json!({
            "number": "0x10",
            "timestamp": "0x65f0a1b2",
            "hash": "0x00",
            "transactions": [{
                "hash": "0x1111111111111111111111111111111111111111111111111111111111111111",
                "from": "0x00000000000000000000000000000000000000aa",
                "to": null,
                "value": "0xde0b6b3a7640000",
                "gas": "0x5208"
            }]
        });
        let block: Block = serde_json::from_value(json).unwrap();
        assert_eq!(block.number(), 16);
        let txs = block.transactions.full();
        assert_eq!(txs.len(), 1);
        assert!(txs[0].is_contract_creation());
        assert_eq!(txs[0].value, U256::from(1_000_000_000_000_000_000u128));
    }

    #[test]
    fn test_hash_only_block_has_no_full_txs() {
        let json = serde_json::json!({
            "number": "0x1",
            "timestamp": "0x1",
            "transactions": ["0x1111111111111111111111111111111111111111111111111111111111111111"]
        });
        let block: Block = serde_json::from_value(json).unwrap();
        assert!(block.transactions.full().is_empty());
        assert_eq!(block.transactions.len(), 1);
    }

    #[test]
    fn test_log_filter_params() {
        let filter = LogFilter::new(10, 20).topic0(B256::ZERO);
        let params = filter.to_params();
        assert_eq!(params["fromBlock"], "0xa");
        assert_eq!(params["toBlock"], "0x14");
        assert!(params.get("address").is_none());
        assert_eq!(params["topics"].as_array().unwrap().len(), 1);
    }
}
