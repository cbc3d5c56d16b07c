//! Mock collaborators shared by the integration tests

#![allow(dead_code)]

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use async_trait::async_trait;
use eyre::{eyre, Result};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use trustmesh::models::{Block, BlockTransactions, Log, LogFilter, Receipt, Transaction};
use trustmesh::providers::{ChainRpc, CompletionRequest, LlmClient};
use trustmesh::utils::decoder::transfer_topic;

pub const BLOCK_TIME: u64 = 1_700_000_000;

/// Native amount in wei
pub fn native(amount: u64) -> U256 {
    U256::from(amount) * U256::from(1_000_000_000_000_000_000u128)
}

pub fn tx(id: u8, from: Address, to: Option<Address>, value: U256) -> Transaction {
    Transaction {
        hash: B256::repeat_byte(id),
        from,
        to,
        value,
        gas: None,
        block_number: None,
    }
}

pub fn block(number: u64, txs: Vec<Transaction>) -> Block {
    Block {
        number: U64::from(number),
        timestamp: U64::from(BLOCK_TIME + number),
        transactions: BlockTransactions::Full(txs),
    }
}

pub fn transfer_log(token: Address, from: Address, to: Address, amount: u64, block_number: u64) -> Log {
    Log {
        address: token,
        topics: vec![transfer_topic(), from.into_word(), to.into_word()],
        data: Bytes::from(U256::from(amount).to_be_bytes::<32>().to_vec()),
        block_number: Some(U64::from(block_number)),
        transaction_hash: Some(B256::repeat_byte(0xee)),
    }
}

pub fn event_log(address: Address, topic0: B256, block_number: u64) -> Log {
    Log {
        address,
        topics: vec![topic0],
        data: Bytes::new(),
        block_number: Some(U64::from(block_number)),
        transaction_hash: None,
    }
}

/// ABI-encoded `true`
pub fn abi_true() -> Bytes {
    let mut word = [0u8; 32];
    word[31] = 1;
    Bytes::from(word.to_vec())
}

// ============================================
// MOCK RPC
// ============================================

/// In-memory chain. Blocks up to `latest` that were never added are empty.
pub struct MockRpc {
    chain: String,
    latest: AtomicU64,
    fail_latest: AtomicBool,
    latest_calls: AtomicU64,
    blocks: Mutex<HashMap<u64, Block>>,
    failing_blocks: HashSet<u64>,
    logs: Vec<Log>,
    code: HashMap<Address, Bytes>,
    call_output: HashMap<Address, Bytes>,
    receipts: HashMap<B256, Receipt>,
}

impl MockRpc {
    pub fn new(chain: &str, latest: u64) -> Self {
        Self {
            chain: chain.to_string(),
            latest: AtomicU64::new(latest),
            fail_latest: AtomicBool::new(false),
            latest_calls: AtomicU64::new(0),
            blocks: Mutex::new(HashMap::new()),
            failing_blocks: HashSet::new(),
            logs: Vec::new(),
            code: HashMap::new(),
            call_output: HashMap::new(),
            receipts: HashMap::new(),
        }
    }

    pub fn with_block(self, block: Block) -> Self {
        self.add_block(block);
        self
    }

    pub fn with_failing_block(mut self, number: u64) -> Self {
        self.failing_blocks.insert(number);
        self
    }

    pub fn with_log(mut self, log: Log) -> Self {
        self.logs.push(log);
        self
    }

    pub fn with_code(mut self, address: Address, code: impl Into<Bytes>) -> Self {
        self.code.insert(address, code.into());
        self
    }

    pub fn with_call_output(mut self, address: Address, output: Bytes) -> Self {
        self.call_output.insert(address, output);
        self
    }

    pub fn with_receipt(mut self, hash: B256, gas_used: u64) -> Self {
        self.receipts.insert(
            hash,
            Receipt {
                transaction_hash: hash,
                gas_used: U64::from(gas_used),
                status: Some(U64::from(1)),
            },
        );
        self
    }

    pub fn add_block(&self, block: Block) {
        if let Ok(mut blocks) = self.blocks.lock() {
            blocks.insert(block.number(), block);
        }
    }

    pub fn set_latest(&self, latest: u64) {
        self.latest.store(latest, Ordering::SeqCst);
    }

    pub fn set_fail_latest(&self, fail: bool) {
        self.fail_latest.store(fail, Ordering::SeqCst);
    }

    pub fn latest_calls(&self) -> u64 {
        self.latest_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainRpc for MockRpc {
    fn chain(&self) -> &str {
        &self.chain
    }

    async fn latest_block_number(&self) -> Result<u64> {
        self.latest_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_latest.load(Ordering::SeqCst) {
            return Err(eyre!("connection refused"));
        }
        Ok(self.latest.load(Ordering::SeqCst))
    }

    async fn get_block(&self, number: u64, _include_transactions: bool) -> Result<Block> {
        if self.failing_blocks.contains(&number) {
            return Err(eyre!("block {} unavailable", number));
        }
        if number > self.latest.load(Ordering::SeqCst) {
            return Err(eyre!("block {} not found", number));
        }
        let blocks = self.blocks.lock().map_err(|_| eyre!("poisoned"))?;
        Ok(blocks.get(&number).cloned().unwrap_or_else(|| block(number, vec![])))
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<Log>> {
        let topic0 = filter.topics.first().copied().flatten();
        Ok(self
            .logs
            .iter()
            .filter(|log| {
                let n = log.block_number.map(|n| n.to::<u64>()).unwrap_or(0);
                n >= filter.from_block
                    && n <= filter.to_block
                    && filter.address.map_or(true, |a| a == log.address)
                    && topic0.map_or(true, |t| log.topics.first() == Some(&t))
            })
            .cloned()
            .collect())
    }

    async fn get_transaction_receipt(&self, hash: B256) -> Result<Receipt> {
        self.receipts
            .get(&hash)
            .cloned()
            .ok_or_else(|| eyre!("receipt {} not found", hash))
    }

    async fn get_code(&self, address: Address) -> Result<Bytes> {
        Ok(self.code.get(&address).cloned().unwrap_or_default())
    }

    async fn call(&self, to: Address, _data: Bytes) -> Result<Bytes> {
        self.call_output
            .get(&to)
            .cloned()
            .ok_or_else(|| eyre!("execution reverted"))
    }
}

// ============================================
// MOCK LLM
// ============================================

pub struct MockLlm {
    response: Option<String>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLlm {
    pub fn new(response: &str) -> Self {
        Self {
            response: Some(response.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().ok()?.last().cloned()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        self.response
            .clone()
            .ok_or_else(|| eyre!("LLM API error: 500 Internal Server Error"))
    }

    fn model(&self) -> &str {
        "mock-gpt"
    }
}
