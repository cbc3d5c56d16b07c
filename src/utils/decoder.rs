//! Log and call decoder module
//! Event signatures, topic decoding and the bridge status probe encoding

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{sol, SolCall, SolEvent};

use crate::models::Log;

sol! {
    /// ERC-20 transfer
    event Transfer(address indexed from, address indexed to, uint256 value);

    /// Bridge deposit, as emitted by the lock side of a token bridge
    event BridgeDeposit(address indexed sender, address indexed recipient, uint256 amount);

    /// Bridge withdrawal, as emitted by the release side of a token bridge
    event BridgeWithdrawal(address indexed recipient, address indexed sender, uint256 amount);

    function getBridgeStatus() external view returns (bool);
}

/// keccak256("Transfer(address,address,uint256)")
pub fn transfer_topic() -> B256 {
    Transfer::SIGNATURE_HASH
}

pub fn bridge_deposit_topic() -> B256 {
    BridgeDeposit::SIGNATURE_HASH
}

pub fn bridge_withdrawal_topic() -> B256 {
    BridgeWithdrawal::SIGNATURE_HASH
}

/// Address held in the low 20 bytes (40 hex chars) of an indexed topic
#[inline]
pub fn topic_to_address(topic: &B256) -> Address {
    Address::from_slice(&topic[12..])
}

/// First 32-byte word of log data as an integer; empty data is zero
pub fn data_word(data: &[u8]) -> U256 {
    let word = &data[..data.len().min(32)];
    U256::try_from_be_slice(word).unwrap_or(U256::ZERO)
}

/// A decoded ERC-20 transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTransfer {
    pub from: Address,
    pub to: Address,
    pub value: U256,
}

/// Decode a `Transfer` log; logs with fewer than three topics are skipped
pub fn decode_transfer(log: &Log) -> Option<DecodedTransfer> {
    if log.topics.len() < 3 {
        return None;
    }
    Some(DecodedTransfer {
        from: topic_to_address(&log.topics[1]),
        to: topic_to_address(&log.topics[2]),
        value: data_word(&log.data),
    })
}

/// Calldata for `getBridgeStatus()`
pub fn bridge_status_calldata() -> Bytes {
    Bytes::from(getBridgeStatusCall {}.abi_encode())
}

/// ABI bool: true when the first returned word is nonzero
pub fn decode_bool(output: &[u8]) -> bool {
    !output.is_empty() && !data_word(output).is_zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, keccak256};

    #[test]
    fn test_transfer_topic_matches_keccak() {
        assert_eq!(transfer_topic(), keccak256("Transfer(address,address,uint256)"));
        assert_eq!(
            hex::encode(transfer_topic()),
            "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn test_bridge_topics() {
        assert_eq!(bridge_deposit_topic(), keccak256("BridgeDeposit(address,address,uint256)"));
        assert_eq!(bridge_withdrawal_topic(), keccak256("BridgeWithdrawal(address,address,uint256)"));
    }

    #[test]
    fn test_topic_to_address() {
        let addr = address!("00000000000000000000000000000000000000aa");
        let topic = addr.into_word();
        assert_eq!(topic_to_address(&topic), addr);
    }

    #[test]
    fn test_decode_transfer() {
        let from = address!("1111111111111111111111111111111111111111");
        let to = address!("2222222222222222222222222222222222222222");
        let log = Log {
            address: Address::ZERO,
            topics: vec![transfer_topic(), from.into_word(), to.into_word()],
            data: Bytes::from(U256::from(1_000u64).to_be_bytes::<32>().to_vec()),
            block_number: None,
            transaction_hash: None,
        };
        let decoded = decode_transfer(&log).unwrap();
        assert_eq!(decoded.from, from);
        assert_eq!(decoded.to, to);
        assert_eq!(decoded.value, U256::from(1_000u64));
    }

    #[test]
    fn test_short_topics_skipped() {
        let log = Log {
            address: Address::ZERO,
            topics: vec![transfer_topic()],
            data: Bytes::new(),
            block_number: None,
            transaction_hash: None,
        };
        assert!(decode_transfer(&log).is_none());
    }

    #[test]
    fn test_bridge_status_probe() {
        let calldata = bridge_status_calldata();
        assert_eq!(calldata.len(), 4);
        assert_eq!(&calldata[..], &keccak256("getBridgeStatus()")[..4]);

        assert!(decode_bool(&U256::from(1u64).to_be_bytes::<32>()));
        assert!(!decode_bool(&[0u8; 32]));
        assert!(!decode_bool(&[]));
    }
}
