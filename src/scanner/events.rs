//! Transfer event shapes and decoding
//!
//! The same `Transfer` signature covers ERC-20 (value in data) and ERC-721
//! (tokenId as a fourth topic, no data), so the topic count picks the shape.

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{sol, SolEvent};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::debug;

sol! {
    interface IERC20 {
        event Transfer(address indexed from, address indexed to, uint256 value);
    }

    interface IERC721 {
        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);
    }

    interface IERC1155 {
        event TransferSingle(
            address indexed operator,
            address indexed from,
            address indexed to,
            uint256 id,
            uint256 value
        );
    }
}

/// A raw log as delivered by the host or fetched over RPC
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<B256>,
    #[serde(default)]
    pub data: Bytes,
}

impl From<&alloy_rpc_types::Log> for LogEntry {
    fn from(log: &alloy_rpc_types::Log) -> Self {
        Self {
            address: log.address(),
            topics: log.topics().to_vec(),
            data: log.data().data.clone(),
        }
    }
}

/// One scam-token movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEvent {
    pub token: Address,
    pub sender: Address,
    pub receiver: Address,
    pub value: U256,
}

/// Logs that omit data for zero-value transfers get an all-zero payload of
/// the width the shape expects
fn normalized_data(data: &[u8], words: usize) -> Cow<'_, [u8]> {
    if data.is_empty() {
        Cow::Owned(vec![0u8; 32 * words])
    } else {
        Cow::Borrowed(data)
    }
}

/// Whether topic0 is one of the transfer signatures we track
pub fn is_transfer_signature(topic0: &B256) -> bool {
    *topic0 == IERC20::Transfer::SIGNATURE_HASH
        || *topic0 == IERC1155::TransferSingle::SIGNATURE_HASH
}

/// Decode a transfer-shaped log, `None` for anything else
pub fn decode_transfer(log: &LogEntry) -> Option<TransferEvent> {
    let topic0 = log.topics.first()?;
    let topics = log.topics.iter().copied();

    let decoded = if *topic0 == IERC20::Transfer::SIGNATURE_HASH {
        match log.topics.len() {
            3 => IERC20::Transfer::decode_raw_log(topics, &normalized_data(&log.data, 1))
                .map(|e| (e.from, e.to, e.value)),
            4 => IERC721::Transfer::decode_raw_log(topics, &normalized_data(&log.data, 0))
                .map(|e| (e.from, e.to, U256::from(1))),
            n => {
                debug!("Transfer log from {} with {} topics, skipping", log.address, n);
                return None;
            }
        }
    } else if *topic0 == IERC1155::TransferSingle::SIGNATURE_HASH {
        IERC1155::TransferSingle::decode_raw_log(topics, &normalized_data(&log.data, 2))
            .map(|e| (e.from, e.to, e.value))
    } else {
        return None;
    };

    match decoded {
        Ok((sender, receiver, value)) => Some(TransferEvent {
            token: log.address,
            sender,
            receiver,
            value,
        }),
        Err(e) => {
            debug!(
                "Undecodable transfer log from {} (data 0x{}): {}",
                log.address,
                hex::encode(&log.data),
                e
            );
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloy_primitives::address;

    pub(crate) fn topic_for(addr: Address) -> B256 {
        addr.into_word()
    }

    pub(crate) fn erc20_transfer_log(token: Address, from: Address, to: Address, data: Bytes) -> LogEntry {
        LogEntry {
            address: token,
            topics: vec![IERC20::Transfer::SIGNATURE_HASH, topic_for(from), topic_for(to)],
            data,
        }
    }

    const TOKEN: Address = address!("00000000000000000000000000000000000000c1");
    const FROM: Address = address!("00000000000000000000000000000000000000a1");
    const TO: Address = address!("00000000000000000000000000000000000000b1");

    #[test]
    fn test_erc20_transfer_decodes() {
        let value = U256::from(42u64);
        let log = erc20_transfer_log(TOKEN, FROM, TO, Bytes::from(value.to_be_bytes::<32>().to_vec()));

        let transfer = decode_transfer(&log).unwrap();
        assert_eq!(transfer.token, TOKEN);
        assert_eq!(transfer.sender, FROM);
        assert_eq!(transfer.receiver, TO);
        assert_eq!(transfer.value, value);
    }

    #[test]
    fn test_empty_data_is_zero_value_transfer() {
        let log = erc20_transfer_log(TOKEN, FROM, TO, Bytes::new());

        let transfer = decode_transfer(&log).expect("empty payload must decode");
        assert_eq!(transfer.value, U256::ZERO);
        assert_eq!(transfer.receiver, TO);
    }

    #[test]
    fn test_erc721_transfer_uses_fourth_topic() {
        let log = LogEntry {
            address: TOKEN,
            topics: vec![
                IERC721::Transfer::SIGNATURE_HASH,
                topic_for(FROM),
                topic_for(TO),
                B256::from(U256::from(7u64).to_be_bytes::<32>()),
            ],
            data: Bytes::new(),
        };

        let transfer = decode_transfer(&log).unwrap();
        assert_eq!(transfer.sender, FROM);
        assert_eq!(transfer.value, U256::from(1));
    }

    #[test]
    fn test_transfer_single_decodes() {
        let operator = address!("00000000000000000000000000000000000000d1");
        let mut data = U256::from(5u64).to_be_bytes::<32>().to_vec();
        data.extend_from_slice(&U256::from(3u64).to_be_bytes::<32>());
        let log = LogEntry {
            address: TOKEN,
            topics: vec![
                IERC1155::TransferSingle::SIGNATURE_HASH,
                topic_for(operator),
                topic_for(FROM),
                topic_for(TO),
            ],
            data: Bytes::from(data),
        };

        let transfer = decode_transfer(&log).unwrap();
        assert_eq!(transfer.sender, FROM);
        assert_eq!(transfer.receiver, TO);
        assert_eq!(transfer.value, U256::from(3u64));
    }

    #[test]
    fn test_transfer_single_empty_data() {
        let log = LogEntry {
            address: TOKEN,
            topics: vec![
                IERC1155::TransferSingle::SIGNATURE_HASH,
                topic_for(FROM),
                topic_for(FROM),
                topic_for(TO),
            ],
            data: Bytes::new(),
        };

        assert_eq!(decode_transfer(&log).map(|t| t.value), Some(U256::ZERO));
    }

    #[test]
    fn test_other_events_ignored() {
        let log = LogEntry {
            address: TOKEN,
            topics: vec![B256::repeat_byte(0x11), topic_for(FROM)],
            data: Bytes::new(),
        };
        assert!(decode_transfer(&log).is_none());
        assert!(!is_transfer_signature(&B256::repeat_byte(0x11)));
    }
}
