//! Pure decoding of raw log records into typed liquidation facts.
//!
//! A `LiquidationCall` log carries three indexed topics after the signature
//! topic (collateral token, debt token, liquidated user) and at least two
//! 32-byte big-endian words of data (debt covered, collateral seized).
//! Anything malformed is a [`DecodeError`]; nothing is silently coerced.

use alloy::primitives::{Address, U256};
use alloy::rpc::types::Log;
use thiserror::Error;

/// Decoding failures. These are tick-fatal for the monitors: a malformed
/// liquidation log could hide a real liquidation, so it is surfaced instead
/// of skipped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("expected {expected} topics, got {got}")]
    TopicCount { expected: usize, got: usize },

    #[error("event data truncated: need {needed} bytes, got {got}")]
    DataTooShort { needed: usize, got: usize },

    #[error("log record is missing a block number")]
    MissingBlockNumber,

    #[error("aggregated read returned {got} results for {requested} calls")]
    ResultCountMismatch { requested: usize, got: usize },

    #[error("return data too short for a health factor: {got} bytes")]
    ReturnDataTooShort { got: usize },
}

/// A decoded liquidation, still chain-agnostic. The monitor attaches the
/// owning (chain, protocol version) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLiquidation {
    /// Account whose position was liquidated
    pub user: Address,
    /// Collateral token that was seized
    pub collateral_token: Address,
    /// Debt token that was repaid by the liquidator
    pub debt_token: Address,
    /// Raw debt amount covered (token base units)
    pub debt_covered: U256,
    /// Raw collateral amount seized (token base units)
    pub collateral_seized: U256,
    /// Block the event was emitted in
    pub block_number: u64,
}

/// Extract the address packed into the low 20 bytes of an event topic.
///
/// The high 12 bytes are zero padding. `Address` renders in EIP-55 checksum
/// casing, so output is deterministic regardless of input casing.
pub fn topic_to_address(topic: alloy::primitives::B256) -> Address {
    Address::from_slice(&topic[12..])
}

/// Decode a `LiquidationCall` log.
///
/// Trailing data fields beyond the first two words (liquidator address,
/// receive-aToken flag) are ignored.
pub fn decode_liquidation(log: &Log) -> Result<RawLiquidation, DecodeError> {
    let topics = log.topics();
    if topics.len() != 4 {
        return Err(DecodeError::TopicCount {
            expected: 4,
            got: topics.len(),
        });
    }

    let data = &log.data().data;
    if data.len() < 64 {
        return Err(DecodeError::DataTooShort {
            needed: 64,
            got: data.len(),
        });
    }

    let block_number = log.block_number.ok_or(DecodeError::MissingBlockNumber)?;

    Ok(RawLiquidation {
        collateral_token: topic_to_address(topics[1]),
        debt_token: topic_to_address(topics[2]),
        user: topic_to_address(topics[3]),
        debt_covered: U256::from_be_slice(&data[..32]),
        collateral_seized: U256::from_be_slice(&data[32..64]),
        block_number,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::LIQUIDATION_CALL_TOPIC;
    use alloy::primitives::{address, Log as LogInner, LogData, B256};

    fn topic_for(addr: Address) -> B256 {
        let mut bytes = [0u8; 32];
        bytes[12..].copy_from_slice(addr.as_slice());
        B256::new(bytes)
    }

    fn word(value: U256) -> [u8; 32] {
        value.to_be_bytes()
    }

    fn liquidation_log(topics: Vec<B256>, data: Vec<u8>, block: Option<u64>) -> Log {
        Log {
            inner: LogInner {
                address: Address::ZERO,
                data: LogData::new_unchecked(topics, data.into()),
            },
            block_number: block,
            ..Default::default()
        }
    }

    #[test]
    fn topic_extraction_discards_padding_and_checksums() {
        let addr = address!("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045");
        let extracted = topic_to_address(topic_for(addr));

        assert_eq!(extracted, addr);
        assert_eq!(
            extracted.to_string(),
            "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045"
        );
        // Re-extraction is a fixed point
        assert_eq!(topic_to_address(topic_for(extracted)), extracted);
    }

    #[test]
    fn decodes_well_formed_log() {
        let collateral = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
        let debt = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
        let user = address!("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045");

        let debt_covered = U256::from(0x000f512a56u64);
        let collateral_seized = U256::from(0x02466c495f276f3cu64);

        let mut data = Vec::new();
        data.extend_from_slice(&word(debt_covered));
        data.extend_from_slice(&word(collateral_seized));
        // trailing fields (liquidator, receiveAToken) must be ignored
        data.extend_from_slice(&[0u8; 64]);

        let log = liquidation_log(
            vec![
                LIQUIDATION_CALL_TOPIC,
                topic_for(collateral),
                topic_for(debt),
                topic_for(user),
            ],
            data,
            Some(19_000_123),
        );

        let decoded = decode_liquidation(&log).unwrap();
        assert_eq!(decoded.user, user);
        assert_eq!(decoded.collateral_token, collateral);
        assert_eq!(decoded.debt_token, debt);
        assert_eq!(decoded.debt_covered, debt_covered);
        assert_eq!(decoded.collateral_seized, collateral_seized);
        assert_eq!(decoded.block_number, 19_000_123);
    }

    #[test]
    fn rejects_wrong_topic_count() {
        let log = liquidation_log(
            vec![LIQUIDATION_CALL_TOPIC, B256::ZERO],
            vec![0u8; 64],
            Some(1),
        );
        assert_eq!(
            decode_liquidation(&log),
            Err(DecodeError::TopicCount {
                expected: 4,
                got: 2
            })
        );
    }

    #[test]
    fn rejects_truncated_data() {
        let log = liquidation_log(
            vec![LIQUIDATION_CALL_TOPIC, B256::ZERO, B256::ZERO, B256::ZERO],
            vec![0u8; 63],
            Some(1),
        );
        assert_eq!(
            decode_liquidation(&log),
            Err(DecodeError::DataTooShort {
                needed: 64,
                got: 63
            })
        );
    }

    #[test]
    fn rejects_missing_block_number() {
        let log = liquidation_log(
            vec![LIQUIDATION_CALL_TOPIC, B256::ZERO, B256::ZERO, B256::ZERO],
            vec![0u8; 64],
            None,
        );
        assert_eq!(
            decode_liquidation(&log),
            Err(DecodeError::MissingBlockNumber)
        );
    }
}
