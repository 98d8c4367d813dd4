//! Chain access layer for the position monitor.
//!
//! This crate provides:
//! - Contract bindings for the lending pool, ERC-20 metadata and Multicall3
//! - A stateless chain reader: aggregated contract reads, range-bounded log
//!   queries and block height lookups over HTTP RPC
//! - Pure decoding of liquidation logs into typed facts
//!
//! Retry and failure-isolation policy lives in the monitor loops, not here;
//! the reader only bounds each remote call with a timeout and reports what
//! happened.

mod contracts;
mod decoder;
mod reader;

pub use contracts::{
    user_account_data_call, IMulticall3, LIQUIDATION_CALL_TOPIC, MULTICALL3_ADDRESS,
};
pub use decoder::{decode_liquidation, topic_to_address, DecodeError, RawLiquidation};
pub use reader::{ChainReadError, ChainReader, RpcChainReader, TokenMetadata, RPC_TIMEOUT};
