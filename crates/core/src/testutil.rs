//! In-memory fakes and fixture builders for driving monitor ticks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, Bytes, Log as LogInner, LogData, B256, U256};
use alloy::rpc::types::Log;
use async_trait::async_trait;

use lendwatch_chain::{ChainReadError, ChainReader, TokenMetadata, LIQUIDATION_CALL_TOPIC};

use crate::notify::{Notifier, OperatorAlerts};
use crate::store::{AccountStore, CheckpointStore};
use crate::types::{Chain, ChainAccount, Market, ProtocolVersion, TrackedAccount};

pub fn test_market() -> Market {
    Market::new(Chain::Ethereum, ProtocolVersion::V3)
}

/// A subscription row with a synthetic address derived from `n`.
pub fn tracked(market: Market, n: u8, threshold: f64) -> TrackedAccount {
    TrackedAccount {
        account: ChainAccount::new(Address::repeat_byte(n), market),
        threshold,
        subscriber: Some(format!("player-{n}")),
    }
}

/// Full six-word `getUserAccountData` return with the health factor in the
/// trailing word.
pub fn account_data_return(health_factor: U256) -> Bytes {
    let mut data = vec![0u8; 160];
    data.extend_from_slice(&health_factor.to_be_bytes::<32>());
    data.into()
}

fn topic_for(addr: Address) -> B256 {
    let mut bytes = [0u8; 32];
    bytes[12..].copy_from_slice(addr.as_slice());
    B256::new(bytes)
}

fn log_with(topics: Vec<B256>, data: Vec<u8>, block: Option<u64>) -> Log {
    Log {
        inner: LogInner {
            address: Address::ZERO,
            data: LogData::new_unchecked(topics, data.into()),
        },
        block_number: block,
        ..Default::default()
    }
}

/// A well-formed `LiquidationCall` log record.
pub fn liquidation_log(
    collateral: Address,
    debt: Address,
    user: Address,
    debt_covered: U256,
    collateral_seized: U256,
    block: u64,
) -> Log {
    let mut data = Vec::with_capacity(64);
    data.extend_from_slice(&debt_covered.to_be_bytes::<32>());
    data.extend_from_slice(&collateral_seized.to_be_bytes::<32>());
    log_with(
        vec![
            LIQUIDATION_CALL_TOPIC,
            topic_for(collateral),
            topic_for(debt),
            topic_for(user),
        ],
        data,
        Some(block),
    )
}

/// A log record with a missing indexed topic.
pub fn malformed_liquidation_log() -> Log {
    log_with(vec![LIQUIDATION_CALL_TOPIC, B256::ZERO], vec![0u8; 64], Some(1))
}

#[derive(Default)]
struct FakeReaderState {
    aggregated: Vec<Bytes>,
    logs: HashMap<(u64, u64), Vec<Log>>,
    height: u64,
    tokens: HashMap<Address, TokenMetadata>,
    log_queries: usize,
    token_lookups: usize,
}

/// Programmable [`ChainReader`]. Clones share state so tests can inspect
/// call counts after handing the reader to a monitor.
#[derive(Clone, Default)]
pub struct FakeReader {
    state: Arc<Mutex<FakeReaderState>>,
}

impl FakeReader {
    pub fn with_aggregated(self, results: Vec<Bytes>) -> Self {
        self.state.lock().unwrap().aggregated = results;
        self
    }

    pub fn with_height(self, height: u64) -> Self {
        self.state.lock().unwrap().height = height;
        self
    }

    pub fn with_logs(self, range: (u64, u64), logs: Vec<Log>) -> Self {
        self.state.lock().unwrap().logs.insert(range, logs);
        self
    }

    pub fn with_token(self, token: Address, metadata: TokenMetadata) -> Self {
        self.state.lock().unwrap().tokens.insert(token, metadata);
        self
    }

    pub fn log_queries(&self) -> usize {
        self.state.lock().unwrap().log_queries
    }

    pub fn token_lookups(&self) -> usize {
        self.state.lock().unwrap().token_lookups
    }
}

#[async_trait]
impl ChainReader for FakeReader {
    async fn read_aggregated(
        &self,
        _calls: Vec<(Address, Bytes)>,
    ) -> Result<Vec<Bytes>, ChainReadError> {
        Ok(self.state.lock().unwrap().aggregated.clone())
    }

    async fn query_logs(
        &self,
        _contract: Address,
        _topic: B256,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>, ChainReadError> {
        let mut state = self.state.lock().unwrap();
        state.log_queries += 1;
        Ok(state
            .logs
            .get(&(from_block, to_block))
            .cloned()
            .unwrap_or_default())
    }

    async fn block_number(&self) -> Result<u64, ChainReadError> {
        Ok(self.state.lock().unwrap().height)
    }

    async fn token_metadata(&self, token: Address) -> Result<TokenMetadata, ChainReadError> {
        let mut state = self.state.lock().unwrap();
        state.token_lookups += 1;
        state
            .tokens
            .get(&token)
            .cloned()
            .ok_or_else(|| ChainReadError::Rpc(format!("no metadata for {token}")))
    }
}

/// Fixed set of subscription rows.
pub struct MemoryAccounts {
    rows: Vec<TrackedAccount>,
}

impl MemoryAccounts {
    pub fn new(rows: Vec<TrackedAccount>) -> Self {
        Self { rows }
    }

    /// Track the given addresses on the test market with a threshold of 1.0.
    pub fn tracking(addresses: Vec<Address>) -> Self {
        Self::new(
            addresses
                .into_iter()
                .map(|address| TrackedAccount {
                    account: ChainAccount::new(address, test_market()),
                    threshold: 1.0,
                    subscriber: None,
                })
                .collect(),
        )
    }
}

#[async_trait]
impl AccountStore for MemoryAccounts {
    async fn tracked_accounts(&self, market: Market) -> anyhow::Result<Vec<TrackedAccount>> {
        Ok(self
            .rows
            .iter()
            .filter(|row| row.account.market() == market)
            .cloned()
            .collect())
    }

    async fn is_tracked(&self, account: &ChainAccount) -> anyhow::Result<bool> {
        Ok(self.rows.iter().any(|row| row.account == *account))
    }
}

#[derive(Default)]
pub struct MemoryCheckpoints {
    map: Mutex<HashMap<Market, u64>>,
}

impl MemoryCheckpoints {
    pub fn set(&self, market: Market, block: u64) {
        self.map.lock().unwrap().insert(market, block);
    }

    pub fn get(&self, market: Market) -> Option<u64> {
        self.map.lock().unwrap().get(&market).copied()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpoints {
    async fn checkpoint(&self, market: Market) -> anyhow::Result<Option<u64>> {
        Ok(self.get(market))
    }

    async fn set_checkpoint(&self, market: Market, block: u64) -> anyhow::Result<()> {
        self.set(market, block);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    health: Mutex<Vec<(ChainAccount, String)>>,
    liquidations: Mutex<Vec<(ChainAccount, String, String)>>,
}

impl RecordingNotifier {
    pub fn health_messages(&self) -> Vec<(ChainAccount, String)> {
        self.health.lock().unwrap().clone()
    }

    pub fn liquidation_messages(&self) -> Vec<(ChainAccount, String, String)> {
        self.liquidations.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_health_factor(&self, account: &ChainAccount, message: &str) {
        self.health
            .lock()
            .unwrap()
            .push((*account, message.to_owned()));
    }

    async fn notify_liquidation(&self, account: &ChainAccount, title: &str, message: &str) {
        self.liquidations
            .lock()
            .unwrap()
            .push((*account, title.to_owned(), message.to_owned()));
    }
}

pub struct NullOperator;

#[async_trait]
impl OperatorAlerts for NullOperator {
    async fn alert_operator(&self, _text: &str) {}
}

#[derive(Default)]
pub struct RecordingOperator {
    alerts: Mutex<Vec<String>>,
}

impl RecordingOperator {
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl OperatorAlerts for RecordingOperator {
    async fn alert_operator(&self, text: &str) {
        self.alerts.lock().unwrap().push(text.to_owned());
    }
}
