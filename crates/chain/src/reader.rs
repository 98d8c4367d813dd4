//! Read access to a chain RPC endpoint.
//!
//! [`ChainReader`] is the seam the monitor loops are written against; the
//! production implementation speaks HTTP JSON-RPC through Alloy providers.
//! The reader is stateless: it holds an endpoint URL and a timeout, nothing
//! else, and every call is independent.

use std::future::IntoFuture;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, B256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log};
use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::contracts::{IERC20Metadata, IMulticall3, MULTICALL3_ADDRESS};

/// Upper bound on any single remote call.
pub const RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Chain read failures. All variants are transient from the monitors' point
/// of view: the tick is skipped and retried on the next interval.
#[derive(Debug, Error)]
pub enum ChainReadError {
    #[error("rpc call failed: {0}")]
    Rpc(String),

    #[error("rpc call timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid rpc url: {0}")]
    Url(String),
}

/// Symbol and decimal count of an ERC-20 token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    pub symbol: String,
    pub decimals: u8,
}

/// Read-only chain access used by the monitor loops.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Issue one aggregated call bundling many contract reads.
    ///
    /// Atomic: either every call's return data comes back, in input order,
    /// or the whole read fails with a single error. Callers must still check
    /// the returned count against the requested count before pairing results
    /// with inputs.
    async fn read_aggregated(
        &self,
        calls: Vec<(Address, Bytes)>,
    ) -> Result<Vec<Bytes>, ChainReadError>;

    /// Fetch logs emitted by `contract` with `topic` as the signature topic,
    /// over the inclusive block range `[from_block, to_block]`.
    async fn query_logs(
        &self,
        contract: Address,
        topic: B256,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>, ChainReadError>;

    /// Current chain head block number.
    async fn block_number(&self) -> Result<u64, ChainReadError>;

    /// Symbol and decimals of an ERC-20 token. Unbatched; only used on the
    /// low-frequency liquidation path.
    async fn token_metadata(&self, token: Address) -> Result<TokenMetadata, ChainReadError>;
}

/// HTTP JSON-RPC implementation of [`ChainReader`].
#[derive(Debug, Clone)]
pub struct RpcChainReader {
    http_url: String,
    timeout: Duration,
}

impl RpcChainReader {
    pub fn new(http_url: impl Into<String>) -> Self {
        Self {
            http_url: http_url.into(),
            timeout: RPC_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn provider(&self) -> Result<impl Provider, ChainReadError> {
        let url = self
            .http_url
            .parse()
            .map_err(|_| ChainReadError::Url(self.http_url.clone()))?;
        Ok(ProviderBuilder::new().on_http(url))
    }

    async fn bounded<T, E, F>(&self, fut: F) -> Result<T, ChainReadError>
    where
        F: std::future::Future<Output = Result<T, E>> + Send,
        E: std::fmt::Display,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| ChainReadError::Timeout(self.timeout))?
            .map_err(|e| ChainReadError::Rpc(e.to_string()))
    }
}

#[async_trait]
impl ChainReader for RpcChainReader {
    async fn read_aggregated(
        &self,
        calls: Vec<(Address, Bytes)>,
    ) -> Result<Vec<Bytes>, ChainReadError> {
        let provider = self.provider()?;
        let multicall = IMulticall3::new(MULTICALL3_ADDRESS, &provider);

        let requested = calls.len();
        let calls: Vec<IMulticall3::Call> = calls
            .into_iter()
            .map(|(target, call_data)| IMulticall3::Call {
                target,
                callData: call_data,
            })
            .collect();

        let ret = self
            .bounded(multicall.aggregate(calls).call().into_future())
            .await?;

        debug!(
            requested = requested,
            returned = ret.returnData.len(),
            block = %ret.blockNumber,
            "aggregated read complete"
        );
        Ok(ret.returnData)
    }

    async fn query_logs(
        &self,
        contract: Address,
        topic: B256,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>, ChainReadError> {
        let provider = self.provider()?;
        let filter = Filter::new()
            .address(contract)
            .event_signature(topic)
            .from_block(from_block)
            .to_block(to_block);

        let logs = self.bounded(provider.get_logs(&filter)).await?;

        debug!(
            contract = %contract,
            from_block,
            to_block,
            count = logs.len(),
            "log query complete"
        );
        Ok(logs)
    }

    async fn block_number(&self) -> Result<u64, ChainReadError> {
        let provider = self.provider()?;
        self.bounded(provider.get_block_number()).await
    }

    async fn token_metadata(&self, token: Address) -> Result<TokenMetadata, ChainReadError> {
        let provider = self.provider()?;
        let erc20 = IERC20Metadata::new(token, &provider);

        let symbol = self.bounded(erc20.symbol().call().into_future()).await?._0;
        let decimals = self
            .bounded(erc20.decimals().call().into_future())
            .await?
            ._0;

        Ok(TokenMetadata { symbol, decimals })
    }
}
