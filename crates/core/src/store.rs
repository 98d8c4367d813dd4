//! Collaborator contracts for externally-owned state.
//!
//! The monitors consume these; they never own the data behind them.
//! Registration of accounts and thresholds happens in an external flow.

use async_trait::async_trait;

use crate::types::{ChainAccount, Market, TrackedAccount};

/// Read access to the tracked-accounts database.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// All subscription rows for a market. Accounts nobody subscribes to do
    /// not appear and therefore cost nothing in a batch.
    async fn tracked_accounts(&self, market: Market) -> anyhow::Result<Vec<TrackedAccount>>;

    /// Whether at least one user tracks this account.
    async fn is_tracked(&self, account: &ChainAccount) -> anyhow::Result<bool>;
}

/// Durable per-market watermark: the last fully-processed block number.
///
/// The monitor reads it at the start of a tick and writes it only after the
/// whole range up to the new watermark was processed; values must never
/// decrease.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn checkpoint(&self, market: Market) -> anyhow::Result<Option<u64>>;

    async fn set_checkpoint(&self, market: Market, block: u64) -> anyhow::Result<()>;
}
