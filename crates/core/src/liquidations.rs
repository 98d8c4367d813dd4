//! Periodic liquidation catch-up.
//!
//! Every tick: read the stored watermark, scan the log range up to one
//! block behind the chain head in bounded chunks, decode each liquidation,
//! filter against the tracked-account set and notify. The watermark only
//! advances after the whole range was processed; a failed tick leaves it
//! untouched and the next tick re-scans the gap. Re-notification on such an
//! overlap is accepted at-least-once behavior.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use lendwatch_chain::{decode_liquidation, ChainReader, LIQUIDATION_CALL_TOPIC};

use crate::error::MonitorError;
use crate::notify::{Notifier, OperatorAlerts};
use crate::ranges::block_chunks;
use crate::store::{AccountStore, CheckpointStore};
use crate::types::{scale_token_amount, LiquidationEvent, Market};

/// Fixed interval between liquidation scans.
pub const LIQUIDATIONS_CHECK_PERIOD: Duration = Duration::from_secs(60 * 15);

/// Blocks per log query. Bounded by provider-side range limits.
pub const MAX_BLOCK_RANGE: u64 = 100;

/// Liquidation monitor for one (chain, protocol version) pair.
pub struct LiquidationMonitor<R, S, C, N, O> {
    market: Market,
    pool: Address,
    reader: R,
    store: Arc<S>,
    checkpoints: Arc<C>,
    notifier: Arc<N>,
    operator: Arc<O>,
}

impl<R, S, C, N, O> LiquidationMonitor<R, S, C, N, O>
where
    R: ChainReader,
    S: AccountStore,
    C: CheckpointStore,
    N: Notifier,
    O: OperatorAlerts,
{
    pub fn new(
        market: Market,
        pool: Address,
        reader: R,
        store: Arc<S>,
        checkpoints: Arc<C>,
        notifier: Arc<N>,
        operator: Arc<O>,
    ) -> Self {
        Self {
            market,
            pool,
            reader,
            store,
            checkpoints,
            notifier,
            operator,
        }
    }

    /// Run forever with the same failure-isolation policy as the health
    /// loop: catch, log, escalate, resume on the next interval.
    pub async fn run(self) {
        let mut ticker = interval(LIQUIDATIONS_CHECK_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.run_once().await;
        }
    }

    /// One scheduled pass: a failed tick is logged with the owning market
    /// and escalated once, never propagated.
    async fn run_once(&self) {
        if let Err(err) = self.tick().await {
            error!(
                market = %self.market,
                error = %err,
                transient = err.is_transient(),
                "liquidation catch-up failed"
            );
            self.operator
                .alert_operator(&format!(
                    "Liquidation catch-up failed on {}: {err}",
                    self.market
                ))
                .await;
        }
    }

    /// One catch-up pass. Either the watermark advances to the scanned
    /// upper bound or it stays where it was.
    pub async fn tick(&self) -> Result<(), MonitorError> {
        info!(market = %self.market, "checking for liquidations");

        let checkpoint = self
            .checkpoints
            .checkpoint(self.market)
            .await
            .map_err(MonitorError::Store)?;

        // One block of safety margin: the head block may not be final yet.
        let head = self.reader.block_number().await?;
        let safe_head = head.saturating_sub(1);

        let Some(from) = checkpoint else {
            // First observation of this market. There is no safe lower
            // bound to backfill from, so start the watermark here.
            info!(
                market = %self.market,
                block = safe_head,
                "no checkpoint found, recording current height"
            );
            self.checkpoints
                .set_checkpoint(self.market, safe_head)
                .await
                .map_err(MonitorError::Store)?;
            return Ok(());
        };

        if safe_head < from {
            debug!(market = %self.market, checkpoint = from, safe_head, "no new blocks");
            return Ok(());
        }

        info!(
            market = %self.market,
            from,
            to = safe_head,
            "scanning for liquidations"
        );

        let mut seen = 0usize;
        let mut matched = 0usize;
        for (chunk_from, chunk_to) in block_chunks(from, safe_head, MAX_BLOCK_RANGE) {
            let logs = self
                .reader
                .query_logs(self.pool, LIQUIDATION_CALL_TOPIC, chunk_from, chunk_to)
                .await?;
            seen += logs.len();

            for log in &logs {
                let event = LiquidationEvent::from_raw(decode_liquidation(log)?, self.market);
                if self.process_liquidation(event).await? {
                    matched += 1;
                }
            }
        }

        info!(market = %self.market, seen, matched, "liquidation scan complete");

        self.checkpoints
            .set_checkpoint(self.market, safe_head)
            .await
            .map_err(MonitorError::Store)?;
        Ok(())
    }

    /// Notify subscribers about one liquidation if the account is tracked.
    /// Returns whether a notification was requested.
    async fn process_liquidation(&self, event: LiquidationEvent) -> Result<bool, MonitorError> {
        if !self
            .store
            .is_tracked(&event.account)
            .await
            .map_err(MonitorError::Store)?
        {
            debug!(
                account = %event.account,
                "liquidated address is not tracked, skipping"
            );
            return Ok(false);
        }

        info!(account = %event.account, "tracked account was liquidated, querying token data");

        let collateral = self.reader.token_metadata(event.collateral_token).await?;
        let debt = self.reader.token_metadata(event.debt_token).await?;
        let collateral_amount = scale_token_amount(event.collateral_seized, collateral.decimals);
        let debt_amount = scale_token_amount(event.debt_covered, debt.decimals);

        let message = format!(
            "Your account {} on chain {} was liquidated. {} {} was liquidated to cover {} {} debt.",
            event.account.address,
            event.account.chain,
            collateral.symbol,
            collateral_amount,
            debt.symbol,
            debt_amount
        );
        self.notifier
            .notify_liquidation(&event.account, "Liquidation occured!", &message)
            .await;
        Ok(true)
    }
}
