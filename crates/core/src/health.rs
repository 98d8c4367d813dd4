//! Periodic health factor monitoring.
//!
//! Every tick: load the tracked accounts for this market, read their health
//! factors in fixed-size batches through one aggregated call each, compare
//! against per-subscription thresholds and hand breaches to the dispatcher.
//! This loop never touches the checkpoint store.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, U256};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use lendwatch_chain::{user_account_data_call, ChainReader, DecodeError};

use crate::error::MonitorError;
use crate::notify::{Notifier, OperatorAlerts};
use crate::store::AccountStore;
use crate::types::{scale_health_factor, HealthFactorReading, Market};

/// Fixed interval between health factor checks.
pub const HEALTH_CHECK_PERIOD: Duration = Duration::from_secs(60 * 15);

/// Accounts per aggregated read. Bounded by the remote call's gas limit.
pub const HEALTH_FACTOR_BATCH_SIZE: usize = 100;

/// Health factor monitor for one (chain, protocol version) pair.
pub struct HealthMonitor<R, S, N, O> {
    market: Market,
    pool: Address,
    reader: R,
    store: Arc<S>,
    notifier: Arc<N>,
    operator: Arc<O>,
}

impl<R, S, N, O> HealthMonitor<R, S, N, O>
where
    R: ChainReader,
    S: AccountStore,
    N: Notifier,
    O: OperatorAlerts,
{
    pub fn new(
        market: Market,
        pool: Address,
        reader: R,
        store: Arc<S>,
        notifier: Arc<N>,
        operator: Arc<O>,
    ) -> Self {
        Self {
            market,
            pool,
            reader,
            store,
            notifier,
            operator,
        }
    }

    /// Run forever. Each tick is isolated: any failure is logged with the
    /// owning market, escalated once, and the loop resumes after the fixed
    /// interval. No early retry.
    pub async fn run(self) {
        let mut ticker = interval(HEALTH_CHECK_PERIOD);
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
                "health factor check failed"
            );
            self.operator
                .alert_operator(&format!(
                    "Health factor check failed on {}: {err}",
                    self.market
                ))
                .await;
        }
    }

    /// One reconciliation pass. Public so tests can drive a single tick
    /// without the schedule wrapper.
    pub async fn tick(&self) -> Result<(), MonitorError> {
        info!(market = %self.market, "checking health factors");

        let accounts = self
            .store
            .tracked_accounts(self.market)
            .await
            .map_err(MonitorError::Store)?;
        if accounts.is_empty() {
            debug!(market = %self.market, "no tracked accounts");
            return Ok(());
        }

        let mut alerted = 0usize;
        for batch in accounts.chunks(HEALTH_FACTOR_BATCH_SIZE) {
            let calls: Vec<(Address, Bytes)> = batch
                .iter()
                .map(|tracked| (self.pool, user_account_data_call(tracked.account.address)))
                .collect();

            let results = self.reader.read_aggregated(calls).await?;
            if results.len() != batch.len() {
                return Err(DecodeError::ResultCountMismatch {
                    requested: batch.len(),
                    got: results.len(),
                }
                .into());
            }

            for (tracked, data) in batch.iter().zip(&results) {
                let reading = HealthFactorReading {
                    account: tracked.account,
                    value: decode_health_factor(data)?,
                };

                if reading.breaches(tracked.threshold) {
                    alerted += 1;
                    let message = format!(
                        "Health factor on your account {} {} is {:.2} which is below the threshold of {}.",
                        tracked.account.chain, tracked.account.address, reading.value, tracked.threshold
                    );
                    self.notifier
                        .notify_health_factor(&tracked.account, &message)
                        .await;
                }
            }
        }

        info!(
            market = %self.market,
            checked = accounts.len(),
            alerted,
            "health factor check complete"
        );
        Ok(())
    }
}

/// The health factor is the last return value of `getUserAccountData`, so
/// it sits in the trailing 32 bytes regardless of protocol version.
fn decode_health_factor(data: &Bytes) -> Result<f64, DecodeError> {
    if data.len() < 32 {
        return Err(DecodeError::ReturnDataTooShort { got: data.len() });
    }
    let raw = U256::from_be_slice(&data[data.len() - 32..]);
    Ok(scale_health_factor(raw))
}
