//! Monitoring core for on-chain lending positions.
//!
//! This crate provides:
//! - Domain types: chains, protocol versions, tracked accounts, readings
//! - The periodic health factor monitor (batched aggregated reads)
//! - The periodic liquidation monitor (checkpointed log catch-up)
//! - Collaborator seams: account store, checkpoint store, notification
//!   dispatcher and operator escalation
//! - Deployment configuration loaded from the environment
//!
//! One health task and one liquidation task run per (chain, protocol
//! version) pair. Tasks share no in-process state; checkpoints, thresholds
//! and cooldowns live behind the collaborator traits.

pub mod config;
mod error;
mod health;
mod liquidations;
mod notify;
mod ranges;
mod store;
mod types;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::{Config, Deployment, Target, DEPLOYMENTS};
pub use error::{ConfigError, MonitorError};
pub use health::{HealthMonitor, HEALTH_CHECK_PERIOD, HEALTH_FACTOR_BATCH_SIZE};
pub use liquidations::{LiquidationMonitor, LIQUIDATIONS_CHECK_PERIOD, MAX_BLOCK_RANGE};
pub use notify::{Notifier, OperatorAlerts};
pub use ranges::block_chunks;
pub use store::{AccountStore, CheckpointStore};
pub use types::{
    scale_health_factor, scale_token_amount, Chain, ChainAccount, HealthFactorReading,
    LiquidationEvent, Market, ProtocolVersion, TrackedAccount, NO_DEBT,
};
