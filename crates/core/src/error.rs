//! Error taxonomy for the monitor loops.
//!
//! Three classes matter operationally: transient remote failures (skip the
//! tick, retry on the next interval), decode failures (tick-fatal, never
//! advance the checkpoint) and configuration failures (startup-fatal, the
//! task is never scheduled). Everything is caught at the tick boundary.

use lendwatch_chain::{ChainReadError, DecodeError};
use thiserror::Error;

/// A failed monitor tick.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Chain(#[from] ChainReadError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("store error: {0}")]
    Store(#[source] anyhow::Error),
}

impl MonitorError {
    /// Transient errors resolve themselves on a later tick; decode errors
    /// indicate a shape mismatch that will recur until investigated.
    pub fn is_transient(&self) -> bool {
        !matches!(self, MonitorError::Decode(_))
    }
}

/// Startup configuration failures. A market with broken configuration is
/// not scheduled at all rather than left spin-failing.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnv(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
