//! Notification and escalation seams.
//!
//! Both are fire-and-forget from the monitors' point of view: subscriber
//! resolution, cooldown policy and delivery failures are the dispatcher's
//! concern and must never fail a monitor tick.

use async_trait::async_trait;

use crate::types::ChainAccount;

/// Resolves subscribers for an account and delivers push notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A health factor dropped below a subscriber's threshold. The
    /// dispatcher applies its cross-process cooldown before delivering.
    async fn notify_health_factor(&self, account: &ChainAccount, message: &str);

    /// A tracked account was liquidated. Never throttled: a liquidation is
    /// a one-time event.
    async fn notify_liquidation(&self, account: &ChainAccount, title: &str, message: &str);
}

/// Pages an operator on unexpected monitor failures. Best-effort; failures
/// here are logged and never re-raised.
#[async_trait]
pub trait OperatorAlerts: Send + Sync {
    async fn alert_operator(&self, text: &str);
}
