//! OneSignal push delivery.
//!
//! [`PushGateway`] is the thin REST wrapper; [`PushDispatcher`] implements
//! the notifier seam on top of it: it resolves subscribers through Supabase,
//! applies the health alert cooldown and swallows delivery failures so a
//! flaky push provider cannot fail a monitor tick.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tracing::{debug, warn};

use lendwatch_core::{ChainAccount, Notifier};

use crate::supabase::SupabaseClient;

const ONESIGNAL_URL: &str = "https://onesignal.com/api/v1/notifications";

const HEALTH_ALERT_TITLE: &str = "Health factor warning!";

/// Minimum gap between two health alerts for the same subscription.
/// Liquidation alerts are never throttled.
pub const HEALTH_ALERT_COOLDOWN_HOURS: i64 = 12;

fn cooldown_elapsed(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last {
        Some(last) => now - last >= Duration::hours(HEALTH_ALERT_COOLDOWN_HOURS),
        None => true,
    }
}

#[derive(Debug, Clone)]
pub struct PushGateway {
    client: reqwest::Client,
    app_id: String,
    app_key: String,
}

impl PushGateway {
    pub fn new(app_id: impl Into<String>, app_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            app_id: app_id.into(),
            app_key: app_key.into(),
        }
    }

    pub async fn send(&self, player_id: &str, title: &str, message: &str) -> Result<()> {
        self.client
            .post(ONESIGNAL_URL)
            .header("Authorization", format!("Basic {}", self.app_key))
            .json(&json!({
                "app_id": self.app_id,
                "include_player_ids": [player_id],
                "target_channel": "push",
                "headings": { "en": title },
                "contents": { "en": message },
            }))
            .send()
            .await?
            .error_for_status()
            .context("push delivery rejected")?;
        Ok(())
    }
}

/// Push-backed implementation of the notifier seam.
pub struct PushDispatcher {
    gateway: PushGateway,
    store: Arc<SupabaseClient>,
}

impl PushDispatcher {
    pub fn new(gateway: PushGateway, store: Arc<SupabaseClient>) -> Self {
        Self { gateway, store }
    }

    async fn dispatch(&self, account: &ChainAccount, title: &str, message: &str, throttled: bool) {
        let subscriptions = match self.store.subscriptions(account).await {
            Ok(subscriptions) => subscriptions,
            Err(err) => {
                warn!(account = %account, error = %err, "failed to resolve subscribers");
                return;
            }
        };

        let now = Utc::now();
        for subscription in subscriptions {
            let Some(player_id) = subscription
                .subscriber
                .as_ref()
                .and_then(|target| target.onesignal_id.as_deref())
            else {
                debug!(account = %account, "subscription has no push destination");
                continue;
            };

            if throttled && !cooldown_elapsed(subscription.last_health_notification, now) {
                debug!(account = %account, "health alert within cooldown, skipping");
                continue;
            }

            if let Err(err) = self.gateway.send(player_id, title, message).await {
                warn!(account = %account, error = %err, "push delivery failed");
                continue;
            }

            if throttled {
                if let Err(err) = self.store.mark_health_factor_notified(subscription.id).await {
                    warn!(account = %account, error = %err, "failed to record notification time");
                }
            }
        }
    }
}

#[async_trait]
impl Notifier for PushDispatcher {
    async fn notify_health_factor(&self, account: &ChainAccount, message: &str) {
        self.dispatch(account, HEALTH_ALERT_TITLE, message, true).await;
    }

    async fn notify_liquidation(&self, account: &ChainAccount, title: &str, message: &str) {
        self.dispatch(account, title, message, false).await;
    }
}
