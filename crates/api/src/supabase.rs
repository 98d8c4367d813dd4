//! Supabase REST client.
//!
//! Two tables matter here: `account` (one row per subscription, joined with
//! the owning `user` row for threshold and push destination) and `setting`
//! (string key/value pairs holding the per-market block watermarks).

use alloy::primitives::Address;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use lendwatch_core::{AccountStore, ChainAccount, CheckpointStore, Market, TrackedAccount};

/// Threshold applied when a subscriber never configured one.
const DEFAULT_THRESHOLD: f64 = 1.0;

/// Storage key for a market's watermark, e.g. `LAST_POLYGON_V3_CHECKED_BLOCK`.
fn checkpoint_key(market: Market) -> String {
    format!(
        "LAST_{}_V{}_CHECKED_BLOCK",
        market.chain.key(),
        market.version.as_u8()
    )
}

#[derive(Debug, Deserialize)]
struct SettingRow {
    value: String,
}

#[derive(Debug, Deserialize)]
struct SubscriberRow {
    health_factor_threshold: Option<f64>,
    onesignal_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccountRow {
    address: String,
    #[serde(rename = "user")]
    subscriber: Option<SubscriberRow>,
}

/// One subscription to an account, resolved for push delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub last_health_notification: Option<DateTime<Utc>>,
    #[serde(rename = "user")]
    pub subscriber: Option<PushTarget>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushTarget {
    pub onesignal_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SupabaseClient {
    client: reqwest::Client,
    base_url: String,
    key: String,
}

impl SupabaseClient {
    pub fn new(base_url: impl Into<String>, key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
            key: key.into(),
        }
    }

    fn request(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}/rest/v1/{table}", self.base_url))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
    }

    async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let rows: Vec<SettingRow> = self
            .request(reqwest::Method::GET, "setting")
            .query(&[("key", format!("eq.{key}")), ("select", "value".into())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("reading setting {key}"))?;
        Ok(rows.into_iter().next().map(|row| row.value))
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.request(reqwest::Method::POST, "setting")
            .query(&[("on_conflict", "key")])
            .header("Prefer", "resolution=merge-duplicates")
            .json(&json!([{ "key": key, "value": value }]))
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("writing setting {key}"))?;
        Ok(())
    }

    fn account_filters(account: &ChainAccount) -> [(&'static str, String); 3] {
        [
            ("address", format!("eq.{}", account.address)),
            ("chain", format!("eq.{}", account.chain.key())),
            ("aave_version", format!("eq.{}", account.version.as_u8())),
        ]
    }

    /// All subscriptions to one account, with push destination and the last
    /// health notification timestamp.
    pub async fn subscriptions(&self, account: &ChainAccount) -> Result<Vec<Subscription>> {
        let mut query = Self::account_filters(account).to_vec();
        query.push((
            "select",
            "id,last_health_notification,user(onesignal_id)".into(),
        ));

        let rows: Vec<Subscription> = self
            .request(reqwest::Method::GET, "account")
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("reading subscriptions for {account}"))?;
        Ok(rows)
    }

    /// Record that a health notification went out for this subscription row.
    pub async fn mark_health_factor_notified(&self, subscription_id: i64) -> Result<()> {
        self.request(reqwest::Method::PATCH, "account")
            .query(&[("id", format!("eq.{subscription_id}"))])
            .json(&json!({ "last_health_notification": Utc::now().to_rfc3339() }))
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("marking subscription {subscription_id} notified"))?;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for SupabaseClient {
    async fn tracked_accounts(&self, market: Market) -> Result<Vec<TrackedAccount>> {
        let rows: Vec<AccountRow> = self
            .request(reqwest::Method::GET, "account")
            .query(&[
                ("chain", format!("eq.{}", market.chain.key())),
                ("aave_version", format!("eq.{}", market.version.as_u8())),
                (
                    "select",
                    "address,user(health_factor_threshold,onesignal_id)".into(),
                ),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("reading tracked accounts for {market}"))?;

        let mut accounts = Vec::with_capacity(rows.len());
        for row in rows {
            let Ok(address) = row.address.parse::<Address>() else {
                // A single corrupt row must not take the whole market down.
                warn!(address = %row.address, market = %market, "unparseable account address, skipping row");
                continue;
            };
            let subscriber = row.subscriber.unwrap_or(SubscriberRow {
                health_factor_threshold: None,
                onesignal_id: None,
            });
            accounts.push(TrackedAccount {
                account: ChainAccount::new(address, market),
                threshold: subscriber.health_factor_threshold.unwrap_or(DEFAULT_THRESHOLD),
                subscriber: subscriber.onesignal_id,
            });
        }
        debug!(market = %market, count = accounts.len(), "loaded tracked accounts");
        Ok(accounts)
    }

    async fn is_tracked(&self, account: &ChainAccount) -> Result<bool> {
        let mut query = Self::account_filters(account).to_vec();
        query.push(("select", "id".into()));
        query.push(("limit", "1".into()));

        let rows: Vec<serde_json::Value> = self
            .request(reqwest::Method::GET, "account")
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("checking whether {account} is tracked"))?;
        Ok(!rows.is_empty())
    }
}

#[async_trait]
impl CheckpointStore for SupabaseClient {
    async fn checkpoint(&self, market: Market) -> Result<Option<u64>> {
        let key = checkpoint_key(market);
        match self.get_setting(&key).await? {
            Some(value) => {
                let block = value
                    .parse::<u64>()
                    .map_err(|e| anyhow!("corrupt checkpoint {key}={value}: {e}"))?;
                Ok(Some(block))
            }
            None => Ok(None),
        }
    }

    async fn set_checkpoint(&self, market: Market, block: u64) -> Result<()> {
        self.set_setting(&checkpoint_key(market), &block.to_string())
            .await
    }
}
