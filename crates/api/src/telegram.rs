//! Telegram operator escalation. Best-effort: delivery failures are logged
//! and never surfaced to the monitor loops.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use lendwatch_core::OperatorAlerts;

pub struct TelegramAlerts {
    client: reqwest::Client,
    bot_token: String,
    chat_id: i64,
}

impl TelegramAlerts {
    pub fn new(bot_token: impl Into<String>, chat_id: i64) -> Self {
        Self {
            client: reqwest::Client::new(),
            bot_token: bot_token.into(),
            chat_id,
        }
    }

    async fn send(&self, text: &str) -> Result<()> {
        self.client
            .post(format!(
                "https://api.telegram.org/bot{}/sendMessage",
                self.bot_token
            ))
            .json(&json!({ "chat_id": self.chat_id, "text": text }))
            .send()
            .await?
            .error_for_status()
            .context("telegram rejected the message")?;
        Ok(())
    }
}

#[async_trait]
impl OperatorAlerts for TelegramAlerts {
    async fn alert_operator(&self, text: &str) {
        if let Err(err) = self.send(text).await {
            warn!(error = %err, "operator alert delivery failed");
        }
    }
}
