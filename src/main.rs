//! Lending position monitor.
//!
//! Watches Aave V2/V3 positions across every configured chain:
//! - Periodic health factor checks via batched aggregated reads
//! - Checkpointed liquidation-event catch-up over bounded log queries
//! - Push notifications to subscribers, Telegram escalation to operators

use std::sync::Arc;

use anyhow::Result;
use tokio::task::JoinSet;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lendwatch_api::{PushDispatcher, PushGateway, SupabaseClient, TelegramAlerts};
use lendwatch_chain::RpcChainReader;
use lendwatch_core::{Config, HealthMonitor, LiquidationMonitor};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,lendwatch_core=debug,lendwatch_chain=debug")),
        )
        .init();

    let config = Config::from_env()?;

    let store = Arc::new(SupabaseClient::new(
        &config.supabase_url,
        &config.supabase_key,
    ));
    let notifier = Arc::new(PushDispatcher::new(
        PushGateway::new(&config.onesignal_app_id, &config.onesignal_app_key),
        store.clone(),
    ));
    let operator = Arc::new(TelegramAlerts::new(
        &config.telegram_bot_token,
        config.telegram_admin_chat,
    ));

    info!(targets = config.targets.len(), "starting monitors");

    // One health task and one liquidation task per configured market.
    let mut tasks = JoinSet::new();
    for target in &config.targets {
        let reader = RpcChainReader::new(&target.rpc_url);

        tasks.spawn(
            HealthMonitor::new(
                target.market,
                target.pool,
                reader.clone(),
                store.clone(),
                notifier.clone(),
                operator.clone(),
            )
            .run(),
        );
        tasks.spawn(
            LiquidationMonitor::new(
                target.market,
                target.pool,
                reader,
                store.clone(),
                store.clone(),
                notifier.clone(),
                operator.clone(),
            )
            .run(),
        );
    }

    // Monitor loops never return; this only resolves if a task panics.
    while let Some(result) = tasks.join_next().await {
        result?;
    }
    Ok(())
}
