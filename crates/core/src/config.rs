//! Runtime configuration.
//!
//! Everything comes from the environment: service credentials are required,
//! RPC endpoints are per-chain and optional. A chain without an endpoint is
//! skipped with a warning instead of failing startup, so one roster serves
//! every deployment environment.

use alloy::primitives::{address, Address};
use tracing::warn;

use crate::error::ConfigError;
use crate::types::{Chain, Market, ProtocolVersion};

/// A known lending pool deployment.
#[derive(Debug, Clone, Copy)]
pub struct Deployment {
    pub market: Market,
    pub pool: Address,
}

const fn deployment(chain: Chain, version: ProtocolVersion, pool: Address) -> Deployment {
    Deployment {
        market: Market { chain, version },
        pool,
    }
}

/// Every pool deployment the service knows about. V2 exists only where the
/// protocol was live before the V3 migration.
pub const DEPLOYMENTS: &[Deployment] = &[
    deployment(
        Chain::Ethereum,
        ProtocolVersion::V2,
        address!("7d2768dE32b0b80b7a3454c06BdAc94A69DDc7A9"),
    ),
    deployment(
        Chain::Ethereum,
        ProtocolVersion::V3,
        address!("87870Bca3F3fD6335C3F4ce8392D69350B4fA4E2"),
    ),
    deployment(
        Chain::EthereumSepolia,
        ProtocolVersion::V3,
        address!("6Ae43d3271ff6888e7Fc43Fd7321a503ff738951"),
    ),
    deployment(
        Chain::Polygon,
        ProtocolVersion::V2,
        address!("8dFf5E27EA6b7AC08EbFdf9eB090F32ee9a30fcf"),
    ),
    deployment(
        Chain::Polygon,
        ProtocolVersion::V3,
        address!("794a61358D6845594F94dc1DB02A252b5b4814aD"),
    ),
    deployment(
        Chain::Optimism,
        ProtocolVersion::V3,
        address!("794a61358D6845594F94dc1DB02A252b5b4814aD"),
    ),
    deployment(
        Chain::Arbitrum,
        ProtocolVersion::V3,
        address!("794a61358D6845594F94dc1DB02A252b5b4814aD"),
    ),
    deployment(
        Chain::Avalanche,
        ProtocolVersion::V2,
        address!("4F01AeD16D97E3aB5ab2B501154DC9bb0F1A5A2C"),
    ),
    deployment(
        Chain::Avalanche,
        ProtocolVersion::V3,
        address!("794a61358D6845594F94dc1DB02A252b5b4814aD"),
    ),
    deployment(
        Chain::Metis,
        ProtocolVersion::V3,
        address!("90df02551bB792286e8D4f13E0e357b4Bf1D6a57"),
    ),
    deployment(
        Chain::Base,
        ProtocolVersion::V3,
        address!("A238Dd80C259a72e81d7e4664a9801593F98d1c5"),
    ),
];

/// One deployment with a usable RPC endpoint. Each target gets its own pair
/// of monitor tasks.
#[derive(Debug, Clone)]
pub struct Target {
    pub market: Market,
    pub pool: Address,
    pub rpc_url: String,
}

/// Fully resolved service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_key: String,
    pub onesignal_app_id: String,
    pub onesignal_app_key: String,
    pub telegram_bot_token: String,
    pub telegram_admin_chat: i64,
    pub targets: Vec<Target>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let telegram_admin_chat = required("TELEGRAM_ADMIN_CHAT_ID")?
            .parse()
            .map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                name: "TELEGRAM_ADMIN_CHAT_ID",
                reason: e.to_string(),
            })?;

        let mut targets = Vec::new();
        for deployment in DEPLOYMENTS {
            let env_var = deployment.market.chain.rpc_env_var();
            match std::env::var(env_var) {
                Ok(url) if !url.trim().is_empty() => targets.push(Target {
                    market: deployment.market,
                    pool: deployment.pool,
                    rpc_url: url,
                }),
                _ => warn!(
                    market = %deployment.market,
                    env_var,
                    "no RPC endpoint configured, skipping market"
                ),
            }
        }
        if targets.is_empty() {
            return Err(ConfigError::Invalid {
                name: "rpc endpoints",
                reason: "no chain has an RPC URL configured".into(),
            });
        }

        Ok(Self {
            supabase_url: required("SUPABASE_URL")?,
            supabase_key: required("SUPABASE_KEY")?,
            onesignal_app_id: required("ONESIGNAL_APP_ID")?,
            onesignal_app_key: required("ONESIGNAL_APP_KEY")?,
            telegram_bot_token: required("TELEGRAM_BOT_TOKEN")?,
            telegram_admin_chat,
            targets,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnv(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployments_have_unique_markets() {
        for (i, a) in DEPLOYMENTS.iter().enumerate() {
            for b in &DEPLOYMENTS[i + 1..] {
                assert_ne!(a.market, b.market, "duplicate deployment for {}", a.market);
            }
        }
    }

    #[test]
    fn deployments_have_real_pool_addresses() {
        for deployment in DEPLOYMENTS {
            assert_ne!(
                deployment.pool,
                Address::ZERO,
                "zero pool for {}",
                deployment.market
            );
        }
    }

    #[test]
    fn v2_exists_only_on_pre_migration_chains() {
        let v2_chains: Vec<Chain> = DEPLOYMENTS
            .iter()
            .filter(|d| d.market.version == ProtocolVersion::V2)
            .map(|d| d.market.chain)
            .collect();
        assert_eq!(
            v2_chains,
            vec![Chain::Ethereum, Chain::Polygon, Chain::Avalanche]
        );
    }
}
