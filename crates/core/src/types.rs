//! Domain types shared by the monitor loops.

use std::fmt;

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

/// Supported networks. The serde encoding is the canonical storage key
/// (`ETHEREUM_SEPOLIA` etc.); `Display` is the user-facing name embedded in
/// notification messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Chain {
    Ethereum,
    EthereumSepolia,
    Polygon,
    PolygonMumbai,
    Optimism,
    Arbitrum,
    Avalanche,
    Metis,
    Base,
}

impl Chain {
    pub const ALL: [Chain; 9] = [
        Chain::Ethereum,
        Chain::EthereumSepolia,
        Chain::Polygon,
        Chain::PolygonMumbai,
        Chain::Optimism,
        Chain::Arbitrum,
        Chain::Avalanche,
        Chain::Metis,
        Chain::Base,
    ];

    /// Canonical storage key, matching the serde encoding.
    pub fn key(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ETHEREUM",
            Chain::EthereumSepolia => "ETHEREUM_SEPOLIA",
            Chain::Polygon => "POLYGON",
            Chain::PolygonMumbai => "POLYGON_MUMBAI",
            Chain::Optimism => "OPTIMISM",
            Chain::Arbitrum => "ARBITRUM",
            Chain::Avalanche => "AVALANCHE",
            Chain::Metis => "METIS",
            Chain::Base => "BASE",
        }
    }

    /// Name shown to users in notifications.
    pub fn display_name(&self) -> &'static str {
        match self {
            Chain::Ethereum => "Ethereum",
            Chain::EthereumSepolia => "Sepolia",
            Chain::Polygon => "Polygon",
            Chain::PolygonMumbai => "Mumbai",
            Chain::Optimism => "Optimism",
            Chain::Arbitrum => "Arbitrum",
            Chain::Avalanche => "Avalanche",
            Chain::Metis => "Metis",
            Chain::Base => "Base",
        }
    }

    /// Environment variable holding this chain's HTTP RPC endpoint.
    pub fn rpc_env_var(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ETHEREUM_RPC_URL",
            Chain::EthereumSepolia => "ETHEREUM_SEPOLIA_RPC_URL",
            Chain::Polygon => "POLYGON_RPC_URL",
            Chain::PolygonMumbai => "POLYGON_MUMBAI_RPC_URL",
            Chain::Optimism => "OPTIMISM_RPC_URL",
            Chain::Arbitrum => "ARBITRUM_RPC_URL",
            Chain::Avalanche => "AVALANCHE_RPC_URL",
            Chain::Metis => "METIS_RPC_URL",
            Chain::Base => "BASE_RPC_URL",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Incompatible revisions of the lending pool interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProtocolVersion {
    V2,
    V3,
}

impl ProtocolVersion {
    pub fn as_u8(&self) -> u8 {
        match self {
            ProtocolVersion::V2 => 2,
            ProtocolVersion::V3 => 3,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            2 => Some(ProtocolVersion::V2),
            3 => Some(ProtocolVersion::V3),
            _ => None,
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.as_u8())
    }
}

/// A (chain, protocol version) pair. Each monitor task owns exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Market {
    pub chain: Chain,
    pub version: ProtocolVersion,
}

impl Market {
    pub fn new(chain: Chain, version: ProtocolVersion) -> Self {
        Self { chain, version }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x Aave {}", self.chain, self.version)
    }
}

/// Lookup key for a lending position: address + chain + protocol version.
///
/// `Address` compares at the byte level, so equality is case-insensitive by
/// construction; `Display` renders checksum-cased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainAccount {
    pub address: alloy::primitives::Address,
    pub chain: Chain,
    pub version: ProtocolVersion,
}

impl ChainAccount {
    pub fn new(address: alloy::primitives::Address, market: Market) -> Self {
        Self {
            address,
            chain: market.chain,
            version: market.version,
        }
    }

    pub fn market(&self) -> Market {
        Market::new(self.chain, self.version)
    }
}

impl fmt::Display for ChainAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.address, self.market())
    }
}

/// One subscription row: an account, the subscribing user's alert threshold
/// and an optional push destination.
#[derive(Debug, Clone)]
pub struct TrackedAccount {
    pub account: ChainAccount,
    pub threshold: f64,
    pub subscriber: Option<String>,
}

/// Sentinel for "no debt": the on-chain value is `MAX_UINT256`, which maps
/// below every positive threshold check by being negative.
pub const NO_DEBT: f64 = -1.0;

/// Fold the full 256-bit magnitude into an `f64`. Exact for values that fit
/// the mantissa; larger values round, they never clamp.
fn u256_to_f64(value: U256) -> f64 {
    value
        .as_limbs()
        .iter()
        .rev()
        .fold(0.0, |acc, &limb| acc * 2f64.powi(64) + limb as f64)
}

/// Map a raw on-chain health factor to a ratio.
///
/// `MAX_UINT256` means the account has no debt and becomes [`NO_DEBT`];
/// anything else is the raw integer scaled by 10^-18.
pub fn scale_health_factor(raw: U256) -> f64 {
    if raw == U256::MAX {
        return NO_DEBT;
    }
    u256_to_f64(raw) / 1e18
}

/// Scale a raw token amount by the token's decimal count.
pub fn scale_token_amount(raw: U256, decimals: u8) -> f64 {
    u256_to_f64(raw) / 10f64.powi(decimals as i32)
}

/// An account plus its computed health factor.
#[derive(Debug, Clone, Copy)]
pub struct HealthFactorReading {
    pub account: ChainAccount,
    pub value: f64,
}

impl HealthFactorReading {
    pub fn is_no_debt(&self) -> bool {
        self.value == NO_DEBT
    }

    /// Whether this reading should trigger an alert: strictly below the
    /// threshold, and never for debt-free accounts.
    pub fn breaches(&self, threshold: f64) -> bool {
        !self.is_no_debt() && self.value < threshold
    }
}

/// A decoded liquidation attributed to its market. Produced per tick, never
/// persisted.
#[derive(Debug, Clone)]
pub struct LiquidationEvent {
    pub account: ChainAccount,
    pub collateral_token: alloy::primitives::Address,
    pub debt_token: alloy::primitives::Address,
    pub collateral_seized: U256,
    pub debt_covered: U256,
    pub block_number: u64,
}

impl LiquidationEvent {
    pub fn from_raw(raw: lendwatch_chain::RawLiquidation, market: Market) -> Self {
        Self {
            account: ChainAccount::new(raw.user, market),
            collateral_token: raw.collateral_token,
            debt_token: raw.debt_token,
            collateral_seized: raw.collateral_seized,
            debt_covered: raw.debt_covered,
            block_number: raw.block_number,
        }
    }
}
