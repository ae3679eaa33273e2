use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use ruint::Uint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type U256 = Uint<256, 4>;

/// Identity of a liquidity provider, trader, or the pool itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits)?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| anyhow!("Address must be 20 bytes, got {}", v.len()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The two reserve slots of a pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    Token,
    Native,
}

impl Asset {
    pub fn other(self) -> Self {
        match self {
            Asset::Token => Asset::Native,
            Asset::Native => Asset::Token,
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Token => f.write_str("token"),
            Asset::Native => f.write_str("native"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolState {
    Uninitialized,
    Active,
}

/// Point-in-time copy of the pool's reserves and share supply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub reserve_token: u128,
    pub reserve_native: u128,
    pub total_shares: u128,
}

impl PoolSnapshot {
    pub fn new(reserve_token: u128, reserve_native: u128, total_shares: u128) -> Self {
        Self {
            reserve_token,
            reserve_native,
            total_shares,
        }
    }

    pub fn reserve_of(&self, asset: Asset) -> u128 {
        match asset {
            Asset::Token => self.reserve_token,
            Asset::Native => self.reserve_native,
        }
    }

    /// `(input_reserve, output_reserve)` for a trade paying in `input`.
    pub fn reserves_for(&self, input: Asset) -> (u128, u128) {
        (self.reserve_of(input), self.reserve_of(input.other()))
    }

    pub fn state(&self) -> PoolState {
        if self.total_shares == 0 {
            PoolState::Uninitialized
        } else {
            PoolState::Active
        }
    }

    /// The constant product `k`.
    pub fn invariant(&self) -> U256 {
        U256::from(self.reserve_token) * U256::from(self.reserve_native)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQuote {
    pub input_asset: Asset,
    pub input_amount: u128,
    pub output_amount: u128,
    pub price_impact: u128, // in basis points (10000 = 100%)
}

impl SwapQuote {
    pub fn new(input_asset: Asset, input_amount: u128, output_amount: u128) -> Self {
        Self {
            input_asset,
            input_amount,
            output_amount,
            price_impact: 0,
        }
    }

    pub fn with_price_impact(mut self, price_impact: u128) -> Self {
        self.price_impact = price_impact;
        self
    }

    pub fn output_asset(&self) -> Asset {
        self.input_asset.other()
    }

    /// Minimum output accepting at most `max_slippage_bps` below this quote.
    pub fn minimum_output(&self, max_slippage_bps: u128) -> u128 {
        let kept = BASIS_POINTS.saturating_sub(max_slippage_bps);
        let min = U256::from(self.output_amount) * U256::from(kept) / U256::from(BASIS_POINTS);
        min.try_into().unwrap_or(self.output_amount)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapReceipt {
    pub trader: Address,
    pub input_asset: Asset,
    pub input_amount: u128,
    pub output_amount: u128,
}

/// Amounts moved by a deposit or withdrawal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityReceipt {
    pub provider: Address,
    pub token_amount: u128,
    pub native_amount: u128,
    pub shares: u128,
}

pub const BASIS_POINTS: u128 = 10000; // 100% in basis points
pub const DEFAULT_FEE_BPS: u128 = 0;
pub const PRICE_PRECISION: u128 = 1000;
