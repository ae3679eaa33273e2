use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::types::{Address, BASIS_POINTS, DEFAULT_FEE_BPS};

/// Construction-time parameters of a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Ledger identity the pool holds its reserves under.
    pub address: Address,
    /// Trading fee taken from the input amount, in basis points.
    pub fee_bps: u128,
}

impl PoolConfig {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            fee_bps: DEFAULT_FEE_BPS,
        }
    }

    pub fn with_fee_bps(mut self, fee_bps: u128) -> Self {
        self.fee_bps = fee_bps;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.address.is_zero() {
            return Err(anyhow!("Pool address cannot be zero"));
        }

        if self.fee_bps >= BASIS_POINTS {
            return Err(anyhow!(
                "Fee must be below 100%, got {} bps",
                self.fee_bps
            ));
        }

        Ok(())
    }
}
