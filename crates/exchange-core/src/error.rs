use thiserror::Error;

use crate::types::{Address, Asset};

pub type PoolResult<T> = std::result::Result<T, PoolError>;

/// Every way a pool operation can be rejected. A rejected operation leaves the
/// pool exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("invalid amount")]
    InvalidAmount,

    #[error("insufficient token amount: {required} required, {supplied} supplied")]
    RatioMismatch { required: u128, supplied: u128 },

    #[error("insufficient shares: {requested} requested, {available} available")]
    InsufficientShares { requested: u128, available: u128 },

    #[error("insufficient output amount: {output} < {minimum}")]
    InsufficientOutputAmount { output: u128, minimum: u128 },

    #[error("pool has no liquidity")]
    PoolUninitialized,

    #[error("insufficient liquidity for requested output")]
    InsufficientLiquidity,

    #[error("{leg} transfer failed: {reason}")]
    TransferFailed { leg: &'static str, reason: String },

    /// A transfer failed and at least one of the movements before it could
    /// not be reversed. The value listed in `unresolved` is still held on the
    /// other side of the ledger.
    #[error("{leg} transfer failed: {reason}; {} earlier movement(s) left unresolved", .unresolved.len())]
    UnwindFailed {
        leg: &'static str,
        reason: String,
        unresolved: Vec<UnresolvedLeg>,
    },

    #[error("fee of {0} bps is not below 100%")]
    InvalidFee(u128),

    #[error("arithmetic overflow")]
    Overflow,

    #[error("{asset} reserve drift: tracked {tracked}, ledger reports {observed}")]
    ReserveMismatch {
        asset: Asset,
        tracked: u128,
        observed: u128,
    },

    #[error("share supply drift: tracked {tracked}, ledger reports {observed}")]
    ShareSupplyMismatch { tracked: u128, observed: u128 },
}

/// A movement that went through but could not be reversed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedLeg {
    /// What the movement was, e.g. "token deposit".
    pub leg: &'static str,
    pub counterparty: Address,
    pub amount: u128,
    pub reason: String,
}

impl PoolError {
    pub(crate) fn transfer(leg: &'static str, err: anyhow::Error) -> Self {
        PoolError::TransferFailed {
            leg,
            reason: format!("{err:#}"),
        }
    }
}
