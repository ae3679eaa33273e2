//! Constant-product exchange between one fungible token and the native
//! currency.
//!
//! - [`amm_logic`]: pure quote and share arithmetic
//! - [`pool`]: the reserve state machine and transfer settlement
//! - [`exchange`]: a shared, serialized handle to a pool
//! - [`ledger`]: the collaborator traits the pool settles against
//! - [`memory`]: in-memory ledgers

pub mod amm_logic;
pub mod config;
pub mod error;
pub mod exchange;
pub mod ledger;
pub mod memory;
pub mod pool;
pub mod types;

pub use config::PoolConfig;
pub use error::{PoolError, PoolResult, UnresolvedLeg};
pub use exchange::Exchange;
pub use ledger::{NativeCurrency, ShareLedger, TokenLedger};
pub use pool::Pool;
pub use types::{
    Address, Asset, LiquidityReceipt, PoolSnapshot, PoolState, SwapQuote, SwapReceipt,
    BASIS_POINTS, DEFAULT_FEE_BPS, PRICE_PRECISION, U256,
};
