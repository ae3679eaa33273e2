//! Shared handle to a pool.
//!
//! Every state-changing call holds the pool lock for its whole duration, so
//! swaps, deposits and withdrawals are applied one at a time against a
//! consistent reserve state. Quotes are taken from a snapshot and computed
//! outside the lock.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::warn;

use crate::amm_logic;
use crate::config::PoolConfig;
use crate::error::PoolResult;
use crate::ledger::{NativeCurrency, ShareLedger, TokenLedger};
use crate::pool::Pool;
use crate::types::{
    Address, Asset, LiquidityReceipt, PoolSnapshot, PoolState, SwapQuote, SwapReceipt,
};

pub struct Exchange<T, N, S> {
    pool: Arc<Mutex<Pool<T, N, S>>>,
    /// Copy of the pool's config; it never changes after construction.
    config: PoolConfig,
}

impl<T, N, S> Clone for Exchange<T, N, S> {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
            config: self.config.clone(),
        }
    }
}

impl<T, N, S> Exchange<T, N, S>
where
    T: TokenLedger,
    N: NativeCurrency,
    S: ShareLedger,
{
    pub fn new(pool: Pool<T, N, S>) -> Self {
        let config = pool.config().clone();
        Self {
            pool: Arc::new(Mutex::new(pool)),
            config,
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Lock the pool. Pool operations commit only after settlement succeeds,
    /// so a poisoned lock still guards a consistent pool.
    pub fn lock(&self) -> MutexGuard<'_, Pool<T, N, S>> {
        self.pool.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            warn!("pool lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        self.lock().snapshot()
    }

    pub fn state(&self) -> PoolState {
        self.snapshot().state()
    }

    pub fn shares_of(&self, provider: &Address) -> u128 {
        self.lock().shares_of(provider)
    }

    /// Quote against the current reserves without holding the lock while
    /// computing.
    pub fn quote(&self, input_asset: Asset, input_amount: u128) -> PoolResult<SwapQuote> {
        let (reserve_in, reserve_out) = self.snapshot().reserves_for(input_asset);
        let output = amm_logic::quote_output_with_fee(
            input_amount,
            reserve_in,
            reserve_out,
            self.config.fee_bps,
        )?;
        let impact = amm_logic::price_impact(input_amount, reserve_in, output, reserve_out);
        Ok(SwapQuote::new(input_asset, input_amount, output).with_price_impact(impact))
    }

    pub fn add_liquidity(
        &self,
        provider: &Address,
        token_amount: u128,
        native_amount: u128,
    ) -> PoolResult<LiquidityReceipt> {
        self.lock().add_liquidity(provider, token_amount, native_amount)
    }

    pub fn remove_liquidity(&self, provider: &Address, shares: u128) -> PoolResult<LiquidityReceipt> {
        self.lock().remove_liquidity(provider, shares)
    }

    pub fn swap_exact_input(
        &self,
        trader: &Address,
        input_asset: Asset,
        input_amount: u128,
        min_output: u128,
    ) -> PoolResult<SwapReceipt> {
        self.lock()
            .swap_exact_input(trader, input_asset, input_amount, min_output)
    }

    pub fn native_to_token_swap(
        &self,
        trader: &Address,
        native_in: u128,
        min_tokens: u128,
    ) -> PoolResult<SwapReceipt> {
        self.lock().native_to_token_swap(trader, native_in, min_tokens)
    }

    pub fn token_to_native_swap(
        &self,
        trader: &Address,
        tokens_in: u128,
        min_native: u128,
    ) -> PoolResult<SwapReceipt> {
        self.lock().token_to_native_swap(trader, tokens_in, min_native)
    }

    pub fn verify_reserves(&self) -> PoolResult<()> {
        self.lock().verify_reserves()
    }
}
