//! The pool state machine.
//!
//! A [`Pool`] owns both reserves, the share supply and the three ledgers it
//! settles against. Every operation follows the same order: compute amounts
//! from a snapshot, run every guard, settle the transfers, and only then commit
//! the new reserves. A failed transfer unwinds the legs that already went
//! through and the staged reserves are dropped.

use anyhow::anyhow;
use log::{debug, error, info, warn};

use crate::amm_logic;
use crate::config::PoolConfig;
use crate::error::{PoolError, PoolResult, UnresolvedLeg};
use crate::ledger::{NativeCurrency, ShareLedger, TokenLedger};
use crate::types::{
    Address, Asset, LiquidityReceipt, PoolSnapshot, PoolState, SwapQuote, SwapReceipt,
};

/// One movement of value between the pool and a counterparty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leg {
    TokenIn { from: Address, amount: u128 },
    NativeIn { from: Address, amount: u128 },
    TokenOut { to: Address, amount: u128 },
    NativeOut { to: Address, amount: u128 },
    Mint { to: Address, amount: u128 },
    Burn { from: Address, amount: u128 },
}

impl Leg {
    fn pay_in(asset: Asset, from: Address, amount: u128) -> Self {
        match asset {
            Asset::Token => Leg::TokenIn { from, amount },
            Asset::Native => Leg::NativeIn { from, amount },
        }
    }

    fn pay_out(asset: Asset, to: Address, amount: u128) -> Self {
        match asset {
            Asset::Token => Leg::TokenOut { to, amount },
            Asset::Native => Leg::NativeOut { to, amount },
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Leg::TokenIn { .. } => "token deposit",
            Leg::NativeIn { .. } => "native deposit",
            Leg::TokenOut { .. } => "token payout",
            Leg::NativeOut { .. } => "native payout",
            Leg::Mint { .. } => "share mint",
            Leg::Burn { .. } => "share burn",
        }
    }

    fn counterparty(&self) -> Address {
        match *self {
            Leg::TokenIn { from, .. } | Leg::NativeIn { from, .. } | Leg::Burn { from, .. } => from,
            Leg::TokenOut { to, .. } | Leg::NativeOut { to, .. } | Leg::Mint { to, .. } => to,
        }
    }

    fn amount(&self) -> u128 {
        match *self {
            Leg::TokenIn { amount, .. }
            | Leg::NativeIn { amount, .. }
            | Leg::TokenOut { amount, .. }
            | Leg::NativeOut { amount, .. }
            | Leg::Mint { amount, .. }
            | Leg::Burn { amount, .. } => amount,
        }
    }

    /// The movement that cancels this one.
    fn reversed(&self) -> Self {
        match *self {
            Leg::TokenIn { from, amount } => Leg::TokenOut { to: from, amount },
            Leg::NativeIn { from, amount } => Leg::NativeOut { to: from, amount },
            Leg::TokenOut { to, amount } => Leg::TokenIn { from: to, amount },
            Leg::NativeOut { to, amount } => Leg::NativeIn { from: to, amount },
            Leg::Mint { to, amount } => Leg::Burn { from: to, amount },
            Leg::Burn { from, amount } => Leg::Mint { to: from, amount },
        }
    }
}

/// A two-asset constant-product pool holding a token and the native currency.
#[derive(Debug)]
pub struct Pool<T, N, S> {
    config: PoolConfig,
    reserve_token: u128,
    reserve_native: u128,
    total_shares: u128,
    token: T,
    native: N,
    shares: S,
}

impl<T, N, S> Pool<T, N, S>
where
    T: TokenLedger,
    N: NativeCurrency,
    S: ShareLedger,
{
    /// Creates an empty pool. The share ledger must not have any shares
    /// outstanding.
    pub fn new(config: PoolConfig, token: T, native: N, shares: S) -> anyhow::Result<Self> {
        config.validate()?;
        if shares.total_supply() != 0 {
            return Err(anyhow!(
                "Share ledger already has {} shares outstanding",
                shares.total_supply()
            ));
        }

        info!(
            "created pool {} with fee {} bps",
            config.address, config.fee_bps
        );
        Ok(Self {
            config,
            reserve_token: 0,
            reserve_native: 0,
            total_shares: 0,
            token,
            native,
            shares,
        })
    }

    pub fn address(&self) -> Address {
        self.config.address
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot::new(self.reserve_token, self.reserve_native, self.total_shares)
    }

    pub fn state(&self) -> PoolState {
        self.snapshot().state()
    }

    pub fn reserve_of(&self, asset: Asset) -> u128 {
        self.snapshot().reserve_of(asset)
    }

    /// The pool's token reserve.
    pub fn token_reserve(&self) -> u128 {
        self.reserve_token
    }

    pub fn shares_of(&self, provider: &Address) -> u128 {
        self.shares.balance_of(provider)
    }

    pub fn token_ledger(&self) -> &T {
        &self.token
    }

    /// Direct ledger access for test harnesses. Changes made here bypass the
    /// pool's bookkeeping.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn token_ledger_mut(&mut self) -> &mut T {
        &mut self.token
    }

    pub fn native_ledger(&self) -> &N {
        &self.native
    }

    /// Direct ledger access for test harnesses. Changes made here bypass the
    /// pool's bookkeeping.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn native_ledger_mut(&mut self) -> &mut N {
        &mut self.native
    }

    pub fn share_ledger(&self) -> &S {
        &self.shares
    }

    /// Direct ledger access for test harnesses. Changes made here bypass the
    /// pool's bookkeeping.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn share_ledger_mut(&mut self) -> &mut S {
        &mut self.shares
    }

    /// Quote selling `input_amount` of `input_asset` against current reserves.
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

    /// Tokens received for selling `native_sold`.
    pub fn get_token_amount(&self, native_sold: u128) -> PoolResult<u128> {
        Ok(self.quote(Asset::Native, native_sold)?.output_amount)
    }

    /// Native currency received for selling `token_sold`.
    pub fn get_native_amount(&self, token_sold: u128) -> PoolResult<u128> {
        Ok(self.quote(Asset::Token, token_sold)?.output_amount)
    }

    /// Mid price of the other asset in units of `input_asset`, scaled by
    /// [`crate::types::PRICE_PRECISION`].
    pub fn price(&self, input_asset: Asset) -> PoolResult<u128> {
        let (reserve_in, reserve_out) = self.snapshot().reserves_for(input_asset);
        amm_logic::price(reserve_in, reserve_out)
    }

    /// Deposit liquidity.
    ///
    /// The first deposit sets both reserves and mints one share per unit of
    /// native currency. Later deposits take exactly the token amount matching
    /// `native_amount` at the current ratio; `token_amount` is the most the
    /// provider is willing to put in.
    pub fn add_liquidity(
        &mut self,
        provider: &Address,
        token_amount: u128,
        native_amount: u128,
    ) -> PoolResult<LiquidityReceipt> {
        self.check_share_supply()?;
        let before = self.snapshot();

        let (token_in, minted) = match before.state() {
            PoolState::Uninitialized => {
                if token_amount == 0 || native_amount == 0 {
                    warn!("rejected first deposit of {token_amount} token / {native_amount} native");
                    return Err(PoolError::InvalidAmount);
                }
                let minted = amm_logic::proportional_shares(
                    token_amount,
                    native_amount,
                    before.reserve_token,
                    before.reserve_native,
                    before.total_shares,
                )?;
                (token_amount, minted)
            }
            PoolState::Active => {
                if native_amount == 0 {
                    return Err(PoolError::InvalidAmount);
                }
                let required = amm_logic::required_token_deposit(
                    native_amount,
                    before.reserve_token,
                    before.reserve_native,
                )?;
                if token_amount < required {
                    warn!(
                        "rejected deposit from {provider}: {required} token required, {token_amount} supplied"
                    );
                    return Err(PoolError::RatioMismatch {
                        required,
                        supplied: token_amount,
                    });
                }
                let minted = amm_logic::proportional_shares(
                    required,
                    native_amount,
                    before.reserve_token,
                    before.reserve_native,
                    before.total_shares,
                )?;
                if minted == 0 {
                    return Err(PoolError::InvalidAmount);
                }
                (required, minted)
            }
        };

        let reserve_token = checked_add(before.reserve_token, token_in)?;
        let reserve_native = checked_add(before.reserve_native, native_amount)?;
        let total_shares = checked_add(before.total_shares, minted)?;

        // The allowance-bound pull goes first so its failure has nothing to unwind.
        self.settle(&[
            Leg::TokenIn {
                from: *provider,
                amount: token_in,
            },
            Leg::NativeIn {
                from: *provider,
                amount: native_amount,
            },
            Leg::Mint {
                to: *provider,
                amount: minted,
            },
        ])?;

        self.reserve_token = reserve_token;
        self.reserve_native = reserve_native;
        self.total_shares = total_shares;

        info!(
            "{provider} added {token_in} token / {native_amount} native for {minted} shares"
        );
        Ok(LiquidityReceipt {
            provider: *provider,
            token_amount: token_in,
            native_amount,
            shares: minted,
        })
    }

    /// Burn `shares` and pay out the matching slice of both reserves.
    pub fn remove_liquidity(
        &mut self,
        provider: &Address,
        shares: u128,
    ) -> PoolResult<LiquidityReceipt> {
        self.check_share_supply()?;
        let before = self.snapshot();
        if before.state() == PoolState::Uninitialized {
            return Err(PoolError::PoolUninitialized);
        }
        if shares == 0 {
            return Err(PoolError::InvalidAmount);
        }

        let available = self.shares.balance_of(provider);
        if available < shares {
            warn!("{provider} tried to burn {shares} shares holding {available}");
            return Err(PoolError::InsufficientShares {
                requested: shares,
                available,
            });
        }

        let (token_out, native_out) = amm_logic::withdrawal_amounts(
            shares,
            before.reserve_token,
            before.reserve_native,
            before.total_shares,
        )?;

        // Token payout goes last: it is the one leg that is never unwound.
        self.settle(&[
            Leg::Burn {
                from: *provider,
                amount: shares,
            },
            Leg::NativeOut {
                to: *provider,
                amount: native_out,
            },
            Leg::TokenOut {
                to: *provider,
                amount: token_out,
            },
        ])?;

        self.reserve_token = before.reserve_token - token_out;
        self.reserve_native = before.reserve_native - native_out;
        self.total_shares = before.total_shares - shares;

        info!("{provider} burned {shares} shares for {token_out} token / {native_out} native");
        if self.total_shares == 0 {
            info!("pool {} drained, back to uninitialized", self.config.address);
        }
        Ok(LiquidityReceipt {
            provider: *provider,
            token_amount: token_out,
            native_amount: native_out,
            shares,
        })
    }

    /// Sell exactly `input_amount` of `input_asset` for at least `min_output`
    /// of the other asset.
    pub fn swap_exact_input(
        &mut self,
        trader: &Address,
        input_asset: Asset,
        input_amount: u128,
        min_output: u128,
    ) -> PoolResult<SwapReceipt> {
        let before = self.snapshot();
        if before.state() == PoolState::Uninitialized {
            return Err(PoolError::PoolUninitialized);
        }

        let output_asset = input_asset.other();
        let (reserve_in, reserve_out) = before.reserves_for(input_asset);
        let output = amm_logic::quote_output_with_fee(
            input_amount,
            reserve_in,
            reserve_out,
            self.config.fee_bps,
        )?;

        if output < min_output {
            warn!(
                "rejected {input_asset} swap from {trader}: output {output} below minimum {min_output}"
            );
            return Err(PoolError::InsufficientOutputAmount {
                output,
                minimum: min_output,
            });
        }

        let receipt = SwapReceipt {
            trader: *trader,
            input_asset,
            input_amount,
            output_amount: output,
        };
        if input_amount == 0 {
            debug!("zero {input_asset} swap from {trader}, nothing to settle");
            return Ok(receipt);
        }

        let new_reserve_in = checked_add(reserve_in, input_amount)?;
        let new_reserve_out = reserve_out - output;

        self.settle(&[
            Leg::pay_in(input_asset, *trader, input_amount),
            Leg::pay_out(output_asset, *trader, output),
        ])?;

        self.set_reserve(input_asset, new_reserve_in);
        self.set_reserve(output_asset, new_reserve_out);
        debug_assert!(self.snapshot().invariant() >= before.invariant());

        info!("{trader} swapped {input_amount} {input_asset} for {output} {output_asset}");
        Ok(receipt)
    }

    /// Sell native currency for tokens.
    pub fn native_to_token_swap(
        &mut self,
        trader: &Address,
        native_in: u128,
        min_tokens: u128,
    ) -> PoolResult<SwapReceipt> {
        self.swap_exact_input(trader, Asset::Native, native_in, min_tokens)
    }

    /// Sell tokens for native currency.
    pub fn token_to_native_swap(
        &mut self,
        trader: &Address,
        tokens_in: u128,
        min_native: u128,
    ) -> PoolResult<SwapReceipt> {
        self.swap_exact_input(trader, Asset::Token, tokens_in, min_native)
    }

    /// Check the tracked reserves and share supply against what the ledgers
    /// report.
    pub fn verify_reserves(&self) -> PoolResult<()> {
        self.check_share_supply()?;

        let pool = self.config.address;
        let observed = [
            (Asset::Token, self.token.balance_of(&pool)),
            (Asset::Native, self.native.balance_of(&pool)),
        ];

        for (asset, observed) in observed {
            let tracked = self.reserve_of(asset);
            if tracked != observed {
                error!("{asset} reserve drift on {pool}: tracked {tracked}, ledger {observed}");
                return Err(PoolError::ReserveMismatch {
                    asset,
                    tracked,
                    observed,
                });
            }
        }
        Ok(())
    }

    /// Shares are only minted and burned by the pool, so the ledger's supply
    /// must equal the tracked total before any deposit or withdrawal.
    fn check_share_supply(&self) -> PoolResult<()> {
        let observed = self.shares.total_supply();
        if observed != self.total_shares {
            error!(
                "share supply drift on {}: tracked {}, ledger {observed}",
                self.config.address, self.total_shares
            );
            return Err(PoolError::ShareSupplyMismatch {
                tracked: self.total_shares,
                observed,
            });
        }
        Ok(())
    }

    fn set_reserve(&mut self, asset: Asset, amount: u128) {
        match asset {
            Asset::Token => self.reserve_token = amount,
            Asset::Native => self.reserve_native = amount,
        }
    }

    /// Run `legs` in order. If one fails, the legs before it are reversed
    /// newest first. The error is `UnwindFailed` when any reversal fails too.
    fn settle(&mut self, legs: &[Leg]) -> PoolResult<()> {
        for (index, leg) in legs.iter().enumerate() {
            if leg.amount() == 0 {
                continue;
            }
            if let Err(err) = self.execute(leg) {
                warn!("{} of {} failed: {err:#}", leg.name(), leg.amount());
                let unresolved = self.unwind(&legs[..index]);
                if unresolved.is_empty() {
                    return Err(PoolError::transfer(leg.name(), err));
                }
                return Err(PoolError::UnwindFailed {
                    leg: leg.name(),
                    reason: format!("{err:#}"),
                    unresolved,
                });
            }
        }
        Ok(())
    }

    /// Reverse `executed` newest first, returning the legs that stayed put.
    fn unwind(&mut self, executed: &[Leg]) -> Vec<UnresolvedLeg> {
        let mut unresolved = Vec::new();
        for leg in executed.iter().rev().filter(|leg| leg.amount() > 0) {
            let reversal = leg.reversed();
            if let Err(err) = self.execute(&reversal) {
                error!(
                    "could not unwind {} of {} for {}: {err:#}",
                    leg.name(),
                    leg.amount(),
                    leg.counterparty()
                );
                unresolved.push(UnresolvedLeg {
                    leg: leg.name(),
                    counterparty: leg.counterparty(),
                    amount: leg.amount(),
                    reason: format!("{err:#}"),
                });
            }
        }
        unresolved
    }

    fn execute(&mut self, leg: &Leg) -> anyhow::Result<()> {
        let pool = self.config.address;
        match *leg {
            Leg::TokenIn { from, amount } => self.token.transfer_from(&from, &pool, amount),
            Leg::NativeIn { from, amount } => self.native.receive(&from, &pool, amount),
            Leg::TokenOut { to, amount } => self.token.transfer(&pool, &to, amount),
            Leg::NativeOut { to, amount } => self.native.pay(&pool, &to, amount),
            Leg::Mint { to, amount } => self.shares.mint(&to, amount),
            Leg::Burn { from, amount } => self.shares.burn(&from, amount),
        }
    }
}

fn checked_add(reserve: u128, amount: u128) -> PoolResult<u128> {
    reserve.checked_add(amount).ok_or(PoolError::Overflow)
}
