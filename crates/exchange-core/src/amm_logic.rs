//! # AMM Logic
//!
//! Pure constant-product arithmetic (x * y = k). Quotes, swaps and liquidity
//! accounting in [`crate::pool`] all go through these functions, so a quote
//! taken from a snapshot and the trade executed against the same reserves
//! always agree.
//!
//! Every division truncates toward zero, which rounds in the pool's favour:
//! outputs and payouts round down, required inputs round up.

use crate::error::{PoolError, PoolResult};
use crate::types::{BASIS_POINTS, PRICE_PRECISION, U256};

/// `floor(a * b / c)` with a 256-bit intermediate. `c` must be non-zero.
fn mul_div(a: u128, b: u128, c: u128) -> PoolResult<u128> {
    let result = U256::from(a) * U256::from(b) / U256::from(c);
    u128::try_from(result).map_err(|_| PoolError::Overflow)
}

fn narrow(value: U256) -> PoolResult<u128> {
    u128::try_from(value).map_err(|_| PoolError::Overflow)
}

/// Share of the input left after the fee, in basis points.
fn fee_multiplier(fee_bps: u128) -> PoolResult<u128> {
    if fee_bps >= BASIS_POINTS {
        return Err(PoolError::InvalidFee(fee_bps));
    }
    Ok(BASIS_POINTS - fee_bps)
}

/// Output amount for selling `input_amount` into the pool, without a fee.
///
/// `floor(input_amount * output_reserve / (input_reserve + input_amount))`
pub fn quote_output(
    input_amount: u128,
    input_reserve: u128,
    output_reserve: u128,
) -> PoolResult<u128> {
    quote_output_with_fee(input_amount, input_reserve, output_reserve, 0)
}

/// Output amount for selling `input_amount` into the pool.
///
/// # Arguments
/// * `input_amount` - The amount paid into the pool.
/// * `input_reserve` - The pool's reserve of the asset being paid in.
/// * `output_reserve` - The pool's reserve of the asset being paid out.
/// * `fee_bps` - Fee applied as a multiplier on the input, in basis points.
///
/// # Returns
/// The output amount, always strictly below `output_reserve`.
/// `InvalidFee` when `fee_bps` is not below [`BASIS_POINTS`].
pub fn quote_output_with_fee(
    input_amount: u128,
    input_reserve: u128,
    output_reserve: u128,
    fee_bps: u128,
) -> PoolResult<u128> {
    let kept_bps = fee_multiplier(fee_bps)?;
    if input_reserve == 0 || output_reserve == 0 {
        return Err(PoolError::PoolUninitialized);
    }
    if input_amount == 0 {
        return Ok(0);
    }

    let input = U256::from(input_amount);
    let reserve_in = U256::from(input_reserve);
    let reserve_out = U256::from(output_reserve);

    if fee_bps == 0 {
        // (2^128)^2 fits in 256 bits, so the fee-less path cannot overflow.
        return narrow(input * reserve_out / (reserve_in + input));
    }

    let input_with_fee = input
        .checked_mul(U256::from(kept_bps))
        .ok_or(PoolError::Overflow)?;
    let numerator = input_with_fee
        .checked_mul(reserve_out)
        .ok_or(PoolError::Overflow)?;
    let denominator = reserve_in * U256::from(BASIS_POINTS) + input_with_fee;

    narrow(numerator / denominator)
}

/// Input amount required to receive exactly `output_amount`, without a fee.
pub fn quote_input(
    output_amount: u128,
    input_reserve: u128,
    output_reserve: u128,
) -> PoolResult<u128> {
    quote_input_with_fee(output_amount, input_reserve, output_reserve, 0)
}

/// Inverse of [`quote_output_with_fee`], rounded up so that
/// `quote_output(quote_input(o)) >= o`.
pub fn quote_input_with_fee(
    output_amount: u128,
    input_reserve: u128,
    output_reserve: u128,
    fee_bps: u128,
) -> PoolResult<u128> {
    let kept_bps = fee_multiplier(fee_bps)?;
    if input_reserve == 0 || output_reserve == 0 {
        return Err(PoolError::PoolUninitialized);
    }
    if output_amount == 0 {
        return Ok(0);
    }
    if output_amount >= output_reserve {
        return Err(PoolError::InsufficientLiquidity);
    }

    let numerator = U256::from(output_amount)
        .checked_mul(U256::from(input_reserve))
        .and_then(|v| v.checked_mul(U256::from(BASIS_POINTS)))
        .ok_or(PoolError::Overflow)?;
    let denominator = U256::from(output_reserve - output_amount)
        .checked_mul(U256::from(kept_bps))
        .ok_or(PoolError::Overflow)?;

    let mut input = numerator / denominator;
    if !(numerator % denominator).is_zero() {
        input += U256::from(1u8);
    }
    narrow(input)
}

/// Shares minted for a deposit.
///
/// The first deposit mints one share per unit of native currency; after that
/// shares are minted in proportion to the native side of the pool.
pub fn proportional_shares(
    _deposit_token: u128,
    deposit_native: u128,
    _reserve_token: u128,
    reserve_native: u128,
    total_shares: u128,
) -> PoolResult<u128> {
    if total_shares == 0 {
        return Ok(deposit_native);
    }
    if reserve_native == 0 {
        return Err(PoolError::PoolUninitialized);
    }
    mul_div(deposit_native, total_shares, reserve_native)
}

/// Token amount that matches `deposit_native` at the current reserve ratio.
pub fn required_token_deposit(
    deposit_native: u128,
    reserve_token: u128,
    reserve_native: u128,
) -> PoolResult<u128> {
    if reserve_native == 0 {
        return Err(PoolError::PoolUninitialized);
    }
    mul_div(deposit_native, reserve_token, reserve_native)
}

/// `(token_out, native_out)` paid for burning `shares`.
pub fn withdrawal_amounts(
    shares: u128,
    reserve_token: u128,
    reserve_native: u128,
    total_shares: u128,
) -> PoolResult<(u128, u128)> {
    if total_shares == 0 {
        return Err(PoolError::PoolUninitialized);
    }
    if shares > total_shares {
        return Err(PoolError::InsufficientShares {
            requested: shares,
            available: total_shares,
        });
    }

    let token_out = mul_div(shares, reserve_token, total_shares)?;
    let native_out = mul_div(shares, reserve_native, total_shares)?;
    Ok((token_out, native_out))
}

/// Mid price of one unit of the output asset, in units of the input asset,
/// scaled by [`PRICE_PRECISION`].
pub fn price(input_reserve: u128, output_reserve: u128) -> PoolResult<u128> {
    if input_reserve == 0 || output_reserve == 0 {
        return Err(PoolError::PoolUninitialized);
    }
    mul_div(input_reserve, PRICE_PRECISION, output_reserve)
}

/// Calculates the price impact of a trade in basis points.
///
/// # Arguments
/// * `amount_in` - The amount of the input asset.
/// * `reserve_in` - The reserve of the input asset before the trade.
/// * `amount_out` - The amount of the output asset.
/// * `reserve_out` - The reserve of the output asset before the trade.
///
/// # Returns
/// The price impact in basis points (e.g., 100 for 1%).
pub fn price_impact(amount_in: u128, reserve_in: u128, amount_out: u128, reserve_out: u128) -> u128 {
    if reserve_in == 0 || reserve_out == 0 {
        return BASIS_POINTS;
    }

    // Output at the mid price, before slippage
    let ideal_out = U256::from(amount_in) * U256::from(reserve_out) / U256::from(reserve_in);
    if ideal_out.is_zero() {
        return 0;
    }

    let actual_out = U256::from(amount_out);
    let impact_diff = if ideal_out > actual_out {
        ideal_out - actual_out
    } else {
        U256::ZERO
    };

    let impact_bps = impact_diff * U256::from(BASIS_POINTS) / ideal_out;
    u128::try_from(impact_bps).unwrap_or(BASIS_POINTS)
}
