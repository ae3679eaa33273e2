//! Mathematical Tests for the exchange pool
//!
//! These tests verify the constant-product invariant, rounding direction,
//! the inverse quote, fee behaviour and price impact growth.

mod common;
use common::*;

use exchange_core::amm_logic::{quote_input, quote_output, quote_output_with_fee};
use exchange_core::{Asset, PoolConfig, SwapQuote};

#[test]
fn test_invariant_never_decreases_across_swaps() -> anyhow::Result<()> {
    println!("Testing invariant preservation across swaps...");

    let mut pool = setup_seeded_pool();
    give_tokens(&mut pool, &user(), to_wei(5000));
    let mut k = pool.snapshot().invariant();

    let trades = [
        (Asset::Native, WEI),
        (Asset::Token, to_wei(37)),
        (Asset::Native, to_wei(250)),
        (Asset::Token, 3),
        (Asset::Native, 7),
        (Asset::Token, to_wei(1200)),
    ];
    for (asset, amount) in trades {
        pool.swap_exact_input(&user(), asset, amount, 0)?;
        let next = pool.snapshot().invariant();
        assert!(next >= k, "k decreased after selling {} {}", amount, asset);
        k = next;
    }

    pool.verify_reserves()?;
    println!("✅ Invariant preservation test passed");
    Ok(())
}

#[test]
fn test_fee_strictly_increases_invariant() -> anyhow::Result<()> {
    let mut pool = setup_pool_with_config(PoolConfig::new(pool_address()).with_fee_bps(30));
    pool.add_liquidity(&owner(), to_wei(2000), to_wei(1000))?;
    let k = pool.snapshot().invariant();

    let receipt = pool.native_to_token_swap(&user(), to_wei(10), 0)?;

    let fee_less = quote_output(to_wei(10), to_wei(1000), to_wei(2000))?;
    assert!(receipt.output_amount < fee_less);
    assert_eq!(
        receipt.output_amount,
        quote_output_with_fee(to_wei(10), to_wei(1000), to_wei(2000), 30)?
    );
    assert!(pool.snapshot().invariant() > k);
    Ok(())
}

#[test]
fn test_quote_input_is_the_smallest_sufficient_input() -> anyhow::Result<()> {
    let (reserve_in, reserve_out) = (to_wei(1000), to_wei(2000));

    for wanted in [1, 999, WEI, to_wei(500), to_wei(1999)] {
        let input = quote_input(wanted, reserve_in, reserve_out)?;
        assert!(
            quote_output(input, reserve_in, reserve_out)? >= wanted,
            "{} in must buy {} out",
            input,
            wanted
        );
        assert!(
            quote_output(input - 1, reserve_in, reserve_out)? < wanted,
            "{} in should already be enough for {} out",
            input - 1,
            wanted
        );
    }
    Ok(())
}

#[test]
fn test_round_trip_swap_loses_at_most_rounding() -> anyhow::Result<()> {
    let mut pool = setup_seeded_pool();
    let pool_address = pool.address();

    let bought = pool.native_to_token_swap(&user(), WEI, 0)?.output_amount;
    pool.token_ledger_mut()
        .inner
        .approve(&user(), &pool_address, bought);
    let returned = pool.token_to_native_swap(&user(), bought, 0)?.output_amount;

    assert!(returned <= WEI, "Round trip must not create value");
    assert!(WEI - returned <= 1, "Lost {} to rounding", WEI - returned);
    assert_eq!(native_balance(&pool, &user()), STARTING_NATIVE - (WEI - returned));
    assert_eq!(token_balance(&pool, &user()), 0);
    Ok(())
}

#[test]
fn test_output_is_always_below_reserve() -> anyhow::Result<()> {
    let pool = setup_seeded_pool();
    let snapshot = pool.snapshot();

    for amount in [1, WEI, to_wei(1_000_000), u128::MAX / 2, u128::MAX] {
        let out = pool.get_token_amount(amount)?;
        assert!(out < snapshot.reserve_token, "{} native drained the pool", amount);
    }
    Ok(())
}

#[test]
fn test_price_impact_grows_with_trade_size() -> anyhow::Result<()> {
    let pool = setup_seeded_pool();

    let impacts = [WEI, to_wei(10), to_wei(100), to_wei(1000)]
        .into_iter()
        .map(|amount| pool.quote(Asset::Native, amount).map(|quote| quote.price_impact))
        .collect::<Result<Vec<_>, _>>()?;

    assert!(impacts.windows(2).all(|pair| pair[0] < pair[1]), "{:?}", impacts);
    // Selling as much native as the pool holds gets half the mid-price output
    assert_eq!(impacts[3], 5000);
    Ok(())
}

#[test]
fn test_minimum_output_from_slippage_tolerance() {
    let quote = SwapQuote::new(Asset::Native, WEI, 10_000);

    assert_eq!(quote.minimum_output(0), 10_000);
    assert_eq!(quote.minimum_output(50), 9_950);
    assert_eq!(quote.minimum_output(20_000), 0);
}
