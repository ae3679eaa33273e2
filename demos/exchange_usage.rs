//! Example usage of the exchange
//!
//! This example demonstrates how to:
//! 1. Deploy an exchange for a token
//! 2. Provide the first liquidity
//! 3. Quote and execute swaps in both directions
//! 4. Withdraw liquidity
//!
//! Run with `RUST_LOG=info cargo run --example exchange_usage` to see the
//! pool's own log lines.

use exchange::memory::{MemoryNative, MemoryToken};
use exchange::{deploy, Address, Asset, NativeCurrency, PoolConfig, TokenLedger};

const WEI: u128 = 1_000_000_000_000_000_000;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("Exchange Usage Example");
    println!("======================");

    let owner: Address = "0x00000000000000000000000000000000000000a1".parse()?;
    let trader: Address = "0x00000000000000000000000000000000000000b2".parse()?;
    let pool: Address = "0x00000000000000000000000000000000000000e0".parse()?;

    println!("\n1. Deploying Exchange");
    let mut token = MemoryToken::new("Token", "TKN", 1_000_000 * WEI, owner);
    token.approve(&owner, &pool, 2_000 * WEI);
    // The trader approves up front so tokens bought later can be sold back
    token.approve(&trader, &pool, u128::MAX);
    let native = MemoryNative::new()
        .with_balance(owner, 10_000 * WEI)
        .with_balance(trader, 10_000 * WEI);
    let exchange = deploy(PoolConfig::new(pool), token, native)?;
    println!("   ✓ Exchange deployed at {}", pool);

    println!("\n2. Adding Liquidity");
    let deposit = exchange.add_liquidity(&owner, 2_000 * WEI, 1_000 * WEI)?;
    println!(
        "   ✓ Deposited {} token / {} native for {} shares",
        deposit.token_amount, deposit.native_amount, deposit.shares
    );
    println!("   Price of 1 token: {} milli-native", exchange.lock().price(Asset::Native)?);

    println!("\n3. Swapping Native For Tokens");
    let quote = exchange.quote(Asset::Native, 10 * WEI)?;
    let max_slippage_bps = 50;
    println!(
        "   Quote: {} tokens, price impact {} bps",
        quote.output_amount, quote.price_impact
    );
    let receipt =
        exchange.native_to_token_swap(&trader, 10 * WEI, quote.minimum_output(max_slippage_bps))?;
    println!("   ✓ Received {} tokens", receipt.output_amount);

    println!("\n4. Swapping Tokens Back");
    match exchange.token_to_native_swap(&trader, receipt.output_amount, 10 * WEI) {
        Ok(_) => println!("   ✗ Round trip should not pay back the full input"),
        Err(e) => println!("   ✓ Rejected greedy minimum: {}", e),
    }
    let back = exchange.token_to_native_swap(&trader, receipt.output_amount, 0)?;
    println!("   ✓ Received {} native", back.output_amount);

    println!("\n5. Withdrawing Liquidity");
    let shares = exchange.shares_of(&owner);
    let withdrawal = exchange.remove_liquidity(&owner, shares)?;
    println!(
        "   ✓ Burned {} shares for {} token / {} native",
        withdrawal.shares, withdrawal.token_amount, withdrawal.native_amount
    );
    exchange.verify_reserves()?;

    let pool_state = exchange.lock();
    println!("\nFinal balances:");
    println!(
        "   owner:  {} token, {} native",
        pool_state.token_ledger().balance_of(&owner),
        pool_state.native_ledger().balance_of(&owner)
    );
    println!(
        "   trader: {} token, {} native",
        pool_state.token_ledger().balance_of(&trader),
        pool_state.native_ledger().balance_of(&trader)
    );
    println!("   pool:   {:?}", pool_state.state());

    Ok(())
}
