// Re-export the core exchange functionality
pub use exchange_core::*;

use anyhow::{Context, Result};
use log::info;

use exchange_core::memory::{MemoryNative, MemoryToken, ShareBook};

/// An exchange settling against the in-memory ledgers.
pub type MemoryExchange = Exchange<MemoryToken, MemoryNative, ShareBook>;

/// Stand up an empty exchange for `token`, with the native balances in
/// `native`.
pub fn deploy(config: PoolConfig, token: MemoryToken, native: MemoryNative) -> Result<MemoryExchange> {
    let address = config.address;
    let listing = format!("{} ({})", token.name(), token.symbol());

    let pool = Pool::new(config, token, native, ShareBook::new())
        .with_context(|| format!("deploying exchange for {listing} at {address}"))?;

    info!("deployed exchange for {listing} at {address}");
    Ok(Exchange::new(pool))
}

#[cfg(test)]
mod tests;
