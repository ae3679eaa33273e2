use crate::types::Address;
use anyhow::Result;

/// The fungible-token ledger the pool trades against. This decouples the pool
/// from where token balances are actually stored, making it easy to test with
/// an in-memory ledger or connect to a live one.
pub trait TokenLedger {
    /// Move `amount` from `owner` to `pool`. Fails if `owner`'s balance or
    /// the allowance granted to `pool` is insufficient.
    fn transfer_from(&mut self, owner: &Address, pool: &Address, amount: u128) -> Result<()>;

    /// Move `amount` from `pool` to `recipient`.
    fn transfer(&mut self, pool: &Address, recipient: &Address, amount: u128) -> Result<()>;

    fn balance_of(&self, holder: &Address) -> u128;
}

/// The runtime's native-currency transfer primitive.
pub trait NativeCurrency {
    /// Accept `amount` attached to a call by `from`.
    fn receive(&mut self, from: &Address, pool: &Address, amount: u128) -> Result<()>;

    /// Pay `amount` out of the pool's balance to `recipient`.
    fn pay(&mut self, pool: &Address, recipient: &Address, amount: u128) -> Result<()>;

    fn balance_of(&self, holder: &Address) -> u128;
}

/// Where liquidity shares are persisted. The pool only computes share amounts
/// and instructs the ledger to mint or burn them.
pub trait ShareLedger {
    fn mint(&mut self, provider: &Address, amount: u128) -> Result<()>;

    fn burn(&mut self, provider: &Address, amount: u128) -> Result<()>;

    fn balance_of(&self, provider: &Address) -> u128;

    fn total_supply(&self) -> u128;
}
