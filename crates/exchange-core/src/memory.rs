//! In-memory implementations of the ledger traits, used by the test suites and
//! the demo, and usable as a reference for wiring a real ledger.

use std::collections::HashMap;

use anyhow::{anyhow, Result};

use crate::ledger::{NativeCurrency, ShareLedger, TokenLedger};
use crate::types::Address;

fn debit(balances: &mut HashMap<Address, u128>, holder: &Address, amount: u128) -> Result<()> {
    let balance = balances.get(holder).copied().unwrap_or(0);
    if balance < amount {
        return Err(anyhow!(
            "insufficient balance: {} holds {}, needs {}",
            holder,
            balance,
            amount
        ));
    }
    balances.insert(*holder, balance - amount);
    Ok(())
}

fn credit(balances: &mut HashMap<Address, u128>, holder: &Address, amount: u128) -> Result<()> {
    let balance = balances.entry(*holder).or_insert(0);
    *balance = balance
        .checked_add(amount)
        .ok_or_else(|| anyhow!("balance overflow for {}", holder))?;
    Ok(())
}

/// A fixed-supply fungible token with allowances.
#[derive(Debug, Clone)]
pub struct MemoryToken {
    name: String,
    symbol: String,
    total_supply: u128,
    balances: HashMap<Address, u128>,
    allowances: HashMap<(Address, Address), u128>,
}

impl MemoryToken {
    /// Creates the token with its whole `initial_supply` held by `deployer`.
    pub fn new(name: &str, symbol: &str, initial_supply: u128, deployer: Address) -> Self {
        let mut balances = HashMap::new();
        balances.insert(deployer, initial_supply);
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            total_supply: initial_supply,
            balances,
            allowances: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: u128) {
        self.allowances.insert((*owner, *spender), amount);
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    /// Holder-initiated transfer.
    pub fn send(&mut self, from: &Address, to: &Address, amount: u128) -> Result<()> {
        debit(&mut self.balances, from, amount)?;
        credit(&mut self.balances, to, amount)
    }
}

impl TokenLedger for MemoryToken {
    fn transfer_from(&mut self, owner: &Address, pool: &Address, amount: u128) -> Result<()> {
        let allowance = self.allowance(owner, pool);
        if allowance < amount {
            return Err(anyhow!(
                "insufficient allowance: {} approved {} for {}, needs {}",
                owner,
                pool,
                allowance,
                amount
            ));
        }
        self.send(owner, pool, amount)?;
        self.allowances.insert((*owner, *pool), allowance - amount);
        Ok(())
    }

    fn transfer(&mut self, pool: &Address, recipient: &Address, amount: u128) -> Result<()> {
        self.send(pool, recipient, amount)
    }

    fn balance_of(&self, holder: &Address) -> u128 {
        self.balances.get(holder).copied().unwrap_or(0)
    }
}

/// Native-currency balances keyed by address.
#[derive(Debug, Clone, Default)]
pub struct MemoryNative {
    balances: HashMap<Address, u128>,
}

impl MemoryNative {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(mut self, holder: Address, amount: u128) -> Self {
        self.balances.insert(holder, amount);
        self
    }

    pub fn fund(&mut self, holder: &Address, amount: u128) -> Result<()> {
        credit(&mut self.balances, holder, amount)
    }
}

impl NativeCurrency for MemoryNative {
    fn receive(&mut self, from: &Address, pool: &Address, amount: u128) -> Result<()> {
        debit(&mut self.balances, from, amount)?;
        credit(&mut self.balances, pool, amount)
    }

    fn pay(&mut self, pool: &Address, recipient: &Address, amount: u128) -> Result<()> {
        debit(&mut self.balances, pool, amount)?;
        credit(&mut self.balances, recipient, amount)
    }

    fn balance_of(&self, holder: &Address) -> u128 {
        self.balances.get(holder).copied().unwrap_or(0)
    }
}

/// Liquidity-share balances.
#[derive(Debug, Clone, Default)]
pub struct ShareBook {
    balances: HashMap<Address, u128>,
    total_supply: u128,
}

impl ShareBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holders(&self) -> impl Iterator<Item = (&Address, &u128)> {
        self.balances.iter().filter(|(_, balance)| **balance > 0)
    }
}

impl ShareLedger for ShareBook {
    fn mint(&mut self, provider: &Address, amount: u128) -> Result<()> {
        let total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| anyhow!("share supply overflow"))?;
        credit(&mut self.balances, provider, amount)?;
        self.total_supply = total_supply;
        Ok(())
    }

    fn burn(&mut self, provider: &Address, amount: u128) -> Result<()> {
        debit(&mut self.balances, provider, amount)?;
        self.total_supply -= amount;
        Ok(())
    }

    fn balance_of(&self, provider: &Address) -> u128 {
        self.balances.get(provider).copied().unwrap_or(0)
    }

    fn total_supply(&self) -> u128 {
        self.total_supply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    #[test]
    fn test_token_deploy_mints_to_deployer() {
        let token = MemoryToken::new("Test token", "TKN", 31337, addr(1));
        assert_eq!(token.name(), "Test token");
        assert_eq!(token.symbol(), "TKN");
        assert_eq!(token.total_supply(), 31337);
        assert_eq!(token.balance_of(&addr(1)), 31337);
    }

    #[test]
    fn test_transfer_from_consumes_allowance() {
        let mut token = MemoryToken::new("Token", "TKN", 1000, addr(1));
        assert!(token.transfer_from(&addr(1), &addr(9), 10).is_err());

        token.approve(&addr(1), &addr(9), 300);
        token.transfer_from(&addr(1), &addr(9), 200).unwrap();
        assert_eq!(token.allowance(&addr(1), &addr(9)), 100);
        assert_eq!(token.balance_of(&addr(9)), 200);
        assert!(token.transfer_from(&addr(1), &addr(9), 101).is_err());
    }

    #[test]
    fn test_share_book_tracks_supply() {
        let mut shares = ShareBook::new();
        shares.mint(&addr(1), 70).unwrap();
        shares.mint(&addr(2), 30).unwrap();
        shares.burn(&addr(1), 70).unwrap();
        assert_eq!(shares.total_supply(), 30);
        assert_eq!(shares.holders().count(), 1);
        assert!(shares.burn(&addr(2), 31).is_err());
    }
}
