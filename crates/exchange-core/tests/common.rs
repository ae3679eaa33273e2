//! Common test utilities for exchange pool tests

// Silence warnings for helpers not every test binary uses
#![allow(dead_code)]

use anyhow::Result;
use exchange_core::memory::{MemoryNative, MemoryToken, ShareBook};
use exchange_core::{
    Address, NativeCurrency, Pool, PoolConfig, PoolSnapshot, ShareLedger, TokenLedger,
};

pub const WEI: u128 = 1_000_000_000_000_000_000;
pub const TOKEN_SUPPLY: u128 = 1_000_000 * WEI;
pub const STARTING_NATIVE: u128 = 10_000 * WEI;

pub fn to_wei(units: u128) -> u128 {
    units * WEI
}

/// Deterministic address derived from a readable label.
pub fn address(label: &str) -> Address {
    let mut bytes = [0u8; 20];
    for (slot, byte) in bytes.iter_mut().zip(label.bytes()) {
        *slot = byte;
    }
    Address::new(bytes)
}

pub fn owner() -> Address {
    address("owner")
}

pub fn user() -> Address {
    address("user")
}

pub fn pool_address() -> Address {
    address("exchange")
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Which side of a ledger should refuse to move value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Faults {
    /// transfer_from / receive / burn
    pub pull: bool,
    /// transfer / pay / mint
    pub push: bool,
}

/// Wraps an in-memory ledger and fails on demand.
#[derive(Debug, Clone)]
pub struct Flaky<L> {
    pub inner: L,
    pub faults: Faults,
}

impl<L> Flaky<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            faults: Faults::default(),
        }
    }

    fn check(&self, pull: bool) -> Result<()> {
        let fail = if pull { self.faults.pull } else { self.faults.push };
        if fail {
            anyhow::bail!("injected ledger fault");
        }
        Ok(())
    }
}

impl TokenLedger for Flaky<MemoryToken> {
    fn transfer_from(&mut self, owner: &Address, pool: &Address, amount: u128) -> Result<()> {
        self.check(true)?;
        self.inner.transfer_from(owner, pool, amount)
    }

    fn transfer(&mut self, pool: &Address, recipient: &Address, amount: u128) -> Result<()> {
        self.check(false)?;
        self.inner.transfer(pool, recipient, amount)
    }

    fn balance_of(&self, holder: &Address) -> u128 {
        self.inner.balance_of(holder)
    }
}

impl NativeCurrency for Flaky<MemoryNative> {
    fn receive(&mut self, from: &Address, pool: &Address, amount: u128) -> Result<()> {
        self.check(true)?;
        self.inner.receive(from, pool, amount)
    }

    fn pay(&mut self, pool: &Address, recipient: &Address, amount: u128) -> Result<()> {
        self.check(false)?;
        self.inner.pay(pool, recipient, amount)
    }

    fn balance_of(&self, holder: &Address) -> u128 {
        self.inner.balance_of(holder)
    }
}

impl ShareLedger for Flaky<ShareBook> {
    fn mint(&mut self, provider: &Address, amount: u128) -> Result<()> {
        self.check(false)?;
        self.inner.mint(provider, amount)
    }

    fn burn(&mut self, provider: &Address, amount: u128) -> Result<()> {
        self.check(true)?;
        self.inner.burn(provider, amount)
    }

    fn balance_of(&self, provider: &Address) -> u128 {
        self.inner.balance_of(provider)
    }

    fn total_supply(&self) -> u128 {
        self.inner.total_supply()
    }
}

pub type TestPool = Pool<Flaky<MemoryToken>, Flaky<MemoryNative>, Flaky<ShareBook>>;

/// Empty pool; the owner holds the whole token supply with the pool approved
/// for all of it, and owner and user both hold native currency.
pub fn setup_pool() -> TestPool {
    setup_pool_with_config(PoolConfig::new(pool_address()))
}

pub fn setup_pool_with_config(config: PoolConfig) -> TestPool {
    init_logging();
    let pool = config.address;

    let mut token = MemoryToken::new("Token", "TKN", TOKEN_SUPPLY, owner());
    token.approve(&owner(), &pool, TOKEN_SUPPLY);
    let native = MemoryNative::new()
        .with_balance(owner(), STARTING_NATIVE)
        .with_balance(user(), STARTING_NATIVE);

    Pool::new(
        config,
        Flaky::new(token),
        Flaky::new(native),
        Flaky::new(ShareBook::new()),
    )
    .expect("valid test pool")
}

/// Pool seeded by the owner with 2000 tokens and 1000 native.
pub fn setup_seeded_pool() -> TestPool {
    let mut pool = setup_pool();
    pool.add_liquidity(&owner(), to_wei(2000), to_wei(1000))
        .expect("seed liquidity");
    pool
}

/// Send `amount` tokens from the owner to `holder` and approve the pool for them.
pub fn give_tokens(pool: &mut TestPool, holder: &Address, amount: u128) {
    let pool_address = pool.address();
    let token = &mut pool.token_ledger_mut().inner;
    token.send(&owner(), holder, amount).expect("owner funds holder");
    let allowance = token.allowance(holder, &pool_address);
    token.approve(holder, &pool_address, allowance + amount);
}

pub fn token_balance(pool: &TestPool, holder: &Address) -> u128 {
    pool.token_ledger().balance_of(holder)
}

pub fn native_balance(pool: &TestPool, holder: &Address) -> u128 {
    pool.native_ledger().balance_of(holder)
}

/// Everything observable about a pool and two accounts, for before/after checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observed {
    pub snapshot: PoolSnapshot,
    pub pool_token: u128,
    pub pool_native: u128,
    pub owner_token: u128,
    pub owner_native: u128,
    pub owner_shares: u128,
    pub user_token: u128,
    pub user_native: u128,
    pub user_shares: u128,
}

pub fn observe(pool: &TestPool) -> Observed {
    let pool_address = pool.address();
    Observed {
        snapshot: pool.snapshot(),
        pool_token: token_balance(pool, &pool_address),
        pool_native: native_balance(pool, &pool_address),
        owner_token: token_balance(pool, &owner()),
        owner_native: native_balance(pool, &owner()),
        owner_shares: pool.shares_of(&owner()),
        user_token: token_balance(pool, &user()),
        user_native: native_balance(pool, &user()),
        user_shares: pool.shares_of(&user()),
    }
}
