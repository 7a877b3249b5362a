use core::cell::{Cell, RefCell};

use alloy_primitives::{map::HashMap, Address, U256};

use crate::{
    AccountInfo, AccountKeeper, AnteError, BankKeeper, Coins, FeeMarketKeeper, FeeMarketParams,
    PublicKey,
};

/// Seconds in a day.
pub const SECONDS_OF_DAY: u64 = 24 * 60 * 60;

/// Seconds in a vesting month.
pub const SECONDS_OF_MONTH: u64 = 30 * SECONDS_OF_DAY;

/// A monthly vesting schedule over a single denomination.
///
/// Nothing vests until the cliff. After the cliff an equal share vests at the end of every month,
/// with the last month also vesting the rounding remainder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyVesting {
    /// The vesting denomination.
    pub denom: String,
    /// The amount vesting over the schedule.
    pub original: U256,
    /// Start of the schedule, in seconds since the Unix epoch.
    pub start_time: u64,
    /// End of the cliff, in seconds since the Unix epoch.
    pub cliff_time: u64,
    /// Number of monthly periods after the cliff.
    pub months: u64,
}

impl MonthlyVesting {
    /// Creates a schedule starting at `start_time` with a cliff of `cliff_days`.
    pub fn new(
        denom: impl Into<String>,
        original: impl Into<U256>,
        start_time: u64,
        cliff_days: u64,
        months: u64,
    ) -> Self {
        Self {
            denom: denom.into(),
            original: original.into(),
            start_time,
            cliff_time: start_time + cliff_days * SECONDS_OF_DAY,
            months,
        }
    }

    /// Returns the end of the schedule.
    pub const fn end_time(&self) -> u64 {
        self.cliff_time + self.months * SECONDS_OF_MONTH
    }

    /// Returns the amount vested at `block_time`.
    pub fn vested(&self, block_time: u64) -> U256 {
        if block_time <= self.start_time || block_time <= self.cliff_time {
            return U256::ZERO;
        }
        if block_time >= self.end_time() {
            return self.original;
        }
        let elapsed = (block_time - self.cliff_time) / SECONDS_OF_MONTH;
        self.original / U256::from(self.months) * U256::from(elapsed)
    }

    /// Returns the amount still locked at `block_time`.
    pub fn locked(&self, block_time: u64) -> U256 {
        self.original - self.vested(block_time)
    }
}

#[derive(Debug, Clone)]
struct MemoryAccount {
    info: AccountInfo,
    balances: HashMap<String, U256>,
    vesting: Option<MonthlyVesting>,
}

#[derive(Debug, Default)]
struct Accounts {
    accounts: HashMap<Address, MemoryAccount>,
    collected_fees: HashMap<String, U256>,
}

impl Accounts {
    fn account_mut(&mut self, address: Address) -> &mut MemoryAccount {
        let account_number = self.accounts.len() as u64;
        self.accounts.entry(address).or_insert_with(|| MemoryAccount {
            info: AccountInfo { address, account_number, sequence: 0, pub_key: None },
            balances: HashMap::default(),
            vesting: None,
        })
    }
}

/// An in-memory account and bank store.
///
/// Accounts are numbered in creation order. Vesting accounts lock part of their balance of the
/// vesting denomination according to their [`MonthlyVesting`] schedule.
#[derive(Debug, Default)]
pub struct MemoryAccountKeeper {
    state: RefCell<Accounts>,
}

impl MemoryAccountKeeper {
    /// Creates an account at `address`.
    pub fn with_account(self, address: Address) -> Self {
        self.state.borrow_mut().account_mut(address);
        self
    }

    /// Creates an account at `address` holding `amount` of `denom`.
    pub fn with_balance(self, address: Address, denom: &str, amount: impl Into<U256>) -> Self {
        self.set_balance(address, denom, amount);
        self
    }

    /// Turns the account at `address` into a vesting account.
    pub fn with_vesting(self, address: Address, vesting: MonthlyVesting) -> Self {
        self.state.borrow_mut().account_mut(address).vesting = Some(vesting);
        self
    }

    /// Sets the public key of the account at `address`.
    pub fn with_pub_key(self, address: Address, pub_key: PublicKey) -> Self {
        self.state.borrow_mut().account_mut(address).info.pub_key = Some(pub_key);
        self
    }

    /// Sets the sequence of the account at `address`.
    pub fn with_sequence(self, address: Address, sequence: u64) -> Self {
        self.state.borrow_mut().account_mut(address).info.sequence = sequence;
        self
    }

    /// Sets the balance of `denom` held by `address`, creating the account if needed.
    pub fn set_balance(&self, address: Address, denom: &str, amount: impl Into<U256>) {
        self.state
            .borrow_mut()
            .account_mut(address)
            .balances
            .insert(denom.to_string(), amount.into());
    }

    /// Returns the fees collected so far in `denom`.
    pub fn collected_fees(&self, denom: &str) -> U256 {
        self.state.borrow().collected_fees.get(denom).copied().unwrap_or_default()
    }
}

impl AccountKeeper for MemoryAccountKeeper {
    fn account(&self, address: Address) -> Option<AccountInfo> {
        self.state.borrow().accounts.get(&address).map(|account| account.info.clone())
    }

    fn set_pub_key(&self, address: Address, pub_key: PublicKey) -> Result<(), AnteError> {
        let mut state = self.state.borrow_mut();
        let account = state.accounts.get_mut(&address).ok_or(AnteError::UnknownAddress(address))?;
        account.info.pub_key = Some(pub_key);
        Ok(())
    }

    fn increment_sequence(&self, address: Address) -> Result<u64, AnteError> {
        let mut state = self.state.borrow_mut();
        let account = state.accounts.get_mut(&address).ok_or(AnteError::UnknownAddress(address))?;
        account.info.sequence += 1;
        Ok(account.info.sequence)
    }

    fn is_vesting_account(&self, address: Address) -> bool {
        self.state.borrow().accounts.get(&address).is_some_and(|account| account.vesting.is_some())
    }

    fn spendable_balance(&self, address: Address, denom: &str, block_time: u64) -> U256 {
        let state = self.state.borrow();
        let Some(account) = state.accounts.get(&address) else { return U256::ZERO };
        let balance = account.balances.get(denom).copied().unwrap_or_default();
        let locked = account
            .vesting
            .as_ref()
            .filter(|vesting| vesting.denom == denom)
            .map_or(U256::ZERO, |vesting| vesting.locked(block_time));
        balance.saturating_sub(locked)
    }
}

impl BankKeeper for MemoryAccountKeeper {
    fn balance(&self, address: Address, denom: &str) -> U256 {
        self.state
            .borrow()
            .accounts
            .get(&address)
            .and_then(|account| account.balances.get(denom).copied())
            .unwrap_or_default()
    }

    fn deduct_fees(&self, payer: Address, fees: &Coins) -> Result<(), AnteError> {
        let mut state = self.state.borrow_mut();
        let account = state.accounts.get_mut(&payer).ok_or(AnteError::UnknownAddress(payer))?;
        for coin in fees.iter() {
            let balance = account.balances.get(&coin.denom).copied().unwrap_or_default();
            if balance < coin.amount {
                return Err(AnteError::InsufficientFunds(format!(
                    "{balance}{} is smaller than {coin}",
                    coin.denom
                )));
            }
        }
        for coin in fees.iter() {
            *account.balances.entry(coin.denom.clone()).or_default() -= coin.amount;
        }
        for coin in fees.iter() {
            *state.collected_fees.entry(coin.denom.clone()).or_default() += coin.amount;
        }
        Ok(())
    }
}

/// An in-memory fee market store.
#[derive(Debug, Default)]
pub struct MemoryFeeMarket {
    params: RefCell<FeeMarketParams>,
    block_gas_wanted: Cell<u64>,
}

impl MemoryFeeMarket {
    /// Creates a store holding `params`.
    pub fn new(params: FeeMarketParams) -> Self {
        Self { params: RefCell::new(params), block_gas_wanted: Cell::new(0) }
    }

    /// Replaces the parameters.
    pub fn set_params(&self, params: FeeMarketParams) {
        *self.params.borrow_mut() = params;
    }
}

impl FeeMarketKeeper for MemoryFeeMarket {
    fn params(&self) -> FeeMarketParams {
        self.params.borrow().clone()
    }

    fn set_base_fee(&self, base_fee: U256) {
        self.params.borrow_mut().base_fee = base_fee;
    }

    fn block_gas_wanted(&self) -> u64 {
        self.block_gas_wanted.get()
    }

    fn set_block_gas_wanted(&self, gas_wanted: u64) {
        self.block_gas_wanted.set(gas_wanted);
    }
}
