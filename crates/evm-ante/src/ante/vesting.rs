//! Vesting balance guard for Ethereum transactions.

use alloy_primitives::{map::HashMap, Address, U256};
use tracing::trace;

use super::{ethereum_msg, AnteDecorator, Next};
use crate::{AccountKeeper, AnteEnvs, AnteError, BankKeeper, Context, Tx};

/// Rejects Ethereum transactions through which a vesting account would transfer more than its
/// unlocked balance.
///
/// Messages from the same vesting sender share one spendable pool, fetched once per transaction
/// at the block time. Values are then debited from the pools in message order and the first
/// debit that overdraws its pool fails the transaction. Non-vesting senders are not restricted
/// here. The guard never writes balances.
#[derive(Debug, Clone)]
pub struct EthVestingDecorator<E> {
    env: E,
    evm_denom: String,
}

impl<E: AnteEnvs> EthVestingDecorator<E> {
    /// Creates the stage.
    pub const fn new(env: E, evm_denom: String) -> Self {
        Self { env, evm_denom }
    }

    /// Returns the spendable pool of every vesting sender in `tx`.
    fn spendable_pools(&self, ctx: &Context, tx: &Tx) -> Result<HashMap<Address, U256>, AnteError> {
        let accounts = self.env.accounts();
        let mut pools = HashMap::default();
        for msg in tx.msgs() {
            let from = ethereum_msg(msg)?.from;
            if accounts.account(from).is_none() {
                return Err(AnteError::UnknownAddress(from));
            }
            if !accounts.is_vesting_account(from) || pools.contains_key(&from) {
                continue;
            }
            if self.env.bank().balance(from, &self.evm_denom).is_zero() {
                return Err(AnteError::InsufficientFunds(format!(
                    "account has no balance to execute transaction: {from}"
                )));
            }
            let spendable = accounts.spendable_balance(from, &self.evm_denom, ctx.header.time);
            trace!(target: "evm_ante", %from, %spendable, "Vesting account spendable balance");
            pools.insert(from, spendable);
        }
        Ok(pools)
    }
}

impl<E: AnteEnvs> AnteDecorator for EthVestingDecorator<E> {
    fn name(&self) -> &'static str {
        "eth_vesting"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> Result<(), AnteError> {
        let mut pools = self.spendable_pools(ctx, tx)?;
        for msg in tx.msgs() {
            let msg = ethereum_msg(msg)?;
            let Some(pool) = pools.get_mut(&msg.from) else { continue };
            let value = msg.value();
            let Some(remaining) = pool.checked_sub(value) else {
                return Err(AnteError::InsufficientUnlockedCoins {
                    address: msg.from,
                    spendable: *pool,
                    requested: value,
                    denom: self.evm_denom.clone(),
                });
            };
            *pool = remaining;
        }
        next.run(ctx, tx, simulate)
    }
}
