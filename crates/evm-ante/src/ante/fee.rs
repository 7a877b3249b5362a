//! Fee deduction.
//!
//! Fees are taken from the payer through [`BankKeeper::deduct_fees`] once every check before has
//! passed. Simulations only check that the payer could afford the fee.

use alloy_primitives::Address;
use tracing::debug;

use super::{ethereum_msg, fee_tx, AnteDecorator, Next};
use crate::{
    fee_market::current_base_fee, AccountKeeper, AnteEnvs, AnteError, BankKeeper, Coins,
    Context, Tx,
};

/// Charges `fees` to `payer`, or only checks the payer's balances when simulating.
fn charge<E: AnteEnvs>(
    env: &E,
    payer: Address,
    fees: &Coins,
    simulate: bool,
) -> Result<(), AnteError> {
    if env.accounts().account(payer).is_none() {
        return Err(AnteError::UnknownAddress(payer));
    }
    if fees.is_zero() {
        return Ok(());
    }
    if simulate {
        let bank = env.bank();
        if let Some(coin) = fees.iter().find(|coin| bank.balance(payer, &coin.denom) < coin.amount)
        {
            return Err(AnteError::InsufficientFunds(format!(
                "{payer} has {}{} but the fee requires {coin}",
                bank.balance(payer, &coin.denom),
                coin.denom
            )));
        }
        return Ok(());
    }
    env.bank().deduct_fees(payer, fees)?;
    debug!(target: "evm_ante", %payer, %fees, "Deducted fees");
    Ok(())
}

/// Deducts the declared fee of a Cosmos transaction from its fee payer.
#[derive(Debug, Clone)]
pub struct DeductFeeDecorator<E> {
    env: E,
}

impl<E: AnteEnvs> DeductFeeDecorator<E> {
    /// Creates the stage.
    pub const fn new(env: E) -> Self {
        Self { env }
    }
}

impl<E: AnteEnvs> AnteDecorator for DeductFeeDecorator<E> {
    fn name(&self) -> &'static str {
        "deduct_fee"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> Result<(), AnteError> {
        let fee_tx = fee_tx(tx)?;
        let payer = fee_tx.fee_payer().ok_or(AnteError::EmptyTx)?;
        charge(&self.env, payer, &fee_tx.fee.amount, simulate)?;
        next.run(ctx, tx, simulate)
    }
}

/// Deducts the effective fee of every wrapped Ethereum transaction from its sender, in the EVM
/// denomination.
#[derive(Debug, Clone)]
pub struct EthDeductFeeDecorator<E> {
    env: E,
    evm_denom: String,
}

impl<E: AnteEnvs> EthDeductFeeDecorator<E> {
    /// Creates the stage.
    pub const fn new(env: E, evm_denom: String) -> Self {
        Self { env, evm_denom }
    }
}

impl<E: AnteEnvs> AnteDecorator for EthDeductFeeDecorator<E> {
    fn name(&self) -> &'static str {
        "eth_deduct_fee"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> Result<(), AnteError> {
        let base_fee = current_base_fee(self.env.fee_market(), ctx.header.height);
        for msg in tx.msgs() {
            let msg = ethereum_msg(msg)?;
            let fee = msg.effective_fee(base_fee).ok_or(AnteError::Overflow("effective fee"))?;
            charge(&self.env, msg.from, &Coins::single(self.evm_denom.as_str(), fee), simulate)?;
        }
        next.run(ctx, tx, simulate)
    }
}
