//! Fee floors.
//!
//! Two floors apply. The chain-wide minimum gas price from the fee market parameters is consensus
//! critical and enforced by [`MinGasPriceDecorator`] and [`EthMinGasPriceDecorator`]. The
//! node-local minimum gas prices in [`Context::min_gas_prices`] only gate mempool admission and are
//! enforced by [`MempoolFeeDecorator`] and [`EthMempoolFeeDecorator`].

use alloy_primitives::U256;
use tracing::trace;

use super::{ethereum_msg, fee_tx, AnteDecorator, Next};
use crate::{
    fee_market::current_base_fee, AnteEnvs, AnteError, Coin, Coins, Context, Dec, FeeMarketKeeper,
    Tx,
};

/// Returns `price * gas`.
fn required_fee(price: Dec, gas: u64) -> Result<Dec, AnteError> {
    price.checked_mul_int(U256::from(gas)).ok_or(AnteError::Overflow("required fee"))
}

/// Rejects Cosmos transactions paying less than the chain-wide minimum gas price in the EVM
/// denomination. A fee in any other denomination counts as zero.
#[derive(Debug, Clone)]
pub struct MinGasPriceDecorator<E> {
    env: E,
    evm_denom: String,
    enforce_on_simulate: bool,
}

impl<E: AnteEnvs> MinGasPriceDecorator<E> {
    /// Creates the stage. The floor is enforced on simulations too.
    pub const fn new(env: E, evm_denom: String) -> Self {
        Self { env, evm_denom, enforce_on_simulate: true }
    }

    /// Sets whether simulations must pay the floor.
    pub const fn with_enforce_on_simulate(mut self, enforce: bool) -> Self {
        self.enforce_on_simulate = enforce;
        self
    }
}

impl<E: AnteEnvs> AnteDecorator for MinGasPriceDecorator<E> {
    fn name(&self) -> &'static str {
        "min_gas_price"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> Result<(), AnteError> {
        let fee = &fee_tx(tx)?.fee;
        if simulate && !self.enforce_on_simulate {
            return next.run(ctx, tx, simulate);
        }

        let min_gas_price = self.env.fee_market().params().min_gas_price;
        if min_gas_price.is_zero() {
            return next.run(ctx, tx, simulate);
        }

        let required = required_fee(min_gas_price, fee.gas_limit)?.ceil();
        let provided = fee.amount.amount_of(&self.evm_denom);
        trace!(target: "evm_ante", %provided, %required, "Checking minimum gas price");
        if provided < required {
            return Err(AnteError::MinFeeNotMet {
                provided: Coin::new(self.evm_denom.as_str(), provided).to_string(),
                required: Coin::new(self.evm_denom.as_str(), required).to_string(),
            });
        }
        next.run(ctx, tx, simulate)
    }
}

/// Rejects Ethereum transactions whose effective gas price is below the chain-wide minimum gas
/// price.
///
/// A legacy payload pays its gas price. A dynamic-fee payload pays `min(tip + base_fee, fee_cap)`,
/// with the base fee taken as zero while it is not enabled.
#[derive(Debug, Clone)]
pub struct EthMinGasPriceDecorator<E> {
    env: E,
    evm_denom: String,
}

impl<E: AnteEnvs> EthMinGasPriceDecorator<E> {
    /// Creates the stage.
    pub const fn new(env: E, evm_denom: String) -> Self {
        Self { env, evm_denom }
    }
}

impl<E: AnteEnvs> AnteDecorator for EthMinGasPriceDecorator<E> {
    fn name(&self) -> &'static str {
        "eth_min_gas_price"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> Result<(), AnteError> {
        let fee_market = self.env.fee_market();
        let min_gas_price = fee_market.params().min_gas_price;
        if min_gas_price.is_zero() {
            return next.run(ctx, tx, simulate);
        }

        let base_fee = current_base_fee(fee_market, ctx.header.height).unwrap_or_default();
        for msg in tx.msgs() {
            let msg = ethereum_msg(msg)?;
            let required = required_fee(min_gas_price, msg.gas())?;
            let provided = msg
                .effective_fee(Some(base_fee))
                .and_then(Dec::checked_from_int)
                .ok_or(AnteError::Overflow("effective fee"))?;
            if provided < required {
                return Err(AnteError::MinFeeNotMet {
                    provided: Coin::new(self.evm_denom.as_str(), provided.truncate()).to_string(),
                    required: Coin::new(self.evm_denom.as_str(), required.ceil()).to_string(),
                });
            }
        }
        next.run(ctx, tx, simulate)
    }
}

/// Applies the node-local minimum gas prices to Cosmos transactions on first mempool admission.
///
/// The fee must cover `price * gas_limit` in at least one of the configured denominations.
/// Simulations and block execution are exempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct MempoolFeeDecorator;

impl AnteDecorator for MempoolFeeDecorator {
    fn name(&self) -> &'static str {
        "mempool_fee"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> Result<(), AnteError> {
        let fee = &fee_tx(tx)?.fee;
        if simulate || !ctx.is_check_tx() || ctx.min_gas_prices.is_zero() {
            return next.run(ctx, tx, simulate);
        }

        let required = ctx
            .min_gas_prices
            .iter()
            .map(|price| {
                required_fee(price.amount, fee.gas_limit)
                    .map(|required| Coin::new(price.denom.as_str(), required.ceil()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Coins::new)?;
        let covered = !fee.amount.is_empty()
            && required.iter().any(|coin| fee.amount.amount_of(&coin.denom) >= coin.amount);
        if !covered {
            return Err(AnteError::InsufficientFee {
                provided: fee.amount.to_string(),
                required: required.to_string(),
            });
        }
        next.run(ctx, tx, simulate)
    }
}

/// Applies the node-local minimum gas price of the EVM denomination to Ethereum transactions on
/// first mempool admission, as long as no base fee is in effect.
#[derive(Debug, Clone)]
pub struct EthMempoolFeeDecorator<E> {
    env: E,
    evm_denom: String,
}

impl<E: AnteEnvs> EthMempoolFeeDecorator<E> {
    /// Creates the stage.
    pub const fn new(env: E, evm_denom: String) -> Self {
        Self { env, evm_denom }
    }
}

impl<E: AnteEnvs> AnteDecorator for EthMempoolFeeDecorator<E> {
    fn name(&self) -> &'static str {
        "eth_mempool_fee"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> Result<(), AnteError> {
        if simulate || !ctx.is_check_tx() {
            return next.run(ctx, tx, simulate);
        }
        // the base fee already prices the transaction
        if current_base_fee(self.env.fee_market(), ctx.header.height).is_some() {
            return next.run(ctx, tx, simulate);
        }
        let min_gas_price = ctx.min_gas_prices.amount_of(&self.evm_denom);
        if min_gas_price.is_zero() {
            return next.run(ctx, tx, simulate);
        }

        for msg in tx.msgs() {
            let msg = ethereum_msg(msg)?;
            let required = required_fee(min_gas_price, msg.gas())?;
            let provided = msg
                .fee()
                .and_then(Dec::checked_from_int)
                .ok_or(AnteError::Overflow("transaction fee"))?;
            if provided < required {
                return Err(AnteError::InsufficientFee {
                    provided: Coin::new(self.evm_denom.as_str(), provided.truncate()).to_string(),
                    required: Coin::new(self.evm_denom.as_str(), required.ceil()).to_string(),
                });
            }
        }
        next.run(ctx, tx, simulate)
    }
}
