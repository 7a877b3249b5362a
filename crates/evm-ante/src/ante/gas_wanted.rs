//! Block gas wanted accounting.
//!
//! Every admitted transaction adds its declared gas to [`BlockTransient::gas_wanted`]. The total
//! is what the fee market settles at the end of the block (see [`crate::fee_market::end_block`]),
//! and it may never exceed [`Context::block_gas_limit`]. A transaction that would push it past
//! the limit is rejected and earlier transactions stay admitted.
//!
//! [`BlockTransient::gas_wanted`]: crate::BlockTransient::gas_wanted

use tracing::trace;

use super::{ethereum_msg, AnteDecorator, Next};
use crate::{AnteError, Context, Tx};

/// Returns the gas a transaction declares: the fee's gas limit of a Cosmos transaction, or the
/// sum of the payload gas limits of an Ethereum transaction. Transactions without a fee declare
/// nothing.
pub fn declared_gas(tx: &Tx) -> Result<Option<u64>, AnteError> {
    match tx {
        Tx::Cosmos(tx) => Ok(Some(tx.fee.gas_limit)),
        Tx::Ethereum(tx) => {
            let mut total = 0u64;
            for msg in &tx.msgs {
                total = total
                    .checked_add(ethereum_msg(msg)?.gas())
                    .ok_or(AnteError::Overflow("gas wanted"))?;
            }
            Ok(Some(total))
        }
        Tx::Opaque(_) => Ok(None),
    }
}

/// Adds `gas_wanted` to the block total in `ctx` and returns the new total.
///
/// Fails with [`AnteError::BlockGasLimitExceeded`] if the new total would exceed the block gas
/// limit, leaving the total unchanged.
pub fn accumulate_gas_wanted(ctx: &mut Context, gas_wanted: u64) -> Result<u64, AnteError> {
    let block_total = ctx.transient.gas_wanted;
    let limit = ctx.block_gas_limit();
    let total = block_total
        .checked_add(gas_wanted)
        .filter(|&total| total <= limit)
        .ok_or(AnteError::BlockGasLimitExceeded { gas_wanted, block_total, limit })?;
    ctx.transient.gas_wanted = total;
    trace!(target: "evm_ante::fee_market", gas_wanted, total, limit, "Accumulated gas wanted");
    Ok(total)
}

/// Accumulates the declared gas of every non-simulated transaction into the block total.
#[derive(Debug, Clone, Copy, Default)]
pub struct GasWantedDecorator;

impl AnteDecorator for GasWantedDecorator {
    fn name(&self) -> &'static str {
        "gas_wanted"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> Result<(), AnteError> {
        if simulate {
            return next.run(ctx, tx, simulate);
        }
        if let Some(gas_wanted) = declared_gas(tx)? {
            accumulate_gas_wanted(ctx, gas_wanted)?;
        }
        next.run(ctx, tx, simulate)
    }
}
