//! Transaction gas meter setup.

use super::{fee_tx, AnteDecorator, Next};
use crate::{AnteError, Context, GasMeter, Tx};

/// Installs the transaction gas meter for a Cosmos transaction.
///
/// The meter is bounded by the fee's gas limit. Simulations and genesis transactions get an
/// unbounded meter.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetUpContextDecorator;

impl AnteDecorator for SetUpContextDecorator {
    fn name(&self) -> &'static str {
        "setup"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> Result<(), AnteError> {
        let fee_tx = fee_tx(tx)?;
        ctx.gas_meter = if simulate || ctx.header.height == 0 {
            GasMeter::infinite()
        } else {
            GasMeter::new(fee_tx.fee.gas_limit)
        };
        next.run(ctx, tx, simulate)
    }
}

/// Installs an unbounded transaction gas meter for an Ethereum transaction. The EVM meters the
/// wrapped payloads itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct EthSetUpContextDecorator;

impl AnteDecorator for EthSetUpContextDecorator {
    fn name(&self) -> &'static str {
        "eth_setup"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> Result<(), AnteError> {
        if !matches!(tx, Tx::Ethereum(_)) {
            return Err(AnteError::InvalidTransactionType("expected an ethereum transaction"));
        }
        ctx.gas_meter = GasMeter::infinite();
        next.run(ctx, tx, simulate)
    }
}
