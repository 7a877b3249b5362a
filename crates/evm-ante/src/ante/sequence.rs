//! Account sequence checks and increments.

use alloy_consensus::Transaction;
use tracing::trace;

use super::{ethereum_msg, fee_tx, AnteDecorator, Next};
use crate::{AccountKeeper, AnteEnvs, AnteError, Context, Tx};

/// Increments the sequence of every signer of a Cosmos transaction.
#[derive(Debug, Clone)]
pub struct IncrementSequenceDecorator<E> {
    env: E,
}

impl<E: AnteEnvs> IncrementSequenceDecorator<E> {
    /// Creates the stage.
    pub const fn new(env: E) -> Self {
        Self { env }
    }
}

impl<E: AnteEnvs> AnteDecorator for IncrementSequenceDecorator<E> {
    fn name(&self) -> &'static str {
        "increment_sequence"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> Result<(), AnteError> {
        for signer in fee_tx(tx)?.signers() {
            let sequence = self.env.accounts().increment_sequence(signer)?;
            trace!(target: "evm_ante", %signer, sequence, "Incremented sequence");
        }
        next.run(ctx, tx, simulate)
    }
}

/// Checks the nonce of every wrapped Ethereum transaction against its sender's sequence and
/// increments the sequence.
///
/// Contract creations leave the sequence alone, the EVM increments the creator's nonce itself
/// when it derives the new contract address.
#[derive(Debug, Clone)]
pub struct EthIncrementSequenceDecorator<E> {
    env: E,
}

impl<E: AnteEnvs> EthIncrementSequenceDecorator<E> {
    /// Creates the stage.
    pub const fn new(env: E) -> Self {
        Self { env }
    }
}

impl<E: AnteEnvs> AnteDecorator for EthIncrementSequenceDecorator<E> {
    fn name(&self) -> &'static str {
        "eth_increment_sequence"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> Result<(), AnteError> {
        let accounts = self.env.accounts();
        for msg in tx.msgs() {
            let msg = ethereum_msg(msg)?;
            let expected = accounts.sequence(msg.from).ok_or(AnteError::UnknownAddress(msg.from))?;
            if msg.nonce() != expected {
                return Err(AnteError::InvalidNonce { expected, got: msg.nonce() });
            }
            if !msg.payload.kind().is_create() {
                accounts.increment_sequence(msg.from)?;
            }
        }
        next.run(ctx, tx, simulate)
    }
}
