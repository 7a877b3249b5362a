//! The admission pipeline.
//!
//! Every transaction passes an ordered chain of stages ([`AnteDecorator`]s) before any of its
//! messages execute. A stage either rejects the transaction or hands it to the rest of the chain
//! through [`Next`]. The first rejection aborts the chain, there is no retry and no skipping.
//!
//! # Chains
//!
//! [`AnteHandler`] routes a transaction by its shape:
//!
//! - [`Tx::Cosmos`] and [`Tx::Opaque`] run the Cosmos chain: context setup, basic validation,
//!   nested message guard, fee floors, gas wanted accumulation, signature checks, sequence
//!   increment and fee deduction.
//! - [`Tx::Ethereum`] runs the Ethereum chain, which verifies the signatures embedded in the
//!   payloads instead of Cosmos signatures and additionally guards vesting balances.
//!
//! # Atomicity
//!
//! Stages mutate the [`Context`] they are handed. The handler runs the chain on a branch of the
//! caller's context and writes the branch back only if every stage passed, so a rejected
//! transaction never leaves a partial gas wanted increment behind.

use core::{cell::Cell, fmt::Debug};

use tracing::debug;

use crate::{
    constants::type_urls, AnteEnvs, AnteError, AnteOptions, AnteRejection, Context, Msg,
    MsgEthereumTx, SdkTx, Tx,
};

mod basic;
pub use basic::*;

mod fee;
pub use fee::*;

mod gas_wanted;
pub use gas_wanted::*;

mod min_gas_price;
pub use min_gas_price::*;

mod nested;
pub use nested::*;

mod sequence;
pub use sequence::*;

mod setup;
pub use setup::*;

mod sig_gas;
pub use sig_gas::*;

mod sig_verify;
pub use sig_verify::*;

mod vesting;
pub use vesting::*;

/// A single admission stage.
pub trait AnteDecorator: Debug {
    /// Name of the stage, reported when it rejects a transaction.
    fn name(&self) -> &'static str;

    /// Checks `tx` and, if it passes, runs the rest of the chain through `next`.
    ///
    /// `simulate` is set when the transaction is only being dry-run, e.g. for gas estimation.
    /// Stages with side effects on block accounting must not apply them when simulating.
    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> Result<(), AnteError>;
}

/// The rest of a chain, handed to each stage.
#[derive(Debug)]
pub struct Next<'a> {
    chain: &'a [Box<dyn AnteDecorator>],
    failed_stage: &'a Cell<Option<&'static str>>,
}

impl<'a> Next<'a> {
    /// Creates the head of `chain`. The name of the stage that originates a rejection is recorded
    /// into `failed_stage`.
    pub const fn new(
        chain: &'a [Box<dyn AnteDecorator>],
        failed_stage: &'a Cell<Option<&'static str>>,
    ) -> Self {
        Self { chain, failed_stage }
    }

    /// Runs the remaining stages. An empty chain accepts.
    pub fn run(self, ctx: &mut Context, tx: &Tx, simulate: bool) -> Result<(), AnteError> {
        let Some((stage, rest)) = self.chain.split_first() else {
            return Ok(());
        };
        let next = Next { chain: rest, failed_stage: self.failed_stage };
        let result = stage.ante_handle(ctx, tx, simulate, next);
        // the innermost failing stage records itself first
        if result.is_err() && self.failed_stage.get().is_none() {
            self.failed_stage.set(Some(stage.name()));
        }
        result
    }
}

/// The public entry point of the admission pipeline.
#[derive(Debug)]
pub struct AnteHandler {
    cosmos: Vec<Box<dyn AnteDecorator>>,
    ethereum: Vec<Box<dyn AnteDecorator>>,
}

impl AnteHandler {
    /// Creates a handler with the default Cosmos and Ethereum chains.
    pub fn new<E>(env: E, options: AnteOptions) -> Self
    where
        E: AnteEnvs + Clone + 'static,
    {
        Self { cosmos: cosmos_chain(env.clone(), &options), ethereum: ethereum_chain(env, &options) }
    }

    /// Creates a handler from custom chains.
    pub fn from_chains(
        cosmos: Vec<Box<dyn AnteDecorator>>,
        ethereum: Vec<Box<dyn AnteDecorator>>,
    ) -> Self {
        Self { cosmos, ethereum }
    }

    /// Returns the names of the Cosmos chain's stages, in order.
    pub fn cosmos_stages(&self) -> Vec<&'static str> {
        self.cosmos.iter().map(|stage| stage.name()).collect()
    }

    /// Returns the names of the Ethereum chain's stages, in order.
    pub fn ethereum_stages(&self) -> Vec<&'static str> {
        self.ethereum.iter().map(|stage| stage.name()).collect()
    }

    /// Admits `tx` in `ctx`.
    ///
    /// On success the context reflects every stage's effects: the transaction gas meter and the
    /// block's accumulated gas wanted. On rejection the context is left untouched and the
    /// returned [`AnteRejection`] names the failing stage and the gas consumed up to it.
    pub fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Tx,
        simulate: bool,
    ) -> Result<(), AnteRejection> {
        let chain = match tx {
            Tx::Ethereum(_) => &self.ethereum,
            Tx::Cosmos(_) | Tx::Opaque(_) => &self.cosmos,
        };

        let mut branch = ctx.branch();
        let failed_stage = Cell::new(None);
        match Next::new(chain, &failed_stage).run(&mut branch, tx, simulate) {
            Ok(()) => {
                *ctx = branch;
                Ok(())
            }
            Err(error) => {
                let rejection = AnteRejection {
                    stage: failed_stage.get().unwrap_or("ante"),
                    error,
                    gas_used: branch.gas_meter.consumed(),
                };
                debug!(
                    target: "evm_ante",
                    kind = tx.kind(),
                    stage = rejection.stage,
                    code = rejection.code(),
                    codespace = rejection.codespace(),
                    gas_used = rejection.gas_used,
                    error = %rejection.error,
                    "Rejected transaction"
                );
                Err(rejection)
            }
        }
    }
}

/// Builds the default chain for Cosmos transactions.
pub fn cosmos_chain<E>(env: E, options: &AnteOptions) -> Vec<Box<dyn AnteDecorator>>
where
    E: AnteEnvs + Clone + 'static,
{
    vec![
        Box::new(SetUpContextDecorator),
        Box::new(RejectEthereumMessagesDecorator),
        Box::new(ExtensionOptionsDecorator),
        Box::new(ValidateBasicDecorator::new(options.max_tx_gas_wanted)),
        Box::new(TxTimeoutHeightDecorator),
        Box::new(ValidateMemoDecorator::new(options.auth)),
        Box::new(ConsumeTxSizeGasDecorator::new(options.auth)),
        Box::new(NestedMessageGuard::new(options.disabled_nested_msgs.clone())),
        Box::new(
            MinGasPriceDecorator::new(env.clone(), options.evm_denom.clone())
                .with_enforce_on_simulate(options.enforce_min_gas_price_on_simulate),
        ),
        Box::new(MempoolFeeDecorator),
        Box::new(GasWantedDecorator),
        Box::new(ValidateSigCountDecorator::new(options.auth)),
        Box::new(SigGasConsumeDecorator::new(options.auth)),
        Box::new(SigVerificationDecorator::new(env.clone(), options.evm_chain_id)),
        Box::new(IncrementSequenceDecorator::new(env.clone())),
        Box::new(DeductFeeDecorator::new(env)),
    ]
}

/// Builds the default chain for Ethereum transactions.
pub fn ethereum_chain<E>(env: E, options: &AnteOptions) -> Vec<Box<dyn AnteDecorator>>
where
    E: AnteEnvs + Clone + 'static,
{
    vec![
        Box::new(EthSetUpContextDecorator),
        Box::new(EthValidateBasicDecorator::new(
            options.evm_denom.clone(),
            options.max_tx_gas_wanted,
        )),
        Box::new(NestedMessageGuard::new(options.disabled_nested_msgs.clone())),
        Box::new(EthMempoolFeeDecorator::new(env.clone(), options.evm_denom.clone())),
        Box::new(EthMinGasPriceDecorator::new(env.clone(), options.evm_denom.clone())),
        Box::new(GasWantedDecorator),
        Box::new(EthSigVerificationDecorator::new(env.clone(), options.evm_chain_id)),
        Box::new(EthVestingDecorator::new(env.clone(), options.evm_denom.clone())),
        Box::new(EthIncrementSequenceDecorator::new(env.clone())),
        Box::new(EthDeductFeeDecorator::new(env, options.evm_denom.clone())),
    ]
}

/// Returns the fee-bearing body of `tx`, rejecting the shapes that carry no fee.
fn fee_tx(tx: &Tx) -> Result<&SdkTx, AnteError> {
    tx.as_fee_tx().ok_or(AnteError::InvalidTransactionType("expected a fee transaction"))
}

/// Returns the Ethereum transaction wrapped by `msg`, rejecting every other message.
fn ethereum_msg(msg: &Msg) -> Result<&MsgEthereumTx, AnteError> {
    msg.as_ethereum().ok_or_else(|| AnteError::InvalidMessageType {
        got: msg.type_url().to_string(),
        expected: type_urls::MSG_ETHEREUM_TX,
    })
}
