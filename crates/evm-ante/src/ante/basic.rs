//! Stateless validation stages.

use alloy_primitives::{Address, U256};

use super::{ethereum_msg, fee_tx, AnteDecorator, Next};
use crate::{constants::type_urls, AnteError, AuthParams, Context, ExtensionOption, Msg, Tx};

/// Rejects Cosmos transactions that carry Ethereum messages. Those must be submitted as
/// [`Tx::Ethereum`] so that their embedded signatures are verified.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectEthereumMessagesDecorator;

impl AnteDecorator for RejectEthereumMessagesDecorator {
    fn name(&self) -> &'static str {
        "reject_ethereum_msgs"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> Result<(), AnteError> {
        if let Some(msg) = tx.msgs().iter().find(|msg| matches!(msg, Msg::Ethereum(_))) {
            return Err(AnteError::InvalidMessageType {
                got: msg.type_url().to_string(),
                expected: "a cosmos message",
            });
        }
        next.run(ctx, tx, simulate)
    }
}

/// Rejects Cosmos transactions carrying extension options other than the EIP-712 one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionOptionsDecorator;

impl AnteDecorator for ExtensionOptionsDecorator {
    fn name(&self) -> &'static str {
        "extension_options"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> Result<(), AnteError> {
        let fee_tx = fee_tx(tx)?;
        for option in &fee_tx.extension_options {
            if !matches!(option, ExtensionOption::Web3Tx { .. }) {
                return Err(AnteError::UnknownExtensionOption {
                    type_url: option.type_url().to_string(),
                });
            }
        }
        next.run(ctx, tx, simulate)
    }
}

/// Checks the structure of a Cosmos transaction: at least one message, a bounded gas limit and
/// one signature per signer. Skipped on re-check, the transaction passed it on first admission.
#[derive(Debug, Clone, Copy)]
pub struct ValidateBasicDecorator {
    max_tx_gas_wanted: u64,
}

impl ValidateBasicDecorator {
    /// Creates the stage.
    pub const fn new(max_tx_gas_wanted: u64) -> Self {
        Self { max_tx_gas_wanted }
    }
}

impl AnteDecorator for ValidateBasicDecorator {
    fn name(&self) -> &'static str {
        "validate_basic"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> Result<(), AnteError> {
        if ctx.is_recheck_tx() {
            return next.run(ctx, tx, simulate);
        }
        let fee_tx = fee_tx(tx)?;
        if fee_tx.msgs.is_empty() {
            return Err(AnteError::EmptyTx);
        }
        fee_tx.fee.amount.validate()?;
        if fee_tx.fee.gas_limit > self.max_tx_gas_wanted {
            return Err(AnteError::InvalidGasLimit(format!(
                "gas limit {} exceeds maximum {}",
                fee_tx.fee.gas_limit, self.max_tx_gas_wanted
            )));
        }
        if fee_tx.signatures.is_empty() {
            return Err(AnteError::NoSignatures);
        }
        let signers = fee_tx.signers().len();
        if fee_tx.signatures.len() != signers {
            return Err(AnteError::SignerCountMismatch {
                expected: signers,
                got: fee_tx.signatures.len(),
            });
        }
        next.run(ctx, tx, simulate)
    }
}

/// Rejects transactions included after their timeout height.
#[derive(Debug, Clone, Copy, Default)]
pub struct TxTimeoutHeightDecorator;

impl AnteDecorator for TxTimeoutHeightDecorator {
    fn name(&self) -> &'static str {
        "tx_timeout_height"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> Result<(), AnteError> {
        let timeout = fee_tx(tx)?.timeout_height;
        let height = ctx.header.height;
        if timeout > 0 && height > timeout {
            return Err(AnteError::TxTimeoutHeight { height, timeout });
        }
        next.run(ctx, tx, simulate)
    }
}

/// Rejects memos longer than [`AuthParams::max_memo_characters`] bytes.
#[derive(Debug, Clone, Copy)]
pub struct ValidateMemoDecorator {
    params: AuthParams,
}

impl ValidateMemoDecorator {
    /// Creates the stage.
    pub const fn new(params: AuthParams) -> Self {
        Self { params }
    }
}

impl AnteDecorator for ValidateMemoDecorator {
    fn name(&self) -> &'static str {
        "validate_memo"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> Result<(), AnteError> {
        let len = fee_tx(tx)?.memo.len() as u64;
        if len > self.params.max_memo_characters {
            return Err(AnteError::MemoTooLong { max: self.params.max_memo_characters, len });
        }
        next.run(ctx, tx, simulate)
    }
}

/// Charges gas proportional to the encoded transaction size.
#[derive(Debug, Clone, Copy)]
pub struct ConsumeTxSizeGasDecorator {
    params: AuthParams,
}

impl ConsumeTxSizeGasDecorator {
    /// Creates the stage.
    pub const fn new(params: AuthParams) -> Self {
        Self { params }
    }
}

impl AnteDecorator for ConsumeTxSizeGasDecorator {
    fn name(&self) -> &'static str {
        "consume_tx_size_gas"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> Result<(), AnteError> {
        let size = fee_tx(tx)?.tx_size;
        let cost = self.params.tx_size_cost_per_byte.saturating_mul(size);
        ctx.gas_meter.consume(cost, "txSize")?;
        next.run(ctx, tx, simulate)
    }
}

/// Checks the structure of an Ethereum transaction.
///
/// The transaction must be marked by the Ethereum extension option alone, carry no Cosmos
/// signatures, memo or timeout, and its fee and gas limit must equal the sums over its payloads.
/// Skipped on re-check.
#[derive(Debug, Clone)]
pub struct EthValidateBasicDecorator {
    evm_denom: String,
    max_tx_gas_wanted: u64,
}

impl EthValidateBasicDecorator {
    /// Creates the stage.
    pub const fn new(evm_denom: String, max_tx_gas_wanted: u64) -> Self {
        Self { evm_denom, max_tx_gas_wanted }
    }
}

impl AnteDecorator for EthValidateBasicDecorator {
    fn name(&self) -> &'static str {
        "eth_validate_basic"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> Result<(), AnteError> {
        if ctx.is_recheck_tx() {
            return next.run(ctx, tx, simulate);
        }
        let fee_tx = fee_tx(tx)?;

        match fee_tx.extension_options.as_slice() {
            [ExtensionOption::EthereumTx] => {}
            [] => {
                return Err(AnteError::ExtensionOptionMissing(
                    type_urls::EXTENSION_OPTIONS_ETHEREUM_TX,
                ))
            }
            options => {
                let unknown = options
                    .iter()
                    .find(|option| !matches!(option, ExtensionOption::EthereumTx))
                    .unwrap_or(&options[0]);
                return Err(AnteError::UnknownExtensionOption {
                    type_url: unknown.type_url().to_string(),
                });
            }
        }

        if fee_tx.msgs.is_empty() {
            return Err(AnteError::EmptyTx);
        }
        if !fee_tx.signatures.is_empty() {
            return Err(AnteError::InvalidEthereumTx(
                "cosmos signatures must be empty, payloads carry their own".to_string(),
            ));
        }
        if !fee_tx.memo.is_empty() {
            return Err(AnteError::InvalidEthereumTx("memo must be empty".to_string()));
        }
        if fee_tx.timeout_height != 0 {
            return Err(AnteError::InvalidEthereumTx("timeout height must be zero".to_string()));
        }
        if fee_tx.fee.payer.is_some() {
            return Err(AnteError::InvalidEthereumTx("fee payer must be empty".to_string()));
        }

        let mut total_gas = 0u64;
        let mut total_fee = U256::ZERO;
        for msg in &fee_tx.msgs {
            let msg = ethereum_msg(msg)?;
            if msg.from == Address::ZERO {
                return Err(AnteError::InvalidEthereumTx("sender address is missing".to_string()));
            }
            total_gas =
                total_gas.checked_add(msg.gas()).ok_or(AnteError::Overflow("total gas"))?;
            total_fee = msg
                .fee()
                .and_then(|fee| total_fee.checked_add(fee))
                .ok_or(AnteError::Overflow("total fee"))?;
        }

        if total_gas > self.max_tx_gas_wanted {
            return Err(AnteError::InvalidGasLimit(format!(
                "gas limit {total_gas} exceeds maximum {}",
                self.max_tx_gas_wanted
            )));
        }
        if fee_tx.fee.gas_limit != total_gas {
            return Err(AnteError::InvalidGasLimit(format!(
                "declared gas {} does not match payload gas {total_gas}",
                fee_tx.fee.gas_limit
            )));
        }
        let amount = &fee_tx.fee.amount;
        amount.validate()?;
        let declared = amount.amount_of(&self.evm_denom);
        if declared != total_fee || amount.iter().any(|coin| coin.denom != self.evm_denom) {
            return Err(AnteError::InvalidEthereumTx(format!(
                "declared fee {amount} does not match payload fee {total_fee}{}",
                self.evm_denom
            )));
        }

        next.run(ctx, tx, simulate)
    }
}
