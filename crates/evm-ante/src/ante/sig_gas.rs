//! Signature verification gas.
//!
//! Each key type has a deterministic verification cost. A multisig key costs the sum of the
//! costs of the members that actually signed, independent of its threshold or size.

use tracing::trace;

use super::{fee_tx, AnteDecorator, Next};
use crate::{
    constants::sig_gas::ETH_SECP256K1_VERIFY_COST, AnteError, AuthParams, Context, GasMeter,
    LegacyMultisigKey, PublicKey, SignatureData, SignatureV2, Tx,
};

/// Maps public keys to the gas charged for verifying their signatures.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyCostModel {
    params: AuthParams,
}

impl KeyCostModel {
    /// Creates a cost model from the auth parameters.
    pub const fn new(params: AuthParams) -> Self {
        Self { params }
    }

    /// Returns the cost of verifying a signature by a single, non-multisig key.
    pub fn key_cost(&self, pub_key: &PublicKey) -> Result<u64, AnteError> {
        match pub_key {
            PublicKey::Ed25519(_) => Ok(self.params.sig_verify_cost_ed25519),
            PublicKey::EthSecp256k1(_) => Ok(ETH_SECP256K1_VERIFY_COST),
            PublicKey::Secp256r1(_) => Ok(self.params.sig_verify_cost_secp256r1()),
            PublicKey::LegacyMultisig(_) | PublicKey::Unsupported { .. } => {
                Err(AnteError::UnknownKeyType { type_url: pub_key.type_url().to_string() })
            }
        }
    }

    /// Returns the cost of verifying `data` made by `pub_key`.
    pub fn cost(&self, pub_key: &PublicKey, data: &SignatureData) -> Result<u64, AnteError> {
        match pub_key {
            PublicKey::LegacyMultisig(multisig) => self.multisig_cost(multisig, data),
            key => self.key_cost(key),
        }
    }

    /// Sums the cost of every member that signed. Members must be single keys.
    fn multisig_cost(
        &self,
        multisig: &LegacyMultisigKey,
        data: &SignatureData,
    ) -> Result<u64, AnteError> {
        let SignatureData::Multi { bitarray, signatures } = data else {
            return Err(AnteError::InvalidMultisignature(
                "multisig key requires multisig signature data".to_string(),
            ));
        };
        if signatures.is_empty() {
            return Err(AnteError::InvalidMultisignature("no member signatures".to_string()));
        }
        if bitarray.count() != multisig.keys.len() {
            return Err(AnteError::InvalidMultisignature(format!(
                "bit array size {} does not match {} member keys",
                bitarray.count(),
                multisig.keys.len()
            )));
        }
        if bitarray.num_true_bits() != signatures.len() {
            return Err(AnteError::InvalidMultisignature(format!(
                "{} members marked as signed but {} signatures provided",
                bitarray.num_true_bits(),
                signatures.len()
            )));
        }

        let signed = multisig.keys.iter().enumerate().filter(|(i, _)| bitarray.get_index(*i));
        let mut total = 0u64;
        for ((_, key), signature) in signed.zip(signatures) {
            if matches!(signature, SignatureData::Multi { .. }) {
                return Err(AnteError::InvalidMultisignature(
                    "nested multisig signature data".to_string(),
                ));
            }
            let cost = self.key_cost(key)?;
            total = total.checked_add(cost).ok_or(AnteError::Overflow("multisig cost"))?;
        }
        Ok(total)
    }
}

/// Charges `meter` for verifying `signature`.
///
/// The full cost is computed before anything is charged, so an unsupported key or a malformed
/// multisig consumes no gas.
pub fn consume_signature_gas(
    meter: &mut GasMeter,
    signature: &SignatureV2,
    params: &AuthParams,
) -> Result<(), AnteError> {
    let cost = KeyCostModel::new(*params).cost(&signature.pub_key, &signature.data)?;
    trace!(target: "evm_ante::sig_gas", key = signature.pub_key.type_url(), cost, "Signature gas");
    meter.consume(cost, "signature verification")
}

/// Rejects transactions signed by more keys than [`AuthParams::tx_sig_limit`]. Every member of a
/// multisig key counts.
#[derive(Debug, Clone, Copy)]
pub struct ValidateSigCountDecorator {
    params: AuthParams,
}

impl ValidateSigCountDecorator {
    /// Creates the stage.
    pub const fn new(params: AuthParams) -> Self {
        Self { params }
    }
}

impl AnteDecorator for ValidateSigCountDecorator {
    fn name(&self) -> &'static str {
        "validate_sig_count"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> Result<(), AnteError> {
        let count = fee_tx(tx)?
            .signatures
            .iter()
            .map(|signature| signature.pub_key.count_sub_keys() as u64)
            .sum::<u64>();
        if count > self.params.tx_sig_limit {
            return Err(AnteError::TooManySignatures { count, limit: self.params.tx_sig_limit });
        }
        next.run(ctx, tx, simulate)
    }
}

/// Charges signature verification gas for every declared signature.
#[derive(Debug, Clone, Copy)]
pub struct SigGasConsumeDecorator {
    params: AuthParams,
}

impl SigGasConsumeDecorator {
    /// Creates the stage.
    pub const fn new(params: AuthParams) -> Self {
        Self { params }
    }
}

impl AnteDecorator for SigGasConsumeDecorator {
    fn name(&self) -> &'static str {
        "sig_gas_consume"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> Result<(), AnteError> {
        for signature in &fee_tx(tx)?.signatures {
            consume_signature_gas(&mut ctx.gas_meter, signature, &self.params)?;
        }
        next.run(ctx, tx, simulate)
    }
}
