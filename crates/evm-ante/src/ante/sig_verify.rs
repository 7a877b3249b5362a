//! Signature verification.

use alloy_consensus::Transaction;
use tracing::trace;

use super::{ethereum_msg, fee_tx, AnteDecorator, Next};
use crate::{
    constants::type_urls, AccountInfo, AccountKeeper, AnteEnvs, AnteError, Context,
    EthSignerRecovery, PublicKey, SdkTx, SignMode, SignModeHandler, SignatureData,
    SignatureVerifier, SignerData, Tx,
};

/// Verifies the Cosmos signatures of a transaction against the signers' accounts.
///
/// For each signer, in signer order, the account must exist and the signature must declare the
/// account's current sequence. An account without a public key adopts the one carried by its
/// signature. The signature bytes themselves are only checked outside simulation and re-check.
#[derive(Debug, Clone)]
pub struct SigVerificationDecorator<E> {
    env: E,
    evm_chain_id: u64,
}

impl<E: AnteEnvs> SigVerificationDecorator<E> {
    /// Creates the stage. `evm_chain_id` is the chain id EIP-712 signatures must commit to.
    pub const fn new(env: E, evm_chain_id: u64) -> Self {
        Self { env, evm_chain_id }
    }

    fn check_pub_key(
        &self,
        account: &AccountInfo,
        pub_key: &PublicKey,
        simulate: bool,
    ) -> Result<(), AnteError> {
        match &account.pub_key {
            None => self.env.accounts().set_pub_key(account.address, pub_key.clone()),
            // simulations may carry placeholder keys
            Some(stored) if stored != pub_key && !simulate => {
                Err(AnteError::InvalidPubKey(account.address))
            }
            Some(_) => Ok(()),
        }
    }

    /// Returns `Ok(false)` if the signature does not verify.
    fn verify_signature(
        &self,
        pub_key: &PublicKey,
        data: &SignatureData,
        signer: &SignerData,
        tx: &SdkTx,
    ) -> Result<bool, AnteError> {
        match (pub_key, data) {
            (PublicKey::LegacyMultisig(multisig), SignatureData::Multi { bitarray, signatures }) => {
                if bitarray.count() != multisig.keys.len()
                    || bitarray.num_true_bits() != signatures.len()
                {
                    return Err(AnteError::InvalidMultisignature(
                        "bit array does not match member keys or signatures".to_string(),
                    ));
                }
                if (signatures.len() as u64) < u64::from(multisig.threshold) {
                    return Ok(false);
                }
                let signed =
                    multisig.keys.iter().enumerate().filter(|(i, _)| bitarray.get_index(*i));
                for ((_, key), signature) in signed.zip(signatures) {
                    if !self.verify_signature(key, signature, signer, tx)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (PublicKey::LegacyMultisig(_), SignatureData::Single { .. })
            | (_, SignatureData::Multi { .. }) => Err(AnteError::InvalidMultisignature(
                "signature data does not match the key type".to_string(),
            )),
            (key, SignatureData::Single { mode, signature }) => {
                if *mode == SignMode::Eip712 {
                    self.check_typed_data_domain(tx)?;
                }
                let sign_bytes = self.env.sign_modes().sign_bytes(*mode, signer, tx)?;
                Ok(self.env.verifier().verify(key, &sign_bytes, signature))
            }
        }
    }

    /// EIP-712 signatures are only valid over typed data bound to this chain's EVM chain id.
    fn check_typed_data_domain(&self, tx: &SdkTx) -> Result<(), AnteError> {
        let (chain_id, _) = tx
            .web3_extension()
            .ok_or(AnteError::ExtensionOptionMissing(type_urls::EXTENSION_OPTIONS_WEB3_TX))?;
        if chain_id != self.evm_chain_id {
            return Err(AnteError::InvalidChainId { got: chain_id, expected: self.evm_chain_id });
        }
        Ok(())
    }
}

impl<E: AnteEnvs> AnteDecorator for SigVerificationDecorator<E> {
    fn name(&self) -> &'static str {
        "sig_verification"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> Result<(), AnteError> {
        let fee_tx = fee_tx(tx)?;
        let signers = fee_tx.signers();
        if signers.len() != fee_tx.signatures.len() {
            return Err(AnteError::SignerCountMismatch {
                expected: signers.len(),
                got: fee_tx.signatures.len(),
            });
        }

        for (address, signature) in signers.into_iter().zip(&fee_tx.signatures) {
            let account =
                self.env.accounts().account(address).ok_or(AnteError::UnknownAddress(address))?;
            self.check_pub_key(&account, &signature.pub_key, simulate)?;
            if signature.sequence != account.sequence {
                return Err(AnteError::WrongSequence {
                    expected: account.sequence,
                    got: signature.sequence,
                });
            }
            if simulate || ctx.is_recheck_tx() {
                continue;
            }

            let signer = SignerData {
                address,
                chain_id: ctx.header.chain_id.clone(),
                account_number: account.account_number,
                sequence: account.sequence,
            };
            if !self.verify_signature(&signature.pub_key, &signature.data, &signer, fee_tx)? {
                return Err(AnteError::TamperedAfterSigning {
                    account_number: signer.account_number,
                    sequence: signer.sequence,
                    chain_id: signer.chain_id,
                });
            }
            trace!(target: "evm_ante", %address, "Verified signature");
        }

        next.run(ctx, tx, simulate)
    }
}

/// Verifies that every wrapped Ethereum transaction was signed by its declared sender for this
/// chain.
#[derive(Debug, Clone)]
pub struct EthSigVerificationDecorator<E> {
    env: E,
    evm_chain_id: u64,
}

impl<E: AnteEnvs> EthSigVerificationDecorator<E> {
    /// Creates the stage.
    pub const fn new(env: E, evm_chain_id: u64) -> Self {
        Self { env, evm_chain_id }
    }
}

impl<E: AnteEnvs> AnteDecorator for EthSigVerificationDecorator<E> {
    fn name(&self) -> &'static str {
        "eth_sig_verification"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> Result<(), AnteError> {
        for msg in tx.msgs() {
            let msg = ethereum_msg(msg)?;
            // pre-EIP-155 legacy payloads carry no chain id
            if let Some(chain_id) = msg.payload.chain_id() {
                if chain_id != self.evm_chain_id {
                    return Err(AnteError::InvalidChainId {
                        got: chain_id,
                        expected: self.evm_chain_id,
                    });
                }
            }
            let recovered = self.env.eth_signers().recover_signer(&msg.payload);
            if recovered != Some(msg.from) {
                return Err(AnteError::InvalidSender { recovered, declared: msg.from });
            }
        }
        next.run(ctx, tx, simulate)
    }
}
