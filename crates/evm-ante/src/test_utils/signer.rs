use core::cell::RefCell;

use alloy_consensus::TxEnvelope;
use alloy_primitives::{keccak256, map::HashMap, Address, Bytes, B256};
use serde_json::json;

use crate::{
    AnteError, EthSignerRecovery, MsgEthereumTx, PublicKey, SdkTx, SignMode, SignModeHandler,
    SignatureVerifier, SignerData,
};

/// A deterministic signature scheme: the signature of `msg` by a key is
/// `keccak256(key_bytes || msg)`.
///
/// It only proves that the signed bytes were not altered, which is all the admission stages rely
/// on.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeccakSignatureScheme;

impl KeccakSignatureScheme {
    /// Signs `msg` with `pub_key`. Multisig keys cannot sign and yield an empty signature.
    pub fn sign(pub_key: &PublicKey, msg: &[u8]) -> Bytes {
        let Some(key) = pub_key.key_bytes() else { return Bytes::new() };
        let mut preimage = key.to_vec();
        preimage.extend_from_slice(msg);
        Bytes::copy_from_slice(keccak256(preimage).as_slice())
    }
}

impl SignatureVerifier for KeccakSignatureScheme {
    fn verify(&self, pub_key: &PublicKey, msg: &[u8], signature: &[u8]) -> bool {
        pub_key.key_bytes().is_some() && Self::sign(pub_key, msg).as_ref() == signature
    }
}

/// Produces sign bytes as a canonical JSON document committing to the signer data and to
/// everything in the transaction except the signatures.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSignModeHandler;

impl SignModeHandler for JsonSignModeHandler {
    fn sign_bytes(
        &self,
        mode: SignMode,
        signer: &SignerData,
        tx: &SdkTx,
    ) -> Result<Bytes, AnteError> {
        let doc = json!({
            "mode": format!("{mode:?}"),
            "chain_id": signer.chain_id,
            "account_number": signer.account_number,
            "sequence": signer.sequence,
            "msgs": format!("{:?}", tx.msgs),
            "memo": tx.memo,
            "fee": tx.fee.amount.to_string(),
            "gas": tx.fee.gas_limit,
            "payer": tx.fee.payer.map(|payer| payer.to_string()),
            "timeout_height": tx.timeout_height,
            "extension_options": format!("{:?}", tx.extension_options),
        });
        Ok(doc.to_string().into_bytes().into())
    }
}

/// Recovers Ethereum signers from a registry of known payloads instead of their signatures.
#[derive(Debug, Default)]
pub struct StaticEthSigners {
    signers: RefCell<HashMap<B256, Address>>,
}

impl StaticEthSigners {
    /// Registers the declared sender of `msg` as the signer of its payload.
    pub fn register(&self, msg: &MsgEthereumTx) {
        self.register_signer(&msg.payload, msg.from);
    }

    /// Registers `signer` as the signer of `payload`.
    pub fn register_signer(&self, payload: &TxEnvelope, signer: Address) {
        self.signers.borrow_mut().insert(*payload.tx_hash(), signer);
    }
}

impl EthSignerRecovery for StaticEthSigners {
    fn recover_signer(&self, payload: &TxEnvelope) -> Option<Address> {
        self.signers.borrow().get(payload.tx_hash()).copied()
    }
}
