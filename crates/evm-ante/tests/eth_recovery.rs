//! Sender recovery from real ECDSA signatures on Ethereum payloads.

use std::rc::Rc;

use alloy_consensus::{SignableTransaction, TxEip1559, TxEnvelope, TxLegacy};
use alloy_primitives::{address, b256, Address, Signature, TxKind, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use evm_ante::{
    constants::fee_market::DEFAULT_EVM_CHAIN_ID,
    test_utils::{
        ethereum_tx, JsonSignModeHandler, KeccakSignatureScheme, MemoryAccountKeeper,
        MemoryFeeMarket, TestEnv, TEST_CHAIN_ID,
    },
    AnteEnvs, AnteError, AnteHandler, Context, EcdsaSignerRecovery, EthSigVerificationDecorator,
    EthSignerRecovery, MsgEthereumTx,
};
use rstest::rstest;

/// The key used by the EIP-155 example transaction.
fn signer() -> PrivateKeySigner {
    let key = b256!("0x4646464646464646464646464646464646464646464646464646464646464646");
    PrivateKeySigner::from_bytes(&key).unwrap()
}

const SENDER: Address = address!("0x9d8A62f656a8d1615C1294fd71e9CFb3E4855A4F");

/// The in-memory environment, recovering Ethereum senders from their signatures.
#[derive(Debug, Default)]
struct EcdsaEnv {
    inner: TestEnv,
    eth_signers: EcdsaSignerRecovery,
}

impl AnteEnvs for EcdsaEnv {
    type Accounts = MemoryAccountKeeper;
    type Bank = MemoryAccountKeeper;
    type FeeMarket = MemoryFeeMarket;
    type SignModes = JsonSignModeHandler;
    type Verifier = KeccakSignatureScheme;
    type EthSigners = EcdsaSignerRecovery;

    fn accounts(&self) -> &Self::Accounts {
        &self.inner.accounts
    }

    fn bank(&self) -> &Self::Bank {
        &self.inner.accounts
    }

    fn fee_market(&self) -> &Self::FeeMarket {
        &self.inner.fee_market
    }

    fn sign_modes(&self) -> &Self::SignModes {
        &self.inner.sign_modes
    }

    fn verifier(&self) -> &Self::Verifier {
        &self.inner.verifier
    }

    fn eth_signers(&self) -> &Self::EthSigners {
        &self.eth_signers
    }
}

fn legacy(value: u64) -> TxLegacy {
    TxLegacy {
        chain_id: Some(DEFAULT_EVM_CHAIN_ID),
        nonce: 9,
        gas_price: 20_000_000_000,
        gas_limit: 21_000,
        to: TxKind::Call(address!("0x3535353535353535353535353535353535353535")),
        value: U256::from(value),
        ..Default::default()
    }
}

fn dynamic(value: u64) -> TxEip1559 {
    TxEip1559 {
        chain_id: DEFAULT_EVM_CHAIN_ID,
        nonce: 9,
        gas_limit: 21_000,
        max_fee_per_gas: 20_000_000_000,
        max_priority_fee_per_gas: 1_000_000_000,
        to: TxKind::Call(address!("0x3535353535353535353535353535353535353535")),
        value: U256::from(value),
        ..Default::default()
    }
}

fn sign<T: SignableTransaction<Signature>>(tx: &T) -> Signature {
    signer().sign_hash_sync(&tx.signature_hash()).unwrap()
}

/// A signed payload, and the same signature attached to a payload moving a different value.
fn payloads(kind: &str) -> (TxEnvelope, TxEnvelope) {
    match kind {
        "legacy" => {
            let signature = sign(&legacy(1_000));
            (
                legacy(1_000).into_signed(signature).into(),
                legacy(2_000).into_signed(signature).into(),
            )
        }
        _ => {
            let signature = sign(&dynamic(1_000));
            (
                dynamic(1_000).into_signed(signature).into(),
                dynamic(2_000).into_signed(signature).into(),
            )
        }
    }
}

fn verify(payload: TxEnvelope) -> Result<(), AnteError> {
    let env = Rc::new(EcdsaEnv::default());
    let handler = AnteHandler::from_chains(
        Vec::new(),
        vec![Box::new(EthSigVerificationDecorator::new(env, DEFAULT_EVM_CHAIN_ID))],
    );
    let tx = ethereum_tx([MsgEthereumTx::new(payload, SENDER)]);
    handler.ante_handle(&mut Context::new(TEST_CHAIN_ID, 1, 0), &tx, false).map_err(|rejection| {
        assert_eq!(rejection.stage, "eth_sig_verification");
        rejection.error
    })
}

#[test]
fn test_key_derives_sender() {
    assert_eq!(signer().address(), SENDER);
}

#[rstest]
#[case::legacy("legacy")]
#[case::dynamic("dynamic")]
fn test_recover_signer(#[case] kind: &str) {
    let (signed, _) = payloads(kind);
    assert_eq!(EcdsaSignerRecovery.recover_signer(&signed), Some(SENDER));
    assert_eq!(verify(signed), Ok(()));
}

#[rstest]
#[case::legacy("legacy")]
#[case::dynamic("dynamic")]
fn test_tampered_payload_rejected(#[case] kind: &str) {
    let (_, tampered) = payloads(kind);
    assert_ne!(EcdsaSignerRecovery.recover_signer(&tampered), Some(SENDER));
    let err = verify(tampered).unwrap_err();
    assert!(
        matches!(err, AnteError::InvalidSender { declared, .. } if declared == SENDER),
        "{err}"
    );
    assert_eq!(err.codespace(), "evm");
}
