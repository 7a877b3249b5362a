use alloy_consensus::{SignableTransaction, TxEip1559, TxEnvelope, TxLegacy};
use alloy_primitives::{Address, Bytes, Signature, TxKind, U256};

use super::{
    JsonSignModeHandler, KeccakSignatureScheme, MemoryAccountKeeper, MemoryFeeMarket,
    StaticEthSigners,
};
use crate::{
    constants::fee_market::{DEFAULT_EVM_CHAIN_ID, DEFAULT_EVM_DENOM},
    AccountKeeper, AnteEnvs, Coins, CompactBitArray, ExtensionOption, Fee, LegacyMultisigKey, Msg,
    MsgEthereumTx, PublicKey, SdkTx, SignMode, SignModeHandler, SignatureData, SignatureV2,
    SignerData, Tx,
};

/// Cosmos chain id used by the test environment.
pub const TEST_CHAIN_ID: &str = "evm_1291-1";

/// Every collaborator of the admission pipeline, backed by memory.
#[derive(Debug, Default)]
pub struct TestEnv {
    /// Accounts and balances.
    pub accounts: MemoryAccountKeeper,
    /// Fee market store.
    pub fee_market: MemoryFeeMarket,
    /// Sign bytes.
    pub sign_modes: JsonSignModeHandler,
    /// Signature verification.
    pub verifier: KeccakSignatureScheme,
    /// Ethereum signer registry.
    pub eth_signers: StaticEthSigners,
}

impl TestEnv {
    /// Creates an environment with the given accounts and fee market.
    pub fn new(accounts: MemoryAccountKeeper, fee_market: MemoryFeeMarket) -> Self {
        Self { accounts, fee_market, ..Default::default() }
    }

    /// Builds `builder` and registers its sender as the payload's signer.
    pub fn signed_eth_msg(&self, builder: EthTxBuilder) -> MsgEthereumTx {
        let msg = builder.build();
        self.eth_signers.register(&msg);
        msg
    }

    /// Signs `tx` with `signers`, in order, and returns it as a Cosmos transaction.
    ///
    /// Account numbers and sequences are taken from the accounts store. Unknown accounts sign
    /// with zeroes.
    pub fn sign_cosmos_tx(&self, tx: SdkTx, signers: &[&TestSigner], mode: SignMode) -> Tx {
        let mut tx = tx;
        tx.signatures = signers
            .iter()
            .map(|signer| {
                let account = self.accounts.account(signer.address());
                let signer_data = SignerData {
                    address: signer.address(),
                    chain_id: TEST_CHAIN_ID.to_string(),
                    account_number: account.as_ref().map_or(0, |account| account.account_number),
                    sequence: account.as_ref().map_or(0, |account| account.sequence),
                };
                let sign_bytes = self.sign_modes.sign_bytes(mode, &signer_data, &tx).unwrap();
                SignatureV2 {
                    pub_key: signer.pub_key(),
                    data: signer.sign(mode, &sign_bytes),
                    sequence: signer_data.sequence,
                }
            })
            .collect();
        Tx::Cosmos(tx)
    }
}

impl AnteEnvs for TestEnv {
    type Accounts = MemoryAccountKeeper;
    type Bank = MemoryAccountKeeper;
    type FeeMarket = MemoryFeeMarket;
    type SignModes = JsonSignModeHandler;
    type Verifier = KeccakSignatureScheme;
    type EthSigners = StaticEthSigners;

    fn accounts(&self) -> &Self::Accounts {
        &self.accounts
    }

    fn bank(&self) -> &Self::Bank {
        &self.accounts
    }

    fn fee_market(&self) -> &Self::FeeMarket {
        &self.fee_market
    }

    fn sign_modes(&self) -> &Self::SignModes {
        &self.sign_modes
    }

    fn verifier(&self) -> &Self::Verifier {
        &self.verifier
    }

    fn eth_signers(&self) -> &Self::EthSigners {
        &self.eth_signers
    }
}

/// A Cosmos signer: a single key, or a multisig key of which some members sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestSigner {
    /// A single key.
    Single {
        /// The account address.
        address: Address,
        /// The key.
        pub_key: PublicKey,
    },
    /// A multisig key.
    Multisig {
        /// The account address.
        address: Address,
        /// The multisig key.
        key: LegacyMultisigKey,
        /// Indices of the members that sign.
        signing: Vec<usize>,
    },
}

impl TestSigner {
    /// An `ed25519` signer whose address and key are derived from `seed`.
    pub fn ed25519(seed: u8) -> Self {
        Self::Single {
            address: Address::repeat_byte(seed),
            pub_key: PublicKey::Ed25519(Bytes::from(vec![seed; 32])),
        }
    }

    /// An Ethereum `secp256k1` signer whose address and key are derived from `seed`.
    pub fn eth_secp256k1(seed: u8) -> Self {
        Self::Single {
            address: Address::repeat_byte(seed),
            pub_key: PublicKey::EthSecp256k1(Bytes::from(vec![seed; 33])),
        }
    }

    /// A `secp256r1` signer whose address and key are derived from `seed`.
    pub fn secp256r1(seed: u8) -> Self {
        Self::Single {
            address: Address::repeat_byte(seed),
            pub_key: PublicKey::Secp256r1(Bytes::from(vec![seed; 33])),
        }
    }

    /// A multisig signer over `members` at `address`, signed by the members at `signing`.
    pub fn multisig(
        address: Address,
        threshold: u32,
        members: &[Self],
        signing: impl IntoIterator<Item = usize>,
    ) -> Self {
        Self::Multisig {
            address,
            key: LegacyMultisigKey { threshold, keys: members.iter().map(Self::pub_key).collect() },
            signing: signing.into_iter().collect(),
        }
    }

    /// Returns the account address.
    pub const fn address(&self) -> Address {
        match self {
            Self::Single { address, .. } | Self::Multisig { address, .. } => *address,
        }
    }

    /// Returns the public key.
    pub fn pub_key(&self) -> PublicKey {
        match self {
            Self::Single { pub_key, .. } => pub_key.clone(),
            Self::Multisig { key, .. } => PublicKey::LegacyMultisig(key.clone()),
        }
    }

    /// Signs `sign_bytes` in `mode`.
    pub fn sign(&self, mode: SignMode, sign_bytes: &[u8]) -> SignatureData {
        match self {
            Self::Single { pub_key, .. } => SignatureData::Single {
                mode,
                signature: KeccakSignatureScheme::sign(pub_key, sign_bytes),
            },
            Self::Multisig { key, signing, .. } => {
                let bitarray = CompactBitArray::with_set(key.keys.len(), signing).unwrap();
                let signatures = key
                    .keys
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| bitarray.get_index(*i))
                    .map(|(_, member)| SignatureData::Single {
                        mode,
                        signature: KeccakSignatureScheme::sign(member, sign_bytes),
                    })
                    .collect();
                SignatureData::Multi { bitarray, signatures }
            }
        }
    }
}

/// Builds the body of a Cosmos transaction.
#[derive(Debug, Clone, Default)]
pub struct CosmosTxBuilder {
    tx: SdkTx,
}

impl CosmosTxBuilder {
    /// Starts a transaction carrying `msgs`.
    pub fn new(msgs: impl IntoIterator<Item = Msg>) -> Self {
        Self { tx: SdkTx { msgs: msgs.into_iter().collect(), ..Default::default() } }
    }

    /// Sets the fee.
    pub fn fee(mut self, amount: Coins, gas_limit: u64) -> Self {
        self.tx.fee.amount = amount;
        self.tx.fee.gas_limit = gas_limit;
        self
    }

    /// Sets an explicit fee payer.
    pub const fn payer(mut self, payer: Address) -> Self {
        self.tx.fee.payer = Some(payer);
        self
    }

    /// Sets the memo.
    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.tx.memo = memo.into();
        self
    }

    /// Sets the timeout height.
    pub const fn timeout_height(mut self, height: u64) -> Self {
        self.tx.timeout_height = height;
        self
    }

    /// Adds an extension option.
    pub fn extension_option(mut self, option: ExtensionOption) -> Self {
        self.tx.extension_options.push(option);
        self
    }

    /// Sets the encoded size.
    pub const fn tx_size(mut self, size: u64) -> Self {
        self.tx.tx_size = size;
        self
    }

    /// Returns the unsigned body.
    pub fn build(self) -> SdkTx {
        self.tx
    }
}

/// Wraps `msgs` into an Ethereum transaction whose fee and gas limit are the sums over the
/// payloads, paid in the default EVM denomination.
pub fn ethereum_tx(msgs: impl IntoIterator<Item = MsgEthereumTx>) -> Tx {
    let msgs: Vec<MsgEthereumTx> = msgs.into_iter().collect();
    let gas_limit = msgs.iter().map(MsgEthereumTx::gas).sum();
    let fee = msgs.iter().map(|msg| msg.fee().unwrap()).fold(U256::ZERO, |acc, fee| acc + fee);
    Tx::Ethereum(SdkTx {
        msgs: msgs.into_iter().map(Msg::from).collect(),
        extension_options: vec![ExtensionOption::EthereumTx],
        fee: Fee::new(Coins::single(DEFAULT_EVM_DENOM, fee), gas_limit),
        ..Default::default()
    })
}

#[derive(Debug, Clone, Copy)]
enum EthFee {
    Legacy { gas_price: u128 },
    Dynamic { tip: u128, fee_cap: u128 },
}

/// Builds a wrapped Ethereum transaction.
///
/// Payloads carry a placeholder signature; use [`TestEnv::signed_eth_msg`] to make the sender
/// recoverable.
#[derive(Debug, Clone)]
pub struct EthTxBuilder {
    from: Address,
    fee: EthFee,
    nonce: u64,
    gas_limit: u64,
    value: U256,
    to: TxKind,
    chain_id: Option<u64>,
}

impl EthTxBuilder {
    fn new(from: Address, fee: EthFee) -> Self {
        Self {
            from,
            fee,
            nonce: 0,
            gas_limit: 21_000,
            value: U256::ZERO,
            to: TxKind::Call(Address::repeat_byte(0xee)),
            chain_id: Some(DEFAULT_EVM_CHAIN_ID),
        }
    }

    /// A legacy payload paying a flat `gas_price`.
    pub fn legacy(from: Address, gas_price: u128) -> Self {
        Self::new(from, EthFee::Legacy { gas_price })
    }

    /// An EIP-1559 payload with the given tip and fee cap.
    pub fn dynamic(from: Address, tip: u128, fee_cap: u128) -> Self {
        Self::new(from, EthFee::Dynamic { tip, fee_cap })
    }

    /// Sets the nonce.
    pub const fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    /// Sets the gas limit.
    pub const fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    /// Sets the transferred value.
    pub fn value(mut self, value: impl Into<U256>) -> Self {
        self.value = value.into();
        self
    }

    /// Makes the payload a contract creation.
    pub const fn create(mut self) -> Self {
        self.to = TxKind::Create;
        self
    }

    /// Sets the chain id. `None` builds a pre-EIP-155 legacy payload.
    pub const fn chain_id(mut self, chain_id: Option<u64>) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Builds the message.
    pub fn build(self) -> MsgEthereumTx {
        let signature = Signature::test_signature();
        let payload: TxEnvelope = match self.fee {
            EthFee::Legacy { gas_price } => TxLegacy {
                chain_id: self.chain_id,
                nonce: self.nonce,
                gas_price,
                gas_limit: self.gas_limit,
                to: self.to,
                value: self.value,
                input: Bytes::new(),
            }
            .into_signed(signature)
            .into(),
            EthFee::Dynamic { tip, fee_cap } => TxEip1559 {
                chain_id: self.chain_id.unwrap_or_default(),
                nonce: self.nonce,
                gas_limit: self.gas_limit,
                max_fee_per_gas: fee_cap,
                max_priority_fee_per_gas: tip,
                to: self.to,
                value: self.value,
                ..Default::default()
            }
            .into_signed(signature)
            .into(),
        };
        MsgEthereumTx::new(payload, self.from)
    }
}
