//! Transactions submitted for admission.

use alloy_primitives::Address;

use crate::{constants::type_urls, Coins, Msg, SignatureV2};

/// A transaction submitted for admission.
///
/// The variant decides which stage chain admits the transaction, see [`crate::AnteHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tx {
    /// A Cosmos transaction with arbitrary messages signed by Cosmos keys.
    Cosmos(SdkTx),
    /// A transaction wrapping one or more signed Ethereum transactions.
    Ethereum(SdkTx),
    /// A transaction without a fee, which no fee-aware stage accepts.
    Opaque(OpaqueTx),
}

impl Tx {
    /// Returns the messages of the transaction.
    pub fn msgs(&self) -> &[Msg] {
        match self {
            Self::Cosmos(tx) | Self::Ethereum(tx) => &tx.msgs,
            Self::Opaque(tx) => &tx.msgs,
        }
    }

    /// Returns the fee-bearing body of the transaction, if it has one.
    pub const fn as_fee_tx(&self) -> Option<&SdkTx> {
        match self {
            Self::Cosmos(tx) | Self::Ethereum(tx) => Some(tx),
            Self::Opaque(_) => None,
        }
    }

    /// Returns a short name of the transaction's shape.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Cosmos(_) => "cosmos",
            Self::Ethereum(_) => "ethereum",
            Self::Opaque(_) => "opaque",
        }
    }
}

/// The body of a fee-bearing transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SdkTx {
    /// The messages, in execution order.
    pub msgs: Vec<Msg>,
    /// The memo.
    pub memo: String,
    /// Height after which the transaction may no longer be included. Zero means no timeout.
    pub timeout_height: u64,
    /// Extension options.
    pub extension_options: Vec<ExtensionOption>,
    /// The fee.
    pub fee: Fee,
    /// Signatures, one per signer, in signer order.
    pub signatures: Vec<SignatureV2>,
    /// Size of the encoded transaction in bytes.
    pub tx_size: u64,
}

impl SdkTx {
    /// Returns the distinct addresses that must sign the transaction, in order of first
    /// appearance. An explicit fee payer that does not sign any message comes last.
    pub fn signers(&self) -> Vec<Address> {
        let mut signers = Vec::new();
        let payer = self.fee.payer.into_iter();
        for signer in self.msgs.iter().flat_map(Msg::signers).chain(payer) {
            if !signers.contains(&signer) {
                signers.push(signer);
            }
        }
        signers
    }

    /// Returns the account paying the fee: the explicit payer, or the first signer.
    pub fn fee_payer(&self) -> Option<Address> {
        self.fee.payer.or_else(|| self.msgs.first().and_then(|msg| msg.signers().first().copied()))
    }

    /// Returns the EIP-712 extension option, if present.
    pub fn web3_extension(&self) -> Option<(u64, Option<Address>)> {
        self.extension_options.iter().find_map(|option| match option {
            ExtensionOption::Web3Tx { typed_data_chain_id, fee_payer } => {
                Some((*typed_data_chain_id, *fee_payer))
            }
            _ => None,
        })
    }
}

/// A transaction that carries no fee.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpaqueTx {
    /// The messages.
    pub msgs: Vec<Msg>,
}

/// The fee a transaction pays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fee {
    /// The amount paid.
    pub amount: Coins,
    /// The declared gas limit.
    pub gas_limit: u64,
    /// The account paying the fee, if not the first signer.
    pub payer: Option<Address>,
}

impl Fee {
    /// Creates a new fee paid by the first signer.
    pub const fn new(amount: Coins, gas_limit: u64) -> Self {
        Self { amount, gas_limit, payer: None }
    }
}

/// A transaction extension option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionOption {
    /// Marks the transaction as wrapping Ethereum transactions.
    EthereumTx,
    /// Marks the transaction as signed with EIP-712 typed data.
    Web3Tx {
        /// The chain id the typed data commits to.
        typed_data_chain_id: u64,
        /// The fee payer the typed data declares.
        fee_payer: Option<Address>,
    },
    /// Any other option.
    Unknown {
        /// The option's type URL.
        type_url: String,
    },
}

impl ExtensionOption {
    /// Returns the type URL of the option.
    pub fn type_url(&self) -> &str {
        match self {
            Self::EthereumTx => type_urls::EXTENSION_OPTIONS_ETHEREUM_TX,
            Self::Web3Tx { .. } => type_urls::EXTENSION_OPTIONS_WEB3_TX,
            Self::Unknown { type_url } => type_url,
        }
    }
}
