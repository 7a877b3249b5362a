//! Error types returned by the admission pipeline.
//!
//! Every rejection maps to exactly one [`AnteError`]. Each variant carries a stable ABCI result
//! code (see [`AnteError::code`]) registered under a codespace (see [`AnteError::codespace`]), so
//! that every validator reports byte-identical results for the same rejected transaction.

use alloy_primitives::{Address, U256};

/// Codespace of errors shared with the base SDK.
pub const SDK_CODESPACE: &str = "sdk";

/// Codespace of errors specific to the EVM admission stages.
pub const EVM_CODESPACE: &str = "evm";

/// Codespace of errors raised by the fee market stages.
pub const FEE_MARKET_CODESPACE: &str = "feemarket";

/// Error returned by an admission stage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnteError {
    /// The transaction does not have the shape the stage requires.
    #[error("invalid transaction type: {0}")]
    InvalidTransactionType(&'static str),

    /// A message has a type the stage does not accept.
    #[error("invalid message type: got {got}, expected {expected}")]
    InvalidMessageType {
        /// The type URL of the offending message.
        got: String,
        /// The expected message type.
        expected: &'static str,
    },

    /// A public key has a type with no registered verification cost.
    #[error("unrecognized public key type: {type_url}")]
    UnknownKeyType {
        /// The type URL of the public key.
        type_url: String,
    },

    /// A multisig signature does not line up with its multisig public key.
    #[error("invalid multisignature: {0}")]
    InvalidMultisignature(String),

    /// Consuming gas would exceed the gas meter's limit.
    #[error("out of gas in location: {descriptor}; gasWanted: {limit}, gasUsed: {needed}")]
    OutOfGas {
        /// What the gas was being consumed for.
        descriptor: &'static str,
        /// The gas meter's limit.
        limit: u64,
        /// The total gas the meter would have reached.
        needed: u64,
    },

    /// Admitting the transaction would exceed the block gas limit.
    #[error(
        "block gas limit exceeded: gas_wanted={gas_wanted}, block_total={block_total}, limit={limit}"
    )]
    BlockGasLimitExceeded {
        /// Gas wanted by the transaction.
        gas_wanted: u64,
        /// Gas wanted accumulated in the block before this transaction.
        block_total: u64,
        /// The block gas limit.
        limit: u64,
    },

    /// The transaction pays less than the chain-wide minimum gas price.
    #[error("provided fee < minimum global fee ({provided} < {required}). Please increase the gas price.")]
    MinFeeNotMet {
        /// The fee the transaction provides.
        provided: String,
        /// The minimum fee required.
        required: String,
    },

    /// The transaction pays less than the node-local mempool minimum.
    #[error("insufficient fee; got: {provided} required: {required}")]
    InsufficientFee {
        /// The fee the transaction provides.
        provided: String,
        /// The minimum fee required.
        required: String,
    },

    /// A vesting account tries to transfer more than its unlocked balance.
    #[error(
        "insufficient unlocked coins: account {address} has {spendable}{denom} spendable, \
         {requested}{denom} requested"
    )]
    InsufficientUnlockedCoins {
        /// The vesting account.
        address: Address,
        /// The pooled spendable balance left before the failing debit.
        spendable: U256,
        /// The value of the failing message.
        requested: U256,
        /// The denomination.
        denom: String,
    },

    /// An account cannot pay for the transaction.
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    /// Delegated execution wrappers are nested too deeply.
    #[error("found more nested msgs than permitted: limit is {limit}")]
    MaxDepthExceeded {
        /// The maximum number of nested wrappers.
        limit: usize,
    },

    /// A message type that may not be executed through delegated authority was found.
    #[error("found disabled msg type: {type_url}")]
    DisabledMessageType {
        /// The type URL of the disabled message.
        type_url: String,
    },

    /// The memo is longer than allowed.
    #[error("maximum number of characters is {max} but received {len} characters")]
    MemoTooLong {
        /// Maximum memo length.
        max: u64,
        /// Actual memo length.
        len: u64,
    },

    /// A required extension option is not present.
    #[error("missing extension option: {0}")]
    ExtensionOptionMissing(&'static str),

    /// An extension option the chain does not accept is present.
    #[error("unknown extension option: {type_url}")]
    UnknownExtensionOption {
        /// The type URL of the extension option.
        type_url: String,
    },

    /// The signature does not match the signed content.
    #[error("signature verification failed; please verify account number ({account_number}), sequence ({sequence}) and chain-id ({chain_id})")]
    TamperedAfterSigning {
        /// Account number of the signer.
        account_number: u64,
        /// Sequence of the signer.
        sequence: u64,
        /// Chain id the transaction was verified against.
        chain_id: String,
    },

    /// The signature was made for a different sequence.
    #[error("account sequence mismatch, expected {expected}, got {got}")]
    WrongSequence {
        /// The account's current sequence.
        expected: u64,
        /// The sequence the signature declares.
        got: u64,
    },

    /// An Ethereum payload carries a nonce different from the account sequence.
    #[error("invalid nonce; got {got}, expected {expected}")]
    InvalidNonce {
        /// The account's current sequence.
        expected: u64,
        /// The payload nonce.
        got: u64,
    },

    /// More keys signed the transaction than allowed.
    #[error("signatures: {count}, limit: {limit}")]
    TooManySignatures {
        /// Number of signing keys.
        count: u64,
        /// The configured limit.
        limit: u64,
    },

    /// The number of signatures does not match the number of signers.
    #[error("wrong number of signers; expected {expected}, got {got}")]
    SignerCountMismatch {
        /// Number of distinct signers required by the messages.
        expected: usize,
        /// Number of signatures provided.
        got: usize,
    },

    /// The transaction carries no signatures.
    #[error("no signatures supplied")]
    NoSignatures,

    /// A signer account does not exist.
    #[error("account {0} does not exist")]
    UnknownAddress(Address),

    /// The public key provided for a signer does not match the one stored on its account.
    #[error("pubkey does not match the key stored on account {0}")]
    InvalidPubKey(Address),

    /// The block height passed the transaction's timeout height.
    #[error("block height: {height}, timeout height: {timeout}")]
    TxTimeoutHeight {
        /// The current block height.
        height: u64,
        /// The transaction's timeout height.
        timeout: u64,
    },

    /// The declared gas limit is invalid.
    #[error("invalid gas limit: {0}")]
    InvalidGasLimit(String),

    /// A coin list is not sorted by denomination or repeats one.
    #[error("invalid coins: {0}")]
    InvalidCoins(String),

    /// An Ethereum-shaped transaction is malformed.
    #[error("invalid ethereum tx: {0}")]
    InvalidEthereumTx(String),

    /// The recovered signer of an Ethereum payload does not match the declared sender.
    #[error("invalid sender: recovered {recovered:?}, declared {declared}")]
    InvalidSender {
        /// The address recovered from the payload signature.
        recovered: Option<Address>,
        /// The declared sender.
        declared: Address,
    },

    /// The signature commits to a different chain.
    #[error("invalid chain id: got {got}, expected {expected}")]
    InvalidChainId {
        /// The chain id the signature commits to.
        got: u64,
        /// The chain's EVM chain id.
        expected: u64,
    },

    /// The transaction has no messages.
    #[error("must contain at least one message")]
    EmptyTx,

    /// An arithmetic operation overflowed.
    #[error("arithmetic overflow: {0}")]
    Overflow(&'static str),
}

impl AnteError {
    /// Returns the ABCI result code of the error. The code is never zero and is unique within
    /// the error's [codespace](Self::codespace), except where the SDK registry itself shares one
    /// code between related failures.
    pub const fn code(&self) -> u32 {
        match self {
            Self::InvalidMultisignature(_)
            | Self::TamperedAfterSigning { .. }
            | Self::SignerCountMismatch { .. } => 4,
            Self::InsufficientFunds(_) => 5,
            Self::InvalidTransactionType(_) | Self::InvalidMessageType { .. } => 6,
            Self::UnknownKeyType { .. } | Self::InvalidPubKey(_) => 8,
            Self::UnknownAddress(_) => 9,
            Self::InvalidCoins(_) => 10,
            Self::OutOfGas { .. } => 11,
            Self::MemoTooLong { .. } => 12,
            Self::InsufficientFee { .. } => 13,
            Self::TooManySignatures { .. } => 14,
            Self::NoSignatures => 15,
            Self::EmptyTx => 18,
            Self::TxTimeoutHeight { .. } => 30,
            Self::UnknownExtensionOption { .. } => 31,
            Self::WrongSequence { .. } => 32,
            Self::Overflow(_) => 35,
            Self::InvalidGasLimit(_) => 41,

            Self::InvalidEthereumTx(_) | Self::MinFeeNotMet { .. } => 2,
            Self::InvalidSender { .. } | Self::BlockGasLimitExceeded { .. } => 3,
            Self::InvalidNonce { .. } => 4,
            Self::ExtensionOptionMissing(_) => 5,
            Self::InsufficientUnlockedCoins { .. } => 6,
            Self::MaxDepthExceeded { .. } => 7,
            Self::DisabledMessageType { .. } => 8,
            Self::InvalidChainId { .. } => 9,
        }
    }

    /// Returns the codespace the error's [code](Self::code) is registered under.
    pub const fn codespace(&self) -> &'static str {
        match self {
            Self::MinFeeNotMet { .. } | Self::BlockGasLimitExceeded { .. } => FEE_MARKET_CODESPACE,
            Self::InvalidEthereumTx(_)
            | Self::InvalidSender { .. }
            | Self::InvalidNonce { .. }
            | Self::ExtensionOptionMissing(_)
            | Self::InsufficientUnlockedCoins { .. }
            | Self::MaxDepthExceeded { .. }
            | Self::DisabledMessageType { .. }
            | Self::InvalidChainId { .. } => EVM_CODESPACE,
            _ => SDK_CODESPACE,
        }
    }

    /// Returns `true` if the error is [`AnteError::OutOfGas`].
    pub const fn is_out_of_gas(&self) -> bool {
        matches!(self, Self::OutOfGas { .. })
    }
}

/// A rejected transaction, as reported by [`crate::AnteHandler::ante_handle`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{stage}: {error}")]
pub struct AnteRejection {
    /// Name of the stage that rejected the transaction.
    pub stage: &'static str,
    /// The error the stage returned.
    #[source]
    pub error: AnteError,
    /// Gas consumed on the transaction gas meter before the rejection.
    pub gas_used: u64,
}

impl AnteRejection {
    /// Returns the ABCI result code of the rejection.
    pub const fn code(&self) -> u32 {
        self.error.code()
    }

    /// Returns the codespace of the rejection.
    pub const fn codespace(&self) -> &'static str {
        self.error.codespace()
    }
}
