//! Constants for the transaction admission pipeline.
//!
//! It groups the constants by the concern they parameterise.

/// Gas costs charged while verifying transaction signatures.
pub mod sig_gas {
    /// Gas charged for verifying an Ethereum-style `secp256k1` signature. It mirrors the
    /// intrinsic base cost of an Ethereum transaction and is not governed by chain params.
    pub const ETH_SECP256K1_VERIFY_COST: u64 = 21_000;

    /// Default gas charged for verifying an `ed25519` signature.
    pub const DEFAULT_SIG_VERIFY_COST_ED25519: u64 = 590;

    /// Default gas charged for verifying a Cosmos `secp256k1` signature. The `secp256r1` cost is
    /// derived from it, see [`crate::AuthParams::sig_verify_cost_secp256r1`].
    pub const DEFAULT_SIG_VERIFY_COST_SECP256K1: u64 = 1_000;
}

/// Limits enforced by the basic validation stages.
pub mod limits {
    /// Default maximum memo length, in bytes.
    pub const DEFAULT_MAX_MEMO_CHARACTERS: u64 = 256;

    /// Default maximum number of keys that may sign a transaction. Multisig members count
    /// individually.
    pub const DEFAULT_TX_SIG_LIMIT: u64 = 7;

    /// Default gas charged per byte of the raw encoded transaction.
    pub const DEFAULT_TX_SIZE_COST_PER_BYTE: u64 = 10;

    /// Maximum gas a single transaction may declare.
    pub const MAX_TX_GAS_WANTED: u64 = i64::MAX as u64;

    /// Maximum depth of nested `MsgExec` wrappers.
    pub const MAX_NESTED_MSG_DEPTH: usize = 5;
}

/// Fee market defaults.
pub mod fee_market {
    /// Default base fee set at the first EIP-1559 block.
    pub const DEFAULT_BASE_FEE: u64 = 1_000_000_000;

    /// Bounds the amount the base fee can change between blocks.
    pub const BASE_FEE_CHANGE_DENOMINATOR: u32 = 8;

    /// Bounds the maximum gas limit an EIP-1559 block may have.
    pub const ELASTICITY_MULTIPLIER: u32 = 2;

    /// Default denomination used for EVM fees and values.
    pub const DEFAULT_EVM_DENOM: &str = "aevm";

    /// Default EIP-155 chain id.
    pub const DEFAULT_EVM_CHAIN_ID: u64 = 1291;
}

/// Type URLs of the messages, keys and extension options the pipeline recognises.
pub mod type_urls {
    /// Ethereum transaction wrapper message.
    pub const MSG_ETHEREUM_TX: &str = "/evm.v1.MsgHandleTx";
    /// Delegated execution message.
    pub const MSG_EXEC: &str = "/cosmos.authz.v1beta1.MsgExec";
    /// Authorization grant message.
    pub const MSG_GRANT: &str = "/cosmos.authz.v1beta1.MsgGrant";
    /// Bank transfer message.
    pub const MSG_SEND: &str = "/cosmos.bank.v1beta1.MsgSend";
    /// Monthly vesting account creation message.
    pub const MSG_CREATE_MONTHLY_VESTING_ACCOUNT: &str =
        "/vesting.v1.MsgCreateMonthlyVestingAccount";

    /// Generic authz authorization.
    pub const GENERIC_AUTHORIZATION: &str = "/cosmos.authz.v1beta1.GenericAuthorization";
    /// Bank send authorization.
    pub const SEND_AUTHORIZATION: &str = "/cosmos.bank.v1beta1.SendAuthorization";

    /// `ed25519` public key.
    pub const PUBKEY_ED25519: &str = "/cosmos.crypto.ed25519.PubKey";
    /// Ethereum `secp256k1` public key.
    pub const PUBKEY_ETH_SECP256K1: &str = "/ethermint.crypto.v1.ethsecp256k1.PubKey";
    /// `secp256r1` public key.
    pub const PUBKEY_SECP256R1: &str = "/cosmos.crypto.secp256r1.PubKey";
    /// Legacy amino multisig threshold public key.
    pub const PUBKEY_LEGACY_MULTISIG: &str = "/cosmos.crypto.multisig.LegacyAminoPubKey";

    /// Marks a transaction as a wrapped Ethereum transaction.
    pub const EXTENSION_OPTIONS_ETHEREUM_TX: &str = "/evm.v1.ExtensionOptionsEthereumTx";
    /// Marks a Cosmos transaction as signed with EIP-712 typed data.
    pub const EXTENSION_OPTIONS_WEB3_TX: &str = "/types.v1.ExtensionOptionsWeb3Tx";
}
