//! Chain parameters and handler options.
//!
//! All structs deserialize from the chain's parameter JSON and provide `with_*` builder methods
//! for overriding individual fields, starting from the defaults.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{fee_market, limits, sig_gas, type_urls},
    Dec,
};

/// Parameters of the auth module governing basic validation and signature costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthParams {
    /// Maximum memo length, in bytes.
    pub max_memo_characters: u64,
    /// Maximum number of signing keys. Multisig members count individually.
    pub tx_sig_limit: u64,
    /// Gas charged per byte of the encoded transaction.
    pub tx_size_cost_per_byte: u64,
    /// Gas charged per `ed25519` signature.
    pub sig_verify_cost_ed25519: u64,
    /// Gas charged per Cosmos `secp256k1` signature.
    pub sig_verify_cost_secp256k1: u64,
}

impl Default for AuthParams {
    fn default() -> Self {
        Self {
            max_memo_characters: limits::DEFAULT_MAX_MEMO_CHARACTERS,
            tx_sig_limit: limits::DEFAULT_TX_SIG_LIMIT,
            tx_size_cost_per_byte: limits::DEFAULT_TX_SIZE_COST_PER_BYTE,
            sig_verify_cost_ed25519: sig_gas::DEFAULT_SIG_VERIFY_COST_ED25519,
            sig_verify_cost_secp256k1: sig_gas::DEFAULT_SIG_VERIFY_COST_SECP256K1,
        }
    }
}

impl AuthParams {
    /// Gas charged per `secp256r1` signature, half the `secp256k1` cost.
    pub const fn sig_verify_cost_secp256r1(&self) -> u64 {
        self.sig_verify_cost_secp256k1 / 2
    }

    /// Set the maximum memo length.
    pub const fn with_max_memo_characters(mut self, max: u64) -> Self {
        self.max_memo_characters = max;
        self
    }

    /// Set the maximum number of signing keys.
    pub const fn with_tx_sig_limit(mut self, limit: u64) -> Self {
        self.tx_sig_limit = limit;
        self
    }

    /// Set the gas charged per transaction byte.
    pub const fn with_tx_size_cost_per_byte(mut self, cost: u64) -> Self {
        self.tx_size_cost_per_byte = cost;
        self
    }

    /// Set the gas charged per `ed25519` signature.
    pub const fn with_sig_verify_cost_ed25519(mut self, cost: u64) -> Self {
        self.sig_verify_cost_ed25519 = cost;
        self
    }

    /// Set the gas charged per `secp256k1` signature.
    pub const fn with_sig_verify_cost_secp256k1(mut self, cost: u64) -> Self {
        self.sig_verify_cost_secp256k1 = cost;
        self
    }
}

/// Parameters of the fee market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeMarketParams {
    /// Disables the base fee entirely.
    pub no_base_fee: bool,
    /// Bounds the amount the base fee can change between blocks.
    pub base_fee_change_denominator: u32,
    /// Bounds the maximum gas limit of a block relative to its gas target.
    pub elasticity_multiplier: u32,
    /// Height from which the base fee applies.
    pub enable_height: u64,
    /// The current base fee.
    pub base_fee: U256,
    /// Chain-wide minimum gas price every transaction must pay.
    pub min_gas_price: Dec,
    /// Fraction of a block's gas wanted that counts towards the next base fee.
    pub min_gas_multiplier: Dec,
}

impl Default for FeeMarketParams {
    fn default() -> Self {
        Self {
            no_base_fee: false,
            base_fee_change_denominator: fee_market::BASE_FEE_CHANGE_DENOMINATOR,
            elasticity_multiplier: fee_market::ELASTICITY_MULTIPLIER,
            enable_height: 0,
            base_fee: U256::from(fee_market::DEFAULT_BASE_FEE),
            min_gas_price: Dec::ZERO,
            // 0.5
            min_gas_multiplier: Dec::from_raw(U256::from(500_000_000_000_000_000u64)),
        }
    }
}

impl FeeMarketParams {
    /// Returns `true` if the base fee applies at `height`.
    pub const fn is_base_fee_enabled(&self, height: u64) -> bool {
        !self.no_base_fee && height >= self.enable_height
    }

    /// Set whether the base fee is disabled.
    pub const fn with_no_base_fee(mut self, no_base_fee: bool) -> Self {
        self.no_base_fee = no_base_fee;
        self
    }

    /// Set the height from which the base fee applies.
    pub const fn with_enable_height(mut self, height: u64) -> Self {
        self.enable_height = height;
        self
    }

    /// Set the base fee.
    pub const fn with_base_fee(mut self, base_fee: U256) -> Self {
        self.base_fee = base_fee;
        self
    }

    /// Set the chain-wide minimum gas price.
    pub const fn with_min_gas_price(mut self, min_gas_price: Dec) -> Self {
        self.min_gas_price = min_gas_price;
        self
    }

    /// Set the gas wanted multiplier.
    pub const fn with_min_gas_multiplier(mut self, multiplier: Dec) -> Self {
        self.min_gas_multiplier = multiplier;
        self
    }

    /// Set the elasticity multiplier.
    pub const fn with_elasticity_multiplier(mut self, multiplier: u32) -> Self {
        self.elasticity_multiplier = multiplier;
        self
    }

    /// Set the base fee change denominator.
    pub const fn with_base_fee_change_denominator(mut self, denominator: u32) -> Self {
        self.base_fee_change_denominator = denominator;
        self
    }
}

/// Options of an [`crate::AnteHandler`] that do not change through governance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnteOptions {
    /// Denomination of EVM fees and values.
    pub evm_denom: String,
    /// EIP-155 chain id of the EVM.
    pub evm_chain_id: u64,
    /// Auth parameters.
    pub auth: AuthParams,
    /// Message types that may not be executed through delegated authority.
    pub disabled_nested_msgs: Vec<String>,
    /// Maximum gas a single transaction may declare.
    pub max_tx_gas_wanted: u64,
    /// Whether the chain-wide minimum gas price applies to simulated Cosmos transactions.
    pub enforce_min_gas_price_on_simulate: bool,
}

impl Default for AnteOptions {
    fn default() -> Self {
        Self {
            evm_denom: fee_market::DEFAULT_EVM_DENOM.to_string(),
            evm_chain_id: fee_market::DEFAULT_EVM_CHAIN_ID,
            auth: AuthParams::default(),
            disabled_nested_msgs: vec![
                type_urls::MSG_ETHEREUM_TX.to_string(),
                type_urls::MSG_CREATE_MONTHLY_VESTING_ACCOUNT.to_string(),
            ],
            max_tx_gas_wanted: limits::MAX_TX_GAS_WANTED,
            enforce_min_gas_price_on_simulate: true,
        }
    }
}

impl AnteOptions {
    /// Set the EVM denomination.
    pub fn with_evm_denom(mut self, denom: impl Into<String>) -> Self {
        self.evm_denom = denom.into();
        self
    }

    /// Set the EVM chain id.
    pub const fn with_evm_chain_id(mut self, chain_id: u64) -> Self {
        self.evm_chain_id = chain_id;
        self
    }

    /// Set the auth parameters.
    pub const fn with_auth(mut self, auth: AuthParams) -> Self {
        self.auth = auth;
        self
    }

    /// Set the message types that may not be executed through delegated authority.
    pub fn with_disabled_nested_msgs<I, S>(mut self, msgs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disabled_nested_msgs = msgs.into_iter().map(Into::into).collect();
        self
    }

    /// Set the maximum gas a single transaction may declare.
    pub const fn with_max_tx_gas_wanted(mut self, max: u64) -> Self {
        self.max_tx_gas_wanted = max;
        self
    }

    /// Set whether the minimum gas price applies to simulated Cosmos transactions.
    pub const fn with_enforce_min_gas_price_on_simulate(mut self, enforce: bool) -> Self {
        self.enforce_min_gas_price_on_simulate = enforce;
        self
    }
}
