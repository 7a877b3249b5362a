//! Collaborators the admission stages read state from and write state through.
//!
//! Stages only call these traits. Writes ([`AccountKeeper::increment_sequence`],
//! [`AccountKeeper::set_pub_key`], [`BankKeeper::deduct_fees`]) are expected to land in a store
//! branch the block driver discards when [`crate::AnteHandler::ante_handle`] rejects the
//! transaction.

use core::fmt::Debug;

use alloy_consensus::{transaction::SignerRecoverable, TxEnvelope};
use alloy_primitives::{Address, Bytes, U256};
use auto_impl::auto_impl;

use crate::{AnteError, Coins, FeeMarketParams, PublicKey, SdkTx, SignMode};

/// An account as seen by the admission stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    /// The account address.
    pub address: Address,
    /// The account number.
    pub account_number: u64,
    /// The next sequence the account must sign with.
    pub sequence: u64,
    /// The public key, once the account signed its first transaction.
    pub pub_key: Option<PublicKey>,
}

/// Account and balance oracle.
#[auto_impl(&, Box, Rc, Arc)]
pub trait AccountKeeper: Debug {
    /// Returns the account at `address`, if it exists.
    fn account(&self, address: Address) -> Option<AccountInfo>;

    /// Returns the next sequence of the account at `address`.
    fn sequence(&self, address: Address) -> Option<u64> {
        self.account(address).map(|account| account.sequence)
    }

    /// Stores the public key of the account at `address`.
    fn set_pub_key(&self, address: Address, pub_key: PublicKey) -> Result<(), AnteError>;

    /// Increments the sequence of the account at `address` and returns the new sequence.
    fn increment_sequence(&self, address: Address) -> Result<u64, AnteError>;

    /// Returns `true` if the account at `address` is a vesting account.
    fn is_vesting_account(&self, address: Address) -> bool;

    /// Returns the balance of `denom` the account at `address` may spend at `block_time`.
    fn spendable_balance(&self, address: Address, denom: &str, block_time: u64) -> U256;
}

/// Fee collection.
#[auto_impl(&, Box, Rc, Arc)]
pub trait BankKeeper: Debug {
    /// Returns the total balance of `denom` held by `address`.
    fn balance(&self, address: Address, denom: &str) -> U256;

    /// Moves `fees` from `payer` to the fee collector.
    fn deduct_fees(&self, payer: Address, fees: &Coins) -> Result<(), AnteError>;
}

/// Fee market parameter store.
#[auto_impl(&, Box, Rc, Arc)]
pub trait FeeMarketKeeper: Debug {
    /// Returns the fee market parameters.
    fn params(&self) -> FeeMarketParams;

    /// Returns the base fee, or `None` if the base fee is disabled.
    fn base_fee(&self) -> Option<U256> {
        let params = self.params();
        (!params.no_base_fee).then_some(params.base_fee)
    }

    /// Stores a new base fee.
    fn set_base_fee(&self, base_fee: U256);

    /// Returns the gas wanted recorded for the parent block.
    fn block_gas_wanted(&self) -> u64;

    /// Records the gas wanted of the current block.
    fn set_block_gas_wanted(&self, gas_wanted: u64);
}

/// Data a signer commits to besides the transaction itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerData {
    /// The signer address.
    pub address: Address,
    /// The Cosmos chain id.
    pub chain_id: String,
    /// The signer's account number.
    pub account_number: u64,
    /// The signer's sequence.
    pub sequence: u64,
}

/// Computes the bytes a signer signs for a given sign mode.
#[auto_impl(&, Box, Rc, Arc)]
pub trait SignModeHandler: Debug {
    /// Returns the bytes `signer` signed over `tx` in `mode`.
    fn sign_bytes(
        &self,
        mode: SignMode,
        signer: &SignerData,
        tx: &SdkTx,
    ) -> Result<Bytes, AnteError>;
}

/// Verifies signatures made by Cosmos keys.
#[auto_impl(&, Box, Rc, Arc)]
pub trait SignatureVerifier: Debug {
    /// Returns `true` if `signature` is a valid signature of `msg` by `pub_key`.
    fn verify(&self, pub_key: &PublicKey, msg: &[u8], signature: &[u8]) -> bool;
}

/// Recovers the signer of an Ethereum transaction.
#[auto_impl(&, Box, Rc, Arc)]
pub trait EthSignerRecovery: Debug {
    /// Returns the address that signed `payload`, or `None` if the signature is invalid.
    fn recover_signer(&self, payload: &TxEnvelope) -> Option<Address>;
}

/// Recovers Ethereum signers from the payload's ECDSA signature.
#[derive(Debug, Clone, Copy, Default)]
pub struct EcdsaSignerRecovery;

impl EthSignerRecovery for EcdsaSignerRecovery {
    fn recover_signer(&self, payload: &TxEnvelope) -> Option<Address> {
        payload.recover_signer().ok()
    }
}

/// A collection trait that aggregates every collaborator of the admission pipeline, so that the
/// handler needs a single type parameter.
#[auto_impl(&, Box, Rc, Arc)]
pub trait AnteEnvs: Debug {
    /// Account oracle.
    type Accounts: AccountKeeper;
    /// Fee collection.
    type Bank: BankKeeper;
    /// Fee market parameter store.
    type FeeMarket: FeeMarketKeeper;
    /// Sign bytes oracle.
    type SignModes: SignModeHandler;
    /// Cosmos signature verifier.
    type Verifier: SignatureVerifier;
    /// Ethereum signer recovery.
    type EthSigners: EthSignerRecovery;

    /// Returns the account oracle.
    fn accounts(&self) -> &Self::Accounts;
    /// Returns the fee collector.
    fn bank(&self) -> &Self::Bank;
    /// Returns the fee market parameter store.
    fn fee_market(&self) -> &Self::FeeMarket;
    /// Returns the sign bytes oracle.
    fn sign_modes(&self) -> &Self::SignModes;
    /// Returns the Cosmos signature verifier.
    fn verifier(&self) -> &Self::Verifier;
    /// Returns the Ethereum signer recovery.
    fn eth_signers(&self) -> &Self::EthSigners;
}
