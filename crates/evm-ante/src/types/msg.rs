//! Transaction messages.

use alloy_consensus::{Transaction, TxEnvelope};
use alloy_primitives::{Address, U256};

use crate::{constants::type_urls, Coins};

/// A message carried by a transaction.
///
/// The set of messages the admission stages need to tell apart is closed; every other message is
/// an [`AnyMsg`] identified by its type URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// A wrapped Ethereum transaction.
    Ethereum(MsgEthereumTx),
    /// Messages executed on behalf of their signers by a grantee.
    Exec(MsgExec),
    /// An authorization grant.
    Grant(MsgGrant),
    /// A bank transfer.
    Send(MsgSend),
    /// Any other message.
    Other(AnyMsg),
}

impl Msg {
    /// Returns the type URL of the message.
    pub fn type_url(&self) -> &str {
        match self {
            Self::Ethereum(_) => type_urls::MSG_ETHEREUM_TX,
            Self::Exec(_) => type_urls::MSG_EXEC,
            Self::Grant(_) => type_urls::MSG_GRANT,
            Self::Send(_) => type_urls::MSG_SEND,
            Self::Other(msg) => &msg.type_url,
        }
    }

    /// Returns the addresses that must sign the message.
    pub fn signers(&self) -> Vec<Address> {
        match self {
            Self::Ethereum(msg) => vec![msg.from],
            Self::Exec(msg) => vec![msg.grantee],
            Self::Grant(msg) => vec![msg.granter],
            Self::Send(msg) => vec![msg.from],
            Self::Other(msg) => msg.signers.clone(),
        }
    }

    /// Returns the wrapped Ethereum transaction, if this is one.
    pub const fn as_ethereum(&self) -> Option<&MsgEthereumTx> {
        match self {
            Self::Ethereum(msg) => Some(msg),
            _ => None,
        }
    }
}

impl From<MsgEthereumTx> for Msg {
    fn from(msg: MsgEthereumTx) -> Self {
        Self::Ethereum(msg)
    }
}

impl From<MsgExec> for Msg {
    fn from(msg: MsgExec) -> Self {
        Self::Exec(msg)
    }
}

impl From<MsgGrant> for Msg {
    fn from(msg: MsgGrant) -> Self {
        Self::Grant(msg)
    }
}

impl From<MsgSend> for Msg {
    fn from(msg: MsgSend) -> Self {
        Self::Send(msg)
    }
}

impl From<AnyMsg> for Msg {
    fn from(msg: AnyMsg) -> Self {
        Self::Other(msg)
    }
}

/// An Ethereum transaction wrapped into a Cosmos message.
///
/// The signature is embedded in the payload rather than declared by the enclosing transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsgEthereumTx {
    /// The signed Ethereum transaction.
    pub payload: TxEnvelope,
    /// The declared sender. Must match the signer recovered from the payload.
    pub from: Address,
}

impl MsgEthereumTx {
    /// Creates a new message.
    pub const fn new(payload: TxEnvelope, from: Address) -> Self {
        Self { payload, from }
    }

    /// Returns the gas limit of the payload.
    pub fn gas(&self) -> u64 {
        self.payload.gas_limit()
    }

    /// Returns the value the payload transfers.
    pub fn value(&self) -> U256 {
        self.payload.value()
    }

    /// Returns the nonce of the payload.
    pub fn nonce(&self) -> u64 {
        self.payload.nonce()
    }

    /// Returns `true` if the payload carries a tip and a fee cap instead of a flat gas price.
    pub fn is_dynamic_fee(&self) -> bool {
        self.payload.is_dynamic_fee()
    }

    /// Returns the flat gas price of a legacy payload, or the fee cap of a dynamic-fee payload.
    pub fn gas_fee_cap(&self) -> U256 {
        U256::from(self.payload.max_fee_per_gas())
    }

    /// Returns the tip of a dynamic-fee payload, or the flat gas price of a legacy payload.
    pub fn gas_tip_cap(&self) -> U256 {
        U256::from(
            self.payload.max_priority_fee_per_gas().unwrap_or_else(|| self.payload.max_fee_per_gas()),
        )
    }

    /// Returns the maximum fee the payload may pay: fee cap times gas limit.
    pub fn fee(&self) -> Option<U256> {
        self.gas_fee_cap().checked_mul(U256::from(self.gas()))
    }

    /// Returns the gas price the payload actually pays.
    ///
    /// A legacy payload pays its flat gas price. A dynamic-fee payload pays
    /// `min(tip + base_fee, fee_cap)`; without a base fee it pays its fee cap.
    pub fn effective_gas_price(&self, base_fee: Option<U256>) -> U256 {
        let fee_cap = self.gas_fee_cap();
        match base_fee {
            Some(base_fee) if self.is_dynamic_fee() => {
                self.gas_tip_cap().saturating_add(base_fee).min(fee_cap)
            }
            _ => fee_cap,
        }
    }

    /// Returns the fee the payload actually pays: effective gas price times gas limit.
    pub fn effective_fee(&self, base_fee: Option<U256>) -> Option<U256> {
        self.effective_gas_price(base_fee).checked_mul(U256::from(self.gas()))
    }
}

/// Messages executed by a grantee on behalf of the messages' signers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsgExec {
    /// The account executing the messages.
    pub grantee: Address,
    /// The messages to execute.
    pub msgs: Vec<Msg>,
}

impl MsgExec {
    /// Creates a new message.
    pub fn new(grantee: Address, msgs: impl IntoIterator<Item = Msg>) -> Self {
        Self { grantee, msgs: msgs.into_iter().collect() }
    }
}

/// Grants a grantee the right to execute messages on the granter's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsgGrant {
    /// The account granting the authorization.
    pub granter: Address,
    /// The account receiving the authorization.
    pub grantee: Address,
    /// The authorization.
    pub authorization: Authorization,
}

/// An authorization that may be granted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    /// Allows executing any message of the given type.
    Generic {
        /// Type URL of the authorized message.
        msg: String,
    },
    /// Allows bank transfers up to a limit.
    Send {
        /// The maximum amount that may be sent.
        spend_limit: Coins,
    },
}

impl Authorization {
    /// Returns the type URL of the message this authorization allows.
    pub fn msg_type_url(&self) -> &str {
        match self {
            Self::Generic { msg } => msg,
            Self::Send { .. } => type_urls::MSG_SEND,
        }
    }
}

/// A bank transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsgSend {
    /// The sender.
    pub from: Address,
    /// The recipient.
    pub to: Address,
    /// The amount transferred.
    pub amount: Coins,
}

/// A message the admission stages only know by type URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnyMsg {
    /// The message's type URL.
    pub type_url: String,
    /// The addresses that must sign the message.
    pub signers: Vec<Address>,
}

impl AnyMsg {
    /// Creates a new message.
    pub fn new(type_url: impl Into<String>, signers: impl IntoIterator<Item = Address>) -> Self {
        Self { type_url: type_url.into(), signers: signers.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use alloy_consensus::{Signed, TxEip1559, TxLegacy};
    use alloy_primitives::{address, Signature, B256};

    use super::*;

    const FROM: Address = address!("0x1000000000000000000000000000000000000001");

    fn dynamic(tip: u128, cap: u128, gas: u64) -> MsgEthereumTx {
        let tx = TxEip1559 {
            gas_limit: gas,
            max_fee_per_gas: cap,
            max_priority_fee_per_gas: tip,
            ..Default::default()
        };
        let payload = Signed::new_unchecked(tx, Signature::test_signature(), B256::ZERO).into();
        MsgEthereumTx::new(payload, FROM)
    }

    #[test]
    fn test_effective_gas_price_dynamic() {
        let msg = dynamic(0, 100, 21_000);
        assert_eq!(msg.effective_gas_price(Some(U256::from(10))), U256::from(10));
        assert_eq!(msg.effective_gas_price(Some(U256::from(500))), U256::from(100));
        assert_eq!(msg.effective_gas_price(Some(U256::ZERO)), U256::ZERO);
        assert_eq!(msg.effective_gas_price(None), U256::from(100));
        assert_eq!(msg.fee(), Some(U256::from(2_100_000)));
        assert_eq!(msg.effective_fee(Some(U256::from(10))), Some(U256::from(210_000)));
    }

    #[test]
    fn test_effective_gas_price_legacy() {
        let tx = TxLegacy { gas_limit: 50_000, gas_price: 7, ..Default::default() };
        let payload = Signed::new_unchecked(tx, Signature::test_signature(), B256::ZERO).into();
        let msg = MsgEthereumTx::new(payload, FROM);
        assert!(!msg.is_dynamic_fee());
        assert_eq!(msg.effective_gas_price(Some(U256::from(1_000))), U256::from(7));
        assert_eq!(msg.gas_tip_cap(), U256::from(7));
        assert_eq!(msg.gas(), 50_000);
    }

    #[test]
    fn test_authorization_type_url() {
        let generic = Authorization::Generic { msg: type_urls::MSG_ETHEREUM_TX.to_string() };
        assert_eq!(generic.msg_type_url(), type_urls::MSG_ETHEREUM_TX);
        let send = Authorization::Send { spend_limit: Coins::default() };
        assert_eq!(send.msg_type_url(), type_urls::MSG_SEND);
    }
}
