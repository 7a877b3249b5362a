//! Public keys and signature data.

use alloy_primitives::Bytes;
use serde::{Deserialize, Serialize};

use crate::constants::type_urls;

/// A public key able to sign Cosmos transactions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PublicKey {
    /// An `ed25519` key.
    Ed25519(Bytes),
    /// A compressed `secp256k1` key whose address is derived the Ethereum way.
    EthSecp256k1(Bytes),
    /// A compressed `secp256r1` key.
    Secp256r1(Bytes),
    /// A legacy amino threshold multisig key.
    LegacyMultisig(LegacyMultisigKey),
    /// A key type the chain does not support.
    Unsupported {
        /// The key's type URL.
        type_url: String,
        /// The raw key.
        key: Bytes,
    },
}

impl PublicKey {
    /// Returns the type URL of the key.
    pub fn type_url(&self) -> &str {
        match self {
            Self::Ed25519(_) => type_urls::PUBKEY_ED25519,
            Self::EthSecp256k1(_) => type_urls::PUBKEY_ETH_SECP256K1,
            Self::Secp256r1(_) => type_urls::PUBKEY_SECP256R1,
            Self::LegacyMultisig(_) => type_urls::PUBKEY_LEGACY_MULTISIG,
            Self::Unsupported { type_url, .. } => type_url,
        }
    }

    /// Returns the raw bytes of a single (non-multisig) key.
    pub const fn key_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Ed25519(key)
            | Self::EthSecp256k1(key)
            | Self::Secp256r1(key)
            | Self::Unsupported { key, .. } => Some(key),
            Self::LegacyMultisig(_) => None,
        }
    }

    /// Returns the number of keys this key stands for. A multisig counts each of its members.
    pub fn count_sub_keys(&self) -> usize {
        match self {
            Self::LegacyMultisig(multisig) => {
                multisig.keys.iter().map(Self::count_sub_keys).sum::<usize>()
            }
            _ => 1,
        }
    }
}

/// A threshold multisig public key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LegacyMultisigKey {
    /// Number of member signatures needed.
    pub threshold: u32,
    /// The member keys, in signing order.
    pub keys: Vec<PublicKey>,
}

/// A bit array marking which members of a multisig key signed.
///
/// Decoding rejects arrays whose `extra_bits_stored` does not describe a bit of the last byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCompactBitArray")]
pub struct CompactBitArray {
    /// Number of bits used in the last byte.
    extra_bits_stored: u8,
    /// The bits, most significant bit first.
    elems: Vec<u8>,
}

#[derive(Deserialize)]
struct RawCompactBitArray {
    extra_bits_stored: u8,
    elems: Vec<u8>,
}

/// A malformed [`CompactBitArray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidBitArray {
    /// More extra bits than a byte holds.
    #[error("extra bits stored {0} exceeds 7")]
    ExtraBits(u8),
    /// Extra bits declared without a byte to hold them.
    #[error("extra bits stored {0} with no elements")]
    Empty(u8),
}

impl TryFrom<RawCompactBitArray> for CompactBitArray {
    type Error = InvalidBitArray;

    fn try_from(raw: RawCompactBitArray) -> Result<Self, Self::Error> {
        let RawCompactBitArray { extra_bits_stored, elems } = raw;
        if extra_bits_stored >= 8 {
            return Err(InvalidBitArray::ExtraBits(extra_bits_stored));
        }
        if extra_bits_stored != 0 && elems.is_empty() {
            return Err(InvalidBitArray::Empty(extra_bits_stored));
        }
        Ok(Self { extra_bits_stored, elems })
    }
}

impl CompactBitArray {
    /// Creates a bit array of `bits` unset bits. Returns `None` if `bits` is zero.
    pub fn new(bits: usize) -> Option<Self> {
        if bits == 0 {
            return None;
        }
        Some(Self { extra_bits_stored: (bits % 8) as u8, elems: vec![0; bits.div_ceil(8)] })
    }

    /// Creates a bit array of `bits` bits with the given indices set.
    pub fn with_set(bits: usize, indices: &[usize]) -> Option<Self> {
        let mut array = Self::new(bits)?;
        for &index in indices {
            if !array.set_index(index, true) {
                return None;
            }
        }
        Some(array)
    }

    /// Returns the number of bits in the array.
    pub fn count(&self) -> usize {
        match self.extra_bits_stored {
            0 => self.elems.len() * 8,
            extra => self.elems.len().saturating_sub(1) * 8 + extra as usize,
        }
    }

    /// Returns the bit at `index`. Out-of-range indices read as unset.
    pub fn get_index(&self, index: usize) -> bool {
        if index >= self.count() {
            return false;
        }
        self.elems.get(index >> 3).is_some_and(|elem| elem & (1 << (7 - (index % 8))) > 0)
    }

    /// Sets the bit at `index`. Returns `false` if `index` is out of range.
    pub fn set_index(&mut self, index: usize, value: bool) -> bool {
        if index >= self.count() {
            return false;
        }
        let mask = 1 << (7 - (index % 8));
        if value {
            self.elems[index >> 3] |= mask;
        } else {
            self.elems[index >> 3] &= !mask;
        }
        true
    }

    /// Returns the number of set bits.
    pub fn num_true_bits(&self) -> usize {
        (0..self.count()).filter(|&i| self.get_index(i)).count()
    }
}

/// The signing mode a signature was produced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignMode {
    /// Protobuf `SignDoc` bytes.
    Direct,
    /// Legacy amino JSON.
    LegacyAminoJson,
    /// EIP-712 typed data.
    Eip712,
}

/// The signature part of a [`SignatureV2`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureData {
    /// A signature by a single key.
    Single {
        /// Mode the signature was produced with.
        mode: SignMode,
        /// The raw signature.
        signature: Bytes,
    },
    /// Member signatures of a multisig key.
    Multi {
        /// Which members signed.
        bitarray: CompactBitArray,
        /// One entry per set bit, in member order.
        signatures: Vec<Self>,
    },
}

/// A signature declared by a Cosmos transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignatureV2 {
    /// The signer's public key.
    pub pub_key: PublicKey,
    /// The signature.
    pub data: SignatureData,
    /// The signer's account sequence the signature commits to.
    pub sequence: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_array() {
        let mut bits = CompactBitArray::new(10).unwrap();
        assert_eq!(bits.count(), 10);
        assert!(bits.set_index(0, true));
        assert!(bits.set_index(9, true));
        assert!(!bits.set_index(10, true));
        assert!(bits.get_index(0));
        assert!(!bits.get_index(1));
        assert!(bits.get_index(9));
        assert_eq!(bits.num_true_bits(), 2);

        assert!(bits.set_index(0, false));
        assert_eq!(bits.num_true_bits(), 1);

        assert_eq!(CompactBitArray::new(16).unwrap().count(), 16);
        assert!(CompactBitArray::new(0).is_none());
        assert!(CompactBitArray::with_set(3, &[3]).is_none());
    }

    #[test]
    fn test_decode_bit_array() {
        let bits: CompactBitArray =
            serde_json::from_str(r#"{"extra_bits_stored":3,"elems":[160]}"#).unwrap();
        assert_eq!(bits.count(), 3);
        assert_eq!(bits.num_true_bits(), 2);
        let encoded = serde_json::to_string(&bits).unwrap();
        assert_eq!(encoded, r#"{"extra_bits_stored":3,"elems":[160]}"#);

        let err = serde_json::from_str::<CompactBitArray>(r#"{"extra_bits_stored":3,"elems":[]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("no elements"), "{err}");
        let err =
            serde_json::from_str::<CompactBitArray>(r#"{"extra_bits_stored":200,"elems":[255]}"#)
                .unwrap_err();
        assert!(err.to_string().contains("exceeds 7"), "{err}");
    }

    #[test]
    fn test_count_sub_keys() {
        let key = PublicKey::LegacyMultisig(LegacyMultisigKey {
            threshold: 2,
            keys: vec![
                PublicKey::Ed25519(Bytes::from_static(&[1])),
                PublicKey::Secp256r1(Bytes::from_static(&[2])),
                PublicKey::EthSecp256k1(Bytes::from_static(&[3])),
            ],
        });
        assert_eq!(key.count_sub_keys(), 3);
        assert_eq!(key.type_url(), type_urls::PUBKEY_LEGACY_MULTISIG);
        assert!(key.key_bytes().is_none());
    }
}
