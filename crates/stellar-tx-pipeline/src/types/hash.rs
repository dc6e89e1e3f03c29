//! 32-byte hash values.
//!
//! Used for transaction hashes, network identifiers, contract ids and any
//! other SHA-256 commitment the pipeline needs to carry around.

use crate::types::TypeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// The length of a hash value in bytes.
pub const HASH_LENGTH: usize = 32;

/// A 32-byte SHA-256 hash value.
///
/// # Example
///
/// ```rust
/// use stellar_tx_pipeline::types::Hash;
///
/// let hash = Hash::sha256(b"hello world");
/// assert_eq!(hash.to_hex().len(), 64);
///
/// let parsed: Hash = hash.to_hex().parse().unwrap();
/// assert_eq!(parsed, hash);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash([u8; HASH_LENGTH]);

impl Hash {
    /// The all-zero hash.
    pub const ZERO: Self = Self([0u8; HASH_LENGTH]);

    /// Creates a hash from a byte array.
    pub const fn new(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Computes the SHA-256 hash of the given data.
    pub fn sha256<T: AsRef<[u8]>>(data: T) -> Self {
        Self::sha256_of([data])
    }

    /// Computes the SHA-256 hash of several byte slices, fed in order.
    pub fn sha256_of<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut hasher = Sha256::new();
        for item in items {
            hasher.update(item.as_ref());
        }
        Self(hasher.finalize().into())
    }

    /// Parses a hash from 64 hex characters, with or without a `0x` prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not exactly 64 hex characters.
    pub fn from_hex(hex_str: &str) -> Result<Self, TypeError> {
        let hex_str = hex_str
            .strip_prefix("0x")
            .or_else(|| hex_str.strip_prefix("0X"))
            .unwrap_or(hex_str);

        if hex_str.len() != HASH_LENGTH * 2 {
            return Err(TypeError::InvalidLength {
                what: "hash",
                expected: HASH_LENGTH * 2,
                got: hex_str.len(),
            });
        }

        let bytes = hex::decode(hex_str)?;
        Self::from_bytes(&bytes)
    }

    /// Creates a hash from a byte slice.
    ///
    /// # Errors
    ///
    /// Returns an error if the slice is not exactly 32 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypeError> {
        let bytes: [u8; HASH_LENGTH] = bytes.try_into().map_err(|_| TypeError::InvalidLength {
            what: "hash",
            expected: HASH_LENGTH,
            got: bytes.len(),
        })?;
        Ok(Self(bytes))
    }

    /// Returns the hash as a byte slice.
    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }

    /// Returns the hash as lowercase hex, without a prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Returns true if this is the zero hash.
    pub fn is_zero(&self) -> bool {
        self == &Self::ZERO
    }
}

impl Default for Hash {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Hash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl From<[u8; HASH_LENGTH]> for Hash {
    fn from(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Identifier of a ledger network: the SHA-256 hash of its passphrase.
///
/// Every transaction hash and every authorization preimage is bound to it, so
/// a signature produced for one network is useless on another.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NetworkId(Hash);

impl NetworkId {
    /// Derives the network id from a network passphrase.
    pub fn from_passphrase(passphrase: &str) -> Self {
        Self(Hash::sha256(passphrase.as_bytes()))
    }

    /// Returns the underlying hash.
    pub fn hash(&self) -> &Hash {
        &self.0
    }
}

impl AsRef<[u8]> for NetworkId {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}
