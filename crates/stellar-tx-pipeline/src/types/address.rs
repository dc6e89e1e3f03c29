//! Account and contract addresses.
//!
//! Addresses are kept in their raw form here: a 32-byte Ed25519 public key for
//! accounts, a 32-byte hash for contracts, claimable balances and liquidity
//! pools. Text encodings with checksums belong to the caller's address codec;
//! this crate renders raw keys as hex.

use crate::types::{Hash, TypeError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The length of an account public key in bytes.
pub const ACCOUNT_ID_LENGTH: usize = 32;

/// An account on the ledger, identified by its Ed25519 master public key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountId([u8; ACCOUNT_ID_LENGTH]);

impl AccountId {
    /// Creates an account id from raw public key bytes.
    pub const fn new(bytes: [u8; ACCOUNT_ID_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Parses an account id from 64 hex characters, with or without `0x`.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is empty, not hex, or not 32 bytes.
    pub fn from_hex(hex_str: &str) -> Result<Self, TypeError> {
        let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        if hex_str.is_empty() {
            return Err(TypeError::InvalidAddress(
                "account id cannot be empty".to_string(),
            ));
        }
        let bytes = hex::decode(hex_str)?;
        let bytes: [u8; ACCOUNT_ID_LENGTH] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| TypeError::InvalidLength {
                    what: "account id",
                    expected: ACCOUNT_ID_LENGTH,
                    got: bytes.len(),
                })?;
        Ok(Self(bytes))
    }

    /// Returns the raw public key bytes.
    pub fn as_bytes(&self) -> &[u8; ACCOUNT_ID_LENGTH] {
        &self.0
    }

    /// Returns the signature hint: the last four bytes of the public key.
    pub fn hint(&self) -> [u8; 4] {
        let mut hint = [0u8; 4];
        hint.copy_from_slice(&self.0[ACCOUNT_ID_LENGTH - 4..]);
        hint
    }

    /// Returns the account id as lowercase hex, without a prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.to_hex())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for AccountId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl From<[u8; ACCOUNT_ID_LENGTH]> for AccountId {
    fn from(bytes: [u8; ACCOUNT_ID_LENGTH]) -> Self {
        Self(bytes)
    }
}

/// A transaction or operation source: either a plain account or a muxed
/// (multiplexed) account that adds a 64-bit sub-account id to a base account.
///
/// Signing authority always belongs to the base account.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuxedAccount {
    /// A plain account.
    Ed25519(AccountId),
    /// A base account plus a sub-account identifier.
    MuxedEd25519 {
        /// The sub-account identifier.
        id: u64,
        /// The base account holding the signing authority.
        ed25519: AccountId,
    },
}

impl MuxedAccount {
    /// Resolves to the base account that holds signing authority.
    pub fn account_id(&self) -> AccountId {
        match self {
            MuxedAccount::Ed25519(account) => *account,
            MuxedAccount::MuxedEd25519 { ed25519, .. } => *ed25519,
        }
    }

    /// Returns true if this carries a sub-account id.
    pub fn is_muxed(&self) -> bool {
        matches!(self, MuxedAccount::MuxedEd25519 { .. })
    }
}

impl From<AccountId> for MuxedAccount {
    fn from(account: AccountId) -> Self {
        MuxedAccount::Ed25519(account)
    }
}

impl fmt::Display for MuxedAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MuxedAccount::Ed25519(account) => write!(f, "{account}"),
            MuxedAccount::MuxedEd25519 { id, ed25519 } => write!(f, "{ed25519}:{id}"),
        }
    }
}

/// A smart-contract address.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(pub Hash);

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Any address a contract can reason about.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScAddress {
    /// A plain account.
    Account(AccountId),
    /// A contract.
    Contract(ContractId),
    /// A muxed account.
    MuxedAccount(MuxedAccount),
    /// A claimable balance entry.
    ClaimableBalance(Hash),
    /// A liquidity pool.
    LiquidityPool(Hash),
}

impl ScAddress {
    /// Returns the kind of this address.
    pub fn kind(&self) -> ScAddressKind {
        match self {
            ScAddress::Account(_) => ScAddressKind::Account,
            ScAddress::Contract(_) => ScAddressKind::Contract,
            ScAddress::MuxedAccount(_) => ScAddressKind::MuxedAccount,
            ScAddress::ClaimableBalance(_) => ScAddressKind::ClaimableBalance,
            ScAddress::LiquidityPool(_) => ScAddressKind::LiquidityPool,
        }
    }
}

impl fmt::Display for ScAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScAddress::Account(account) => write!(f, "account:{account}"),
            ScAddress::Contract(contract) => write!(f, "contract:{contract}"),
            ScAddress::MuxedAccount(muxed) => write!(f, "muxed:{muxed}"),
            ScAddress::ClaimableBalance(id) => write!(f, "claimable_balance:{id}"),
            ScAddress::LiquidityPool(id) => write!(f, "liquidity_pool:{id}"),
        }
    }
}

/// Discriminant of [`ScAddress`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ScAddressKind {
    /// A plain account.
    Account,
    /// A contract.
    Contract,
    /// A muxed account.
    MuxedAccount,
    /// A claimable balance entry.
    ClaimableBalance,
    /// A liquidity pool.
    LiquidityPool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(byte: u8) -> AccountId {
        AccountId::new([byte; ACCOUNT_ID_LENGTH])
    }

    #[test]
    fn test_account_id_hex_roundtrip() {
        let id = account(7);
        assert_eq!(AccountId::from_hex(&id.to_hex()).unwrap(), id);
        assert_eq!(format!("0x{}", id.to_hex()).parse::<AccountId>().unwrap(), id);
    }

    #[test]
    fn test_account_id_rejects_bad_input() {
        assert!(AccountId::from_hex("").is_err());
        assert!(AccountId::from_hex("0x").is_err());
        assert!(AccountId::from_hex("abcd").is_err());
        assert!(AccountId::from_hex(&"gg".repeat(32)).is_err());
    }

    #[test]
    fn test_hint_is_last_four_bytes() {
        let mut bytes = [0u8; ACCOUNT_ID_LENGTH];
        bytes[28..].copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(AccountId::new(bytes).hint(), [1, 2, 3, 4]);
    }

    #[test]
    fn test_muxed_resolves_to_base() {
        let base = account(9);
        let muxed = MuxedAccount::MuxedEd25519 {
            id: 42,
            ed25519: base,
        };
        assert!(muxed.is_muxed());
        assert_eq!(muxed.account_id(), base);
        assert_eq!(MuxedAccount::from(base).account_id(), base);
        assert!(muxed.to_string().ends_with(":42"));
    }

    #[test]
    fn test_sc_address_kind() {
        assert_eq!(ScAddress::Account(account(1)).kind(), ScAddressKind::Account);
        assert_eq!(
            ScAddress::Contract(ContractId(Hash::ZERO)).kind(),
            ScAddressKind::Contract
        );
        assert_eq!(
            ScAddress::LiquidityPool(Hash::ZERO).kind(),
            ScAddressKind::LiquidityPool
        );
    }
}
