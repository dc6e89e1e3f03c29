//! Core ledger types.
//!
//! This module contains the fundamental value types used throughout the
//! crate: account and contract addresses, hashes and network identifiers.

mod address;
mod hash;

pub use address::{
    ACCOUNT_ID_LENGTH, AccountId, ContractId, MuxedAccount, ScAddress, ScAddressKind,
};
pub use hash::{HASH_LENGTH, Hash, NetworkId};

use thiserror::Error;

/// Errors produced when parsing or constructing core types.
#[derive(Error, Debug)]
pub enum TypeError {
    /// Hex decoding failed
    #[error("hex error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// A value had the wrong byte length
    #[error("invalid {what} length: expected {expected}, got {got}")]
    InvalidLength {
        /// Which value was being parsed
        what: &'static str,
        /// Expected length
        expected: usize,
        /// Actual length
        got: usize,
    },

    /// An address could not be parsed
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}
