//! The signer capability.

use crate::transaction::{
    CodecError, DecoratedSignature, ScMapEntry, ScVal, SorobanAuthorizationEntry,
    SorobanCredentials, TransactionEnvelope,
};
use crate::types::{AccountId, NetworkId};
use std::panic::{catch_unwind, AssertUnwindSafe};
use thiserror::Error;

/// Errors produced by signers.
#[derive(Error, Debug)]
pub enum SignerError {
    /// The key material was disposed
    #[error("signer key material has been disposed")]
    Disposed,

    /// The key material is malformed
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The signer cannot sign this authorization entry
    #[error("authorization entry has no address credentials to sign")]
    UnsupportedEntry,

    /// The signer produced something that is not a valid signature
    #[error("malformed signature: {0}")]
    Malformed(String),

    /// The payload to sign could not be encoded
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Any other failure inside the signer
    #[error("signing failed: {0}")]
    Other(String),
}

/// Something that can sign on behalf of one account.
///
/// Implementations own their key material; the pipeline only borrows them for
/// the duration of a run.
pub trait Signer: Send + Sync + std::fmt::Debug {
    /// The account this signer signs for.
    fn account_id(&self) -> AccountId;

    /// Signs an envelope for the given network.
    ///
    /// Plain envelopes are signed over the transaction hash, fee-bump
    /// envelopes over the fee-bump hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unavailable or the envelope cannot be hashed.
    fn sign_transaction(
        &self,
        envelope: &TransactionEnvelope,
        network_id: &NetworkId,
    ) -> Result<DecoratedSignature, SignerError>;

    /// Signs an authorization entry, valid up to and including `expiration_ledger`.
    ///
    /// Returns the entry with its expiration and signature filled in.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unavailable or the entry has no address
    /// credentials.
    fn sign_auth_entry(
        &self,
        entry: &SorobanAuthorizationEntry,
        expiration_ledger: u32,
        network_id: &NetworkId,
    ) -> Result<SorobanAuthorizationEntry, SignerError>;
}

/// Fills in the expiration and signature of an address-credential entry.
///
/// The signature value is a one-element vector holding a map with the
/// signer's public key and the raw signature.
pub fn authorize_entry(
    entry: &SorobanAuthorizationEntry,
    expiration_ledger: u32,
    public_key: &AccountId,
    signature: Vec<u8>,
) -> Result<SorobanAuthorizationEntry, SignerError> {
    let SorobanCredentials::Address(credentials) = &entry.credentials else {
        return Err(SignerError::UnsupportedEntry);
    };
    let mut credentials = credentials.clone();
    credentials.signature_expiration_ledger = expiration_ledger;
    credentials.signature = ScVal::Vec(vec![ScVal::Map(vec![
        ScMapEntry {
            key: ScVal::symbol("public_key"),
            val: ScVal::Bytes(public_key.as_bytes().to_vec()),
        },
        ScMapEntry {
            key: ScVal::symbol("signature"),
            val: ScVal::Bytes(signature),
        },
    ])]);
    Ok(SorobanAuthorizationEntry {
        credentials: SorobanCredentials::Address(credentials),
        root_invocation: entry.root_invocation.clone(),
    })
}

/// Runs a signer callback, turning a panic inside it into [`SignerError::Other`].
pub(crate) fn call_signer<T>(
    f: impl FnOnce() -> Result<T, SignerError>,
) -> Result<T, SignerError> {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "signer panicked".to_string());
        Err(SignerError::Other(message))
    })
}
