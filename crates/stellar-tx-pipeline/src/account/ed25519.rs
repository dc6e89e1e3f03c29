//! Ed25519 key signer.

use crate::account::signer::{authorize_entry, Signer, SignerError};
use crate::transaction::{DecoratedSignature, SorobanAuthorizationEntry, TransactionEnvelope};
use crate::types::{AccountId, NetworkId};
use ed25519_dalek::Signer as DalekSigner;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Ed25519 secret key length in bytes.
pub const ED25519_SECRET_KEY_LENGTH: usize = 32;
/// Ed25519 signature length in bytes.
pub const ED25519_SIGNATURE_LENGTH: usize = 64;

/// A signer backed by an Ed25519 secret key.
///
/// The key is zeroized when the signer is dropped or when [`dispose`] is
/// called; any signing attempt after disposal fails with
/// [`SignerError::Disposed`].
///
/// [`dispose`]: Ed25519Signer::dispose
///
/// # Example
///
/// ```rust
/// use stellar_tx_pipeline::account::{Ed25519Signer, Signer};
///
/// let signer = Ed25519Signer::generate();
/// let account = signer.account_id();
/// signer.dispose();
/// assert!(signer.is_disposed());
/// assert_eq!(signer.account_id(), account);
/// ```
pub struct Ed25519Signer {
    account_id: AccountId,
    key: Mutex<Option<ed25519_dalek::SigningKey>>,
}

impl Ed25519Signer {
    /// Generates a new random key.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self::from_signing_key(ed25519_dalek::SigningKey::generate(&mut csprng))
    }

    /// Creates a signer from a raw 32-byte secret key.
    ///
    /// # Errors
    ///
    /// Returns an error if the slice is not 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignerError> {
        let key_bytes: [u8; ED25519_SECRET_KEY_LENGTH] = bytes.try_into().map_err(|_| {
            SignerError::InvalidKey(format!(
                "expected {} bytes, got {}",
                ED25519_SECRET_KEY_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self::from_signing_key(
            ed25519_dalek::SigningKey::from_bytes(&key_bytes),
        ))
    }

    /// Creates a signer from a hex-encoded secret key.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not hex or not 32 bytes.
    pub fn from_hex(hex_str: &str) -> Result<Self, SignerError> {
        let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = zeroize::Zeroizing::new(
            hex::decode(hex_str).map_err(|e| SignerError::InvalidKey(e.to_string()))?,
        );
        Self::from_bytes(&bytes)
    }

    fn from_signing_key(key: ed25519_dalek::SigningKey) -> Self {
        Self {
            account_id: AccountId::new(key.verifying_key().to_bytes()),
            key: Mutex::new(Some(key)),
        }
    }

    /// Zeroizes the key. The account id stays readable.
    pub fn dispose(&self) {
        // SigningKey zeroizes itself on drop
        self.lock().take();
    }

    /// Returns true once the key has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.lock().is_none()
    }

    fn lock(&self) -> MutexGuard<'_, Option<ed25519_dalek::SigningKey>> {
        self.key.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sign_bytes(&self, message: &[u8]) -> Result<Vec<u8>, SignerError> {
        let guard = self.lock();
        let key = guard.as_ref().ok_or(SignerError::Disposed)?;
        Ok(key.sign(message).to_bytes().to_vec())
    }
}

impl Signer for Ed25519Signer {
    fn account_id(&self) -> AccountId {
        self.account_id
    }

    fn sign_transaction(
        &self,
        envelope: &TransactionEnvelope,
        network_id: &NetworkId,
    ) -> Result<DecoratedSignature, SignerError> {
        let hash = envelope.hash(network_id)?;
        Ok(DecoratedSignature {
            hint: self.account_id.hint(),
            signature: self.sign_bytes(hash.as_bytes())?,
        })
    }

    fn sign_auth_entry(
        &self,
        entry: &SorobanAuthorizationEntry,
        expiration_ledger: u32,
        network_id: &NetworkId,
    ) -> Result<SorobanAuthorizationEntry, SignerError> {
        let payload = entry
            .signature_payload(expiration_ledger, network_id)?
            .ok_or(SignerError::UnsupportedEntry)?;
        let signature = self.sign_bytes(payload.as_bytes())?;
        authorize_entry(entry, expiration_ledger, &self.account_id, signature)
    }
}

impl fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("account_id", &self.account_id)
            .field("key", &"[REDACTED]")
            .finish()
    }
}
