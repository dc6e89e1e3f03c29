//! Signers.
//!
//! The pipeline never touches key material directly. It asks a [`Signer`] for
//! envelope signatures and authorization-entry signatures, and matches signers
//! to signing requirements by [`Signer::account_id`].

mod ed25519;
mod signer;

pub use ed25519::{Ed25519Signer, ED25519_SECRET_KEY_LENGTH, ED25519_SIGNATURE_LENGTH};
pub use signer::{authorize_entry, Signer, SignerError};
pub(crate) use signer::call_signer;
