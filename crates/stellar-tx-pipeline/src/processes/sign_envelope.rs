//! Applies envelope signatures for a set of signing requirements.

use crate::account::{call_signer, Signer, SignerError, ED25519_SIGNATURE_LENGTH};
use crate::processes::{Process, SigningRequirement};
use crate::transaction::{DecoratedSignature, TransactionEnvelope};
use crate::types::{AccountId, NetworkId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Input of [`SignEnvelope`].
#[derive(Debug, Clone)]
pub struct SignEnvelopeInput {
    /// The envelope to sign, plain or fee-bump.
    pub envelope: TransactionEnvelope,
    /// Who has to sign.
    pub requirements: Vec<SigningRequirement>,
    /// Signers to sign with.
    pub signers: Vec<Arc<dyn Signer>>,
}

/// Errors of [`SignEnvelope`].
#[derive(Error, Debug)]
pub enum SignEnvelopeError {
    /// No requirements were given
    #[error("no signing requirements given")]
    NoRequirements,

    /// No signers were given
    #[error("no signers given")]
    NoSigners,

    /// A required address has no signer
    #[error("no signer for required address {address}, available: {available:?}")]
    SignerNotFound {
        /// The required address
        address: AccountId,
        /// Addresses of the given signers
        available: Vec<AccountId>,
    },

    /// A signer failed or produced a malformed signature
    #[error("failed to sign envelope for {address}")]
    SigningFailed {
        /// The signer's address
        address: AccountId,
        /// Signer failure
        #[source]
        source: SignerError,
    },
}

impl SignEnvelopeError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoRequirements => "SEV_001",
            Self::NoSigners => "SEV_002",
            Self::SignerNotFound { .. } => "SEV_003",
            Self::SigningFailed { .. } => "SEV_004",
        }
    }

    /// Suggested fix, when there is an obvious one.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NoRequirements => Some("resolve the envelope's signing requirements first"),
            Self::NoSigners => Some("pass at least one signer"),
            Self::SignerNotFound { .. } => Some("add a signer for the missing address"),
            Self::SigningFailed { .. } => None,
        }
    }
}

/// Signs an envelope once per requirement.
///
/// All requirements are matched to signers before anything is signed, so a
/// missing signer fails without invoking any of them. A signer required twice
/// signs twice. Plain envelopes stay plain, fee-bumps stay fee-bumps.
#[derive(Debug, Clone)]
pub struct SignEnvelope {
    network_id: NetworkId,
}

impl SignEnvelope {
    /// Creates the stage.
    pub fn new(network_id: NetworkId) -> Self {
        Self { network_id }
    }

    fn match_signers<'a>(
        envelope: &TransactionEnvelope,
        requirements: &[SigningRequirement],
        signers: &'a [Arc<dyn Signer>],
    ) -> Result<Vec<(AccountId, &'a Arc<dyn Signer>)>, SignEnvelopeError> {
        requirements
            .iter()
            .map(|requirement| {
                let address = requirement.address.resolve(envelope);
                signers
                    .iter()
                    .find(|signer| signer.account_id() == address)
                    .map(|signer| (address, signer))
                    .ok_or_else(|| SignEnvelopeError::SignerNotFound {
                        address,
                        available: signers.iter().map(|s| s.account_id()).collect(),
                    })
            })
            .collect()
    }
}

fn check_signature(signature: &DecoratedSignature, address: &AccountId) -> Result<(), SignerError> {
    if signature.signature.len() != ED25519_SIGNATURE_LENGTH {
        return Err(SignerError::Malformed(format!(
            "expected {ED25519_SIGNATURE_LENGTH} signature bytes, got {}",
            signature.signature.len()
        )));
    }
    if signature.hint != address.hint() {
        return Err(SignerError::Malformed(
            "signature hint does not match the signer".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl Process for SignEnvelope {
    type Input = SignEnvelopeInput;
    type Output = TransactionEnvelope;
    type Error = SignEnvelopeError;

    fn name(&self) -> &'static str {
        "SignEnvelope"
    }

    async fn run(&self, input: SignEnvelopeInput) -> Result<TransactionEnvelope, SignEnvelopeError> {
        if input.requirements.is_empty() {
            return Err(SignEnvelopeError::NoRequirements);
        }
        if input.signers.is_empty() {
            return Err(SignEnvelopeError::NoSigners);
        }

        let matched = Self::match_signers(&input.envelope, &input.requirements, &input.signers)?;
        let mut signatures = Vec::with_capacity(matched.len());
        for (address, signer) in matched {
            let signature = call_signer(|| {
                let signature = signer.sign_transaction(&input.envelope, &self.network_id)?;
                check_signature(&signature, &address)?;
                Ok(signature)
            })
            .map_err(|source| SignEnvelopeError::SigningFailed { address, source })?;
            debug!(%address, "signed envelope");
            signatures.push(signature);
        }

        let mut envelope = input.envelope;
        for signature in signatures {
            envelope.add_signature(signature);
        }
        Ok(envelope)
    }
}
