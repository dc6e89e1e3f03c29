//! Resolves who must sign an envelope and at what threshold.

use crate::processes::Process;
use crate::transaction::{ThresholdLevel, TransactionEnvelope, FEE_BUMP_THRESHOLD};
use crate::types::AccountId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// An address that has to sign.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignerAddress {
    /// Whatever account is the envelope's source, or fee source for a fee-bump.
    SourceAccount,
    /// A specific account.
    Account(AccountId),
}

impl SignerAddress {
    /// Resolves the pseudo-address against an envelope.
    pub fn resolve(&self, envelope: &TransactionEnvelope) -> AccountId {
        match self {
            SignerAddress::SourceAccount => envelope.source_account_id(),
            SignerAddress::Account(account) => *account,
        }
    }
}

impl From<AccountId> for SignerAddress {
    fn from(account: AccountId) -> Self {
        SignerAddress::Account(account)
    }
}

impl fmt::Display for SignerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignerAddress::SourceAccount => f.write_str("source-account"),
            SignerAddress::Account(account) => write!(f, "{account}"),
        }
    }
}

/// One address and the authority it must provide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SigningRequirement {
    /// Who signs.
    pub address: SignerAddress,
    /// The threshold the signature must meet.
    pub threshold: ThresholdLevel,
}

impl SigningRequirement {
    /// Creates a requirement.
    pub fn new(address: impl Into<SignerAddress>, threshold: ThresholdLevel) -> Self {
        Self {
            address: address.into(),
            threshold,
        }
    }
}

/// Errors of [`EnvelopeSigningRequirements`].
#[derive(Error, Debug)]
pub enum SigningRequirementsError {
    /// A plain envelope could not be resolved
    #[error("failed to resolve signers of transaction: {reason}")]
    PlainEnvelope {
        /// What was wrong
        reason: String,
    },

    /// A fee-bump envelope could not be resolved
    #[error("failed to resolve signers of fee-bump transaction: {reason}")]
    FeeBumpEnvelope {
        /// What was wrong
        reason: String,
    },
}

impl SigningRequirementsError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PlainEnvelope { .. } => "ESR_001",
            Self::FeeBumpEnvelope { .. } => "ESR_002",
        }
    }

    /// Suggested fix, when there is an obvious one.
    pub fn hint(&self) -> Option<&'static str> {
        Some("signing requirements can only be resolved for a built envelope")
    }
}

/// Computes the minimal set of signing requirements of an envelope.
///
/// For a fee-bump the only requirement is the fee source at low threshold.
/// For a plain envelope every operation contributes its effective source at the
/// operation's threshold; an address appearing more than once keeps the highest
/// level. Muxed accounts resolve to their base account. The result lists each
/// address once, in order of first appearance.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeSigningRequirements;

impl EnvelopeSigningRequirements {
    /// Creates the stage.
    pub fn new() -> Self {
        Self
    }

    /// Resolves the requirements without going through the async stage.
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope, or the inner transaction of a
    /// fee-bump, has no operations.
    pub fn resolve(
        envelope: &TransactionEnvelope,
    ) -> Result<Vec<SigningRequirement>, SigningRequirementsError> {
        match envelope {
            TransactionEnvelope::FeeBump(env) => {
                if env.tx.inner_tx.tx.operations.is_empty() {
                    return Err(SigningRequirementsError::FeeBumpEnvelope {
                        reason: "inner transaction has no operations".to_string(),
                    });
                }
                Ok(vec![SigningRequirement::new(
                    env.tx.fee_source.account_id(),
                    FEE_BUMP_THRESHOLD,
                )])
            }
            TransactionEnvelope::Tx(env) => {
                if env.tx.operations.is_empty() {
                    return Err(SigningRequirementsError::PlainEnvelope {
                        reason: "transaction has no operations".to_string(),
                    });
                }
                let mut requirements: Vec<SigningRequirement> = Vec::new();
                for operation in &env.tx.operations {
                    let source = operation
                        .source_account
                        .unwrap_or(env.tx.source_account)
                        .account_id();
                    upsert(&mut requirements, source, operation.threshold());
                }
                Ok(requirements)
            }
        }
    }
}

fn upsert(requirements: &mut Vec<SigningRequirement>, account: AccountId, level: ThresholdLevel) {
    let address = SignerAddress::Account(account);
    match requirements.iter_mut().find(|r| r.address == address) {
        Some(existing) => existing.threshold = existing.threshold.max(level),
        None => requirements.push(SigningRequirement {
            address,
            threshold: level,
        }),
    }
}

#[async_trait]
impl Process for EnvelopeSigningRequirements {
    type Input = TransactionEnvelope;
    type Output = Vec<SigningRequirement>;
    type Error = SigningRequirementsError;

    fn name(&self) -> &'static str {
        "EnvelopeSigningRequirements"
    }

    async fn run(
        &self,
        envelope: TransactionEnvelope,
    ) -> Result<Vec<SigningRequirement>, SigningRequirementsError> {
        let requirements = Self::resolve(&envelope)?;
        debug!(
            fee_bump = envelope.is_fee_bump(),
            requirements = requirements.len(),
            "resolved signing requirements"
        );
        Ok(requirements)
    }
}
