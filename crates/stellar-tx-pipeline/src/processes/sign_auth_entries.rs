//! Signs the per-address authorization entries produced by simulation.

use crate::account::{call_signer, Signer, SignerError};
use crate::config::LEDGER_CLOSE_TIME_SECS;
use crate::processes::Process;
use crate::rpc::{RpcClient, RpcError};
use crate::transaction::{SorobanAuthorizationEntry, SorobanCredentials};
use crate::types::{AccountId, NetworkId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// How long a signed authorization entry stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthExpiration {
    /// Valid up to and including this ledger.
    Ledger(u32),
    /// Valid for this many ledgers past the latest one.
    RelativeLedgers(u32),
    /// Valid for roughly this many seconds past the latest ledger.
    RelativeSeconds(u64),
}

/// Input of [`SignAuthEntries`].
#[derive(Debug, Clone)]
pub struct SignAuthEntriesInput {
    /// Entries to sign, usually from simulation.
    pub entries: Vec<SorobanAuthorizationEntry>,
    /// Signers available for this pass.
    pub signers: Vec<Arc<dyn Signer>>,
    /// Expiration of the signatures. Required as soon as one entry is signed.
    pub expiration: Option<AuthExpiration>,
    /// Keep entries that this pass does not sign.
    pub include_unsigned: bool,
}

/// Errors of [`SignAuthEntries`].
#[derive(Error, Debug)]
pub enum SignAuthEntriesError {
    /// An entry had to be signed but no expiration was given
    #[error("no signature expiration given for entry of {address}")]
    MissingExpiration {
        /// The address to sign for
        address: AccountId,
    },

    /// The latest ledger could not be fetched
    #[error("failed to fetch latest ledger")]
    LatestLedgerFailed(#[source] RpcError),

    /// The expiration ledger does not fit a ledger number
    #[error("expiration {expiration:?} past ledger {latest_ledger} overflows")]
    ExpirationOverflow {
        /// The latest ledger
        latest_ledger: u32,
        /// The requested expiration
        expiration: AuthExpiration,
    },

    /// A signer failed
    #[error("failed to sign authorization entry for {address}")]
    SigningFailed {
        /// The signer's address
        address: AccountId,
        /// Signer failure
        #[source]
        source: SignerError,
    },
}

impl SignAuthEntriesError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingExpiration { .. } => "SAE_001",
            Self::LatestLedgerFailed(_) => "SAE_002",
            Self::ExpirationOverflow { .. } => "SAE_003",
            Self::SigningFailed { .. } => "SAE_004",
        }
    }

    /// Suggested fix, when there is an obvious one.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingExpiration { .. } => {
                Some("pass an expiration ledger, a ledger count or a number of seconds")
            }
            Self::LatestLedgerFailed(_) => Some("check that the RPC server is reachable"),
            Self::ExpirationOverflow { .. } => Some("use a shorter expiration"),
            Self::SigningFailed { .. } => None,
        }
    }

    /// Returns true if repeating the stage may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LatestLedgerFailed(e) if e.is_retryable())
    }
}

/// Signs the authorization entries of plain accounts that have a signer.
///
/// Source-account entries are covered by the envelope signature and are never
/// signed here, nor are contract, muxed, claimable-balance and liquidity-pool
/// addresses. Those are kept only with `include_unsigned`. Account entries
/// without a matching signer are dropped rather than failing, so callers can
/// sign a subset per pass.
#[derive(Debug, Clone)]
pub struct SignAuthEntries {
    rpc: Arc<dyn RpcClient>,
    network_id: NetworkId,
}

impl SignAuthEntries {
    /// Creates the stage.
    pub fn new(rpc: Arc<dyn RpcClient>, network_id: NetworkId) -> Self {
        Self { rpc, network_id }
    }

    async fn latest_ledger(&self, cached: &mut Option<u32>) -> Result<u32, SignAuthEntriesError> {
        if let Some(sequence) = *cached {
            return Ok(sequence);
        }
        let sequence = self
            .rpc
            .get_latest_ledger()
            .await
            .map_err(SignAuthEntriesError::LatestLedgerFailed)?
            .sequence;
        *cached = Some(sequence);
        Ok(sequence)
    }

    async fn expiration_ledger(
        &self,
        expiration: AuthExpiration,
        cached: &mut Option<u32>,
    ) -> Result<u32, SignAuthEntriesError> {
        let ledgers = match expiration {
            AuthExpiration::Ledger(ledger) => return Ok(ledger),
            AuthExpiration::RelativeLedgers(ledgers) => Some(ledgers),
            AuthExpiration::RelativeSeconds(seconds) => {
                u32::try_from(seconds.div_ceil(LEDGER_CLOSE_TIME_SECS)).ok()
            }
        };
        let latest_ledger = self.latest_ledger(cached).await?;
        ledgers
            .and_then(|ledgers| latest_ledger.checked_add(ledgers))
            .ok_or(SignAuthEntriesError::ExpirationOverflow {
                latest_ledger,
                expiration,
            })
    }
}

fn check_signed(
    signed: &SorobanAuthorizationEntry,
    address: AccountId,
) -> Result<(), SignerError> {
    match &signed.credentials {
        SorobanCredentials::Address(credentials)
            if signed.signing_account() == Some(address) && !credentials.signature.is_void() =>
        {
            Ok(())
        }
        _ => Err(SignerError::Malformed(
            "signed entry lost its address credentials or signature".to_string(),
        )),
    }
}

#[async_trait]
impl Process for SignAuthEntries {
    type Input = SignAuthEntriesInput;
    type Output = Vec<SorobanAuthorizationEntry>;
    type Error = SignAuthEntriesError;

    fn name(&self) -> &'static str {
        "SignAuthEntries"
    }

    async fn run(
        &self,
        input: SignAuthEntriesInput,
    ) -> Result<Vec<SorobanAuthorizationEntry>, SignAuthEntriesError> {
        let mut latest_ledger = None;
        let mut output = Vec::with_capacity(input.entries.len());

        for entry in input.entries {
            let Some(address) = entry.signing_account() else {
                debug!(
                    source_account = matches!(entry.credentials, SorobanCredentials::SourceAccount),
                    include = input.include_unsigned,
                    "authorization entry does not need a signature here"
                );
                if input.include_unsigned {
                    output.push(entry);
                }
                continue;
            };

            let Some(signer) = input.signers.iter().find(|s| s.account_id() == address) else {
                debug!(%address, "no signer for authorization entry, dropping it");
                continue;
            };

            let expiration = input
                .expiration
                .ok_or(SignAuthEntriesError::MissingExpiration { address })?;
            let expiration_ledger = self.expiration_ledger(expiration, &mut latest_ledger).await?;

            let signed = call_signer(|| {
                let signed = signer.sign_auth_entry(&entry, expiration_ledger, &self.network_id)?;
                check_signed(&signed, address)?;
                Ok(signed)
            })
            .map_err(|source| SignAuthEntriesError::SigningFailed { address, source })?;
            debug!(%address, expiration_ledger, "signed authorization entry");
            output.push(signed);
        }

        Ok(output)
    }
}
