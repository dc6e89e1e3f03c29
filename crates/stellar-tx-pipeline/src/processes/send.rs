//! Submits a signed envelope and polls until it is confirmed.
//!
//! ```text
//! submit ── DUPLICATE ──────────▶ Duplicate
//!        ├─ TRY_AGAIN_LATER ────▶ TryAgainLater
//!        ├─ ERROR ──────────────▶ Rejected
//!        ├─ other ──────────────▶ UnexpectedSubmitStatus
//!        └─ PENDING ─▶ poll ─ SUCCESS ──▶ Ok(SendOutcome)
//!                        ├─── SUCCESS, bad return value ─▶ ReturnValueUndecodable
//!                        ├─── FAILED ───▶ ExecutionFailed
//!                        ├─── other ────▶ UnexpectedStatus
//!                        └─── NOT_FOUND ─ wait ─▶ poll, until the timeout
//!                                                 ends in NotFoundAfterTimeout
//! ```

use crate::config::{SendOptions, FALLBACK_TIMEOUT_SECS, MIN_TIMEOUT_SECS};
use crate::processes::Process;
use crate::rpc::{
    GetTransactionResponse, GetTransactionStatus, RpcClient, RpcError, SendTransactionStatus,
};
use crate::transaction::{ScVal, TransactionEnvelope};
use crate::types::{Hash, NetworkId};
use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// A confirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    /// The transaction hash.
    pub hash: Hash,
    /// The contract return value, for contract invocations.
    pub return_value: Option<ScVal>,
    /// The confirmation record.
    pub response: GetTransactionResponse,
}

/// Errors of [`SendTransaction`].
#[derive(Error, Debug)]
pub enum SendError {
    /// The configured timeout is below the minimum
    #[error("timeout of {timeout_in_seconds}s is below the minimum of {min}s")]
    TimeoutTooLow {
        /// The configured timeout
        timeout_in_seconds: u64,
        /// The minimum
        min: u64,
    },

    /// The configured wait interval is below the minimum
    #[error("wait interval of {wait_interval_in_ms}ms is below the minimum of {min}ms")]
    WaitIntervalTooLow {
        /// The configured interval
        wait_interval_in_ms: u64,
        /// The minimum
        min: u64,
    },

    /// The submission request failed
    #[error("failed to submit transaction")]
    SubmitFailed(#[source] RpcError),

    /// The server already has this transaction
    #[error("transaction {hash} was already submitted")]
    Duplicate {
        /// The transaction hash
        hash: Hash,
    },

    /// The server asked to resubmit later
    #[error("server asked to try transaction {hash} again later")]
    TryAgainLater {
        /// The transaction hash
        hash: Hash,
    },

    /// The server rejected the transaction
    #[error("transaction {hash} was rejected")]
    Rejected {
        /// The transaction hash
        hash: Hash,
        /// Encoded transaction result
        error_result_xdr: Option<String>,
    },

    /// The submission status is not one this client knows
    #[error("unexpected submission status {status} for transaction {hash}")]
    UnexpectedSubmitStatus {
        /// The transaction hash
        hash: Hash,
        /// The raw status
        status: String,
    },

    /// A status poll failed
    #[error("could not retrieve status of transaction {hash} (attempt {attempts})")]
    PollFailed {
        /// The transaction hash
        hash: Hash,
        /// Polls made so far, including the failed one
        attempts: u32,
        /// RPC failure
        #[source]
        source: RpcError,
    },

    /// The transaction was applied and failed
    #[error("transaction {hash} failed")]
    ExecutionFailed {
        /// The transaction hash
        hash: Hash,
        /// The confirmation record
        response: Box<GetTransactionResponse>,
    },

    /// The transaction did not show up in time
    #[error("transaction {hash} not found after {timeout_in_seconds}s ({attempts} polls)")]
    NotFoundAfterTimeout {
        /// The transaction hash
        hash: Hash,
        /// The timeout that elapsed
        timeout_in_seconds: u64,
        /// Polls made
        attempts: u32,
    },

    /// The poll status is not one this client knows
    #[error("unexpected status {status} for transaction {hash}")]
    UnexpectedStatus {
        /// The transaction hash
        hash: Hash,
        /// The raw status
        status: String,
    },

    /// The transaction was applied successfully but its return value could not be decoded
    #[error("transaction {hash} succeeded but its return value could not be decoded")]
    ReturnValueUndecodable {
        /// The transaction hash
        hash: Hash,
        /// The confirmation record
        response: Box<GetTransactionResponse>,
        /// Decoding failure
        #[source]
        source: RpcError,
    },

    /// Anything else
    #[error("unexpected error while sending transaction: {0}")]
    Unexpected(#[source] anyhow::Error),
}

impl SendError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unexpected(_) => "SND_000",
            Self::TimeoutTooLow { .. } => "SND_001",
            Self::WaitIntervalTooLow { .. } => "SND_002",
            Self::SubmitFailed(_) => "SND_003",
            Self::Duplicate { .. } => "SND_004",
            Self::TryAgainLater { .. } => "SND_005",
            Self::Rejected { .. } => "SND_006",
            Self::UnexpectedSubmitStatus { .. } => "SND_007",
            Self::PollFailed { .. } => "SND_008",
            Self::ExecutionFailed { .. } => "SND_009",
            Self::NotFoundAfterTimeout { .. } => "SND_010",
            Self::UnexpectedStatus { .. } => "SND_011",
            Self::ReturnValueUndecodable { .. } => "SND_012",
        }
    }

    /// Suggested fix, when there is an obvious one.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::TimeoutTooLow { .. } => Some("use a timeout of at least one second"),
            Self::WaitIntervalTooLow { .. } => Some("poll at most every 100 milliseconds"),
            Self::Duplicate { .. } => Some("poll the existing submission instead of resending"),
            Self::TryAgainLater { .. } => Some("the server is congested; resubmit after a pause"),
            Self::Rejected { .. } => Some("decode the error result to see why it was rejected"),
            Self::PollFailed { .. } => Some("the transaction may still land; poll its hash again"),
            Self::NotFoundAfterTimeout { .. } => {
                Some("the transaction may still land; poll its hash again or raise the timeout")
            }
            Self::UnexpectedSubmitStatus { .. } | Self::UnexpectedStatus { .. } => {
                Some("the RPC server may run an incompatible version")
            }
            Self::ReturnValueUndecodable { .. } => {
                Some("the transaction is on the ledger; do not resubmit it")
            }
            _ => None,
        }
    }

    /// Returns true if the caller may retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::SubmitFailed(e) => e.is_retryable(),
            Self::TryAgainLater { .. } | Self::PollFailed { .. } | Self::NotFoundAfterTimeout { .. } => {
                true
            }
            _ => false,
        }
    }

    /// The transaction hash, once the envelope was submitted.
    pub fn hash(&self) -> Option<&Hash> {
        match self {
            Self::Duplicate { hash }
            | Self::TryAgainLater { hash }
            | Self::Rejected { hash, .. }
            | Self::UnexpectedSubmitStatus { hash, .. }
            | Self::PollFailed { hash, .. }
            | Self::ExecutionFailed { hash, .. }
            | Self::NotFoundAfterTimeout { hash, .. }
            | Self::UnexpectedStatus { hash, .. }
            | Self::ReturnValueUndecodable { hash, .. } => Some(hash),
            _ => None,
        }
    }
}

/// Submits an envelope and waits for it to be applied.
///
/// Only `NOT_FOUND` is retried. Every other outcome, including `DUPLICATE` and
/// `TRY_AGAIN_LATER` on submission, is returned to the caller as is.
#[derive(Debug, Clone)]
pub struct SendTransaction {
    rpc: Arc<dyn RpcClient>,
    network_id: NetworkId,
    options: SendOptions,
}

impl SendTransaction {
    /// Creates the stage.
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout or wait interval is below its minimum.
    pub fn new(
        rpc: Arc<dyn RpcClient>,
        network_id: NetworkId,
        options: SendOptions,
    ) -> Result<Self, SendError> {
        options.validate()?;
        Ok(Self {
            rpc,
            network_id,
            options,
        })
    }

    /// The options in use.
    pub fn options(&self) -> &SendOptions {
        &self.options
    }

    /// How long to wait for `envelope` to be confirmed.
    ///
    /// An explicit timeout wins. Otherwise, if enabled, the time left until the
    /// envelope's deadline is used, but never less than the minimum timeout.
    /// Otherwise the fallback timeout applies.
    pub fn effective_timeout(&self, envelope: &TransactionEnvelope) -> Duration {
        if let Some(seconds) = self.options.timeout_in_seconds {
            return Duration::from_secs(seconds);
        }
        if self.options.use_envelope_timeout_if_available {
            if let Some(deadline) = envelope.deadline() {
                let now = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_secs();
                return Duration::from_secs(deadline.saturating_sub(now).max(MIN_TIMEOUT_SECS));
            }
        }
        Duration::from_secs(FALLBACK_TIMEOUT_SECS)
    }

    async fn submit(&self, envelope: &TransactionEnvelope, hash: Hash) -> Result<(), SendError> {
        let response = self
            .rpc
            .send_transaction(envelope)
            .await
            .map_err(SendError::SubmitFailed)?;
        if !response.hash.eq_ignore_ascii_case(&hash.to_hex()) {
            warn!(%hash, reported = %response.hash, "server reported a different transaction hash");
        }
        match response.status {
            SendTransactionStatus::Pending => {
                info!(%hash, latest_ledger = response.latest_ledger, "transaction submitted");
                Ok(())
            }
            SendTransactionStatus::Duplicate => Err(SendError::Duplicate { hash }),
            SendTransactionStatus::TryAgainLater => Err(SendError::TryAgainLater { hash }),
            SendTransactionStatus::Error => Err(SendError::Rejected {
                hash,
                error_result_xdr: response.error_result_xdr,
            }),
            SendTransactionStatus::Unknown(status) => {
                Err(SendError::UnexpectedSubmitStatus { hash, status })
            }
        }
    }

    async fn wait_for_confirmation(
        &self,
        hash: Hash,
        timeout: Duration,
    ) -> Result<SendOutcome, SendError> {
        let interval = Duration::from_millis(self.options.wait_interval_in_ms);
        let started = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts = attempts.saturating_add(1);
            let response = self
                .rpc
                .get_transaction(&hash)
                .await
                .map_err(|source| SendError::PollFailed {
                    hash,
                    attempts,
                    source,
                })?;
            debug!(
                %hash,
                attempts,
                status = %response.status,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "polled transaction status"
            );

            match response.status {
                GetTransactionStatus::Success => {
                    let return_value = match response.decode_return_value() {
                        Ok(value) => value,
                        Err(source) => {
                            warn!(
                                %hash,
                                error = %source,
                                "confirmed transaction has an undecodable return value"
                            );
                            return Err(SendError::ReturnValueUndecodable {
                                hash,
                                response: Box::new(response),
                                source,
                            });
                        }
                    };
                    info!(%hash, ledger = ?response.ledger, "transaction confirmed");
                    return Ok(SendOutcome {
                        hash,
                        return_value,
                        response,
                    });
                }
                GetTransactionStatus::Failed => {
                    return Err(SendError::ExecutionFailed {
                        hash,
                        response: Box::new(response),
                    })
                }
                GetTransactionStatus::Unknown(status) => {
                    return Err(SendError::UnexpectedStatus { hash, status })
                }
                GetTransactionStatus::NotFound => {}
            }

            if started.elapsed() >= timeout {
                break;
            }
            tokio::time::sleep(interval).await;
            if started.elapsed() >= timeout {
                break;
            }
        }

        Err(SendError::NotFoundAfterTimeout {
            hash,
            timeout_in_seconds: timeout.as_secs(),
            attempts,
        })
    }
}

#[async_trait]
impl Process for SendTransaction {
    type Input = TransactionEnvelope;
    type Output = SendOutcome;
    type Error = SendError;

    fn name(&self) -> &'static str {
        "SendTransaction"
    }

    async fn run(&self, envelope: TransactionEnvelope) -> Result<SendOutcome, SendError> {
        let hash = envelope
            .hash(&self.network_id)
            .context("hashing envelope")
            .map_err(SendError::Unexpected)?;
        let timeout = self.effective_timeout(&envelope);
        debug!(%hash, timeout_secs = timeout.as_secs(), "sending transaction");

        self.submit(&envelope, hash).await?;
        self.wait_for_confirmation(hash, timeout).await
    }
}
