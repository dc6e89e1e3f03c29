//! Simulates an envelope and classifies the outcome.

use crate::processes::Process;
use crate::rpc::{RpcClient, RpcError, SimulateTransactionResponse};
use crate::transaction::codec;
use crate::transaction::{
    ScVal, SorobanAuthorizationEntry, SorobanTransactionData, TransactionEnvelope,
};
use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// What a successful or restore-needing simulation yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationData {
    /// Ledger the simulation ran against.
    pub latest_ledger: u32,
    /// Resource footprint and limits for the invocation.
    pub transaction_data: SorobanTransactionData,
    /// Minimum resource fee, in stroops.
    pub min_resource_fee: u64,
    /// Authorization entries the invocation needs.
    pub auth: Vec<SorobanAuthorizationEntry>,
    /// Simulated return value.
    pub return_value: Option<ScVal>,
    /// The raw response.
    pub response: SimulateTransactionResponse,
}

/// What a restore needs before the invocation can run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreData {
    /// Resource fee of the restore, in stroops.
    pub min_resource_fee: u64,
    /// Soroban data for the restore transaction.
    pub transaction_data: SorobanTransactionData,
}

/// Classified simulation outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationResult {
    /// The invocation can run as simulated.
    Success(SimulationData),
    /// Archived ledger entries must be restored first.
    Restore {
        /// The simulated invocation.
        data: SimulationData,
        /// The restore to run first.
        restore: RestoreData,
    },
}

impl SimulationResult {
    /// The simulated invocation, whatever the outcome.
    pub fn data(&self) -> &SimulationData {
        match self {
            Self::Success(data) | Self::Restore { data, .. } => data,
        }
    }

    /// Consumes the result, keeping the simulated invocation.
    pub fn into_data(self) -> SimulationData {
        match self {
            Self::Success(data) | Self::Restore { data, .. } => data,
        }
    }

    /// Returns true if a restore is needed first.
    pub fn is_restore(&self) -> bool {
        matches!(self, Self::Restore { .. })
    }
}

/// Errors of [`SimulateTransaction`].
#[derive(Error, Debug)]
pub enum SimulateError {
    /// The simulation call itself failed
    #[error("simulation request failed")]
    RpcFailed(#[source] RpcError),

    /// The contract execution would fail
    #[error("simulation failed: {error}")]
    SimulationFailed {
        /// Error reported by the server
        error: String,
        /// The full response
        response: Box<SimulateTransactionResponse>,
    },

    /// The response is neither a success, a restore nor an error
    #[error("simulation response could not be verified")]
    Unverifiable {
        /// The full response
        response: Box<SimulateTransactionResponse>,
    },

    /// Anything else
    #[error("unexpected error while simulating transaction: {0}")]
    Unexpected(#[source] anyhow::Error),
}

impl SimulateError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unexpected(_) => "SIM_000",
            Self::RpcFailed(_) => "SIM_001",
            Self::SimulationFailed { .. } => "SIM_002",
            Self::Unverifiable { .. } => "SIM_003",
        }
    }

    /// Suggested fix, when there is an obvious one.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::RpcFailed(_) => Some("check that the RPC server is reachable"),
            Self::SimulationFailed { .. } => {
                Some("inspect the response events to see why the invocation fails")
            }
            Self::Unverifiable { .. } => {
                Some("the RPC server may run an incompatible version")
            }
            Self::Unexpected(_) => None,
        }
    }

    /// Returns true if repeating the simulation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RpcFailed(e) if e.is_retryable())
    }
}

/// Asks the network to estimate resources and authorizations for an envelope.
#[derive(Debug, Clone)]
pub struct SimulateTransaction {
    rpc: Arc<dyn RpcClient>,
}

impl SimulateTransaction {
    /// Creates the stage.
    pub fn new(rpc: Arc<dyn RpcClient>) -> Self {
        Self { rpc }
    }

    fn classify(response: SimulateTransactionResponse) -> Result<SimulationResult, SimulateError> {
        if let Some(error) = response.error.clone() {
            return Err(SimulateError::SimulationFailed {
                error,
                response: Box::new(response),
            });
        }

        let transaction_data = response
            .decode_transaction_data()
            .context("decoding simulated soroban data")
            .map_err(SimulateError::Unexpected)?;
        let (Some(transaction_data), Some(min_resource_fee)) =
            (transaction_data, response.min_resource_fee.as_deref())
        else {
            return Err(SimulateError::Unverifiable {
                response: Box::new(response),
            });
        };
        let min_resource_fee = parse_fee(min_resource_fee)?;
        let auth = response
            .decode_auth()
            .context("decoding simulated authorization entries")
            .map_err(SimulateError::Unexpected)?;
        let return_value = response
            .decode_return_value()
            .context("decoding simulated return value")
            .map_err(SimulateError::Unexpected)?;

        let restore = match &response.restore_preamble {
            Some(preamble) => Some(RestoreData {
                min_resource_fee: parse_fee(&preamble.min_resource_fee)?,
                transaction_data: codec::decode(
                    "restore soroban data",
                    &preamble.transaction_data,
                )
                .context("decoding restore preamble")
                .map_err(SimulateError::Unexpected)?,
            }),
            None => None,
        };

        let data = SimulationData {
            latest_ledger: response.latest_ledger,
            transaction_data,
            min_resource_fee,
            auth,
            return_value,
            response,
        };
        Ok(match restore {
            Some(restore) => SimulationResult::Restore { data, restore },
            None => SimulationResult::Success(data),
        })
    }
}

fn parse_fee(fee: &str) -> Result<u64, SimulateError> {
    fee.parse::<u64>()
        .with_context(|| format!("resource fee {fee:?} is not a non-negative integer"))
        .map_err(SimulateError::Unexpected)
}

#[async_trait]
impl Process for SimulateTransaction {
    type Input = TransactionEnvelope;
    type Output = SimulationResult;
    type Error = SimulateError;

    fn name(&self) -> &'static str {
        "SimulateTransaction"
    }

    async fn run(&self, envelope: TransactionEnvelope) -> Result<SimulationResult, SimulateError> {
        let response = self
            .rpc
            .simulate_transaction(&envelope)
            .await
            .map_err(SimulateError::RpcFailed)?;
        debug!(
            latest_ledger = response.latest_ledger,
            failed = response.error.is_some(),
            "simulation response"
        );
        let result = Self::classify(response)?;
        if result.is_restore() {
            warn!("simulation requires restoring archived entries");
        }
        Ok(result)
    }
}
