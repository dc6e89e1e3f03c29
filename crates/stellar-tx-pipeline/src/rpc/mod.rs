//! RPC collaborator.
//!
//! The pipeline talks to the network only through [`RpcClient`]. The crate
//! ships a JSON-RPC implementation, [`JsonRpcClient`]; tests and callers with
//! their own transport implement the trait directly.

mod jsonrpc;
mod response;

pub use jsonrpc::JsonRpcClient;
pub use response::{
    AccountResponse, GetLatestLedgerResponse, GetTransactionResponse, GetTransactionStatus,
    RestorePreamble, SendTransactionResponse, SendTransactionStatus, SimulateHostFunctionResult,
    SimulateTransactionResponse,
};

use crate::transaction::{CodecError, TransactionEnvelope};
use crate::types::{AccountId, Hash};
use async_trait::async_trait;
use thiserror::Error;

/// Errors talking to the RPC server.
#[derive(Error, Debug)]
pub enum RpcError {
    /// HTTP transport failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The body was not the expected JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server answered with a non-success HTTP status
    #[error("API error ({status_code}): {message}")]
    Api {
        /// HTTP status code
        status_code: u16,
        /// Response body or reason
        message: String,
    },

    /// The server answered with a JSON-RPC error object
    #[error("JSON-RPC error {code}: {message}")]
    JsonRpc {
        /// JSON-RPC error code
        code: i64,
        /// Error message
        message: String,
    },

    /// The response had neither a result nor an error
    #[error("{method} response has no result")]
    MissingResult {
        /// The method called
        method: &'static str,
    },

    /// A payload could not be encoded or decoded
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl RpcError {
    /// Returns true if repeating the request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status_code, .. } => matches!(status_code, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }
}

/// The network operations the pipeline needs.
///
/// Implementations must be safe to share between concurrently running
/// pipelines.
#[async_trait]
pub trait RpcClient: Send + Sync + std::fmt::Debug {
    /// Loads an account's current state.
    async fn get_account(&self, account: &AccountId) -> Result<AccountResponse, RpcError>;

    /// Simulates an envelope.
    async fn simulate_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> Result<SimulateTransactionResponse, RpcError>;

    /// Submits a signed envelope.
    async fn send_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> Result<SendTransactionResponse, RpcError>;

    /// Looks up a submitted transaction by hash.
    async fn get_transaction(&self, hash: &Hash) -> Result<GetTransactionResponse, RpcError>;

    /// Fetches the newest closed ledger.
    async fn get_latest_ledger(&self) -> Result<GetLatestLedgerResponse, RpcError>;
}
