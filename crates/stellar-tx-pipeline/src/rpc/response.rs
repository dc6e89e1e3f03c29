//! RPC wire types.
//!
//! Field names follow the server's camelCase JSON. Binary payloads stay as
//! base64 strings here; the `decode_*` helpers turn them into model types.

use crate::rpc::RpcError;
use crate::transaction::codec;
use crate::transaction::{ScVal, SorobanAuthorizationEntry, SorobanTransactionData};
use crate::types::AccountId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current state of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    /// The account.
    pub id: AccountId,
    /// The current sequence number, as a decimal string.
    pub sequence: String,
}

/// The newest closed ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetLatestLedgerResponse {
    /// Ledger hash.
    pub id: String,
    /// Protocol version.
    pub protocol_version: u32,
    /// Ledger sequence number.
    pub sequence: u32,
}

/// Result of one simulated host function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateHostFunctionResult {
    /// Authorization entries the invocation needs, base64.
    #[serde(default)]
    pub auth: Vec<String>,
    /// Return value, base64.
    pub xdr: String,
}

/// Data needed to restore archived entries before the invocation can run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestorePreamble {
    /// Resource fee of the restore, as a decimal string.
    pub min_resource_fee: String,
    /// Soroban data for the restore, base64.
    pub transaction_data: String,
}

/// Raw response of `simulateTransaction`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateTransactionResponse {
    /// Ledger the simulation ran against.
    pub latest_ledger: u32,
    /// Error message when the contract execution would fail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Soroban data, base64.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_data: Option<String>,
    /// Minimum resource fee, as a decimal string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_resource_fee: Option<String>,
    /// Per-host-function results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<SimulateHostFunctionResult>>,
    /// Present when archived entries must be restored first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore_preamble: Option<RestorePreamble>,
    /// Diagnostic events, base64.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<String>,
}

/// Status returned by `sendTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SendTransactionStatus {
    /// Accepted into the queue.
    Pending,
    /// Already submitted.
    Duplicate,
    /// The server is overloaded.
    TryAgainLater,
    /// Rejected.
    Error,
    /// A status this client does not know.
    Unknown(String),
}

impl From<String> for SendTransactionStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "PENDING" => Self::Pending,
            "DUPLICATE" => Self::Duplicate,
            "TRY_AGAIN_LATER" => Self::TryAgainLater,
            "ERROR" => Self::Error,
            _ => Self::Unknown(status),
        }
    }
}

impl From<SendTransactionStatus> for String {
    fn from(status: SendTransactionStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for SendTransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("PENDING"),
            Self::Duplicate => f.write_str("DUPLICATE"),
            Self::TryAgainLater => f.write_str("TRY_AGAIN_LATER"),
            Self::Error => f.write_str("ERROR"),
            Self::Unknown(status) => f.write_str(status),
        }
    }
}

/// Raw response of `sendTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionResponse {
    /// Submission status.
    pub status: SendTransactionStatus,
    /// Transaction hash, hex.
    pub hash: String,
    /// Latest ledger known to the server.
    pub latest_ledger: u32,
    /// Rejection reason, base64, when `status` is `ERROR`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_result_xdr: Option<String>,
}

/// Status returned by `getTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GetTransactionStatus {
    /// Applied successfully.
    Success,
    /// Applied and failed.
    Failed,
    /// Not in a ledger yet, or unknown to the server.
    NotFound,
    /// A status this client does not know.
    Unknown(String),
}

impl From<String> for GetTransactionStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "SUCCESS" => Self::Success,
            "FAILED" => Self::Failed,
            "NOT_FOUND" => Self::NotFound,
            _ => Self::Unknown(status),
        }
    }
}

impl From<GetTransactionStatus> for String {
    fn from(status: GetTransactionStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for GetTransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("SUCCESS"),
            Self::Failed => f.write_str("FAILED"),
            Self::NotFound => f.write_str("NOT_FOUND"),
            Self::Unknown(status) => f.write_str(status),
        }
    }
}

/// Raw response of `getTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTransactionResponse {
    /// Confirmation status.
    pub status: GetTransactionStatus,
    /// Latest ledger known to the server.
    pub latest_ledger: u32,
    /// Ledger the transaction was applied in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger: Option<u32>,
    /// Close time of that ledger, unix seconds as a string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// The applied envelope, base64.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub envelope_xdr: Option<String>,
    /// The transaction result, base64.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_xdr: Option<String>,
    /// Contract return value, base64.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_value: Option<String>,
}

impl SimulateTransactionResponse {
    /// Decodes the Soroban data.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is present but malformed.
    pub fn decode_transaction_data(&self) -> Result<Option<SorobanTransactionData>, RpcError> {
        self.transaction_data
            .as_deref()
            .map(|data| codec::decode("soroban transaction data", data))
            .transpose()
            .map_err(RpcError::from)
    }

    /// Decodes the authorization entries of the first result.
    ///
    /// # Errors
    ///
    /// Returns an error if any entry is malformed.
    pub fn decode_auth(&self) -> Result<Vec<SorobanAuthorizationEntry>, RpcError> {
        let Some(result) = self.results.as_ref().and_then(|results| results.first()) else {
            return Ok(Vec::new());
        };
        result
            .auth
            .iter()
            .map(|entry| codec::decode("authorization entry", entry).map_err(RpcError::from))
            .collect()
    }

    /// Decodes the return value of the first result.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is malformed.
    pub fn decode_return_value(&self) -> Result<Option<ScVal>, RpcError> {
        self.results
            .as_ref()
            .and_then(|results| results.first())
            .map(|result| codec::decode("return value", &result.xdr))
            .transpose()
            .map_err(RpcError::from)
    }
}

impl GetTransactionResponse {
    /// Decodes the contract return value, if the transaction produced one.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is malformed.
    pub fn decode_return_value(&self) -> Result<Option<ScVal>, RpcError> {
        self.return_value
            .as_deref()
            .map(|value| codec::decode("return value", value))
            .transpose()
            .map_err(RpcError::from)
    }
}
