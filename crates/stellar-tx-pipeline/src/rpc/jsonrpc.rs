//! JSON-RPC 2.0 client.

use crate::config::{ConfigError, NetworkConfig};
use crate::rpc::response::{
    AccountResponse, GetLatestLedgerResponse, GetTransactionResponse, SendTransactionResponse,
    SimulateTransactionResponse,
};
use crate::rpc::{RpcClient, RpcError};
use crate::transaction::TransactionEnvelope;
use crate::types::{AccountId, Hash};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;
use url::Url;

const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Serialize)]
struct Request<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct ErrorObject {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct Response<R> {
    result: Option<R>,
    error: Option<ErrorObject>,
}

/// Client for a JSON-RPC smart-contract RPC server.
///
/// # Example
///
/// ```rust,no_run
/// use stellar_tx_pipeline::config::{NetworkConfig, TEST_NETWORK_PASSPHRASE};
/// use stellar_tx_pipeline::rpc::{JsonRpcClient, RpcClient};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = NetworkConfig::new(TEST_NETWORK_PASSPHRASE, "https://rpc.example.org")?;
///     let client = JsonRpcClient::new(&config)?;
///     let ledger = client.get_latest_ledger().await?;
///     println!("latest ledger: {}", ledger.sequence);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct JsonRpcClient {
    url: Url,
    client: Client,
    next_id: Arc<AtomicU64>,
}

impl JsonRpcClient {
    /// Creates a client for the configured RPC URL.
    ///
    /// TLS certificates are validated by `reqwest`'s default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is plain `http` and HTTP is not allowed, or
    /// if the HTTP client fails to build.
    pub fn new(config: &NetworkConfig) -> Result<Self, ConfigError> {
        let url = config.rpc_url().clone();
        if url.scheme() == "http" && !config.allow_http() {
            return Err(ConfigError::InsecureUrl(url.to_string()));
        }

        let pool = config.pool();
        let mut builder = Client::builder()
            .timeout(config.request_timeout())
            .pool_max_idle_per_host(pool.max_idle_per_host.unwrap_or(usize::MAX))
            .pool_idle_timeout(pool.idle_timeout)
            .tcp_nodelay(pool.tcp_nodelay);
        if let Some(keepalive) = pool.tcp_keepalive {
            builder = builder.tcp_keepalive(keepalive);
        }
        let client = builder.build().map_err(ConfigError::HttpClient)?;

        Ok(Self {
            url,
            client,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    /// Returns the server URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn call<P: Serialize + Send + Sync, R: DeserializeOwned>(
        &self,
        method: &'static str,
        params: P,
    ) -> Result<R, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, "sending rpc request");

        let response = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header(ACCEPT, JSON_CONTENT_TYPE)
            .json(&Request {
                jsonrpc: "2.0",
                id,
                method,
                params,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            return Err(RpcError::Api {
                status_code: status.as_u16(),
                message,
            });
        }

        let body: Response<R> = response.json().await?;
        if let Some(error) = body.error {
            return Err(RpcError::JsonRpc {
                code: error.code,
                message: error.message,
            });
        }
        body.result.ok_or(RpcError::MissingResult { method })
    }
}

#[derive(Serialize)]
struct AccountParams {
    account: AccountId,
}

#[derive(Serialize)]
struct TransactionParams {
    transaction: String,
}

#[derive(Serialize)]
struct HashParams {
    hash: Hash,
}

#[derive(Serialize)]
struct NoParams {}

#[async_trait]
impl RpcClient for JsonRpcClient {
    async fn get_account(&self, account: &AccountId) -> Result<AccountResponse, RpcError> {
        self.call("getAccount", AccountParams { account: *account })
            .await
    }

    async fn simulate_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> Result<SimulateTransactionResponse, RpcError> {
        let transaction = envelope.to_base64()?;
        self.call("simulateTransaction", TransactionParams { transaction })
            .await
    }

    async fn send_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> Result<SendTransactionResponse, RpcError> {
        let transaction = envelope.to_base64()?;
        self.call("sendTransaction", TransactionParams { transaction })
            .await
    }

    async fn get_transaction(&self, hash: &Hash) -> Result<GetTransactionResponse, RpcError> {
        self.call("getTransaction", HashParams { hash: *hash }).await
    }

    async fn get_latest_ledger(&self) -> Result<GetLatestLedgerResponse, RpcError> {
        self.call("getLatestLedger", NoParams {}).await
    }
}
