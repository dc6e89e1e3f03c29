//! Pipeline configuration.
//!
//! [`NetworkConfig`] says which network the pipelines sign for and where its
//! RPC server lives. [`SendOptions`] and [`InvokeOptions`] tune the submit and
//! authorization stages.

use crate::processes::{AuthExpiration, SendError};
use crate::types::NetworkId;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Minimum base fee per operation accepted by the network, in stroops.
pub const MIN_BASE_FEE: u32 = 100;
/// Average ledger close time used to turn seconds into ledgers.
pub const LEDGER_CLOSE_TIME_SECS: u64 = 5;
/// Default authorization lifetime, in ledgers past the latest one.
pub const DEFAULT_AUTH_EXPIRATION_LEDGERS: u32 = 120;
/// Smallest allowed confirmation timeout.
pub const MIN_TIMEOUT_SECS: u64 = 1;
/// Smallest allowed delay between status polls.
pub const MIN_WAIT_INTERVAL_MS: u64 = 100;
/// Default delay between status polls.
pub const DEFAULT_WAIT_INTERVAL_MS: u64 = 1_000;
/// Confirmation timeout used when neither an explicit value nor the envelope's
/// own deadline applies.
pub const FALLBACK_TIMEOUT_SECS: u64 = 30;
/// Default timeout of a single RPC request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Passphrase of the public network.
pub const PUBLIC_NETWORK_PASSPHRASE: &str = "Public Global Stellar Network ; September 2015";
/// Passphrase of the test network.
pub const TEST_NETWORK_PASSPHRASE: &str = "Test SDF Network ; September 2015";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The network passphrase is empty
    #[error("network passphrase cannot be empty")]
    EmptyPassphrase,

    /// The RPC URL could not be parsed
    #[error("invalid RPC URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The RPC URL uses plain HTTP and HTTP was not allowed
    #[error("refusing insecure RPC URL {0}; enable allow_http to use plain HTTP")]
    InsecureUrl(String),

    /// The HTTP client could not be built
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Configuration for HTTP connection pooling.
///
/// # Example
///
/// ```rust
/// use stellar_tx_pipeline::config::PoolConfig;
/// use std::time::Duration;
///
/// let pool = PoolConfig::builder()
///     .max_idle_per_host(8)
///     .idle_timeout(Duration::from_secs(30))
///     .build();
/// assert_eq!(pool.max_idle_per_host, Some(8));
/// ```
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum idle connections per host (`None` for unlimited).
    pub max_idle_per_host: Option<usize>,
    /// How long an idle connection is kept.
    pub idle_timeout: Duration,
    /// TCP keepalive interval, if any.
    pub tcp_keepalive: Option<Duration>,
    /// Whether `TCP_NODELAY` is set.
    pub tcp_nodelay: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: None,
            idle_timeout: Duration::from_secs(90),
            tcp_keepalive: Some(Duration::from_secs(60)),
            tcp_nodelay: true,
        }
    }
}

impl PoolConfig {
    /// Starts a builder from the defaults.
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::default()
    }

    /// Few connections, short lifetimes.
    pub fn minimal() -> Self {
        Self {
            max_idle_per_host: Some(2),
            idle_timeout: Duration::from_secs(10),
            tcp_keepalive: None,
            tcp_nodelay: true,
        }
    }
}

/// Builder for [`PoolConfig`].
#[derive(Debug, Clone, Default)]
pub struct PoolConfigBuilder {
    max_idle_per_host: Option<usize>,
    idle_timeout: Option<Duration>,
    tcp_keepalive: Option<Option<Duration>>,
    tcp_nodelay: Option<bool>,
}

impl PoolConfigBuilder {
    /// Caps idle connections per host.
    #[must_use]
    pub fn max_idle_per_host(mut self, max: usize) -> Self {
        self.max_idle_per_host = Some(max);
        self
    }

    /// Sets the idle timeout.
    #[must_use]
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Sets the TCP keepalive interval.
    #[must_use]
    pub fn tcp_keepalive(mut self, interval: Duration) -> Self {
        self.tcp_keepalive = Some(Some(interval));
        self
    }

    /// Disables TCP keepalive.
    #[must_use]
    pub fn no_tcp_keepalive(mut self) -> Self {
        self.tcp_keepalive = Some(None);
        self
    }

    /// Sets `TCP_NODELAY`.
    #[must_use]
    pub fn tcp_nodelay(mut self, enabled: bool) -> Self {
        self.tcp_nodelay = Some(enabled);
        self
    }

    /// Builds the pool configuration.
    pub fn build(self) -> PoolConfig {
        let default = PoolConfig::default();
        PoolConfig {
            max_idle_per_host: self.max_idle_per_host.or(default.max_idle_per_host),
            idle_timeout: self.idle_timeout.unwrap_or(default.idle_timeout),
            tcp_keepalive: self.tcp_keepalive.unwrap_or(default.tcp_keepalive),
            tcp_nodelay: self.tcp_nodelay.unwrap_or(default.tcp_nodelay),
        }
    }
}

/// Which network to sign for and how to reach its RPC server.
///
/// # Example
///
/// ```rust
/// use stellar_tx_pipeline::config::{NetworkConfig, TEST_NETWORK_PASSPHRASE};
/// use std::time::Duration;
///
/// let config = NetworkConfig::new(TEST_NETWORK_PASSPHRASE, "https://rpc.example.org")
///     .unwrap()
///     .with_request_timeout(Duration::from_secs(10));
/// assert_eq!(config.rpc_url().as_str(), "https://rpc.example.org/");
/// ```
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    network_passphrase: String,
    rpc_url: Url,
    request_timeout: Duration,
    pool: PoolConfig,
    allow_http: bool,
}

impl NetworkConfig {
    /// Creates a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the passphrase is empty or the URL cannot be parsed.
    pub fn new(network_passphrase: impl Into<String>, rpc_url: &str) -> Result<Self, ConfigError> {
        let network_passphrase = network_passphrase.into();
        if network_passphrase.is_empty() {
            return Err(ConfigError::EmptyPassphrase);
        }
        Ok(Self {
            network_passphrase,
            rpc_url: Url::parse(rpc_url)?,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            pool: PoolConfig::default(),
            allow_http: false,
        })
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the connection pool configuration.
    #[must_use]
    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Allows plain `http` RPC URLs, for local development.
    #[must_use]
    pub fn with_allow_http(mut self, allow: bool) -> Self {
        self.allow_http = allow;
        self
    }

    /// The network passphrase.
    pub fn network_passphrase(&self) -> &str {
        &self.network_passphrase
    }

    /// The network id derived from the passphrase.
    pub fn network_id(&self) -> NetworkId {
        NetworkId::from_passphrase(&self.network_passphrase)
    }

    /// The RPC server URL.
    pub fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }

    /// The per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// The connection pool configuration.
    pub fn pool(&self) -> &PoolConfig {
        &self.pool
    }

    /// Whether plain `http` URLs are allowed.
    pub fn allow_http(&self) -> bool {
        self.allow_http
    }
}

/// Options for the submit-and-confirm stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOptions {
    /// Confirmation timeout. When unset the envelope deadline or the fallback applies.
    pub timeout_in_seconds: Option<u64>,
    /// Delay between status polls.
    pub wait_interval_in_ms: u64,
    /// Derive the timeout from the envelope's time bounds when no explicit one is set.
    pub use_envelope_timeout_if_available: bool,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            timeout_in_seconds: None,
            wait_interval_in_ms: DEFAULT_WAIT_INTERVAL_MS,
            use_envelope_timeout_if_available: true,
        }
    }
}

impl SendOptions {
    /// Sets an explicit timeout.
    #[must_use]
    pub fn with_timeout_in_seconds(mut self, seconds: u64) -> Self {
        self.timeout_in_seconds = Some(seconds);
        self
    }

    /// Sets the poll interval.
    #[must_use]
    pub fn with_wait_interval_in_ms(mut self, millis: u64) -> Self {
        self.wait_interval_in_ms = millis;
        self
    }

    /// Enables or disables the envelope-derived timeout.
    #[must_use]
    pub fn with_envelope_timeout(mut self, enabled: bool) -> Self {
        self.use_envelope_timeout_if_available = enabled;
        self
    }

    /// Checks the options against the minimums.
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout or the wait interval is below its minimum.
    pub fn validate(&self) -> Result<(), SendError> {
        if let Some(timeout) = self.timeout_in_seconds {
            if timeout < MIN_TIMEOUT_SECS {
                return Err(SendError::TimeoutTooLow {
                    timeout_in_seconds: timeout,
                    min: MIN_TIMEOUT_SECS,
                });
            }
        }
        if self.wait_interval_in_ms < MIN_WAIT_INTERVAL_MS {
            return Err(SendError::WaitIntervalTooLow {
                wait_interval_in_ms: self.wait_interval_in_ms,
                min: MIN_WAIT_INTERVAL_MS,
            });
        }
        Ok(())
    }
}

/// Options for the invoke pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvokeOptions {
    /// How long signed authorization entries stay valid.
    pub auth_expiration: AuthExpiration,
    /// Submit-stage options.
    pub send: SendOptions,
}

impl Default for InvokeOptions {
    fn default() -> Self {
        Self {
            auth_expiration: AuthExpiration::RelativeLedgers(DEFAULT_AUTH_EXPIRATION_LEDGERS),
            send: SendOptions::default(),
        }
    }
}
