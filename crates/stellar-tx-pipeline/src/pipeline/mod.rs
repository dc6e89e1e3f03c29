//! Pipeline composition.
//!
//! A pipeline chains [`Stage`]s, each a [`Process`](crate::processes::Process)
//! with an ordered list of [`Plugin`]s that may rewrite its input. Values that
//! later stages need from earlier ones travel through a write-once
//! [`RunContext`] owned by the run.
//!
//! Three presets cover the usual flows:
//!
//! - [`ClassicPipeline`] - build, resolve signers, sign, submit
//! - [`InvokePipeline`] - build, simulate, sign authorizations, assemble,
//!   resolve signers, sign, submit
//! - [`ReadPipeline`] - build with a throwaway source, simulate, return the
//!   contract's return value; never signs or submits
//!
//! # Example
//!
//! ```rust,no_run
//! use stellar_tx_pipeline::account::{Ed25519Signer, Signer};
//! use stellar_tx_pipeline::config::{NetworkConfig, SendOptions, TEST_NETWORK_PASSPHRASE};
//! use stellar_tx_pipeline::pipeline::{ClassicInput, ClassicPipeline, TransactionHeader};
//! use stellar_tx_pipeline::transaction::{Asset, Operation};
//! use std::sync::Arc;
//!
//! # async fn example(destination: stellar_tx_pipeline::types::AccountId) -> anyhow::Result<()> {
//! let config = NetworkConfig::new(TEST_NETWORK_PASSPHRASE, "https://rpc.example.org")?;
//! let pipeline = ClassicPipeline::from_config(&config, SendOptions::default())?;
//!
//! let signer = Arc::new(Ed25519Signer::generate());
//! let input = ClassicInput::new(TransactionHeader::new(signer.account_id(), "100"))
//!     .with_operation(Operation::payment(destination, Asset::Native, 10_000_000))
//!     .with_signer(signer);
//! let outcome = pipeline.run(input).await?;
//! println!("confirmed {}", outcome.hash);
//! # Ok(())
//! # }
//! ```

mod classic;
pub mod connectors;
mod context;
mod invoke;
mod plugin;
mod read;
mod stage;

pub use classic::{ClassicInput, ClassicPipeline};
pub use context::{ContextError, ContextKey, RunContext, BUILT_ENVELOPE, SIGNERS, SIMULATION};
pub use invoke::{InvokeInput, InvokePipeline};
pub use plugin::Plugin;
pub use read::{ReadInput, ReadPipeline};
pub use stage::Stage;

use crate::processes::{SequenceSource, TransactionPreconditions};
use crate::rpc::RpcClient;
use crate::transaction::Memo;
use crate::types::MuxedAccount;
use std::sync::Arc;

/// Transaction fields shared by the preset inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionHeader {
    /// Transaction source.
    pub source: MuxedAccount,
    /// Per-operation fee, as a decimal string.
    pub base_fee: String,
    /// Current source sequence number. `None` loads it from the network.
    pub sequence: Option<i64>,
    /// Memo.
    pub memo: Memo,
    /// Preconditions.
    pub preconditions: TransactionPreconditions,
}

impl TransactionHeader {
    /// Creates a header with no memo and no preconditions.
    pub fn new(source: impl Into<MuxedAccount>, base_fee: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            base_fee: base_fee.into(),
            sequence: None,
            memo: Memo::None,
            preconditions: TransactionPreconditions::default(),
        }
    }

    /// Uses a known sequence number instead of loading the account.
    #[must_use]
    pub fn with_sequence(mut self, sequence: i64) -> Self {
        self.sequence = Some(sequence);
        self
    }

    /// Sets the memo.
    #[must_use]
    pub fn with_memo(mut self, memo: Memo) -> Self {
        self.memo = memo;
        self
    }

    /// Sets the preconditions.
    #[must_use]
    pub fn with_preconditions(mut self, preconditions: TransactionPreconditions) -> Self {
        self.preconditions = preconditions;
        self
    }

    /// Expires the transaction `seconds` after it is built.
    #[must_use]
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.preconditions.timeout = Some(seconds);
        self
    }

    fn sequence_source(&self, rpc: &Arc<dyn RpcClient>) -> SequenceSource {
        match self.sequence {
            Some(sequence) => SequenceSource::Explicit(sequence),
            None => SequenceSource::Rpc(rpc.clone()),
        }
    }
}
