//! # Stellar Tx Pipeline
//!
//! A client-side transaction lifecycle engine for ledgers with both classic
//! multi-signature transactions and resource-metered smart-contract calls.
//!
//! The crate turns "operations plus signers" into a confirmed on-ledger result:
//! it builds the envelope, simulates contract calls, works out who has to sign
//! at which threshold, signs authorization entries, reassembles the envelope
//! with simulated resources, signs it and polls the network until the
//! transaction lands.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stellar_tx_pipeline::config::{NetworkConfig, SendOptions, TEST_NETWORK_PASSPHRASE};
//! use stellar_tx_pipeline::pipeline::{ClassicInput, ClassicPipeline, TransactionHeader};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = NetworkConfig::new(TEST_NETWORK_PASSPHRASE, "https://rpc.example.org")?;
//!     let pipeline = ClassicPipeline::from_config(&config, SendOptions::default())?;
//!
//!     let input = ClassicInput::new(TransactionHeader::new(source, "100"))
//!         .with_operation(payment)
//!         .with_signer(signer);
//!     let outcome = pipeline.run(input).await?;
//!     println!("confirmed {}", outcome.hash);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Addresses, hashes and network identifiers
//! - [`transaction`] - Operations, envelopes, builders and thresholds
//! - [`account`] - Signers
//! - [`rpc`] - The RPC collaborator and its JSON-RPC client
//! - [`processes`] - The seven pipeline stages
//! - [`pipeline`] - Stage composition, plugins and the preset pipelines
//! - [`plugins`] - Ready-made plugins
//!
//! ## Logging
//!
//! The crate logs through [`tracing`] and never installs a subscriber.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod account;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod plugins;
pub mod processes;
pub mod rpc;
pub mod transaction;
pub mod types;

// Re-export main entry points
pub use config::{InvokeOptions, NetworkConfig, SendOptions};
pub use error::{PipelineError, PipelineResult};
pub use pipeline::{ClassicPipeline, InvokePipeline, ReadPipeline};

// Re-export commonly used types
pub use types::{AccountId, Hash, MuxedAccount, NetworkId};

#[cfg(test)]
mod tests;
