//! The transaction processing stages.
//!
//! Each stage is a [`Process`]: a typed, async transform from one input to one
//! output with its own closed error enum. Pipelines chain them; callers can
//! also run any of them on their own.
//!
//! | Stage | Input | Output |
//! |-------|-------|--------|
//! | [`BuildTransaction`] | [`BuildInput`] | unsigned envelope |
//! | [`SimulateTransaction`] | envelope | [`SimulationResult`] |
//! | [`EnvelopeSigningRequirements`] | envelope | [`SigningRequirement`]s |
//! | [`SignAuthEntries`] | [`SignAuthEntriesInput`] | authorization entries |
//! | [`AssembleTransaction`] | [`AssembleInput`] | rebuilt envelope |
//! | [`SignEnvelope`] | [`SignEnvelopeInput`] | signed envelope |
//! | [`SendTransaction`] | signed envelope | [`SendOutcome`] |

mod assemble;
mod build;
mod send;
mod sign_auth_entries;
mod sign_envelope;
mod signing_requirements;
mod simulate;

pub use assemble::{AssembleError, AssembleInput, AssembleTransaction};
pub use build::{BuildError, BuildInput, BuildTransaction, SequenceSource, TransactionPreconditions};
pub use send::{SendError, SendOutcome, SendTransaction};
pub use sign_auth_entries::{
    AuthExpiration, SignAuthEntries, SignAuthEntriesError, SignAuthEntriesInput,
};
pub use sign_envelope::{SignEnvelope, SignEnvelopeError, SignEnvelopeInput};
pub use signing_requirements::{
    EnvelopeSigningRequirements, SignerAddress, SigningRequirement, SigningRequirementsError,
};
pub use simulate::{RestoreData, SimulateError, SimulateTransaction, SimulationData, SimulationResult};

use async_trait::async_trait;
use std::fmt::Debug;

/// One typed stage of a pipeline.
#[async_trait]
pub trait Process: Send + Sync + Debug {
    /// What the stage consumes.
    type Input: Send + 'static;
    /// What the stage produces.
    type Output: Send + 'static;
    /// The stage's error family.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Stage name used in logs and plugin errors.
    fn name(&self) -> &'static str;

    /// Runs the stage.
    async fn run(&self, input: Self::Input) -> Result<Self::Output, Self::Error>;
}
