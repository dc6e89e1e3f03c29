//! Build, sign and submit a classic transaction.

use crate::account::Signer;
use crate::config::{NetworkConfig, SendOptions};
use crate::error::PipelineError;
use crate::pipeline::{connectors, Plugin, RunContext, Stage, TransactionHeader};
use crate::pipeline::{BUILT_ENVELOPE, SIGNERS};
use crate::processes::{
    BuildInput, BuildTransaction, EnvelopeSigningRequirements, SendOutcome, SendTransaction,
    SignEnvelope, SignEnvelopeInput,
};
use crate::rpc::{JsonRpcClient, RpcClient};
use crate::transaction::{Operation, TransactionEnvelope};
use std::sync::Arc;
use tracing::info;

/// Input of [`ClassicPipeline`].
#[derive(Debug, Clone)]
pub struct ClassicInput {
    /// Source, fee, memo and preconditions.
    pub header: TransactionHeader,
    /// Operations, in order.
    pub operations: Vec<Operation>,
    /// Signers covering every required address.
    pub signers: Vec<Arc<dyn Signer>>,
}

impl ClassicInput {
    /// Creates an input with no operations and no signers.
    pub fn new(header: TransactionHeader) -> Self {
        Self {
            header,
            operations: Vec::new(),
            signers: Vec::new(),
        }
    }

    /// Appends an operation.
    #[must_use]
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    /// Adds a signer.
    #[must_use]
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signers.push(signer);
        self
    }
}

/// Build → signing requirements → sign envelope → send.
#[derive(Debug)]
pub struct ClassicPipeline {
    rpc: Arc<dyn RpcClient>,
    build: Stage<BuildTransaction>,
    requirements: Stage<EnvelopeSigningRequirements>,
    sign: Stage<SignEnvelope>,
    send: Stage<SendTransaction>,
}

impl ClassicPipeline {
    /// Creates the pipeline over an existing RPC handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the send options are below their minimums.
    pub fn new(
        config: &NetworkConfig,
        rpc: Arc<dyn RpcClient>,
        options: SendOptions,
    ) -> Result<Self, PipelineError> {
        let network_id = config.network_id();
        Ok(Self {
            build: Stage::new(BuildTransaction::new()),
            requirements: Stage::new(EnvelopeSigningRequirements::new()),
            sign: Stage::new(SignEnvelope::new(network_id)),
            send: Stage::new(SendTransaction::new(rpc.clone(), network_id, options)?),
            rpc,
        })
    }

    /// Creates the pipeline with a JSON-RPC client built from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built or the send options are
    /// below their minimums.
    pub fn from_config(config: &NetworkConfig, options: SendOptions) -> Result<Self, PipelineError> {
        let rpc = Arc::new(JsonRpcClient::new(config)?);
        Self::new(config, rpc, options)
    }

    /// Adds a plugin in front of the build stage.
    pub fn add_build_plugin(&mut self, plugin: Arc<dyn Plugin<BuildInput>>) -> &mut Self {
        self.build.add_plugin(plugin);
        self
    }

    /// Adds a plugin in front of the envelope signing stage.
    pub fn add_sign_envelope_plugin(
        &mut self,
        plugin: Arc<dyn Plugin<SignEnvelopeInput>>,
    ) -> &mut Self {
        self.sign.add_plugin(plugin);
        self
    }

    /// Adds a plugin in front of the send stage, e.g. a
    /// [`FeeBumpPlugin`](crate::plugins::FeeBumpPlugin).
    pub fn add_send_plugin(&mut self, plugin: Arc<dyn Plugin<TransactionEnvelope>>) -> &mut Self {
        self.send.add_plugin(plugin);
        self
    }

    /// Runs the pipeline to confirmation.
    ///
    /// # Errors
    ///
    /// Returns the first stage, plugin or context error.
    pub async fn run(&self, input: ClassicInput) -> Result<SendOutcome, PipelineError> {
        let mut context = RunContext::new();
        context.insert(SIGNERS, input.signers)?;

        let sequence = input.header.sequence_source(&self.rpc);
        let envelope = self
            .build
            .run(
                connectors::build_input(input.header, input.operations, sequence),
                &context,
            )
            .await?;
        context.insert(BUILT_ENVELOPE, envelope.clone())?;

        let requirements = self.requirements.run(envelope.clone(), &context).await?;
        let signers = context.require(SIGNERS)?.clone();
        let signed = self
            .sign
            .run(
                connectors::sign_envelope_input(envelope, requirements, signers),
                &context,
            )
            .await?;

        let outcome = self.send.run(signed, &context).await?;
        info!(hash = %outcome.hash, "classic pipeline finished");
        Ok(outcome)
    }
}
