//! Build, simulate, authorize, assemble, sign and submit a contract invocation.

use crate::account::Signer;
use crate::config::{InvokeOptions, NetworkConfig};
use crate::error::PipelineError;
use crate::pipeline::{connectors, Plugin, RunContext, Stage, TransactionHeader};
use crate::pipeline::{BUILT_ENVELOPE, SIGNERS, SIMULATION};
use crate::processes::{
    AssembleInput, AssembleTransaction, BuildInput, BuildTransaction,
    EnvelopeSigningRequirements, SendOutcome, SendTransaction, SignAuthEntries,
    SignAuthEntriesInput, SignEnvelope, SignEnvelopeInput, SimulateTransaction,
};
use crate::rpc::{JsonRpcClient, RpcClient};
use crate::transaction::{HostFunction, TransactionEnvelope};
use std::sync::Arc;
use tracing::{debug, info};

/// Input of [`InvokePipeline`].
#[derive(Debug, Clone)]
pub struct InvokeInput {
    /// Source, fee, memo and preconditions.
    pub header: TransactionHeader,
    /// The function to invoke.
    pub host_function: HostFunction,
    /// Signers for the envelope and for any authorization entries.
    pub signers: Vec<Arc<dyn Signer>>,
}

impl InvokeInput {
    /// Creates an input with no signers.
    pub fn new(header: TransactionHeader, host_function: HostFunction) -> Self {
        Self {
            header,
            host_function,
            signers: Vec::new(),
        }
    }

    /// Adds a signer.
    #[must_use]
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signers.push(signer);
        self
    }
}

/// All seven stages, for smart-contract invocations.
///
/// Source-account and contract authorization entries are carried into the
/// assembled envelope unsigned; account entries are signed by the matching
/// signer, and dropped when there is none. A simulation that asks for a
/// restore ends the run with [`PipelineError::RestoreRequired`].
#[derive(Debug)]
pub struct InvokePipeline {
    rpc: Arc<dyn RpcClient>,
    options: InvokeOptions,
    build: Stage<BuildTransaction>,
    simulate: Stage<SimulateTransaction>,
    sign_auth: Stage<SignAuthEntries>,
    assemble: Stage<AssembleTransaction>,
    requirements: Stage<EnvelopeSigningRequirements>,
    sign: Stage<SignEnvelope>,
    send: Stage<SendTransaction>,
}

impl InvokePipeline {
    /// Creates the pipeline over an existing RPC handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the send options are below their minimums.
    pub fn new(
        config: &NetworkConfig,
        rpc: Arc<dyn RpcClient>,
        options: InvokeOptions,
    ) -> Result<Self, PipelineError> {
        let network_id = config.network_id();
        Ok(Self {
            build: Stage::new(BuildTransaction::new()),
            simulate: Stage::new(SimulateTransaction::new(rpc.clone())),
            sign_auth: Stage::new(SignAuthEntries::new(rpc.clone(), network_id)),
            assemble: Stage::new(AssembleTransaction::new()),
            requirements: Stage::new(EnvelopeSigningRequirements::new()),
            sign: Stage::new(SignEnvelope::new(network_id)),
            send: Stage::new(SendTransaction::new(rpc.clone(), network_id, options.send)?),
            options,
            rpc,
        })
    }

    /// Creates the pipeline with a JSON-RPC client built from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built or the send options are
    /// below their minimums.
    pub fn from_config(config: &NetworkConfig, options: InvokeOptions) -> Result<Self, PipelineError> {
        let rpc = Arc::new(JsonRpcClient::new(config)?);
        Self::new(config, rpc, options)
    }

    /// The options in use.
    pub fn options(&self) -> &InvokeOptions {
        &self.options
    }

    /// Adds a plugin in front of the build stage.
    pub fn add_build_plugin(&mut self, plugin: Arc<dyn Plugin<BuildInput>>) -> &mut Self {
        self.build.add_plugin(plugin);
        self
    }

    /// Adds a plugin in front of the simulation stage.
    pub fn add_simulate_plugin(
        &mut self,
        plugin: Arc<dyn Plugin<TransactionEnvelope>>,
    ) -> &mut Self {
        self.simulate.add_plugin(plugin);
        self
    }

    /// Adds a plugin in front of the authorization signing stage.
    pub fn add_sign_auth_plugin(
        &mut self,
        plugin: Arc<dyn Plugin<SignAuthEntriesInput>>,
    ) -> &mut Self {
        self.sign_auth.add_plugin(plugin);
        self
    }

    /// Adds a plugin in front of the assemble stage.
    pub fn add_assemble_plugin(&mut self, plugin: Arc<dyn Plugin<AssembleInput>>) -> &mut Self {
        self.assemble.add_plugin(plugin);
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
    /// Returns the first stage, plugin or context error, or
    /// [`PipelineError::RestoreRequired`] if archived state must be restored
    /// first.
    pub async fn run(&self, input: InvokeInput) -> Result<SendOutcome, PipelineError> {
        let mut context = RunContext::new();
        context.insert(SIGNERS, input.signers)?;

        let sequence = input.header.sequence_source(&self.rpc);
        let operation = connectors::invoke_operation(input.host_function);
        let envelope = self
            .build
            .run(
                connectors::build_input(input.header, vec![operation], sequence),
                &context,
            )
            .await?;
        context.insert(BUILT_ENVELOPE, envelope.clone())?;

        let simulation = self.simulate.run(envelope.clone(), &context).await?;
        context.insert(SIMULATION, simulation.clone())?;
        let simulation = connectors::require_success(simulation)?;
        debug!(
            min_resource_fee = simulation.min_resource_fee,
            auth_entries = simulation.auth.len(),
            "simulation succeeded"
        );

        let signers = context.require(SIGNERS)?.clone();
        let auth = self
            .sign_auth
            .run(
                connectors::sign_auth_input(
                    &simulation,
                    signers.clone(),
                    self.options.auth_expiration,
                    true,
                ),
                &context,
            )
            .await?;

        let assembled = self
            .assemble
            .run(
                connectors::assemble_input(envelope, simulation, auth),
                &context,
            )
            .await?;

        let requirements = self.requirements.run(assembled.clone(), &context).await?;
        let signed = self
            .sign
            .run(
                connectors::sign_envelope_input(assembled, requirements, signers),
                &context,
            )
            .await?;

        let outcome = self.send.run(signed, &context).await?;
        info!(hash = %outcome.hash, "invoke pipeline finished");
        Ok(outcome)
    }
}
