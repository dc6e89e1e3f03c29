//! Read a contract value through simulation alone.

use crate::config::{NetworkConfig, MIN_BASE_FEE};
use crate::error::PipelineError;
use crate::pipeline::{connectors, Plugin, RunContext, Stage, TransactionHeader};
use crate::pipeline::BUILT_ENVELOPE;
use crate::processes::{BuildInput, BuildTransaction, SequenceSource, SimulateTransaction};
use crate::rpc::{JsonRpcClient, RpcClient};
use crate::transaction::{HostFunction, ScVal, TransactionEnvelope};
use crate::types::AccountId;
use std::sync::Arc;
use tracing::debug;

/// Input of [`ReadPipeline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadInput {
    /// The function to simulate.
    pub host_function: HostFunction,
}

impl ReadInput {
    /// Creates the input.
    pub fn new(host_function: HostFunction) -> Self {
        Self { host_function }
    }
}

/// Build → simulate → return value.
///
/// The envelope is built for a random source account at sequence zero, so no
/// account is loaded and nothing is ever signed or submitted. The return value
/// is reported even when the simulation asks for a restore.
#[derive(Debug)]
pub struct ReadPipeline {
    build: Stage<BuildTransaction>,
    simulate: Stage<SimulateTransaction>,
}

impl ReadPipeline {
    /// Creates the pipeline over an existing RPC handle.
    pub fn new(rpc: Arc<dyn RpcClient>) -> Self {
        Self {
            build: Stage::new(BuildTransaction::new()),
            simulate: Stage::new(SimulateTransaction::new(rpc)),
        }
    }

    /// Creates the pipeline with a JSON-RPC client built from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built.
    pub fn from_config(config: &NetworkConfig) -> Result<Self, PipelineError> {
        Ok(Self::new(Arc::new(JsonRpcClient::new(config)?)))
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

    /// Simulates the call and returns its return value, if any.
    ///
    /// # Errors
    ///
    /// Returns the first stage, plugin or context error.
    pub async fn run(&self, input: ReadInput) -> Result<Option<ScVal>, PipelineError> {
        let mut context = RunContext::new();
        let source = AccountId::new(rand::random());
        let header = TransactionHeader::new(source, MIN_BASE_FEE.to_string());
        let operation = connectors::invoke_operation(input.host_function);

        let envelope = self
            .build
            .run(
                connectors::build_input(header, vec![operation], SequenceSource::Explicit(0)),
                &context,
            )
            .await?;
        context.insert(BUILT_ENVELOPE, envelope.clone())?;

        let simulation = self.simulate.run(envelope, &context).await?;
        let return_value = connectors::return_value(&simulation);
        debug!(
            restore = simulation.is_restore(),
            has_value = return_value.is_some(),
            "read pipeline finished"
        );
        Ok(return_value)
    }
}
