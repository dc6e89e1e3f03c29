//! A process together with its plugins.

use crate::error::PipelineError;
use crate::pipeline::{Plugin, RunContext};
use crate::processes::Process;
use std::sync::Arc;
use tracing::debug;

/// A pipeline step: plugins first, then the process.
#[derive(Debug)]
pub struct Stage<P: Process> {
    process: P,
    plugins: Vec<Arc<dyn Plugin<P::Input>>>,
}

impl<P> Stage<P>
where
    P: Process,
    PipelineError: From<P::Error>,
{
    /// Wraps a process with no plugins.
    pub fn new(process: P) -> Self {
        Self {
            process,
            plugins: Vec::new(),
        }
    }

    /// Appends a plugin. Plugins run in the order they were added.
    pub fn add_plugin(&mut self, plugin: Arc<dyn Plugin<P::Input>>) -> &mut Self {
        debug!(stage = self.process.name(), plugin = plugin.name(), "plugin registered");
        self.plugins.push(plugin);
        self
    }

    /// The wrapped process.
    pub fn process(&self) -> &P {
        &self.process
    }

    /// Names of the attached plugins, in application order.
    pub fn plugin_names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|plugin| plugin.name()).collect()
    }

    /// Applies the plugins to `input`, then runs the process.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Plugin`] if a plugin fails, or the process
    /// error converted into a [`PipelineError`].
    pub async fn run(
        &self,
        input: P::Input,
        context: &RunContext,
    ) -> Result<P::Output, PipelineError> {
        let stage = self.process.name();
        let mut input = input;
        for plugin in &self.plugins {
            debug!(stage, plugin = plugin.name(), "applying plugin");
            input = plugin
                .process_input(input, context)
                .await
                .map_err(|source| PipelineError::Plugin {
                    plugin: plugin.name(),
                    stage,
                    source,
                })?;
        }

        debug!(stage, "stage started");
        match self.process.run(input).await {
            Ok(output) => {
                debug!(stage, "stage finished");
                Ok(output)
            }
            Err(e) => {
                debug!(stage, error = %e, "stage failed");
                Err(e.into())
            }
        }
    }
}
