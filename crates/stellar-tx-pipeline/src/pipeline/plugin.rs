//! Stage input interceptors.

use crate::pipeline::RunContext;
use async_trait::async_trait;
use std::fmt::Debug;

/// Rewrites a stage's input right before the stage runs.
///
/// Plugins attached to a stage run in registration order, each receiving the
/// previous one's output. A plugin error aborts the run and is reported as
/// [`PipelineError::Plugin`](crate::error::PipelineError::Plugin) naming both
/// the plugin and the stage.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Debug)]
/// struct AddMemo;
///
/// #[async_trait]
/// impl Plugin<BuildInput> for AddMemo {
///     fn name(&self) -> &'static str {
///         "AddMemo"
///     }
///
///     async fn process_input(&self, input: BuildInput, _: &RunContext) -> anyhow::Result<BuildInput> {
///         Ok(input.with_memo(Memo::Id(7)))
///     }
/// }
/// ```
#[async_trait]
pub trait Plugin<I: Send + 'static>: Send + Sync + Debug {
    /// Plugin name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Returns the input the stage should run with.
    async fn process_input(&self, input: I, context: &RunContext) -> anyhow::Result<I>;
}
