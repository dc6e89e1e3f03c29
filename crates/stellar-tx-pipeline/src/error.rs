//! Pipeline-level errors.
//!
//! Every stage keeps its own closed error enum; [`PipelineError`] wraps them
//! together with the failures that belong to the pipeline itself.

use crate::config::ConfigError;
use crate::pipeline::ContextError;
use crate::processes::{
    AssembleError, BuildError, RestoreData, SendError, SignAuthEntriesError, SignEnvelopeError,
    SigningRequirementsError, SimulateError,
};
use thiserror::Error;

/// A specialized Result type for pipeline runs.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors of a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The build stage failed
    #[error(transparent)]
    Build(#[from] BuildError),

    /// The simulation stage failed
    #[error(transparent)]
    Simulate(#[from] SimulateError),

    /// Signing requirements could not be resolved
    #[error(transparent)]
    SigningRequirements(#[from] SigningRequirementsError),

    /// Authorization entries could not be signed
    #[error(transparent)]
    SignAuthEntries(#[from] SignAuthEntriesError),

    /// The assemble stage failed
    #[error(transparent)]
    Assemble(#[from] AssembleError),

    /// The envelope could not be signed
    #[error(transparent)]
    SignEnvelope(#[from] SignEnvelopeError),

    /// Submission or confirmation failed
    #[error(transparent)]
    Send(#[from] SendError),

    /// Archived ledger entries must be restored before the invocation
    #[error("archived ledger entries must be restored first (restore resource fee {})", restore.min_resource_fee)]
    RestoreRequired {
        /// The restore the simulation asked for
        restore: Box<RestoreData>,
    },

    /// The run context was wired incorrectly
    #[error("pipeline context error: {0}")]
    Context(#[from] ContextError),

    /// A plugin rejected a stage input
    #[error("plugin {plugin} failed before stage {stage}: {source}")]
    Plugin {
        /// The plugin name
        plugin: &'static str,
        /// The stage the plugin was attached to
        stage: &'static str,
        /// Plugin failure
        #[source]
        source: anyhow::Error,
    },

    /// The pipeline could not be configured
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Maximum length for error messages to prevent excessive memory usage in logs.
const MAX_ERROR_MESSAGE_LENGTH: usize = 1000;

/// Patterns that might indicate sensitive information in error messages.
const SENSITIVE_PATTERNS: &[&str] = &[
    "private_key",
    "secret",
    "password",
    "mnemonic",
    "seed",
    "bearer",
    "authorization:",
];

impl PipelineError {
    /// Stable error code. Stage errors report their own code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Build(e) => e.code(),
            Self::Simulate(e) => e.code(),
            Self::SigningRequirements(e) => e.code(),
            Self::SignAuthEntries(e) => e.code(),
            Self::Assemble(e) => e.code(),
            Self::SignEnvelope(e) => e.code(),
            Self::Send(e) => e.code(),
            Self::RestoreRequired { .. } => "PIP_001",
            Self::Context(_) => "PIP_002",
            Self::Plugin { .. } => "PIP_003",
            Self::Config(_) => "PIP_004",
        }
    }

    /// Suggested fix, when there is an obvious one.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Build(e) => e.hint(),
            Self::Simulate(e) => e.hint(),
            Self::SigningRequirements(e) => e.hint(),
            Self::SignAuthEntries(e) => e.hint(),
            Self::Assemble(e) => e.hint(),
            Self::SignEnvelope(e) => e.hint(),
            Self::Send(e) => e.hint(),
            Self::RestoreRequired { .. } => {
                Some("submit a restore-footprint transaction, then invoke again")
            }
            Self::Context(_) => Some("each context key may be written once per run"),
            Self::Plugin { .. } | Self::Config(_) => None,
        }
    }

    /// Returns true if running the pipeline again may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Build(BuildError::AccountLoadFailed { source, .. }) => source.is_retryable(),
            Self::Simulate(e) => e.is_retryable(),
            Self::SignAuthEntries(e) => e.is_retryable(),
            Self::Send(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Returns a sanitized version of the error message safe for logging.
    ///
    /// This method:
    /// - Removes control characters that could corrupt logs
    /// - Truncates very long messages to prevent log flooding
    /// - Redacts patterns that might indicate sensitive information
    pub fn sanitized_message(&self) -> String {
        sanitize_string(&self.to_string())
    }
}

fn sanitize_string(s: &str) -> String {
    // Keep newlines and tabs for readability
    let cleaned: String = s
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();

    let lower = cleaned.to_lowercase();
    for pattern in SENSITIVE_PATTERNS {
        if lower.contains(pattern) {
            return format!("[REDACTED: message contained sensitive pattern '{pattern}']");
        }
    }

    if cleaned.len() > MAX_ERROR_MESSAGE_LENGTH {
        let mut end = MAX_ERROR_MESSAGE_LENGTH;
        while !cleaned.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}... [truncated, total length: {}]",
            &cleaned[..end],
            cleaned.len()
        )
    } else {
        cleaned
    }
}
