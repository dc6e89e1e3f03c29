//! Builds an unsigned envelope from operations, account state and preconditions.

use crate::config::MIN_BASE_FEE;
use crate::processes::Process;
use crate::rpc::{RpcClient, RpcError};
use crate::transaction::{
    LedgerBounds, Memo, Operation, SignerKey, SorobanTransactionData, SourceAccount, TimeBounds,
    TransactionBuilder, TransactionEnvelope, TransactionError, TIMEOUT_INFINITE,
};
use crate::types::{AccountId, MuxedAccount};
use async_trait::async_trait;
use std::fmt;
use std::num::ParseIntError;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Where the source sequence number comes from.
#[derive(Clone)]
pub enum SequenceSource {
    /// A known current sequence number; the transaction consumes the next one.
    Explicit(i64),
    /// Load the current sequence number from the network.
    Rpc(Arc<dyn RpcClient>),
}

impl fmt::Debug for SequenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(sequence) => f.debug_tuple("Explicit").field(sequence).finish(),
            Self::Rpc(_) => f.write_str("Rpc"),
        }
    }
}

/// Preconditions requested for a new transaction.
///
/// `time_bounds` and `timeout` are mutually exclusive. When neither is set the
/// transaction is valid forever.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionPreconditions {
    /// Explicit validity window.
    pub time_bounds: Option<TimeBounds>,
    /// Expire this many seconds after building.
    pub timeout: Option<u64>,
    /// Valid ledger range.
    pub ledger_bounds: Option<LedgerBounds>,
    /// Minimum source sequence number.
    pub min_sequence_number: Option<i64>,
    /// Seconds that must pass since the source sequence number changed.
    pub min_sequence_age: Option<u64>,
    /// Ledgers that must close since the source sequence number changed.
    pub min_sequence_ledger_gap: Option<u32>,
    /// Signers required on top of the usual thresholds.
    pub extra_signers: Vec<SignerKey>,
}

/// Input of [`BuildTransaction`].
#[derive(Debug, Clone)]
pub struct BuildInput {
    /// Operations, in order.
    pub operations: Vec<Operation>,
    /// Transaction source.
    pub source: MuxedAccount,
    /// Per-operation fee, as a decimal string.
    pub base_fee: String,
    /// Source sequence number.
    pub sequence: SequenceSource,
    /// Soroban resource data.
    pub soroban_data: Option<SorobanTransactionData>,
    /// Memo.
    pub memo: Memo,
    /// Preconditions.
    pub preconditions: TransactionPreconditions,
}

impl BuildInput {
    /// Creates an input with no operations.
    pub fn new(
        source: impl Into<MuxedAccount>,
        base_fee: impl Into<String>,
        sequence: SequenceSource,
    ) -> Self {
        Self {
            operations: Vec::new(),
            source: source.into(),
            base_fee: base_fee.into(),
            sequence,
            soroban_data: None,
            memo: Memo::None,
            preconditions: TransactionPreconditions::default(),
        }
    }

    /// Appends an operation.
    #[must_use]
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    /// Appends operations.
    #[must_use]
    pub fn with_operations(mut self, operations: impl IntoIterator<Item = Operation>) -> Self {
        self.operations.extend(operations);
        self
    }

    /// Sets the memo.
    #[must_use]
    pub fn with_memo(mut self, memo: Memo) -> Self {
        self.memo = memo;
        self
    }

    /// Attaches Soroban resource data.
    #[must_use]
    pub fn with_soroban_data(mut self, data: SorobanTransactionData) -> Self {
        self.soroban_data = Some(data);
        self
    }

    /// Sets the preconditions.
    #[must_use]
    pub fn with_preconditions(mut self, preconditions: TransactionPreconditions) -> Self {
        self.preconditions = preconditions;
        self
    }
}

/// Errors of [`BuildTransaction`].
#[derive(Error, Debug)]
pub enum BuildError {
    /// The base fee is not a positive integer
    #[error("invalid base fee: {base_fee:?}")]
    InvalidBaseFee {
        /// The rejected value
        base_fee: String,
    },

    /// The base fee is below the network minimum
    #[error("base fee {base_fee} is below the network minimum of {min}")]
    FeeTooLow {
        /// The parsed value
        base_fee: u32,
        /// The minimum
        min: u32,
    },

    /// No operations were given
    #[error("at least one operation is required")]
    NoOperations,

    /// Both a time window and a timeout were given
    #[error("time bounds and timeout cannot both be set")]
    ConflictingTimeConstraints {
        /// The window
        time_bounds: TimeBounds,
        /// The timeout
        timeout: u64,
    },

    /// The source account could not be loaded
    #[error("failed to load account {account}")]
    AccountLoadFailed {
        /// The account
        account: AccountId,
        /// The RPC failure
        #[source]
        source: RpcError,
    },

    /// The loaded sequence number is not an integer
    #[error("account sequence {sequence:?} is not a valid sequence number")]
    SequenceParseFailed {
        /// The raw value
        sequence: String,
        /// Parse failure
        #[source]
        source: ParseIntError,
    },

    /// The builder rejected the account or fee
    #[error("failed to create transaction builder")]
    BuilderCreationFailed(#[source] TransactionError),

    /// A precondition was rejected
    #[error("failed to apply precondition {precondition}")]
    PreconditionFailed {
        /// Which precondition
        precondition: &'static str,
        /// Builder failure
        #[source]
        source: TransactionError,
    },

    /// The memo was rejected
    #[error("invalid memo")]
    InvalidMemo(#[source] TransactionError),

    /// The Soroban data was rejected
    #[error("failed to set soroban data")]
    SorobanDataFailed(#[source] TransactionError),

    /// An operation could not be appended
    #[error("failed to append operation {index}")]
    OperationAppendFailed {
        /// Position in the input
        index: usize,
        /// Builder failure
        #[source]
        source: TransactionError,
    },

    /// The final build was rejected
    #[error("failed to build transaction")]
    BuildFailed(#[source] TransactionError),

    /// Anything else
    #[error("unexpected error while building transaction: {0}")]
    Unexpected(#[source] anyhow::Error),
}

impl BuildError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unexpected(_) => "BTX_000",
            Self::InvalidBaseFee { .. } => "BTX_001",
            Self::FeeTooLow { .. } => "BTX_002",
            Self::NoOperations => "BTX_003",
            Self::ConflictingTimeConstraints { .. } => "BTX_004",
            Self::AccountLoadFailed { .. } => "BTX_005",
            Self::SequenceParseFailed { .. } => "BTX_006",
            Self::BuilderCreationFailed(_) => "BTX_007",
            Self::PreconditionFailed { .. } => "BTX_008",
            Self::InvalidMemo(_) => "BTX_009",
            Self::SorobanDataFailed(_) => "BTX_010",
            Self::OperationAppendFailed { .. } => "BTX_011",
            Self::BuildFailed(_) => "BTX_012",
        }
    }

    /// Suggested fix, when there is an obvious one.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidBaseFee { .. } => Some("pass the base fee as a positive integer string"),
            Self::FeeTooLow { .. } => Some("raise the base fee to at least the network minimum"),
            Self::NoOperations => Some("add at least one operation"),
            Self::ConflictingTimeConstraints { .. } => {
                Some("set either an explicit time window or a timeout, not both")
            }
            Self::AccountLoadFailed { .. } => {
                Some("check that the source account exists and the RPC server is reachable")
            }
            Self::InvalidMemo(_) => Some("text memos are limited to 28 bytes"),
            Self::SorobanDataFailed(_) => Some("soroban data must have a non-negative resource fee"),
            _ => None,
        }
    }
}

/// Builds an unsigned envelope.
///
/// If the sequence comes from the network, the source account is loaded first.
/// Without an explicit time window or timeout the envelope gets an unbounded
/// window, so every built envelope carries time bounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildTransaction;

impl BuildTransaction {
    /// Creates the stage.
    pub fn new() -> Self {
        Self
    }

    fn parse_base_fee(base_fee: &str) -> Result<u32, BuildError> {
        let parsed = base_fee
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|fee| *fee > 0)
            .ok_or_else(|| BuildError::InvalidBaseFee {
                base_fee: base_fee.to_string(),
            })?;
        if parsed < MIN_BASE_FEE {
            return Err(BuildError::FeeTooLow {
                base_fee: parsed,
                min: MIN_BASE_FEE,
            });
        }
        Ok(parsed)
    }

    async fn load_sequence(
        source: &MuxedAccount,
        sequence: &SequenceSource,
    ) -> Result<i64, BuildError> {
        let rpc = match sequence {
            SequenceSource::Explicit(sequence) => return Ok(*sequence),
            SequenceSource::Rpc(rpc) => rpc,
        };
        let account = source.account_id();
        let response = rpc
            .get_account(&account)
            .await
            .map_err(|source| BuildError::AccountLoadFailed { account, source })?;
        if response.id != account {
            return Err(BuildError::Unexpected(anyhow::anyhow!(
                "requested account {account} but the server returned {}",
                response.id
            )));
        }
        response
            .sequence
            .parse::<i64>()
            .map_err(|source| BuildError::SequenceParseFailed {
                sequence: response.sequence.clone(),
                source,
            })
    }

    fn apply_preconditions(
        builder: &mut TransactionBuilder,
        preconditions: TransactionPreconditions,
    ) -> Result<(), BuildError> {
        let failed = |precondition: &'static str| {
            move |source: TransactionError| BuildError::PreconditionFailed {
                precondition,
                source,
            }
        };

        if let Some(bounds) = preconditions.ledger_bounds {
            builder
                .set_ledger_bounds(bounds)
                .map_err(failed("ledger_bounds"))?;
        }
        if let Some(bounds) = preconditions.time_bounds {
            builder
                .set_time_bounds(bounds)
                .map_err(failed("time_bounds"))?;
        }
        if let Some(timeout) = preconditions.timeout {
            builder.set_timeout(timeout).map_err(failed("timeout"))?;
        }
        if let Some(min) = preconditions.min_sequence_number {
            builder.set_min_sequence_number(min);
        }
        if let Some(age) = preconditions.min_sequence_age {
            builder.set_min_sequence_age(age);
        }
        if let Some(gap) = preconditions.min_sequence_ledger_gap {
            builder.set_min_sequence_ledger_gap(gap);
        }
        for key in preconditions.extra_signers {
            builder
                .add_extra_signer(key)
                .map_err(failed("extra_signers"))?;
        }
        if !builder.has_time_constraint() {
            builder
                .set_timeout(TIMEOUT_INFINITE)
                .map_err(failed("timeout"))?;
        }
        Ok(())
    }
}

#[async_trait]
impl Process for BuildTransaction {
    type Input = BuildInput;
    type Output = TransactionEnvelope;
    type Error = BuildError;

    fn name(&self) -> &'static str {
        "BuildTransaction"
    }

    async fn run(&self, input: BuildInput) -> Result<TransactionEnvelope, BuildError> {
        let base_fee = Self::parse_base_fee(&input.base_fee)?;
        if input.operations.is_empty() {
            return Err(BuildError::NoOperations);
        }
        if let (Some(time_bounds), Some(timeout)) =
            (input.preconditions.time_bounds, input.preconditions.timeout)
        {
            return Err(BuildError::ConflictingTimeConstraints {
                time_bounds,
                timeout,
            });
        }

        let sequence = Self::load_sequence(&input.source, &input.sequence).await?;
        debug!(
            source = %input.source,
            sequence,
            operations = input.operations.len(),
            "building transaction"
        );

        let account = SourceAccount::new(input.source, sequence);
        let mut builder =
            TransactionBuilder::new(&account, base_fee).map_err(BuildError::BuilderCreationFailed)?;
        if let Some(data) = input.soroban_data {
            builder
                .set_soroban_data(data)
                .map_err(BuildError::SorobanDataFailed)?;
        }
        Self::apply_preconditions(&mut builder, input.preconditions)?;
        builder.add_memo(input.memo).map_err(BuildError::InvalidMemo)?;
        for (index, operation) in input.operations.into_iter().enumerate() {
            builder
                .add_operation(operation)
                .map_err(|source| BuildError::OperationAppendFailed { index, source })?;
        }

        let tx = builder.build().map_err(BuildError::BuildFailed)?;
        Ok(TransactionEnvelope::from_transaction(tx))
    }
}
