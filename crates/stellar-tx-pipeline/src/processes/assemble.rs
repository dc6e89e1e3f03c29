//! Rebuilds a smart-contract envelope with simulation results.

use crate::processes::Process;
use crate::transaction::{
    OperationBody, OperationKind, SorobanAuthorizationEntry, SorobanTransactionData,
    SourceAccount, TransactionBuilder, TransactionEnvelope, TransactionError,
};
use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Input of [`AssembleTransaction`].
#[derive(Debug, Clone)]
pub struct AssembleInput {
    /// The envelope as built, before simulation.
    pub envelope: TransactionEnvelope,
    /// Authorization entries for the invocation. `None` keeps the entries the
    /// operation already carries.
    pub auth_entries: Option<Vec<SorobanAuthorizationEntry>>,
    /// Resource data from simulation. `None` keeps the envelope's own data.
    pub soroban_data: Option<SorobanTransactionData>,
    /// Resource fee to pay, in stroops.
    pub resource_fee: u64,
}

/// Errors of [`AssembleTransaction`].
#[derive(Error, Debug)]
pub enum AssembleError {
    /// The envelope does not hold exactly one contract invocation
    #[error("not a smart-contract transaction, operations: {kinds:?}")]
    NotSorobanTransaction {
        /// The operation kinds found
        kinds: Vec<OperationKind>,
    },

    /// Fee-bump envelopes cannot be reassembled
    #[error("cannot assemble a fee-bump envelope; assemble the inner transaction first")]
    FeeBumpEnvelope,

    /// The resource fee does not fit the fee field
    #[error("resource fee {resource_fee} is out of range")]
    InvalidResourceFee {
        /// The rejected value
        resource_fee: u64,
    },

    /// The builder rejected the account or fee
    #[error("failed to create transaction builder")]
    BuilderCreationFailed(#[source] TransactionError),

    /// An original precondition could not be carried over
    #[error("failed to carry over preconditions")]
    PreconditionFailed(#[source] TransactionError),

    /// The original memo could not be carried over
    #[error("failed to carry over the memo")]
    MemoFailed(#[source] TransactionError),

    /// The Soroban data was rejected
    #[error("failed to set soroban data")]
    SorobanDataFailed(#[source] TransactionError),

    /// The rebuilt operation was rejected
    #[error("failed to append the invocation")]
    OperationAppendFailed(#[source] TransactionError),

    /// The final build was rejected
    #[error("failed to build assembled transaction")]
    BuildFailed(#[source] TransactionError),
}

impl AssembleError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotSorobanTransaction { .. } => "ATX_001",
            Self::FeeBumpEnvelope => "ATX_002",
            Self::InvalidResourceFee { .. } => "ATX_003",
            Self::BuilderCreationFailed(_) => "ATX_004",
            Self::PreconditionFailed(_) => "ATX_005",
            Self::SorobanDataFailed(_) => "ATX_006",
            Self::OperationAppendFailed(_) => "ATX_007",
            Self::BuildFailed(_) => "ATX_008",
            Self::MemoFailed(_) => "ATX_009",
        }
    }

    /// Suggested fix, when there is an obvious one.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NotSorobanTransaction { .. } => {
                Some("only transactions with a single invoke-host-function operation can be assembled")
            }
            Self::FeeBumpEnvelope => Some("wrap the transaction in a fee-bump after assembling it"),
            Self::BuildFailed(TransactionError::FeeOverflow { .. }) => {
                Some("the inclusion fee plus the resource fee does not fit the fee field")
            }
            _ => None,
        }
    }
}

/// Rebuilds an envelope around its single contract invocation.
///
/// The invocation gets the given authorization entries, the transaction gets
/// the simulated resource data with `resource_fee`, and the fee becomes the
/// original inclusion fee plus `resource_fee`. Sequence number, preconditions
/// and memo are carried over unchanged. Signatures are not: the result is
/// unsigned.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssembleTransaction;

impl AssembleTransaction {
    /// Creates the stage.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Process for AssembleTransaction {
    type Input = AssembleInput;
    type Output = TransactionEnvelope;
    type Error = AssembleError;

    fn name(&self) -> &'static str {
        "AssembleTransaction"
    }

    async fn run(&self, input: AssembleInput) -> Result<TransactionEnvelope, AssembleError> {
        let TransactionEnvelope::Tx(envelope) = input.envelope else {
            return Err(AssembleError::FeeBumpEnvelope);
        };
        let tx = envelope.tx;
        let mut operation = match tx.operations.as_slice() {
            [operation] if operation.kind() == OperationKind::InvokeHostFunction => {
                operation.clone()
            }
            _ => {
                return Err(AssembleError::NotSorobanTransaction {
                    kinds: tx.operation_kinds(),
                })
            }
        };
        let resource_fee =
            i64::try_from(input.resource_fee).map_err(|_| AssembleError::InvalidResourceFee {
                resource_fee: input.resource_fee,
            })?;

        if let (OperationBody::InvokeHostFunction(invoke), Some(auth)) =
            (&mut operation.body, input.auth_entries)
        {
            invoke.auth = auth;
        }
        let mut soroban_data = input
            .soroban_data
            .or_else(|| tx.soroban_data.clone())
            .unwrap_or_default();
        soroban_data.resource_fee = resource_fee;

        // Rebuilding from sequence - 1 reuses the original sequence number.
        let inclusion_fee = u32::try_from(tx.inclusion_fee()).unwrap_or(0);
        let account = SourceAccount::new(tx.source_account, tx.seq_num.saturating_sub(1));
        let mut builder = TransactionBuilder::new(&account, inclusion_fee)
            .map_err(AssembleError::BuilderCreationFailed)?;
        builder
            .set_preconditions(&tx.cond)
            .map_err(AssembleError::PreconditionFailed)?;
        builder.add_memo(tx.memo).map_err(AssembleError::MemoFailed)?;
        builder
            .set_soroban_data(soroban_data)
            .map_err(AssembleError::SorobanDataFailed)?;
        builder
            .add_operation(operation)
            .map_err(AssembleError::OperationAppendFailed)?;

        let assembled = builder.build().map_err(AssembleError::BuildFailed)?;
        debug!(
            seq_num = assembled.seq_num,
            inclusion_fee,
            resource_fee,
            fee = assembled.fee,
            "assembled transaction"
        );
        Ok(TransactionEnvelope::from_transaction(assembled))
    }
}
