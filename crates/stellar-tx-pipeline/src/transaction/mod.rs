//! Transaction model, building and encoding.
//!
//! This module holds everything the pipeline stages manipulate: operations and
//! their threshold classification, preconditions, smart-contract data and
//! authorization entries, plain and fee-bump envelopes, and the builders that
//! produce them.
//!
//! # Overview
//!
//! - **Plain transactions** - built with [`TransactionBuilder`] from a
//!   [`SourceAccount`] view
//! - **Fee-bump transactions** - wrap a signed plain envelope under another
//!   fee source with [`FeeBumpBuilder`]
//! - **Transport** - envelopes and Soroban payloads cross the RPC boundary as
//!   base64 via [`codec`]

mod builder;
pub mod codec;
mod envelope;
mod fee_bump;
mod operation;
mod preconditions;
mod soroban;
mod threshold;

pub use builder::{SourceAccount, TransactionBuilder, MAX_OPERATIONS, TIMEOUT_INFINITE};
pub use codec::CodecError;
pub use envelope::{
    DecoratedSignature, FeeBumpTransaction, FeeBumpTransactionEnvelope, Memo, Transaction,
    TransactionEnvelope, TransactionV1Envelope, ENVELOPE_TYPE_SOROBAN_AUTHORIZATION,
    ENVELOPE_TYPE_TX, ENVELOPE_TYPE_TX_FEE_BUMP, MAX_MEMO_TEXT_LENGTH,
};
pub use fee_bump::FeeBumpBuilder;
pub use operation::{
    Asset, ClaimPredicate, Claimant, InvokeHostFunctionOp, Operation, OperationBody,
    OperationKind, Price, RevokeSponsorship, SetOptionsOp, SignerKey, SignerUpdate,
};
pub use preconditions::{LedgerBounds, Preconditions, TimeBounds, MAX_EXTRA_SIGNERS};
pub use soroban::{
    CreateContractArgs, HostFunction, InvokeContractArgs, LedgerFootprint, LedgerKey,
    ScMapEntry, ScVal, SorobanAddressCredentials, SorobanAuthorizationEntry,
    SorobanAuthorizedFunction, SorobanAuthorizedInvocation, SorobanCredentials,
    SorobanResources, SorobanTransactionData,
};
pub use threshold::{ThresholdLevel, FEE_BUMP_THRESHOLD};

use thiserror::Error;

/// Errors raised while constructing transactions.
#[derive(Error, Debug)]
pub enum TransactionError {
    /// The base fee was zero
    #[error("invalid base fee: {0}")]
    InvalidBaseFee(u32),

    /// The source sequence number cannot be incremented
    #[error("sequence number {0} cannot be incremented")]
    SequenceOverflow(i64),

    /// No operations were added
    #[error("transaction has no operations")]
    NoOperations,

    /// Too many operations were added
    #[error("transaction cannot hold more than {max} operations")]
    TooManyOperations {
        /// The limit
        max: usize,
    },

    /// Text memo too long
    #[error("memo text is {length} bytes, limit is {max}")]
    MemoTooLong {
        /// Actual length
        length: usize,
        /// The limit
        max: usize,
    },

    /// Both a time window and a timeout were applied
    #[error("time bounds and timeout are mutually exclusive")]
    ConflictingTimeConstraints,

    /// Neither a time window nor a timeout was applied
    #[error("transaction has no time bounds; set a timeout or an explicit window")]
    MissingTimeBounds,

    /// The time window is empty
    #[error("invalid time bounds: min {min_time} > max {max_time}")]
    InvalidTimeBounds {
        /// Lower end
        min_time: u64,
        /// Upper end
        max_time: u64,
    },

    /// The ledger range is empty
    #[error("invalid ledger bounds: min {min_ledger} > max {max_ledger}")]
    InvalidLedgerBounds {
        /// Lower end
        min_ledger: u32,
        /// Upper end
        max_ledger: u32,
    },

    /// Too many extra signers
    #[error("transaction cannot require more than {max} extra signers")]
    TooManyExtraSigners {
        /// The limit
        max: usize,
    },

    /// Soroban data declared a negative resource fee
    #[error("resource fee cannot be negative: {0}")]
    NegativeResourceFee(i64),

    /// Soroban data attached to a transaction with classic operations
    #[error("soroban data can only be attached to smart-contract operations")]
    SorobanDataOnClassicOperation,

    /// The computed fee does not fit the fee field
    #[error("fee overflow: base fee {base_fee} x {operations} operations + resource fee {resource_fee}")]
    FeeOverflow {
        /// Per-operation fee
        base_fee: u32,
        /// Operation count
        operations: usize,
        /// Resource fee
        resource_fee: i64,
    },

    /// A fee-bump was built without a fee source
    #[error("fee-bump requires a fee source")]
    MissingFeeSource,

    /// A fee-bump was built without an inner transaction
    #[error("fee-bump requires an inner transaction")]
    MissingInnerTransaction,

    /// A fee-bump was asked to wrap another fee-bump
    #[error("cannot fee-bump a fee-bump transaction")]
    NestedFeeBump,

    /// The fee-bump fee would be lower than the inner transaction's fee
    #[error("fee-bump fee {fee} is lower than the inner transaction fee {inner_fee}")]
    FeeBumpFeeTooLow {
        /// Offered fee
        fee: i64,
        /// Inner transaction fee
        inner_fee: i64,
    },
}
