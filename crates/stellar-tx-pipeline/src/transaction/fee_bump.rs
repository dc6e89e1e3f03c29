//! Fee-bump transactions.
//!
//! A fee-bump wraps an already-signed plain transaction and pays its fee from
//! a different account. The inner signatures stay valid; only the fee source
//! has to sign the wrapper.
//!
//! # Example
//!
//! ```rust,ignore
//! use stellar_tx_pipeline::transaction::FeeBumpBuilder;
//!
//! let bumped = FeeBumpBuilder::new()
//!     .fee_source(sponsor)
//!     .base_fee(200)
//!     .inner(signed_envelope)
//!     .build()?;
//! ```

use crate::transaction::envelope::{
    FeeBumpTransaction, FeeBumpTransactionEnvelope, TransactionEnvelope,
};
use crate::transaction::TransactionError;
use crate::types::MuxedAccount;

/// A builder for fee-bump envelopes.
#[derive(Debug, Clone, Default)]
pub struct FeeBumpBuilder {
    fee_source: Option<MuxedAccount>,
    base_fee: u32,
    inner: Option<TransactionEnvelope>,
}

impl FeeBumpBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the account paying the fee.
    #[must_use]
    pub fn fee_source(mut self, fee_source: impl Into<MuxedAccount>) -> Self {
        self.fee_source = Some(fee_source.into());
        self
    }

    /// Sets the fee offered per operation, counting the wrapper as one.
    #[must_use]
    pub fn base_fee(mut self, base_fee: u32) -> Self {
        self.base_fee = base_fee;
        self
    }

    /// Sets the envelope to wrap.
    #[must_use]
    pub fn inner(mut self, envelope: TransactionEnvelope) -> Self {
        self.inner = Some(envelope);
        self
    }

    /// Builds the unsigned fee-bump envelope.
    ///
    /// The fee is `base_fee × (inner operations + 1)` plus the inner
    /// transaction's resource fee.
    ///
    /// # Errors
    ///
    /// Returns an error if the fee source or inner envelope is missing, the
    /// inner envelope is itself a fee-bump, or the resulting fee is lower than
    /// the inner transaction's fee.
    pub fn build(self) -> Result<TransactionEnvelope, TransactionError> {
        let fee_source = self.fee_source.ok_or(TransactionError::MissingFeeSource)?;
        let inner = match self.inner.ok_or(TransactionError::MissingInnerTransaction)? {
            TransactionEnvelope::Tx(inner) => inner,
            TransactionEnvelope::FeeBump(_) => return Err(TransactionError::NestedFeeBump),
        };

        let operations = i64::try_from(inner.tx.operations.len()).unwrap_or(i64::MAX);
        let fee = i64::from(self.base_fee)
            .saturating_mul(operations.saturating_add(1))
            .saturating_add(inner.tx.resource_fee());
        let inner_fee = i64::from(inner.tx.fee);
        if fee < inner_fee {
            return Err(TransactionError::FeeBumpFeeTooLow { fee, inner_fee });
        }

        Ok(TransactionEnvelope::FeeBump(FeeBumpTransactionEnvelope {
            tx: FeeBumpTransaction {
                fee_source,
                fee,
                inner_tx: inner,
            },
            signatures: Vec::new(),
        }))
    }
}
