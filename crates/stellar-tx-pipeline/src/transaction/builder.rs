//! Transaction builder.

use crate::transaction::envelope::{Memo, Transaction, MAX_MEMO_TEXT_LENGTH};
use crate::transaction::operation::{soroban_data_applies, Operation, SignerKey};
use crate::transaction::preconditions::{
    LedgerBounds, Preconditions, TimeBounds, MAX_EXTRA_SIGNERS,
};
use crate::transaction::soroban::SorobanTransactionData;
use crate::transaction::TransactionError;
use crate::types::{AccountId, MuxedAccount};
use std::time::{SystemTime, UNIX_EPOCH};

/// Maximum number of operations in one transaction.
pub const MAX_OPERATIONS: usize = 100;
/// Timeout value meaning "valid forever".
pub const TIMEOUT_INFINITE: u64 = 0;

/// The view of an account a transaction is built from: its address and its
/// current sequence number. The built transaction consumes `sequence + 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceAccount {
    account: MuxedAccount,
    sequence: i64,
}

impl SourceAccount {
    /// Creates an account view.
    pub fn new(account: impl Into<MuxedAccount>, sequence: i64) -> Self {
        Self {
            account: account.into(),
            sequence,
        }
    }

    /// The account address.
    pub fn account(&self) -> MuxedAccount {
        self.account
    }

    /// The base account.
    pub fn account_id(&self) -> AccountId {
        self.account.account_id()
    }

    /// The current sequence number.
    pub fn sequence(&self) -> i64 {
        self.sequence
    }
}

/// A builder for constructing transactions.
///
/// # Example
///
/// ```rust
/// use stellar_tx_pipeline::transaction::{
///     Asset, Operation, SourceAccount, TransactionBuilder, TIMEOUT_INFINITE,
/// };
/// use stellar_tx_pipeline::types::AccountId;
///
/// let source = SourceAccount::new(AccountId::new([1; 32]), 41);
/// let mut builder = TransactionBuilder::new(&source, 100).unwrap();
/// builder
///     .add_operation(Operation::payment(AccountId::new([2; 32]), Asset::Native, 10))
///     .unwrap()
///     .set_timeout(TIMEOUT_INFINITE)
///     .unwrap();
/// let tx = builder.build().unwrap();
/// assert_eq!(tx.seq_num, 42);
/// assert_eq!(tx.fee, 100);
/// ```
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    source: MuxedAccount,
    seq_num: i64,
    base_fee: u32,
    operations: Vec<Operation>,
    memo: Memo,
    time_bounds: Option<TimeBounds>,
    ledger_bounds: Option<LedgerBounds>,
    min_sequence_number: Option<i64>,
    min_sequence_age: u64,
    min_sequence_ledger_gap: u32,
    extra_signers: Vec<SignerKey>,
    soroban_data: Option<SorobanTransactionData>,
}

impl TransactionBuilder {
    /// Starts a transaction from `source`, paying `base_fee` per operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the base fee is zero or the source sequence number
    /// cannot be incremented.
    pub fn new(source: &SourceAccount, base_fee: u32) -> Result<Self, TransactionError> {
        if base_fee == 0 {
            return Err(TransactionError::InvalidBaseFee(base_fee));
        }
        let seq_num = source
            .sequence
            .checked_add(1)
            .ok_or(TransactionError::SequenceOverflow(source.sequence))?;
        Ok(Self {
            source: source.account,
            seq_num,
            base_fee,
            operations: Vec::new(),
            memo: Memo::None,
            time_bounds: None,
            ledger_bounds: None,
            min_sequence_number: None,
            min_sequence_age: 0,
            min_sequence_ledger_gap: 0,
            extra_signers: Vec::new(),
            soroban_data: None,
        })
    }

    /// Appends an operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction already holds the maximum number of operations.
    pub fn add_operation(&mut self, operation: Operation) -> Result<&mut Self, TransactionError> {
        if self.operations.len() >= MAX_OPERATIONS {
            return Err(TransactionError::TooManyOperations { max: MAX_OPERATIONS });
        }
        self.operations.push(operation);
        Ok(self)
    }

    /// Sets the memo.
    ///
    /// # Errors
    ///
    /// Returns an error if a text memo is longer than 28 bytes.
    pub fn add_memo(&mut self, memo: Memo) -> Result<&mut Self, TransactionError> {
        if let Memo::Text(text) = &memo {
            if text.len() > MAX_MEMO_TEXT_LENGTH {
                return Err(TransactionError::MemoTooLong {
                    length: text.len(),
                    max: MAX_MEMO_TEXT_LENGTH,
                });
            }
        }
        self.memo = memo;
        Ok(self)
    }

    /// Sets an explicit validity window.
    ///
    /// # Errors
    ///
    /// Returns an error if a time constraint was already applied or the window is empty.
    pub fn set_time_bounds(&mut self, bounds: TimeBounds) -> Result<&mut Self, TransactionError> {
        if self.time_bounds.is_some() {
            return Err(TransactionError::ConflictingTimeConstraints);
        }
        if bounds.has_deadline() && bounds.min_time > bounds.max_time {
            return Err(TransactionError::InvalidTimeBounds {
                min_time: bounds.min_time,
                max_time: bounds.max_time,
            });
        }
        self.time_bounds = Some(bounds);
        Ok(self)
    }

    /// Makes the transaction expire `seconds` from now, or never for
    /// [`TIMEOUT_INFINITE`].
    ///
    /// Uses saturating arithmetic to handle edge cases like system time going backwards.
    ///
    /// # Errors
    ///
    /// Returns an error if a time constraint was already applied.
    pub fn set_timeout(&mut self, seconds: u64) -> Result<&mut Self, TransactionError> {
        if self.time_bounds.is_some() {
            return Err(TransactionError::ConflictingTimeConstraints);
        }
        let max_time = if seconds == TIMEOUT_INFINITE {
            0
        } else {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs()
                .saturating_add(seconds)
        };
        self.time_bounds = Some(TimeBounds::new(0, max_time));
        Ok(self)
    }

    /// Returns true once a time window or timeout has been applied.
    pub fn has_time_constraint(&self) -> bool {
        self.time_bounds.is_some()
    }

    /// Sets the valid ledger range.
    ///
    /// # Errors
    ///
    /// Returns an error if the range is empty.
    pub fn set_ledger_bounds(
        &mut self,
        bounds: LedgerBounds,
    ) -> Result<&mut Self, TransactionError> {
        if !bounds.is_valid() {
            return Err(TransactionError::InvalidLedgerBounds {
                min_ledger: bounds.min_ledger,
                max_ledger: bounds.max_ledger,
            });
        }
        self.ledger_bounds = Some(bounds);
        Ok(self)
    }

    /// Requires the source sequence number to be at least `min`.
    pub fn set_min_sequence_number(&mut self, min: i64) -> &mut Self {
        self.min_sequence_number = Some(min);
        self
    }

    /// Requires `seconds` to pass since the source sequence number last changed.
    pub fn set_min_sequence_age(&mut self, seconds: u64) -> &mut Self {
        self.min_sequence_age = seconds;
        self
    }

    /// Requires `gap` ledgers to close since the source sequence number last changed.
    pub fn set_min_sequence_ledger_gap(&mut self, gap: u32) -> &mut Self {
        self.min_sequence_ledger_gap = gap;
        self
    }

    /// Adds a signer that must sign in addition to the usual thresholds.
    ///
    /// # Errors
    ///
    /// Returns an error if two extra signers are already required.
    pub fn add_extra_signer(&mut self, key: SignerKey) -> Result<&mut Self, TransactionError> {
        if self.extra_signers.len() >= MAX_EXTRA_SIGNERS {
            return Err(TransactionError::TooManyExtraSigners {
                max: MAX_EXTRA_SIGNERS,
            });
        }
        self.extra_signers.push(key);
        Ok(self)
    }

    /// Applies every precondition of an existing transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if any precondition is rejected by its setter.
    pub fn set_preconditions(
        &mut self,
        cond: &Preconditions,
    ) -> Result<&mut Self, TransactionError> {
        if let Some(bounds) = cond.time_bounds {
            self.set_time_bounds(bounds)?;
        }
        if let Some(bounds) = cond.ledger_bounds {
            self.set_ledger_bounds(bounds)?;
        }
        if let Some(min) = cond.min_sequence_number {
            self.set_min_sequence_number(min);
        }
        self.set_min_sequence_age(cond.min_sequence_age);
        self.set_min_sequence_ledger_gap(cond.min_sequence_ledger_gap);
        for key in &cond.extra_signers {
            self.add_extra_signer(key.clone())?;
        }
        Ok(self)
    }

    /// Attaches smart-contract resource data. Its resource fee is added on
    /// top of the inclusion fee when the transaction is built.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource fee is negative.
    pub fn set_soroban_data(
        &mut self,
        data: SorobanTransactionData,
    ) -> Result<&mut Self, TransactionError> {
        if data.resource_fee < 0 {
            return Err(TransactionError::NegativeResourceFee(data.resource_fee));
        }
        self.soroban_data = Some(data);
        Ok(self)
    }

    /// Builds the transaction.
    ///
    /// The fee is `base_fee × operations` plus the resource fee of any
    /// attached Soroban data.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - there are no operations
    /// - no time window or timeout was applied
    /// - Soroban data is attached to classic operations
    /// - the fee does not fit the fee field
    pub fn build(self) -> Result<Transaction, TransactionError> {
        if self.operations.is_empty() {
            return Err(TransactionError::NoOperations);
        }
        if self.time_bounds.is_none() {
            return Err(TransactionError::MissingTimeBounds);
        }
        if !soroban_data_applies(&self.operations, self.soroban_data.as_ref()) {
            return Err(TransactionError::SorobanDataOnClassicOperation);
        }

        let resource_fee = self
            .soroban_data
            .as_ref()
            .map_or(0, |data| data.resource_fee);
        let fee = u32::try_from(self.operations.len())
            .ok()
            .and_then(|count| self.base_fee.checked_mul(count))
            .and_then(|inclusion| {
                u32::try_from(resource_fee)
                    .ok()
                    .and_then(|resource| inclusion.checked_add(resource))
            })
            .ok_or(TransactionError::FeeOverflow {
                base_fee: self.base_fee,
                operations: self.operations.len(),
                resource_fee,
            })?;

        Ok(Transaction {
            source_account: self.source,
            fee,
            seq_num: self.seq_num,
            cond: Preconditions {
                time_bounds: self.time_bounds,
                ledger_bounds: self.ledger_bounds,
                min_sequence_number: self.min_sequence_number,
                min_sequence_age: self.min_sequence_age,
                min_sequence_ledger_gap: self.min_sequence_ledger_gap,
                extra_signers: self.extra_signers,
            },
            memo: self.memo,
            operations: self.operations,
            soroban_data: self.soroban_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::operation::{Asset, OperationBody};

    fn source() -> SourceAccount {
        SourceAccount::new(AccountId::new([1; 32]), 100)
    }

    fn payment() -> Operation {
        Operation::payment(AccountId::new([2; 32]), Asset::Native, 50)
    }

    #[test]
    fn test_build_basic() {
        let mut builder = TransactionBuilder::new(&source(), 100).unwrap();
        builder
            .add_operation(payment())
            .unwrap()
            .add_operation(payment())
            .unwrap()
            .set_timeout(TIMEOUT_INFINITE)
            .unwrap();
        let tx = builder.build().unwrap();
        assert_eq!(tx.seq_num, 101);
        assert_eq!(tx.fee, 200);
        assert_eq!(tx.cond.time_bounds, Some(TimeBounds::UNBOUNDED));
    }

    #[test]
    fn test_timeout_sets_deadline() {
        let mut builder = TransactionBuilder::new(&source(), 100).unwrap();
        builder.add_operation(payment()).unwrap().set_timeout(30).unwrap();
        let tx = builder.build().unwrap();
        assert!(tx.cond.deadline().is_some());
    }

    #[test]
    fn test_time_constraints_are_exclusive() {
        let mut builder = TransactionBuilder::new(&source(), 100).unwrap();
        builder.set_time_bounds(TimeBounds::new(0, 10)).unwrap();
        assert!(matches!(
            builder.set_timeout(30),
            Err(TransactionError::ConflictingTimeConstraints)
        ));

        let mut builder = TransactionBuilder::new(&source(), 100).unwrap();
        builder.set_timeout(30).unwrap();
        assert!(matches!(
            builder.set_time_bounds(TimeBounds::new(0, 10)),
            Err(TransactionError::ConflictingTimeConstraints)
        ));
    }

    #[test]
    fn test_build_requires_time_bounds_and_operations() {
        let builder = TransactionBuilder::new(&source(), 100).unwrap();
        assert!(matches!(builder.build(), Err(TransactionError::NoOperations)));

        let mut builder = TransactionBuilder::new(&source(), 100).unwrap();
        builder.add_operation(payment()).unwrap();
        assert!(matches!(
            builder.build(),
            Err(TransactionError::MissingTimeBounds)
        ));
    }

    #[test]
    fn test_limits() {
        let mut builder = TransactionBuilder::new(&source(), 100).unwrap();
        for _ in 0..MAX_OPERATIONS {
            builder.add_operation(payment()).unwrap();
        }
        assert!(matches!(
            builder.add_operation(payment()),
            Err(TransactionError::TooManyOperations { .. })
        ));

        let key = SignerKey::Ed25519(AccountId::new([5; 32]));
        builder.add_extra_signer(key.clone()).unwrap();
        builder.add_extra_signer(key.clone()).unwrap();
        assert!(builder.add_extra_signer(key).is_err());

        assert!(builder.set_ledger_bounds(LedgerBounds::new(5, 1)).is_err());
    }

    #[test]
    fn test_memo_length_checked() {
        let mut builder = TransactionBuilder::new(&source(), 100).unwrap();
        assert!(builder.add_memo(Memo::Text("x".repeat(29))).is_err());
        assert!(builder.add_memo(Memo::Id(7)).is_ok());
    }

    #[test]
    fn test_new_rejects_zero_fee_and_max_sequence() {
        assert!(matches!(
            TransactionBuilder::new(&source(), 0),
            Err(TransactionError::InvalidBaseFee(0))
        ));
        let exhausted = SourceAccount::new(AccountId::new([1; 32]), i64::MAX);
        assert!(matches!(
            TransactionBuilder::new(&exhausted, 100),
            Err(TransactionError::SequenceOverflow(_))
        ));
    }

    #[test]
    fn test_soroban_data_adds_resource_fee() {
        let mut builder = TransactionBuilder::new(&source(), 100).unwrap();
        builder
            .add_operation(Operation::new(OperationBody::RestoreFootprint))
            .unwrap()
            .set_timeout(TIMEOUT_INFINITE)
            .unwrap()
            .set_soroban_data(SorobanTransactionData {
                resource_fee: 25,
                ..Default::default()
            })
            .unwrap();
        let tx = builder.build().unwrap();
        assert_eq!(tx.fee, 125);
        assert_eq!(tx.inclusion_fee(), 100);
    }

    #[test]
    fn test_soroban_data_rejected_on_classic() {
        let mut builder = TransactionBuilder::new(&source(), 100).unwrap();
        builder
            .add_operation(payment())
            .unwrap()
            .set_timeout(TIMEOUT_INFINITE)
            .unwrap()
            .set_soroban_data(SorobanTransactionData::default())
            .unwrap();
        assert!(matches!(
            builder.build(),
            Err(TransactionError::SorobanDataOnClassicOperation)
        ));
    }

    #[test]
    fn test_negative_resource_fee_rejected() {
        let mut builder = TransactionBuilder::new(&source(), 100).unwrap();
        let result = builder.set_soroban_data(SorobanTransactionData {
            resource_fee: -1,
            ..Default::default()
        });
        assert!(matches!(
            result,
            Err(TransactionError::NegativeResourceFee(-1))
        ));
    }
}
