//! Transaction preconditions.

use crate::transaction::operation::SignerKey;
use serde::{Deserialize, Serialize};

/// Maximum number of extra signers a transaction can require.
pub const MAX_EXTRA_SIGNERS: usize = 2;

/// A window of unix times in which the transaction is valid.
///
/// A `max_time` of zero means the window has no upper end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBounds {
    /// Earliest valid time, inclusive.
    pub min_time: u64,
    /// Latest valid time, inclusive, or zero for no limit.
    pub max_time: u64,
}

impl TimeBounds {
    /// A window with no limits on either side.
    pub const UNBOUNDED: Self = Self {
        min_time: 0,
        max_time: 0,
    };

    /// Creates a time window.
    pub fn new(min_time: u64, max_time: u64) -> Self {
        Self { min_time, max_time }
    }

    /// Returns true if the window has an upper end.
    pub fn has_deadline(&self) -> bool {
        self.max_time != 0
    }
}

/// A range of ledgers in which the transaction is valid.
///
/// A `max_ledger` of zero means the range has no upper end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerBounds {
    /// First valid ledger, inclusive.
    pub min_ledger: u32,
    /// Last valid ledger, exclusive, or zero for no limit.
    pub max_ledger: u32,
}

impl LedgerBounds {
    /// Creates a ledger range.
    pub fn new(min_ledger: u32, max_ledger: u32) -> Self {
        Self {
            min_ledger,
            max_ledger,
        }
    }

    /// Returns true if the range can contain a ledger.
    pub fn is_valid(&self) -> bool {
        self.max_ledger == 0 || self.min_ledger <= self.max_ledger
    }
}

/// Preconditions carried by a built transaction.
///
/// Time bounds are always present once the builder has run: either an
/// explicit window, a window derived from a timeout, or the unbounded window.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preconditions {
    /// The valid time window.
    pub time_bounds: Option<TimeBounds>,
    /// The valid ledger range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_bounds: Option<LedgerBounds>,
    /// The source account's sequence number must be at least this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_sequence_number: Option<i64>,
    /// Seconds that must pass since the source sequence number last changed.
    #[serde(default)]
    pub min_sequence_age: u64,
    /// Ledgers that must close since the source sequence number last changed.
    #[serde(default)]
    pub min_sequence_ledger_gap: u32,
    /// Signers required in addition to the usual thresholds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_signers: Vec<SignerKey>,
}

impl Preconditions {
    /// The latest unix time the transaction is valid for, if bounded.
    pub fn deadline(&self) -> Option<u64> {
        self.time_bounds
            .filter(TimeBounds::has_deadline)
            .map(|bounds| bounds.max_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline() {
        let mut cond = Preconditions::default();
        assert_eq!(cond.deadline(), None);
        cond.time_bounds = Some(TimeBounds::UNBOUNDED);
        assert_eq!(cond.deadline(), None);
        cond.time_bounds = Some(TimeBounds::new(0, 1_700_000_000));
        assert_eq!(cond.deadline(), Some(1_700_000_000));
    }

    #[test]
    fn test_ledger_bounds_validity() {
        assert!(LedgerBounds::new(10, 0).is_valid());
        assert!(LedgerBounds::new(10, 20).is_valid());
        assert!(!LedgerBounds::new(20, 10).is_valid());
    }
}
