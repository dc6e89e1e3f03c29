//! Multisig threshold classification.
//!
//! Every operation demands one of three authority tiers from its source
//! account's signer set. The table below follows the ledger's own per-operation
//! thresholds: a handful of operations only need `Low`, merging an account and
//! changing signers or thresholds need `High`, everything else is `Medium`.

use crate::transaction::operation::{Operation, OperationBody, OperationKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The multisig authority tier an operation demands.
///
/// Ordered so that `Low < Medium < High`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdLevel {
    /// Low authority.
    Low,
    /// Medium authority.
    Medium,
    /// High authority.
    High,
}

impl fmt::Display for ThresholdLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdLevel::Low => f.write_str("low"),
            ThresholdLevel::Medium => f.write_str("medium"),
            ThresholdLevel::High => f.write_str("high"),
        }
    }
}

impl OperationKind {
    /// The threshold an operation of this kind needs, ignoring its body.
    ///
    /// `SetOptions` reports `High` here; [`Operation::threshold`] lowers it to
    /// `Medium` when the body leaves signers and thresholds alone.
    pub fn threshold(&self) -> ThresholdLevel {
        match self {
            OperationKind::AllowTrust
            | OperationKind::Inflation
            | OperationKind::BumpSequence
            | OperationKind::ClaimClaimableBalance
            | OperationKind::SetTrustLineFlags
            | OperationKind::ExtendFootprintTtl
            | OperationKind::RestoreFootprint => ThresholdLevel::Low,

            OperationKind::AccountMerge | OperationKind::SetOptions => ThresholdLevel::High,

            OperationKind::CreateAccount
            | OperationKind::Payment
            | OperationKind::PathPaymentStrictReceive
            | OperationKind::ManageSellOffer
            | OperationKind::CreatePassiveSellOffer
            | OperationKind::ChangeTrust
            | OperationKind::ManageData
            | OperationKind::ManageBuyOffer
            | OperationKind::PathPaymentStrictSend
            | OperationKind::CreateClaimableBalance
            | OperationKind::BeginSponsoringFutureReserves
            | OperationKind::EndSponsoringFutureReserves
            | OperationKind::RevokeSponsorship
            | OperationKind::Clawback
            | OperationKind::ClawbackClaimableBalance
            | OperationKind::LiquidityPoolDeposit
            | OperationKind::LiquidityPoolWithdraw
            | OperationKind::InvokeHostFunction => ThresholdLevel::Medium,
        }
    }
}

impl Operation {
    /// The threshold this operation needs from its source account.
    pub fn threshold(&self) -> ThresholdLevel {
        match &self.body {
            OperationBody::SetOptions(options) if !options.changes_authority() => {
                ThresholdLevel::Medium
            }
            body => body.kind().threshold(),
        }
    }
}

/// Threshold needed from the fee source of a fee-bump envelope.
pub const FEE_BUMP_THRESHOLD: ThresholdLevel = ThresholdLevel::Low;
