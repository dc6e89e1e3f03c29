//! Ledger operations.

use crate::transaction::soroban::{
    HostFunction, SorobanAuthorizationEntry, SorobanTransactionData,
};
use crate::types::{AccountId, Hash, MuxedAccount};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An asset held on the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Asset {
    /// The native lumen.
    Native,
    /// An issued credit asset.
    Credit {
        /// Asset code, 1 to 12 characters.
        code: String,
        /// The issuing account.
        issuer: AccountId,
    },
}

impl Asset {
    /// Creates an issued credit asset.
    pub fn credit(code: impl Into<String>, issuer: AccountId) -> Self {
        Asset::Credit {
            code: code.into(),
            issuer,
        }
    }
}

/// A rational price `n / d`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Numerator.
    pub n: i32,
    /// Denominator.
    pub d: i32,
}

/// A signer key added, updated or removed by `SetOptions`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignerKey {
    /// An Ed25519 public key.
    Ed25519(AccountId),
    /// A pre-authorized transaction hash.
    PreAuthTx(Hash),
    /// A SHA-256 hash whose preimage must be revealed.
    HashX(Hash),
}

/// One signer slot in `SetOptions`; a weight of zero removes the signer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerUpdate {
    /// The signer key.
    pub key: SignerKey,
    /// The new weight.
    pub weight: u32,
}

/// Predicate gating when a claimable balance may be claimed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimPredicate {
    /// Always claimable.
    Unconditional,
    /// Claimable before an absolute unix time.
    BeforeAbsoluteTime(i64),
    /// Claimable within a number of seconds of creation.
    BeforeRelativeTime(i64),
    /// Negation.
    Not(Box<ClaimPredicate>),
    /// Conjunction.
    And(Vec<ClaimPredicate>),
    /// Disjunction.
    Or(Vec<ClaimPredicate>),
}

/// A recipient of a claimable balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claimant {
    /// Who may claim.
    pub destination: AccountId,
    /// When they may claim.
    pub predicate: ClaimPredicate,
}

/// The ledger entry whose sponsorship is revoked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevokeSponsorship {
    /// An opaque ledger entry key.
    LedgerEntry(crate::transaction::soroban::LedgerKey),
    /// A signer on an account.
    Signer {
        /// The account holding the signer.
        account: AccountId,
        /// The signer key.
        key: SignerKey,
    },
}

/// `SetOptions` body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetOptionsOp {
    /// Inflation destination.
    pub inflation_dest: Option<AccountId>,
    /// Flags to clear.
    pub clear_flags: Option<u32>,
    /// Flags to set.
    pub set_flags: Option<u32>,
    /// New master key weight.
    pub master_weight: Option<u32>,
    /// New low threshold.
    pub low_threshold: Option<u32>,
    /// New medium threshold.
    pub med_threshold: Option<u32>,
    /// New high threshold.
    pub high_threshold: Option<u32>,
    /// New home domain.
    pub home_domain: Option<String>,
    /// Signer to add, update or remove.
    pub signer: Option<SignerUpdate>,
}

impl SetOptionsOp {
    /// Returns true if this changes who can sign or how much authority they need.
    pub fn changes_authority(&self) -> bool {
        self.master_weight.is_some()
            || self.low_threshold.is_some()
            || self.med_threshold.is_some()
            || self.high_threshold.is_some()
            || self.signer.is_some()
    }
}

/// The body of an operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum OperationBody {
    CreateAccount {
        destination: AccountId,
        starting_balance: i64,
    },
    Payment {
        destination: MuxedAccount,
        asset: Asset,
        amount: i64,
    },
    PathPaymentStrictReceive {
        send_asset: Asset,
        send_max: i64,
        destination: MuxedAccount,
        dest_asset: Asset,
        dest_amount: i64,
        path: Vec<Asset>,
    },
    ManageSellOffer {
        selling: Asset,
        buying: Asset,
        amount: i64,
        price: Price,
        offer_id: i64,
    },
    CreatePassiveSellOffer {
        selling: Asset,
        buying: Asset,
        amount: i64,
        price: Price,
    },
    SetOptions(SetOptionsOp),
    ChangeTrust {
        line: Asset,
        limit: i64,
    },
    AllowTrust {
        trustor: AccountId,
        asset_code: String,
        authorize: u32,
    },
    AccountMerge(MuxedAccount),
    Inflation,
    ManageData {
        data_name: String,
        #[serde(with = "hex::serde")]
        data_value: Vec<u8>,
    },
    BumpSequence {
        bump_to: i64,
    },
    ManageBuyOffer {
        selling: Asset,
        buying: Asset,
        buy_amount: i64,
        price: Price,
        offer_id: i64,
    },
    PathPaymentStrictSend {
        send_asset: Asset,
        send_amount: i64,
        destination: MuxedAccount,
        dest_asset: Asset,
        dest_min: i64,
        path: Vec<Asset>,
    },
    CreateClaimableBalance {
        asset: Asset,
        amount: i64,
        claimants: Vec<Claimant>,
    },
    ClaimClaimableBalance {
        balance_id: Hash,
    },
    BeginSponsoringFutureReserves {
        sponsored_id: AccountId,
    },
    EndSponsoringFutureReserves,
    RevokeSponsorship(RevokeSponsorship),
    Clawback {
        asset: Asset,
        from: MuxedAccount,
        amount: i64,
    },
    ClawbackClaimableBalance {
        balance_id: Hash,
    },
    SetTrustLineFlags {
        trustor: AccountId,
        asset: Asset,
        clear_flags: u32,
        set_flags: u32,
    },
    LiquidityPoolDeposit {
        liquidity_pool_id: Hash,
        max_amount_a: i64,
        max_amount_b: i64,
        min_price: Price,
        max_price: Price,
    },
    LiquidityPoolWithdraw {
        liquidity_pool_id: Hash,
        amount: i64,
        min_amount_a: i64,
        min_amount_b: i64,
    },
    InvokeHostFunction(InvokeHostFunctionOp),
    ExtendFootprintTtl {
        extend_to: u32,
    },
    RestoreFootprint,
}

/// `InvokeHostFunction` body: the call plus the authorizations it carries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeHostFunctionOp {
    /// The host function to run.
    pub host_function: HostFunction,
    /// Authorization entries, empty until simulation fills them in.
    pub auth: Vec<SorobanAuthorizationEntry>,
}

/// The discriminant of [`OperationBody`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum OperationKind {
    CreateAccount,
    Payment,
    PathPaymentStrictReceive,
    ManageSellOffer,
    CreatePassiveSellOffer,
    SetOptions,
    ChangeTrust,
    AllowTrust,
    AccountMerge,
    Inflation,
    ManageData,
    BumpSequence,
    ManageBuyOffer,
    PathPaymentStrictSend,
    CreateClaimableBalance,
    ClaimClaimableBalance,
    BeginSponsoringFutureReserves,
    EndSponsoringFutureReserves,
    RevokeSponsorship,
    Clawback,
    ClawbackClaimableBalance,
    SetTrustLineFlags,
    LiquidityPoolDeposit,
    LiquidityPoolWithdraw,
    InvokeHostFunction,
    ExtendFootprintTtl,
    RestoreFootprint,
}

impl OperationKind {
    /// Returns the snake_case name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::CreateAccount => "create_account",
            OperationKind::Payment => "payment",
            OperationKind::PathPaymentStrictReceive => "path_payment_strict_receive",
            OperationKind::ManageSellOffer => "manage_sell_offer",
            OperationKind::CreatePassiveSellOffer => "create_passive_sell_offer",
            OperationKind::SetOptions => "set_options",
            OperationKind::ChangeTrust => "change_trust",
            OperationKind::AllowTrust => "allow_trust",
            OperationKind::AccountMerge => "account_merge",
            OperationKind::Inflation => "inflation",
            OperationKind::ManageData => "manage_data",
            OperationKind::BumpSequence => "bump_sequence",
            OperationKind::ManageBuyOffer => "manage_buy_offer",
            OperationKind::PathPaymentStrictSend => "path_payment_strict_send",
            OperationKind::CreateClaimableBalance => "create_claimable_balance",
            OperationKind::ClaimClaimableBalance => "claim_claimable_balance",
            OperationKind::BeginSponsoringFutureReserves => "begin_sponsoring_future_reserves",
            OperationKind::EndSponsoringFutureReserves => "end_sponsoring_future_reserves",
            OperationKind::RevokeSponsorship => "revoke_sponsorship",
            OperationKind::Clawback => "clawback",
            OperationKind::ClawbackClaimableBalance => "clawback_claimable_balance",
            OperationKind::SetTrustLineFlags => "set_trust_line_flags",
            OperationKind::LiquidityPoolDeposit => "liquidity_pool_deposit",
            OperationKind::LiquidityPoolWithdraw => "liquidity_pool_withdraw",
            OperationKind::InvokeHostFunction => "invoke_host_function",
            OperationKind::ExtendFootprintTtl => "extend_footprint_ttl",
            OperationKind::RestoreFootprint => "restore_footprint",
        }
    }

    /// Returns true for the three smart-contract operation kinds.
    pub fn is_soroban(&self) -> bool {
        matches!(
            self,
            OperationKind::InvokeHostFunction
                | OperationKind::ExtendFootprintTtl
                | OperationKind::RestoreFootprint
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl OperationBody {
    /// Returns the kind of this operation.
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationBody::CreateAccount { .. } => OperationKind::CreateAccount,
            OperationBody::Payment { .. } => OperationKind::Payment,
            OperationBody::PathPaymentStrictReceive { .. } => {
                OperationKind::PathPaymentStrictReceive
            }
            OperationBody::ManageSellOffer { .. } => OperationKind::ManageSellOffer,
            OperationBody::CreatePassiveSellOffer { .. } => OperationKind::CreatePassiveSellOffer,
            OperationBody::SetOptions(_) => OperationKind::SetOptions,
            OperationBody::ChangeTrust { .. } => OperationKind::ChangeTrust,
            OperationBody::AllowTrust { .. } => OperationKind::AllowTrust,
            OperationBody::AccountMerge(_) => OperationKind::AccountMerge,
            OperationBody::Inflation => OperationKind::Inflation,
            OperationBody::ManageData { .. } => OperationKind::ManageData,
            OperationBody::BumpSequence { .. } => OperationKind::BumpSequence,
            OperationBody::ManageBuyOffer { .. } => OperationKind::ManageBuyOffer,
            OperationBody::PathPaymentStrictSend { .. } => OperationKind::PathPaymentStrictSend,
            OperationBody::CreateClaimableBalance { .. } => OperationKind::CreateClaimableBalance,
            OperationBody::ClaimClaimableBalance { .. } => OperationKind::ClaimClaimableBalance,
            OperationBody::BeginSponsoringFutureReserves { .. } => {
                OperationKind::BeginSponsoringFutureReserves
            }
            OperationBody::EndSponsoringFutureReserves => {
                OperationKind::EndSponsoringFutureReserves
            }
            OperationBody::RevokeSponsorship(_) => OperationKind::RevokeSponsorship,
            OperationBody::Clawback { .. } => OperationKind::Clawback,
            OperationBody::ClawbackClaimableBalance { .. } => {
                OperationKind::ClawbackClaimableBalance
            }
            OperationBody::SetTrustLineFlags { .. } => OperationKind::SetTrustLineFlags,
            OperationBody::LiquidityPoolDeposit { .. } => OperationKind::LiquidityPoolDeposit,
            OperationBody::LiquidityPoolWithdraw { .. } => OperationKind::LiquidityPoolWithdraw,
            OperationBody::InvokeHostFunction(_) => OperationKind::InvokeHostFunction,
            OperationBody::ExtendFootprintTtl { .. } => OperationKind::ExtendFootprintTtl,
            OperationBody::RestoreFootprint => OperationKind::RestoreFootprint,
        }
    }
}

/// An operation with an optional explicit source.
///
/// When `source_account` is `None` the operation runs on behalf of the
/// enclosing transaction's source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Explicit source, overriding the transaction source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_account: Option<MuxedAccount>,
    /// What the operation does.
    pub body: OperationBody,
}

impl Operation {
    /// Creates an operation that inherits the transaction source.
    pub fn new(body: OperationBody) -> Self {
        Self {
            source_account: None,
            body,
        }
    }

    /// Sets an explicit source account.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<MuxedAccount>) -> Self {
        self.source_account = Some(source.into());
        self
    }

    /// Returns the kind of this operation.
    pub fn kind(&self) -> OperationKind {
        self.body.kind()
    }

    /// Creates a payment.
    pub fn payment(destination: impl Into<MuxedAccount>, asset: Asset, amount: i64) -> Self {
        Self::new(OperationBody::Payment {
            destination: destination.into(),
            asset,
            amount,
        })
    }

    /// Creates a contract call with no authorizations attached yet.
    pub fn invoke_host_function(host_function: HostFunction) -> Self {
        Self::new(OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
            host_function,
            auth: Vec::new(),
        }))
    }
}

/// Resource data can be attached only to transactions of smart-contract operations.
pub(crate) fn soroban_data_applies(
    operations: &[Operation],
    data: Option<&SorobanTransactionData>,
) -> bool {
    data.is_none() || operations.iter().all(|op| op.kind().is_soroban())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::soroban::InvokeContractArgs;
    use crate::types::{ContractId, ScAddress};

    #[test]
    fn test_kind_and_name() {
        let op = Operation::payment(AccountId::new([1; 32]), Asset::Native, 10);
        assert_eq!(op.kind(), OperationKind::Payment);
        assert_eq!(op.kind().to_string(), "payment");
        assert!(!op.kind().is_soroban());
    }

    #[test]
    fn test_with_source() {
        let source = AccountId::new([2; 32]);
        let op = Operation::new(OperationBody::Inflation).with_source(source);
        assert_eq!(op.source_account, Some(MuxedAccount::Ed25519(source)));
    }

    #[test]
    fn test_set_options_authority() {
        assert!(!SetOptionsOp::default().changes_authority());
        let op = SetOptionsOp {
            home_domain: Some("example.com".to_string()),
            ..Default::default()
        };
        assert!(!op.changes_authority());
        let op = SetOptionsOp {
            high_threshold: Some(3),
            ..Default::default()
        };
        assert!(op.changes_authority());
    }

    #[test]
    fn test_soroban_data_only_on_soroban_ops() {
        let invoke = Operation::invoke_host_function(HostFunction::InvokeContract(
            InvokeContractArgs {
                contract_address: ScAddress::Contract(ContractId(Hash::ZERO)),
                function_name: "hello".to_string(),
                args: vec![],
            },
        ));
        let data = SorobanTransactionData::default();
        assert!(soroban_data_applies(&[invoke.clone()], Some(&data)));
        let payment = Operation::payment(AccountId::new([1; 32]), Asset::Native, 1);
        assert!(!soroban_data_applies(&[invoke, payment.clone()], Some(&data)));
        assert!(soroban_data_applies(&[payment], None));
    }
}
