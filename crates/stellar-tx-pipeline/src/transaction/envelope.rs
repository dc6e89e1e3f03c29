//! Transactions and their signed envelopes.

use crate::transaction::codec::{self, CodecError};
use crate::transaction::operation::{Operation, OperationKind};
use crate::transaction::preconditions::Preconditions;
use crate::transaction::soroban::SorobanTransactionData;
use crate::transaction::TransactionError;
use crate::types::{AccountId, Hash, MuxedAccount, NetworkId};
use serde::{Deserialize, Serialize};

/// Maximum length of a text memo in bytes.
pub const MAX_MEMO_TEXT_LENGTH: usize = 28;

/// Domain tag hashed into a plain transaction's signature payload.
pub const ENVELOPE_TYPE_TX: u32 = 2;
/// Domain tag hashed into a fee-bump transaction's signature payload.
pub const ENVELOPE_TYPE_TX_FEE_BUMP: u32 = 5;
/// Domain tag hashed into an authorization entry's signature payload.
pub const ENVELOPE_TYPE_SOROBAN_AUTHORIZATION: u32 = 9;

/// A note attached to a transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Memo {
    /// No memo.
    #[default]
    None,
    /// Up to 28 bytes of UTF-8 text.
    Text(String),
    /// A 64-bit id.
    Id(u64),
    /// A 32-byte hash.
    Hash(Hash),
    /// A 32-byte hash of a transaction being refunded.
    Return(Hash),
}

impl Memo {
    /// Creates a text memo.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is longer than 28 bytes.
    pub fn text(text: impl Into<String>) -> Result<Self, TransactionError> {
        let text = text.into();
        if text.len() > MAX_MEMO_TEXT_LENGTH {
            return Err(TransactionError::MemoTooLong {
                length: text.len(),
                max: MAX_MEMO_TEXT_LENGTH,
            });
        }
        Ok(Memo::Text(text))
    }
}

/// A signature together with the hint that tells verifiers which key made it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoratedSignature {
    /// Last four bytes of the signing public key.
    #[serde(with = "hex::serde")]
    pub hint: [u8; 4],
    /// The raw signature.
    #[serde(with = "hex::serde")]
    pub signature: Vec<u8>,
}

/// An unsigned transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// The account paying the fee and consuming the sequence number.
    pub source_account: MuxedAccount,
    /// Total fee in stroops: inclusion fee plus any resource fee.
    pub fee: u32,
    /// The sequence number this transaction consumes.
    pub seq_num: i64,
    /// Validity preconditions.
    pub cond: Preconditions,
    /// Attached memo.
    pub memo: Memo,
    /// The operations, applied in order.
    pub operations: Vec<Operation>,
    /// Smart-contract resource data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soroban_data: Option<SorobanTransactionData>,
}

impl Transaction {
    /// The resource fee declared by the Soroban data, or zero.
    pub fn resource_fee(&self) -> i64 {
        self.soroban_data
            .as_ref()
            .map_or(0, |data| data.resource_fee)
    }

    /// The fee minus the declared resource fee.
    pub fn inclusion_fee(&self) -> i64 {
        i64::from(self.fee) - self.resource_fee()
    }

    /// The kinds of all operations, in order.
    pub fn operation_kinds(&self) -> Vec<OperationKind> {
        self.operations.iter().map(Operation::kind).collect()
    }

    /// The hash that signers sign for this transaction on the given network.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be encoded.
    pub fn hash(&self, network_id: &NetworkId) -> Result<Hash, CodecError> {
        signature_payload(network_id, ENVELOPE_TYPE_TX, "transaction", self)
    }
}

/// A plain transaction with its signatures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionV1Envelope {
    /// The transaction.
    pub tx: Transaction,
    /// Signatures collected so far.
    pub signatures: Vec<DecoratedSignature>,
}

/// A transaction that pays the fee for an inner, already-signed transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBumpTransaction {
    /// The account paying the fee.
    pub fee_source: MuxedAccount,
    /// Total fee for the inner transaction and the wrapper.
    pub fee: i64,
    /// The wrapped envelope.
    pub inner_tx: TransactionV1Envelope,
}

impl FeeBumpTransaction {
    /// The hash that signers sign for this fee-bump on the given network.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be encoded.
    pub fn hash(&self, network_id: &NetworkId) -> Result<Hash, CodecError> {
        signature_payload(
            network_id,
            ENVELOPE_TYPE_TX_FEE_BUMP,
            "fee-bump transaction",
            self,
        )
    }
}

/// A fee-bump transaction with its signatures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBumpTransactionEnvelope {
    /// The fee-bump transaction.
    pub tx: FeeBumpTransaction,
    /// Signatures collected so far.
    pub signatures: Vec<DecoratedSignature>,
}

/// A transaction ready to sign and submit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionEnvelope {
    /// A plain transaction.
    Tx(TransactionV1Envelope),
    /// A fee-bump wrapping a plain transaction.
    FeeBump(FeeBumpTransactionEnvelope),
}

impl TransactionEnvelope {
    /// Wraps an unsigned transaction.
    pub fn from_transaction(tx: Transaction) -> Self {
        TransactionEnvelope::Tx(TransactionV1Envelope {
            tx,
            signatures: Vec::new(),
        })
    }

    /// Returns true for a fee-bump envelope.
    pub fn is_fee_bump(&self) -> bool {
        matches!(self, TransactionEnvelope::FeeBump(_))
    }

    /// The account whose sequence number or fee this envelope spends: the
    /// transaction source, or the fee source of a fee-bump.
    pub fn source_account(&self) -> MuxedAccount {
        match self {
            TransactionEnvelope::Tx(env) => env.tx.source_account,
            TransactionEnvelope::FeeBump(env) => env.tx.fee_source,
        }
    }

    /// Base account of [`source_account`](Self::source_account).
    pub fn source_account_id(&self) -> AccountId {
        self.source_account().account_id()
    }

    /// The plain transaction, or the inner transaction of a fee-bump.
    pub fn transaction(&self) -> &Transaction {
        match self {
            TransactionEnvelope::Tx(env) => &env.tx,
            TransactionEnvelope::FeeBump(env) => &env.tx.inner_tx.tx,
        }
    }

    /// The total fee this envelope offers.
    pub fn fee(&self) -> i64 {
        match self {
            TransactionEnvelope::Tx(env) => i64::from(env.tx.fee),
            TransactionEnvelope::FeeBump(env) => env.tx.fee,
        }
    }

    /// The outer signatures.
    pub fn signatures(&self) -> &[DecoratedSignature] {
        match self {
            TransactionEnvelope::Tx(env) => &env.signatures,
            TransactionEnvelope::FeeBump(env) => &env.signatures,
        }
    }

    /// Appends an outer signature.
    pub fn add_signature(&mut self, signature: DecoratedSignature) {
        match self {
            TransactionEnvelope::Tx(env) => env.signatures.push(signature),
            TransactionEnvelope::FeeBump(env) => env.signatures.push(signature),
        }
    }

    /// The latest unix time the envelope is valid for, if bounded.
    pub fn deadline(&self) -> Option<u64> {
        self.transaction().cond.deadline()
    }

    /// The hash that identifies this envelope on the given network.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be encoded.
    pub fn hash(&self, network_id: &NetworkId) -> Result<Hash, CodecError> {
        match self {
            TransactionEnvelope::Tx(env) => env.tx.hash(network_id),
            TransactionEnvelope::FeeBump(env) => env.tx.hash(network_id),
        }
    }

    /// Encodes the envelope for transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope cannot be encoded.
    pub fn to_base64(&self) -> Result<String, CodecError> {
        codec::encode("transaction envelope", self)
    }

    /// Decodes an envelope from transport form.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not a valid envelope.
    pub fn from_base64(payload: &str) -> Result<Self, CodecError> {
        codec::decode("transaction envelope", payload)
    }
}

/// `sha256(network_id || tag || canonical bytes)`.
pub(crate) fn signature_payload<T: Serialize>(
    network_id: &NetworkId,
    tag: u32,
    what: &'static str,
    value: &T,
) -> Result<Hash, CodecError> {
    let bytes = codec::to_bytes(what, value)?;
    Ok(Hash::sha256_of([
        network_id.as_ref(),
        &tag.to_be_bytes(),
        bytes.as_slice(),
    ]))
}
