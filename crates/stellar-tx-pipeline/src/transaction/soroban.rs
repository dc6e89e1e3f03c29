//! Smart-contract (Soroban) transaction data.
//!
//! Covers contract values, host functions, the resource footprint attached to
//! a transaction, and the per-address authorization entries that simulation
//! hands back for signing.

use crate::transaction::codec::CodecError;
use crate::transaction::envelope::{signature_payload, ENVELOPE_TYPE_SOROBAN_AUTHORIZATION};
use crate::types::{AccountId, Hash, NetworkId, ScAddress};
use serde::{Deserialize, Serialize};

/// A contract value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ScVal {
    /// The unit value.
    Void,
    /// A boolean.
    Bool(bool),
    /// An unsigned 32-bit integer.
    U32(u32),
    /// A signed 32-bit integer.
    I32(i32),
    /// An unsigned 64-bit integer.
    U64(u64),
    /// A signed 64-bit integer.
    I64(i64),
    /// An unsigned 128-bit integer, carried as a decimal string on the wire.
    U128(#[serde(with = "decimal")] u128),
    /// A signed 128-bit integer, carried as a decimal string on the wire.
    I128(#[serde(with = "decimal")] i128),
    /// Raw bytes.
    Bytes(#[serde(with = "hex::serde")] Vec<u8>),
    /// A UTF-8 string.
    String(String),
    /// A symbol (short identifier).
    Symbol(String),
    /// An address.
    Address(ScAddress),
    /// A vector of values.
    Vec(Vec<ScVal>),
    /// An ordered map of key/value pairs.
    Map(Vec<ScMapEntry>),
}

/// One entry of an [`ScVal::Map`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScMapEntry {
    /// The key.
    pub key: ScVal,
    /// The value.
    pub val: ScVal,
}

impl ScVal {
    /// Creates a symbol value.
    pub fn symbol(s: impl Into<String>) -> Self {
        ScVal::Symbol(s.into())
    }

    /// Returns true for [`ScVal::Void`].
    pub fn is_void(&self) -> bool {
        matches!(self, ScVal::Void)
    }
}

mod decimal {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::fmt::Display;
    use std::str::FromStr;

    pub(super) fn serialize<T: Display, S: Serializer>(
        value: &T,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub(super) fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Arguments of a contract function call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeContractArgs {
    /// The contract being called.
    pub contract_address: ScAddress,
    /// The function name.
    pub function_name: String,
    /// The call arguments.
    pub args: Vec<ScVal>,
}

/// Arguments for deploying a contract instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateContractArgs {
    /// The deployer address, which together with the salt fixes the contract id.
    pub deployer: ScAddress,
    /// Salt for the contract id derivation.
    pub salt: Hash,
    /// Hash of the uploaded Wasm, or `None` to deploy the built-in asset contract.
    pub wasm_hash: Option<Hash>,
    /// Constructor arguments.
    pub constructor_args: Vec<ScVal>,
}

/// The host function executed by an `InvokeHostFunction` operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostFunction {
    /// Call a contract function.
    InvokeContract(InvokeContractArgs),
    /// Deploy a contract instance.
    CreateContract(CreateContractArgs),
    /// Upload contract Wasm.
    UploadWasm(#[serde(with = "hex::serde")] Vec<u8>),
}

/// The function an authorization entry covers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SorobanAuthorizedFunction {
    /// A contract function call.
    ContractFn(InvokeContractArgs),
    /// A contract deployment.
    CreateContractHostFn(CreateContractArgs),
}

/// A tree of authorized invocations rooted at one call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SorobanAuthorizedInvocation {
    /// The authorized function.
    pub function: SorobanAuthorizedFunction,
    /// Calls made from within `function` that are covered by the same authorization.
    pub sub_invocations: Vec<SorobanAuthorizedInvocation>,
}

/// Credentials for an address-bound authorization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SorobanAddressCredentials {
    /// The authorizing address.
    pub address: ScAddress,
    /// Replay-protection nonce chosen during simulation.
    pub nonce: i64,
    /// Last ledger (inclusive) on which the signature is valid.
    pub signature_expiration_ledger: u32,
    /// The signature, [`ScVal::Void`] until signed.
    pub signature: ScVal,
}

/// How an authorization entry is authenticated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SorobanCredentials {
    /// Authorized by the transaction source account's envelope signature.
    SourceAccount,
    /// Authorized by an explicit signature from the given address.
    Address(SorobanAddressCredentials),
}

/// A per-invocation authorization attached to an `InvokeHostFunction` operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SorobanAuthorizationEntry {
    /// How the entry is authenticated.
    pub credentials: SorobanCredentials,
    /// The authorized invocation tree.
    pub root_invocation: SorobanAuthorizedInvocation,
}

#[derive(Serialize)]
struct AuthorizationPreimage<'a> {
    nonce: i64,
    signature_expiration_ledger: u32,
    invocation: &'a SorobanAuthorizedInvocation,
}

impl SorobanAuthorizationEntry {
    /// The hash an address signs to authorize this entry until `expiration_ledger`.
    ///
    /// Source-account entries have no payload of their own and return `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the invocation cannot be encoded.
    pub fn signature_payload(
        &self,
        expiration_ledger: u32,
        network_id: &NetworkId,
    ) -> Result<Option<Hash>, CodecError> {
        let SorobanCredentials::Address(credentials) = &self.credentials else {
            return Ok(None);
        };
        let preimage = AuthorizationPreimage {
            nonce: credentials.nonce,
            signature_expiration_ledger: expiration_ledger,
            invocation: &self.root_invocation,
        };
        signature_payload(
            network_id,
            ENVELOPE_TYPE_SOROBAN_AUTHORIZATION,
            "authorization entry",
            &preimage,
        )
        .map(Some)
    }

    /// Returns the plain account this entry needs a signature from, if any.
    ///
    /// Source-account credentials and non-account addresses return `None`.
    pub fn signing_account(&self) -> Option<AccountId> {
        match &self.credentials {
            SorobanCredentials::Address(SorobanAddressCredentials {
                address: ScAddress::Account(account),
                ..
            }) => Some(*account),
            _ => None,
        }
    }
}

/// An opaque, encoded ledger key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerKey(pub String);

/// The set of ledger entries an invocation reads and writes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerFootprint {
    /// Entries only read.
    pub read_only: Vec<LedgerKey>,
    /// Entries read and written.
    pub read_write: Vec<LedgerKey>,
}

/// Resources an invocation is allowed to consume.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SorobanResources {
    /// Ledger entries touched.
    pub footprint: LedgerFootprint,
    /// CPU instruction budget.
    pub instructions: u32,
    /// Bytes read from disk.
    pub disk_read_bytes: u32,
    /// Bytes written.
    pub write_bytes: u32,
}

/// Resource data attached to a smart-contract transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SorobanTransactionData {
    /// Declared resources.
    pub resources: SorobanResources,
    /// The resource fee (in stroops) reserved on top of the inclusion fee.
    pub resource_fee: i64,
}
