//! Shared fixtures for the unit tests: a scripted RPC client, test signers and
//! envelope builders.

use crate::account::{authorize_entry, Signer, SignerError, ED25519_SIGNATURE_LENGTH};
use crate::config::TEST_NETWORK_PASSPHRASE;
use crate::rpc::{
    AccountResponse, GetLatestLedgerResponse, GetTransactionResponse, GetTransactionStatus,
    RpcClient, RpcError, SendTransactionResponse, SendTransactionStatus,
    SimulateHostFunctionResult, SimulateTransactionResponse,
};
use crate::transaction::{
    codec, Asset, DecoratedSignature, HostFunction, InvokeContractArgs, Operation, ScVal,
    SorobanAddressCredentials, SorobanAuthorizationEntry, SorobanAuthorizedFunction,
    SorobanAuthorizedInvocation, SorobanCredentials, SorobanTransactionData, SourceAccount,
    TransactionBuilder, TransactionEnvelope, TIMEOUT_INFINITE,
};
use crate::types::{AccountId, ContractId, Hash, MuxedAccount, NetworkId, ScAddress};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub(crate) fn account(byte: u8) -> AccountId {
    AccountId::new([byte; 32])
}

pub(crate) fn network_id() -> NetworkId {
    NetworkId::from_passphrase(TEST_NETWORK_PASSPHRASE)
}

pub(crate) fn contract() -> ScAddress {
    ScAddress::Contract(ContractId(Hash::new([7; 32])))
}

pub(crate) fn payment_to(destination: AccountId) -> Operation {
    Operation::payment(destination, Asset::Native, 10)
}

pub(crate) fn invoke_contract() -> InvokeContractArgs {
    InvokeContractArgs {
        contract_address: contract(),
        function_name: "hello".to_string(),
        args: vec![ScVal::symbol("world")],
    }
}

/// An unsigned envelope at sequence 2 with no time limit.
pub(crate) fn tx_envelope(
    source: impl Into<MuxedAccount>,
    operations: Vec<Operation>,
) -> TransactionEnvelope {
    envelope_with_fee(source, operations, 100)
}

fn envelope_with_fee(
    source: impl Into<MuxedAccount>,
    operations: Vec<Operation>,
    base_fee: u32,
) -> TransactionEnvelope {
    let source = SourceAccount::new(source, 1);
    let mut builder = TransactionBuilder::new(&source, base_fee).unwrap();
    for operation in operations {
        builder.add_operation(operation).unwrap();
    }
    builder.set_timeout(TIMEOUT_INFINITE).unwrap();
    TransactionEnvelope::from_transaction(builder.build().unwrap())
}

/// An unsigned single-invocation envelope paying `base_fee`.
pub(crate) fn invoke_envelope(source: AccountId, base_fee: u32) -> TransactionEnvelope {
    envelope_with_fee(
        source,
        vec![Operation::invoke_host_function(HostFunction::InvokeContract(
            invoke_contract(),
        ))],
        base_fee,
    )
}

pub(crate) fn address_entry(address: ScAddress, nonce: i64) -> SorobanAuthorizationEntry {
    SorobanAuthorizationEntry {
        credentials: SorobanCredentials::Address(SorobanAddressCredentials {
            address,
            nonce,
            signature_expiration_ledger: 0,
            signature: ScVal::Void,
        }),
        root_invocation: SorobanAuthorizedInvocation {
            function: SorobanAuthorizedFunction::ContractFn(invoke_contract()),
            sub_invocations: vec![],
        },
    }
}

pub(crate) fn source_entry() -> SorobanAuthorizationEntry {
    SorobanAuthorizationEntry {
        credentials: SorobanCredentials::SourceAccount,
        ..address_entry(contract(), 0)
    }
}

pub(crate) fn simulation_response(
    min_resource_fee: u64,
    auth: Vec<SorobanAuthorizationEntry>,
    return_value: Option<ScVal>,
) -> SimulateTransactionResponse {
    let data = SorobanTransactionData {
        resource_fee: i64::try_from(min_resource_fee).unwrap(),
        ..Default::default()
    };
    SimulateTransactionResponse {
        latest_ledger: 1000,
        transaction_data: Some(codec::encode("data", &data).unwrap()),
        min_resource_fee: Some(min_resource_fee.to_string()),
        results: Some(vec![SimulateHostFunctionResult {
            auth: auth
                .iter()
                .map(|entry| codec::encode("entry", entry).unwrap())
                .collect(),
            xdr: codec::encode("value", &return_value.unwrap_or(ScVal::Void)).unwrap(),
        }]),
        ..Default::default()
    }
}

pub(crate) fn latest_ledger(sequence: u32) -> GetLatestLedgerResponse {
    GetLatestLedgerResponse {
        id: "ledger".to_string(),
        protocol_version: 22,
        sequence,
    }
}

pub(crate) fn send_response(status: SendTransactionStatus, hash: Hash) -> SendTransactionResponse {
    SendTransactionResponse {
        status,
        hash: hash.to_hex(),
        latest_ledger: 1000,
        error_result_xdr: None,
    }
}

pub(crate) fn transaction_response(status: GetTransactionStatus) -> GetTransactionResponse {
    GetTransactionResponse {
        status,
        latest_ledger: 1000,
        ledger: None,
        created_at: None,
        envelope_xdr: None,
        result_xdr: None,
        return_value: None,
    }
}

/// An RPC client that replays queued responses and records every call.
///
/// A method with nothing queued fails with [`RpcError::MissingResult`].
#[derive(Debug, Default)]
pub(crate) struct MockRpc {
    accounts: Mutex<VecDeque<Result<AccountResponse, RpcError>>>,
    simulations: Mutex<VecDeque<Result<SimulateTransactionResponse, RpcError>>>,
    sends: Mutex<VecDeque<Result<SendTransactionResponse, RpcError>>>,
    transactions: Mutex<VecDeque<Result<GetTransactionResponse, RpcError>>>,
    transaction_fallback: Mutex<Option<GetTransactionResponse>>,
    ledgers: Mutex<VecDeque<Result<GetLatestLedgerResponse, RpcError>>>,
    calls: Mutex<Vec<&'static str>>,
    simulated: Mutex<Vec<TransactionEnvelope>>,
    submitted: Mutex<Vec<TransactionEnvelope>>,
}

impl MockRpc {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_account(&self, response: Result<AccountResponse, RpcError>) {
        self.accounts.lock().unwrap().push_back(response);
    }

    pub(crate) fn push_simulation(&self, response: Result<SimulateTransactionResponse, RpcError>) {
        self.simulations.lock().unwrap().push_back(response);
    }

    pub(crate) fn push_send(&self, response: Result<SendTransactionResponse, RpcError>) {
        self.sends.lock().unwrap().push_back(response);
    }

    pub(crate) fn push_transaction(&self, response: Result<GetTransactionResponse, RpcError>) {
        self.transactions.lock().unwrap().push_back(response);
    }

    /// Answer `getTransaction` with `response` once the queue is empty.
    pub(crate) fn set_transaction_fallback(&self, response: GetTransactionResponse) {
        *self.transaction_fallback.lock().unwrap() = Some(response);
    }

    pub(crate) fn push_latest_ledger(&self, response: Result<GetLatestLedgerResponse, RpcError>) {
        self.ledgers.lock().unwrap().push_back(response);
    }

    pub(crate) fn count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| **call == method)
            .count()
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn simulated(&self) -> Vec<TransactionEnvelope> {
        self.simulated.lock().unwrap().clone()
    }

    pub(crate) fn submitted(&self) -> Vec<TransactionEnvelope> {
        self.submitted.lock().unwrap().clone()
    }

    fn next<T>(
        &self,
        method: &'static str,
        queue: &Mutex<VecDeque<Result<T, RpcError>>>,
    ) -> Result<T, RpcError> {
        self.calls.lock().unwrap().push(method);
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(RpcError::MissingResult { method }))
    }
}

#[async_trait]
impl RpcClient for MockRpc {
    async fn get_account(&self, _account: &AccountId) -> Result<AccountResponse, RpcError> {
        self.next("getAccount", &self.accounts)
    }

    async fn simulate_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> Result<SimulateTransactionResponse, RpcError> {
        self.simulated.lock().unwrap().push(envelope.clone());
        self.next("simulateTransaction", &self.simulations)
    }

    async fn send_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> Result<SendTransactionResponse, RpcError> {
        self.submitted.lock().unwrap().push(envelope.clone());
        self.next("sendTransaction", &self.sends)
    }

    async fn get_transaction(&self, _hash: &Hash) -> Result<GetTransactionResponse, RpcError> {
        let fallback = self.transaction_fallback.lock().unwrap().clone();
        match (self.next("getTransaction", &self.transactions), fallback) {
            (Err(RpcError::MissingResult { .. }), Some(fallback)) => Ok(fallback),
            (result, _) => result,
        }
    }

    async fn get_latest_ledger(&self) -> Result<GetLatestLedgerResponse, RpcError> {
        self.next("getLatestLedger", &self.ledgers)
    }
}

/// How a [`TestSigner`] misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SignerBehavior {
    Honest,
    Fail,
    Panic,
    Malformed,
}

/// A signer with a fixed address and fake signatures that counts its calls.
#[derive(Debug)]
pub(crate) struct TestSigner {
    account: AccountId,
    behavior: SignerBehavior,
    tx_calls: AtomicUsize,
    auth_calls: AtomicUsize,
}

impl TestSigner {
    pub(crate) fn new(account: AccountId, behavior: SignerBehavior) -> Self {
        Self {
            account,
            behavior,
            tx_calls: AtomicUsize::new(0),
            auth_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn tx_calls(&self) -> usize {
        self.tx_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }
}

impl Signer for TestSigner {
    fn account_id(&self) -> AccountId {
        self.account
    }

    fn sign_transaction(
        &self,
        _envelope: &TransactionEnvelope,
        _network_id: &NetworkId,
    ) -> Result<DecoratedSignature, SignerError> {
        self.tx_calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            SignerBehavior::Honest => Ok(DecoratedSignature {
                hint: self.account.hint(),
                signature: vec![1; ED25519_SIGNATURE_LENGTH],
            }),
            SignerBehavior::Fail => Err(SignerError::Other("device unplugged".to_string())),
            SignerBehavior::Panic => panic!("signer exploded"),
            SignerBehavior::Malformed => Ok(DecoratedSignature {
                hint: self.account.hint(),
                signature: vec![1; 10],
            }),
        }
    }

    fn sign_auth_entry(
        &self,
        entry: &SorobanAuthorizationEntry,
        expiration_ledger: u32,
        _network_id: &NetworkId,
    ) -> Result<SorobanAuthorizationEntry, SignerError> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            SignerBehavior::Honest => authorize_entry(
                entry,
                expiration_ledger,
                &self.account,
                vec![1; ED25519_SIGNATURE_LENGTH],
            ),
            SignerBehavior::Fail => Err(SignerError::Other("device unplugged".to_string())),
            SignerBehavior::Panic => panic!("signer exploded"),
            SignerBehavior::Malformed => Ok(entry.clone()),
        }
    }
}

#[test]
fn test_mock_rpc_records_calls() {
    let rpc = MockRpc::new();
    rpc.push_latest_ledger(Ok(latest_ledger(5)));
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let ledger = runtime.block_on(rpc.get_latest_ledger()).unwrap();
    assert_eq!(ledger.sequence, 5);
    assert!(runtime.block_on(rpc.get_latest_ledger()).is_err());
    assert_eq!(rpc.calls(), vec!["getLatestLedger", "getLatestLedger"]);
}
