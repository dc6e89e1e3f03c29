//! Behavioral tests for the preset pipelines.
//!
//! These tests run the pipelines end to end against a scripted RPC client,
//! without requiring a live network.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use stellar_tx_pipeline::account::{Ed25519Signer, Signer};
use stellar_tx_pipeline::config::{NetworkConfig, SendOptions, TEST_NETWORK_PASSPHRASE};
use stellar_tx_pipeline::rpc::{
    AccountResponse, GetLatestLedgerResponse, GetTransactionResponse, GetTransactionStatus,
    RestorePreamble, RpcClient, RpcError, SendTransactionResponse, SendTransactionStatus,
    SimulateHostFunctionResult, SimulateTransactionResponse,
};
use stellar_tx_pipeline::transaction::{
    codec, Asset, HostFunction, InvokeContractArgs, Operation, ScVal, SorobanAddressCredentials,
    SorobanAuthorizationEntry, SorobanAuthorizedFunction, SorobanAuthorizedInvocation,
    SorobanCredentials, SorobanTransactionData, TransactionEnvelope,
};
use stellar_tx_pipeline::types::{AccountId, ContractId, Hash, NetworkId, ScAddress};

/// An RPC client answering from per-method queues.
#[derive(Debug)]
struct ScriptedRpc {
    network_id: NetworkId,
    accounts: Mutex<VecDeque<AccountResponse>>,
    simulations: Mutex<VecDeque<SimulateTransactionResponse>>,
    transactions: Mutex<VecDeque<GetTransactionResponse>>,
    ledgers: Mutex<VecDeque<GetLatestLedgerResponse>>,
    calls: Mutex<Vec<&'static str>>,
    submitted: Mutex<Vec<TransactionEnvelope>>,
}

impl ScriptedRpc {
    fn new(network_id: NetworkId) -> Self {
        Self {
            network_id,
            accounts: Mutex::default(),
            simulations: Mutex::default(),
            transactions: Mutex::default(),
            ledgers: Mutex::default(),
            calls: Mutex::default(),
            submitted: Mutex::default(),
        }
    }

    fn count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| **call == method)
            .count()
    }

    fn submitted(&self) -> Vec<TransactionEnvelope> {
        self.submitted.lock().unwrap().clone()
    }

    fn pop<T>(&self, method: &'static str, queue: &Mutex<VecDeque<T>>) -> Result<T, RpcError> {
        self.calls.lock().unwrap().push(method);
        queue
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(RpcError::MissingResult { method })
    }
}

#[async_trait]
impl RpcClient for ScriptedRpc {
    async fn get_account(&self, _account: &AccountId) -> Result<AccountResponse, RpcError> {
        self.pop("getAccount", &self.accounts)
    }

    async fn simulate_transaction(
        &self,
        _envelope: &TransactionEnvelope,
    ) -> Result<SimulateTransactionResponse, RpcError> {
        self.pop("simulateTransaction", &self.simulations)
    }

    async fn send_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> Result<SendTransactionResponse, RpcError> {
        self.calls.lock().unwrap().push("sendTransaction");
        self.submitted.lock().unwrap().push(envelope.clone());
        Ok(SendTransactionResponse {
            status: SendTransactionStatus::Pending,
            hash: envelope.hash(&self.network_id)?.to_hex(),
            latest_ledger: 500,
            error_result_xdr: None,
        })
    }

    async fn get_transaction(&self, _hash: &Hash) -> Result<GetTransactionResponse, RpcError> {
        self.pop("getTransaction", &self.transactions)
    }

    async fn get_latest_ledger(&self) -> Result<GetLatestLedgerResponse, RpcError> {
        self.pop("getLatestLedger", &self.ledgers)
    }
}

fn network_config() -> NetworkConfig {
    NetworkConfig::new(TEST_NETWORK_PASSPHRASE, "https://rpc.example.org").unwrap()
}

fn scripted() -> Arc<ScriptedRpc> {
    Arc::new(ScriptedRpc::new(network_config().network_id()))
}

fn account_response(id: AccountId, sequence: i64) -> AccountResponse {
    AccountResponse {
        id,
        sequence: sequence.to_string(),
    }
}

fn confirmed(return_value: Option<ScVal>) -> GetTransactionResponse {
    GetTransactionResponse {
        status: GetTransactionStatus::Success,
        latest_ledger: 501,
        ledger: Some(501),
        created_at: Some("1700000000".to_string()),
        envelope_xdr: None,
        result_xdr: None,
        return_value: return_value.map(|value| codec::encode("value", &value).unwrap()),
    }
}

fn contract_call() -> InvokeContractArgs {
    InvokeContractArgs {
        contract_address: ScAddress::Contract(ContractId(Hash::new([7; 32]))),
        function_name: "transfer".to_string(),
        args: vec![ScVal::I128(10)],
    }
}

fn auth_entry(credentials: SorobanCredentials) -> SorobanAuthorizationEntry {
    SorobanAuthorizationEntry {
        credentials,
        root_invocation: SorobanAuthorizedInvocation {
            function: SorobanAuthorizedFunction::ContractFn(contract_call()),
            sub_invocations: vec![],
        },
    }
}

fn address_entry(account: AccountId) -> SorobanAuthorizationEntry {
    auth_entry(SorobanCredentials::Address(SorobanAddressCredentials {
        address: ScAddress::Account(account),
        nonce: 42,
        signature_expiration_ledger: 0,
        signature: ScVal::Void,
    }))
}

fn simulation(
    min_resource_fee: u64,
    auth: &[SorobanAuthorizationEntry],
    return_value: ScVal,
) -> SimulateTransactionResponse {
    let data = SorobanTransactionData {
        resource_fee: min_resource_fee as i64,
        ..Default::default()
    };
    SimulateTransactionResponse {
        latest_ledger: 500,
        transaction_data: Some(codec::encode("data", &data).unwrap()),
        min_resource_fee: Some(min_resource_fee.to_string()),
        results: Some(vec![SimulateHostFunctionResult {
            auth: auth
                .iter()
                .map(|entry| codec::encode("entry", entry).unwrap())
                .collect(),
            xdr: codec::encode("value", &return_value).unwrap(),
        }]),
        ..Default::default()
    }
}

mod classic_pipeline_tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};
    use stellar_tx_pipeline::error::PipelineError;
    use stellar_tx_pipeline::pipeline::{ClassicInput, ClassicPipeline, TransactionHeader};
    use stellar_tx_pipeline::plugins::FeeBumpPlugin;
    use stellar_tx_pipeline::processes::SignEnvelopeError;

    fn payment() -> Operation {
        Operation::payment(AccountId::new([2; 32]), Asset::Native, 1_000)
    }

    #[tokio::test]
    async fn test_builds_signs_and_confirms() {
        let rpc = scripted();
        let signer = Arc::new(Ed25519Signer::generate());
        rpc.accounts
            .lock()
            .unwrap()
            .push_back(account_response(signer.account_id(), 41));
        rpc.transactions.lock().unwrap().push_back(confirmed(None));

        let pipeline =
            ClassicPipeline::new(&network_config(), rpc.clone(), SendOptions::default()).unwrap();
        let outcome = pipeline
            .run(
                ClassicInput::new(TransactionHeader::new(signer.account_id(), "100"))
                    .with_operation(payment())
                    .with_signer(signer.clone()),
            )
            .await
            .unwrap();

        let submitted = rpc.submitted();
        assert_eq!(submitted.len(), 1);
        let envelope = &submitted[0];
        let network_id = network_config().network_id();
        let hash = envelope.hash(&network_id).unwrap();
        assert_eq!(outcome.hash, hash);
        assert_eq!(envelope.transaction().seq_num, 42);
        assert_eq!(envelope.fee(), 100);

        let key = VerifyingKey::from_bytes(signer.account_id().as_bytes()).unwrap();
        let signature = Signature::from_slice(&envelope.signatures()[0].signature).unwrap();
        assert!(key.verify(hash.as_bytes(), &signature).is_ok());
        assert_eq!(rpc.count("getAccount"), 1);
        assert_eq!(rpc.count("simulateTransaction"), 0);
    }

    #[tokio::test]
    async fn test_explicit_sequence_skips_account_load() {
        let rpc = scripted();
        let signer = Arc::new(Ed25519Signer::generate());
        rpc.transactions.lock().unwrap().push_back(confirmed(None));

        let pipeline =
            ClassicPipeline::new(&network_config(), rpc.clone(), SendOptions::default()).unwrap();
        pipeline
            .run(
                ClassicInput::new(
                    TransactionHeader::new(signer.account_id(), "100").with_sequence(9),
                )
                .with_operation(payment())
                .with_signer(signer),
            )
            .await
            .unwrap();

        assert_eq!(rpc.count("getAccount"), 0);
        assert_eq!(rpc.submitted()[0].transaction().seq_num, 10);
    }

    #[tokio::test]
    async fn test_fee_bump_plugin_sponsors_submission() {
        let rpc = scripted();
        let signer = Arc::new(Ed25519Signer::generate());
        let sponsor = Arc::new(Ed25519Signer::generate());
        rpc.accounts
            .lock()
            .unwrap()
            .push_back(account_response(signer.account_id(), 1));
        rpc.transactions.lock().unwrap().push_back(confirmed(None));

        let config = network_config();
        let mut pipeline =
            ClassicPipeline::new(&config, rpc.clone(), SendOptions::default()).unwrap();
        pipeline.add_send_plugin(Arc::new(
            FeeBumpPlugin::new(sponsor.account_id(), 300, config.network_id())
                .with_signer(sponsor.clone()),
        ));

        pipeline
            .run(
                ClassicInput::new(TransactionHeader::new(signer.account_id(), "100"))
                    .with_operation(payment())
                    .with_signer(signer.clone()),
            )
            .await
            .unwrap();

        let submitted = rpc.submitted();
        let TransactionEnvelope::FeeBump(bumped) = &submitted[0] else {
            panic!("expected a fee-bump envelope");
        };
        assert_eq!(bumped.tx.fee, 600);
        assert_eq!(bumped.signatures.len(), 1);
        assert_eq!(bumped.signatures[0].hint, sponsor.account_id().hint());
        assert_eq!(bumped.tx.inner_tx.signatures.len(), 1);
        assert_eq!(
            bumped.tx.inner_tx.signatures[0].hint,
            signer.account_id().hint()
        );
    }

    #[tokio::test]
    async fn test_missing_signer_never_submits() {
        let rpc = scripted();
        let source = Arc::new(Ed25519Signer::generate());
        let other = Arc::new(Ed25519Signer::generate());
        rpc.accounts
            .lock()
            .unwrap()
            .push_back(account_response(source.account_id(), 1));

        let pipeline =
            ClassicPipeline::new(&network_config(), rpc.clone(), SendOptions::default()).unwrap();
        let err = pipeline
            .run(
                ClassicInput::new(TransactionHeader::new(source.account_id(), "100"))
                    .with_operation(payment())
                    .with_signer(other),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::SignEnvelope(SignEnvelopeError::SignerNotFound { .. })
        ));
        assert_eq!(err.code(), "SEV_003");
        assert!(rpc.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_options_fail_construction() {
        let err = ClassicPipeline::new(
            &network_config(),
            scripted(),
            SendOptions::default().with_wait_interval_in_ms(10),
        )
        .unwrap_err();
        assert_eq!(err.code(), "SND_002");
    }
}

mod invoke_pipeline_tests {
    use super::*;
    use stellar_tx_pipeline::config::InvokeOptions;
    use stellar_tx_pipeline::error::PipelineError;
    use stellar_tx_pipeline::pipeline::{
        InvokeInput, InvokePipeline, Plugin, RunContext, TransactionHeader, BUILT_ENVELOPE,
        SIMULATION,
    };
    use stellar_tx_pipeline::transaction::OperationBody;

    #[tokio::test]
    async fn test_invocation_end_to_end() {
        let rpc = scripted();
        let signer = Arc::new(Ed25519Signer::generate());
        let source_entry = auth_entry(SorobanCredentials::SourceAccount);
        let entries = vec![address_entry(signer.account_id()), source_entry.clone()];
        rpc.accounts
            .lock()
            .unwrap()
            .push_back(account_response(signer.account_id(), 7));
        rpc.simulations
            .lock()
            .unwrap()
            .push_back(simulation(5_000, &entries, ScVal::Bool(true)));
        rpc.ledgers.lock().unwrap().push_back(GetLatestLedgerResponse {
            id: "ledger".to_string(),
            protocol_version: 22,
            sequence: 500,
        });
        rpc.transactions
            .lock()
            .unwrap()
            .push_back(confirmed(Some(ScVal::Bool(true))));

        let pipeline =
            InvokePipeline::new(&network_config(), rpc.clone(), InvokeOptions::default()).unwrap();
        let outcome = pipeline
            .run(
                InvokeInput::new(
                    TransactionHeader::new(signer.account_id(), "100"),
                    HostFunction::InvokeContract(contract_call()),
                )
                .with_signer(signer.clone()),
            )
            .await
            .unwrap();

        assert_eq!(outcome.return_value, Some(ScVal::Bool(true)));
        let submitted = rpc.submitted();
        let tx = submitted[0].transaction();
        assert_eq!(tx.seq_num, 8);
        assert_eq!(submitted[0].fee(), 5_100);
        assert_eq!(tx.resource_fee(), 5_000);
        assert_eq!(submitted[0].signatures().len(), 1);

        let OperationBody::InvokeHostFunction(invoke) = &tx.operations[0].body else {
            panic!("expected an invocation");
        };
        assert_eq!(invoke.auth.len(), 2);
        match &invoke.auth[0].credentials {
            SorobanCredentials::Address(credentials) => {
                assert_eq!(credentials.signature_expiration_ledger, 620);
                assert!(!credentials.signature.is_void());
            }
            SorobanCredentials::SourceAccount => panic!("expected address credentials"),
        }
        assert_eq!(invoke.auth[1], source_entry);
        assert_eq!(rpc.count("getLatestLedger"), 1);
    }

    #[tokio::test]
    async fn test_restore_stops_before_signing() {
        let rpc = scripted();
        let signer = Arc::new(Ed25519Signer::generate());
        rpc.accounts
            .lock()
            .unwrap()
            .push_back(account_response(signer.account_id(), 7));
        let mut response = simulation(100, &[], ScVal::Void);
        response.restore_preamble = Some(RestorePreamble {
            min_resource_fee: "900".to_string(),
            transaction_data: codec::encode("data", &SorobanTransactionData::default()).unwrap(),
        });
        rpc.simulations.lock().unwrap().push_back(response);

        let pipeline =
            InvokePipeline::new(&network_config(), rpc.clone(), InvokeOptions::default()).unwrap();
        let err = pipeline
            .run(
                InvokeInput::new(
                    TransactionHeader::new(signer.account_id(), "100"),
                    HostFunction::InvokeContract(contract_call()),
                )
                .with_signer(signer),
            )
            .await
            .unwrap_err();

        match err {
            PipelineError::RestoreRequired { restore } => assert_eq!(restore.min_resource_fee, 900),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(rpc.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_simulation_failure_is_reported() {
        let rpc = scripted();
        let signer = Arc::new(Ed25519Signer::generate());
        rpc.accounts
            .lock()
            .unwrap()
            .push_back(account_response(signer.account_id(), 7));
        rpc.simulations
            .lock()
            .unwrap()
            .push_back(SimulateTransactionResponse {
                latest_ledger: 500,
                error: Some("HostError: contract already exists".to_string()),
                ..Default::default()
            });

        let pipeline =
            InvokePipeline::new(&network_config(), rpc.clone(), InvokeOptions::default()).unwrap();
        let err = pipeline
            .run(
                InvokeInput::new(
                    TransactionHeader::new(signer.account_id(), "100"),
                    HostFunction::InvokeContract(contract_call()),
                )
                .with_signer(signer),
            )
            .await
            .unwrap_err();

        assert_eq!(err.code(), "SIM_002");
        assert!(rpc.submitted().is_empty());
    }

    /// Refuses to submit when the simulation priced the call above a ceiling.
    #[derive(Debug)]
    struct ResourceFeeCeiling {
        max_resource_fee: u64,
        seen: Mutex<Vec<(i64, u64)>>,
    }

    impl ResourceFeeCeiling {
        fn new(max_resource_fee: u64) -> Arc<Self> {
            Arc::new(Self {
                max_resource_fee,
                seen: Mutex::default(),
            })
        }
    }

    #[async_trait]
    impl Plugin<TransactionEnvelope> for ResourceFeeCeiling {
        fn name(&self) -> &'static str {
            "ResourceFeeCeiling"
        }

        async fn process_input(
            &self,
            envelope: TransactionEnvelope,
            context: &RunContext,
        ) -> anyhow::Result<TransactionEnvelope> {
            let built = context.require(BUILT_ENVELOPE)?;
            let min_resource_fee = context.require(SIMULATION)?.data().min_resource_fee;
            anyhow::ensure!(
                envelope.transaction().seq_num == built.transaction().seq_num,
                "sequence number changed after build"
            );
            anyhow::ensure!(
                min_resource_fee <= self.max_resource_fee,
                "resource fee {min_resource_fee} is above {}",
                self.max_resource_fee
            );
            self.seen
                .lock()
                .unwrap()
                .push((built.fee(), min_resource_fee));
            Ok(envelope)
        }
    }

    fn scripted_invocation(signer: &Ed25519Signer, min_resource_fee: u64) -> Arc<ScriptedRpc> {
        let rpc = scripted();
        rpc.accounts
            .lock()
            .unwrap()
            .push_back(account_response(signer.account_id(), 7));
        rpc.simulations.lock().unwrap().push_back(simulation(
            min_resource_fee,
            &[address_entry(signer.account_id())],
            ScVal::Bool(true),
        ));
        rpc.ledgers.lock().unwrap().push_back(GetLatestLedgerResponse {
            id: "ledger".to_string(),
            protocol_version: 22,
            sequence: 500,
        });
        rpc.transactions
            .lock()
            .unwrap()
            .push_back(confirmed(Some(ScVal::Bool(true))));
        rpc
    }

    #[tokio::test]
    async fn test_send_plugin_sees_build_and_simulation() {
        let signer = Arc::new(Ed25519Signer::generate());
        let rpc = scripted_invocation(&signer, 5_000);
        let ceiling = ResourceFeeCeiling::new(10_000);

        let mut pipeline =
            InvokePipeline::new(&network_config(), rpc.clone(), InvokeOptions::default()).unwrap();
        pipeline.add_send_plugin(ceiling.clone());
        pipeline
            .run(
                InvokeInput::new(
                    TransactionHeader::new(signer.account_id(), "100"),
                    HostFunction::InvokeContract(contract_call()),
                )
                .with_signer(signer.clone()),
            )
            .await
            .unwrap();

        assert_eq!(*ceiling.seen.lock().unwrap(), vec![(100, 5_000)]);
        assert_eq!(rpc.submitted()[0].fee(), 5_100);
    }

    #[tokio::test]
    async fn test_send_plugin_can_veto_from_simulation() {
        let signer = Arc::new(Ed25519Signer::generate());
        let rpc = scripted_invocation(&signer, 5_000);
        let ceiling = ResourceFeeCeiling::new(1_000);

        let mut pipeline =
            InvokePipeline::new(&network_config(), rpc.clone(), InvokeOptions::default()).unwrap();
        pipeline.add_send_plugin(ceiling.clone());
        let err = pipeline
            .run(
                InvokeInput::new(
                    TransactionHeader::new(signer.account_id(), "100"),
                    HostFunction::InvokeContract(contract_call()),
                )
                .with_signer(signer),
            )
            .await
            .unwrap_err();

        match &err {
            PipelineError::Plugin { plugin, stage, source } => {
                assert_eq!(*plugin, "ResourceFeeCeiling");
                assert_eq!(*stage, "SendTransaction");
                assert!(source.to_string().contains("5000"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.code(), "PIP_003");
        assert!(ceiling.seen.lock().unwrap().is_empty());
        assert!(rpc.submitted().is_empty());
    }
}

mod read_pipeline_tests {
    use super::*;
    use stellar_tx_pipeline::pipeline::{
        Plugin, ReadInput, ReadPipeline, RunContext, BUILT_ENVELOPE,
    };

    /// Checks the simulated envelope against the one the build stage recorded.
    #[derive(Debug, Default)]
    struct BuiltEnvelopeCheck {
        sources: Mutex<Vec<AccountId>>,
    }

    #[async_trait]
    impl Plugin<TransactionEnvelope> for BuiltEnvelopeCheck {
        fn name(&self) -> &'static str {
            "BuiltEnvelopeCheck"
        }

        async fn process_input(
            &self,
            envelope: TransactionEnvelope,
            context: &RunContext,
        ) -> anyhow::Result<TransactionEnvelope> {
            let built = context.require(BUILT_ENVELOPE)?;
            anyhow::ensure!(*built == envelope, "envelope changed between build and simulate");
            self.sources
                .lock()
                .unwrap()
                .push(built.source_account_id());
            Ok(envelope)
        }
    }

    #[tokio::test]
    async fn test_simulate_plugin_reads_built_envelope() {
        let rpc = scripted();
        rpc.simulations
            .lock()
            .unwrap()
            .push_back(simulation(10, &[], ScVal::U32(3)));
        let check = Arc::new(BuiltEnvelopeCheck::default());

        let mut pipeline = ReadPipeline::new(rpc.clone());
        pipeline.add_simulate_plugin(check.clone());
        let value = pipeline
            .run(ReadInput::new(HostFunction::InvokeContract(contract_call())))
            .await
            .unwrap();

        assert_eq!(value, Some(ScVal::U32(3)));
        assert_eq!(check.sources.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_read_returns_value_without_signing() {
        let rpc = scripted();
        rpc.simulations
            .lock()
            .unwrap()
            .push_back(simulation(10, &[], ScVal::U64(99)));

        let value = ReadPipeline::new(rpc.clone())
            .run(ReadInput::new(HostFunction::InvokeContract(contract_call())))
            .await
            .unwrap();

        assert_eq!(value, Some(ScVal::U64(99)));
        assert_eq!(rpc.count("getAccount"), 0);
        assert_eq!(rpc.count("sendTransaction"), 0);
    }
}

mod requirement_properties {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;
    use stellar_tx_pipeline::processes::{EnvelopeSigningRequirements, SignerAddress};
    use stellar_tx_pipeline::transaction::{
        FeeBumpBuilder, OperationBody, SourceAccount, ThresholdLevel, TransactionBuilder,
        TIMEOUT_INFINITE,
    };
    use stellar_tx_pipeline::types::MuxedAccount;

    fn operation(kind: u8, source: Option<u8>) -> Operation {
        let operation = match kind % 3 {
            0 => Operation::new(OperationBody::BumpSequence { bump_to: 5 }),
            1 => Operation::payment(AccountId::new([200; 32]), Asset::Native, 1),
            _ => Operation::new(OperationBody::AccountMerge(
                AccountId::new([201; 32]).into(),
            )),
        };
        match source {
            Some(byte) => operation.with_source(MuxedAccount::MuxedEd25519 {
                id: u64::from(byte),
                ed25519: AccountId::new([byte % 4; 32]),
            }),
            None => operation,
        }
    }

    fn envelope(operations: Vec<Operation>) -> TransactionEnvelope {
        let source = SourceAccount::new(AccountId::new([1; 32]), 1);
        let mut builder = TransactionBuilder::new(&source, 100).unwrap();
        for operation in operations {
            builder.add_operation(operation).unwrap();
        }
        builder.set_timeout(TIMEOUT_INFINITE).unwrap();
        TransactionEnvelope::from_transaction(builder.build().unwrap())
    }

    fn arb_operations() -> impl Strategy<Value = Vec<Operation>> {
        prop::collection::vec(
            (any::<u8>(), prop::option::of(any::<u8>())).prop_map(|(k, s)| operation(k, s)),
            1..20,
        )
    }

    proptest! {
        #[test]
        fn prop_resolution_is_idempotent(operations in arb_operations()) {
            let envelope = envelope(operations);
            let first = EnvelopeSigningRequirements::resolve(&envelope).unwrap();
            let second = EnvelopeSigningRequirements::resolve(&envelope).unwrap();

            let first_set: HashSet<_> = first.iter().copied().collect();
            let second_set: HashSet<_> = second.iter().copied().collect();
            prop_assert_eq!(first_set, second_set);

            let addresses: HashSet<_> = first.iter().map(|r| r.address).collect();
            prop_assert_eq!(addresses.len(), first.len());
        }

        #[test]
        fn prop_fee_bump_needs_only_low_fee_source(
            operations in arb_operations(),
            sponsor in any::<u8>(),
            id in any::<u64>(),
        ) {
            let sponsor = AccountId::new([sponsor; 32]);
            let bumped = FeeBumpBuilder::new()
                .fee_source(MuxedAccount::MuxedEd25519 { id, ed25519: sponsor })
                .base_fee(100)
                .inner(envelope(operations))
                .build()
                .unwrap();

            let requirements = EnvelopeSigningRequirements::resolve(&bumped).unwrap();
            prop_assert_eq!(requirements.len(), 1);
            prop_assert_eq!(requirements[0].address, SignerAddress::Account(sponsor));
            prop_assert_eq!(requirements[0].threshold, ThresholdLevel::Low);
        }
    }
}
