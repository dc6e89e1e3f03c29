//! Pure transforms between stage outputs and the next stage's input.

use crate::account::Signer;
use crate::error::PipelineError;
use crate::pipeline::TransactionHeader;
use crate::processes::{
    AssembleInput, AuthExpiration, BuildInput, SequenceSource, SignAuthEntriesInput,
    SignEnvelopeInput, SigningRequirement, SimulationData, SimulationResult,
};
use crate::transaction::{
    HostFunction, Operation, ScVal, SorobanAuthorizationEntry, TransactionEnvelope,
};
use std::sync::Arc;

/// Turns a header and operations into the build stage input.
pub fn build_input(
    header: TransactionHeader,
    operations: Vec<Operation>,
    sequence: SequenceSource,
) -> BuildInput {
    BuildInput::new(header.source, header.base_fee, sequence)
        .with_operations(operations)
        .with_memo(header.memo)
        .with_preconditions(header.preconditions)
}

/// Wraps a host function into its operation.
pub fn invoke_operation(host_function: HostFunction) -> Operation {
    Operation::invoke_host_function(host_function)
}

/// Keeps the simulated invocation of a plain success.
///
/// # Errors
///
/// Returns [`PipelineError::RestoreRequired`] when archived entries must be
/// restored before the invocation can be submitted.
pub fn require_success(result: SimulationResult) -> Result<SimulationData, PipelineError> {
    match result {
        SimulationResult::Success(data) => Ok(data),
        SimulationResult::Restore { restore, .. } => Err(PipelineError::RestoreRequired {
            restore: Box::new(restore),
        }),
    }
}

/// The contract return value of a simulation, restore or not.
pub fn return_value(result: &SimulationResult) -> Option<ScVal> {
    result.data().return_value.clone()
}

/// Asks for the simulated authorization entries to be signed.
pub fn sign_auth_input(
    simulation: &SimulationData,
    signers: Vec<Arc<dyn Signer>>,
    expiration: AuthExpiration,
    include_unsigned: bool,
) -> SignAuthEntriesInput {
    SignAuthEntriesInput {
        entries: simulation.auth.clone(),
        signers,
        expiration: Some(expiration),
        include_unsigned,
    }
}

/// Combines the built envelope, its simulation and the signed entries.
pub fn assemble_input(
    envelope: TransactionEnvelope,
    simulation: SimulationData,
    auth_entries: Vec<SorobanAuthorizationEntry>,
) -> AssembleInput {
    AssembleInput {
        envelope,
        auth_entries: Some(auth_entries),
        soroban_data: Some(simulation.transaction_data),
        resource_fee: simulation.min_resource_fee,
    }
}

/// Pairs an envelope with who must sign it and who can.
pub fn sign_envelope_input(
    envelope: TransactionEnvelope,
    requirements: Vec<SigningRequirement>,
    signers: Vec<Arc<dyn Signer>>,
) -> SignEnvelopeInput {
    SignEnvelopeInput {
        envelope,
        requirements,
        signers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processes::RestoreData;
    use crate::rpc::SimulateTransactionResponse;
    use crate::tests::{account, address_entry, payment_to};
    use crate::transaction::{Memo, SorobanTransactionData};
    use crate::types::ScAddress;

    fn simulation() -> SimulationData {
        SimulationData {
            latest_ledger: 10,
            transaction_data: SorobanTransactionData {
                resource_fee: 77,
                ..Default::default()
            },
            min_resource_fee: 77,
            auth: vec![address_entry(ScAddress::Account(account(2)), 1)],
            return_value: Some(ScVal::U32(5)),
            response: SimulateTransactionResponse::default(),
        }
    }

    #[test]
    fn test_build_input_carries_header() {
        let header = TransactionHeader::new(account(1), "200").with_memo(Memo::Id(3));
        let input = build_input(
            header,
            vec![payment_to(account(2))],
            SequenceSource::Explicit(4),
        );
        assert_eq!(input.source, account(1).into());
        assert_eq!(input.base_fee, "200");
        assert_eq!(input.memo, Memo::Id(3));
        assert_eq!(input.operations.len(), 1);
        assert!(matches!(input.sequence, SequenceSource::Explicit(4)));
    }

    #[test]
    fn test_restore_is_not_a_success() {
        let data = simulation();
        assert_eq!(require_success(SimulationResult::Success(data.clone())).unwrap(), data);

        let restore = SimulationResult::Restore {
            data,
            restore: RestoreData {
                min_resource_fee: 9,
                transaction_data: SorobanTransactionData::default(),
            },
        };
        assert_eq!(return_value(&restore), Some(ScVal::U32(5)));
        let err = require_success(restore).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::RestoreRequired { ref restore } if restore.min_resource_fee == 9
        ));
    }

    #[test]
    fn test_assemble_input_uses_simulated_fee_and_data() {
        let data = simulation();
        let envelope = crate::tests::invoke_envelope(account(1), 100);
        let input = assemble_input(envelope, data.clone(), data.auth.clone());
        assert_eq!(input.resource_fee, 77);
        assert_eq!(input.soroban_data, Some(data.transaction_data));
        assert_eq!(input.auth_entries, Some(data.auth));
    }

    #[test]
    fn test_sign_auth_input_sets_expiration() {
        let input = sign_auth_input(&simulation(), vec![], AuthExpiration::Ledger(50), true);
        assert_eq!(input.entries.len(), 1);
        assert_eq!(input.expiration, Some(AuthExpiration::Ledger(50)));
        assert!(input.include_unsigned);
    }
}
