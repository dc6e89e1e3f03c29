//! Sponsor a transaction's fee right before submission.

use crate::account::Signer;
use crate::pipeline::{Plugin, RunContext};
use crate::processes::{EnvelopeSigningRequirements, Process, SignEnvelope, SignEnvelopeInput};
use crate::transaction::{FeeBumpBuilder, TransactionEnvelope};
use crate::types::{MuxedAccount, NetworkId};
use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Wraps a signed plain envelope into a fee-bump paid by `fee_source`.
///
/// Attach it to a send stage. The fee-bump is signed by the plugin's own
/// signers, which must cover the fee source. Envelopes that already are
/// fee-bumps pass through untouched.
///
/// # Example
///
/// ```rust,ignore
/// let sponsor = Arc::new(Ed25519Signer::generate());
/// let plugin = FeeBumpPlugin::new(sponsor.account_id(), 200, config.network_id())
///     .with_signer(sponsor);
/// pipeline.add_send_plugin(Arc::new(plugin));
/// ```
#[derive(Debug, Clone)]
pub struct FeeBumpPlugin {
    fee_source: MuxedAccount,
    base_fee: u32,
    signers: Vec<Arc<dyn Signer>>,
    sign: SignEnvelope,
}

impl FeeBumpPlugin {
    /// Creates the plugin with no signers.
    pub fn new(fee_source: impl Into<MuxedAccount>, base_fee: u32, network_id: NetworkId) -> Self {
        Self {
            fee_source: fee_source.into(),
            base_fee,
            signers: Vec::new(),
            sign: SignEnvelope::new(network_id),
        }
    }

    /// Adds a signer for the fee-bump envelope.
    #[must_use]
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signers.push(signer);
        self
    }

    /// The account paying the fee.
    pub fn fee_source(&self) -> &MuxedAccount {
        &self.fee_source
    }
}

#[async_trait]
impl Plugin<TransactionEnvelope> for FeeBumpPlugin {
    fn name(&self) -> &'static str {
        "FeeBumpPlugin"
    }

    async fn process_input(
        &self,
        envelope: TransactionEnvelope,
        _context: &RunContext,
    ) -> anyhow::Result<TransactionEnvelope> {
        if envelope.is_fee_bump() {
            debug!("envelope is already a fee-bump, passing through");
            return Ok(envelope);
        }

        let inner_fee = envelope.fee();
        let bumped = FeeBumpBuilder::new()
            .fee_source(self.fee_source)
            .base_fee(self.base_fee)
            .inner(envelope)
            .build()
            .context("wrapping envelope in a fee-bump")?;
        let requirements = EnvelopeSigningRequirements::resolve(&bumped)?;
        let signed = self
            .sign
            .run(SignEnvelopeInput {
                envelope: bumped,
                requirements,
                signers: self.signers.clone(),
            })
            .await
            .context("signing fee-bump envelope")?;

        info!(
            fee_source = %self.fee_source,
            inner_fee,
            fee = signed.fee(),
            "wrapped envelope in a fee-bump"
        );
        Ok(signed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Ed25519Signer;
    use crate::tests::{account, network_id, payment_to, tx_envelope, SignerBehavior, TestSigner};
    use crate::transaction::OperationKind;

    fn signed_inner() -> TransactionEnvelope {
        tx_envelope(account(1), vec![payment_to(account(2))])
    }

    #[tokio::test]
    async fn test_wraps_and_signs_for_fee_source() {
        let sponsor = Arc::new(Ed25519Signer::generate());
        let plugin = FeeBumpPlugin::new(sponsor.account_id(), 200, network_id())
            .with_signer(sponsor.clone());

        let inner = signed_inner();
        let bumped = plugin
            .process_input(inner.clone(), &RunContext::new())
            .await
            .unwrap();

        let TransactionEnvelope::FeeBump(env) = &bumped else {
            panic!("expected a fee-bump");
        };
        assert_eq!(env.tx.fee_source.account_id(), sponsor.account_id());
        assert_eq!(env.tx.fee, 400);
        assert_eq!(env.signatures.len(), 1);
        assert_eq!(env.signatures[0].hint, sponsor.account_id().hint());
        assert_eq!(env.tx.inner_tx.tx, *inner.transaction());
        assert_eq!(
            bumped.transaction().operation_kinds(),
            vec![OperationKind::Payment]
        );
    }

    #[tokio::test]
    async fn test_muxed_fee_source_signs_with_base_account() {
        let sponsor = Arc::new(TestSigner::new(account(9), SignerBehavior::Honest));
        let fee_source = MuxedAccount::MuxedEd25519 {
            id: 3,
            ed25519: account(9),
        };
        let plugin = FeeBumpPlugin::new(fee_source, 100, network_id())
            .with_signer(sponsor.clone() as Arc<dyn Signer>);

        let bumped = plugin
            .process_input(signed_inner(), &RunContext::new())
            .await
            .unwrap();

        assert!(bumped.is_fee_bump());
        assert_eq!(sponsor.tx_calls(), 1);
    }

    #[tokio::test]
    async fn test_existing_fee_bump_passes_through() {
        let sponsor = Arc::new(TestSigner::new(account(9), SignerBehavior::Honest));
        let plugin = FeeBumpPlugin::new(account(9), 100, network_id())
            .with_signer(sponsor.clone() as Arc<dyn Signer>);
        let already = FeeBumpBuilder::new()
            .fee_source(account(8))
            .base_fee(100)
            .inner(signed_inner())
            .build()
            .unwrap();

        let out = plugin
            .process_input(already.clone(), &RunContext::new())
            .await
            .unwrap();

        assert_eq!(out, already);
        assert_eq!(sponsor.tx_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_sponsor_signer_fails() {
        let plugin = FeeBumpPlugin::new(account(9), 100, network_id())
            .with_signer(Arc::new(TestSigner::new(account(1), SignerBehavior::Honest)));
        let err = plugin
            .process_input(signed_inner(), &RunContext::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("signing fee-bump envelope"));
    }

    #[tokio::test]
    async fn test_fee_below_inner_fee_fails() {
        let plugin = FeeBumpPlugin::new(account(9), 10, network_id())
            .with_signer(Arc::new(TestSigner::new(account(9), SignerBehavior::Honest)));
        let err = plugin
            .process_input(signed_inner(), &RunContext::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("wrapping envelope in a fee-bump"));
    }
}
