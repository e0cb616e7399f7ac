//! # Responder Flow
//!
//! ```text
//! AwaitingProposal ─▶ Checking ─┬─▶ Signing ─▶ AwaitingFinality ─▶ Recorded
//!        │                      └─▶ Reject ─▶ Failed
//!        └─ first frame is Finalized ─▶ observer: verify ─▶ Recorded
//! ```
//!
//! A proposal is checked independently of anything the initiator claims:
//! attached signatures, the producing transactions of its inputs, the
//! contracts, and this party's acceptance policy for every flow kind its
//! commands belong to. A session that closes before finality leaves
//! nothing persisted.

use crate::domain::error::{FlowError, FlowResult};
use crate::domain::wire::{FlowKind, FlowMessage};
use crate::finality::record_locally;
use crate::hub::ServiceHub;
use lf_02_vault::Vault;
use shared_bus::{FlowRole, FlowSession, LedgerEvent, ProgressStep};
use shared_types::{
    LedgerState, NotarizedTransaction, SignedTransaction, StateRef, StateResolver, TxId,
    TypesError,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct ResponderFlow {
    hub: Arc<ServiceHub>,
    session: Box<dyn FlowSession>,
    flow_id: Uuid,
}

impl ResponderFlow {
    pub fn new(hub: Arc<ServiceHub>, session: Box<dyn FlowSession>) -> Self {
        let flow_id = session.session_id();
        Self {
            hub,
            session,
            flow_id,
        }
    }

    pub fn flow_id(&self) -> Uuid {
        self.flow_id
    }

    /// Run to `Recorded` and return the recorded transaction id.
    pub async fn run(mut self) -> FlowResult<TxId> {
        let result = self.execute().await;
        if let Err(err) = &result {
            self.fail(err).await;
        }
        self.session.close();
        result
    }

    async fn execute(&mut self) -> FlowResult<TxId> {
        self.progress(ProgressStep::AwaitingProposal).await;
        let first = self.receive(self.hub.config().session_timeout).await?;

        match first {
            FlowMessage::Finalized(ntx) => {
                debug!(
                    flow_id = %self.flow_id,
                    from = %self.session.counterparty(),
                    "[lf-04] Receiving as observer"
                );
                self.accept_finalized(ntx).await
            }
            FlowMessage::Propose {
                kind,
                stx,
                dependencies,
            } => {
                self.progress(ProgressStep::Checking).await;
                if let Err(reason) = self.check(kind, &stx, &dependencies) {
                    info!(
                        flow_id = %self.flow_id,
                        kind = %kind,
                        %reason,
                        "[lf-04] Declining to sign"
                    );
                    self.send(&FlowMessage::Reject {
                        reason: reason.clone(),
                    })
                    .await?;
                    return Err(FlowError::VerificationRejected(reason));
                }

                self.progress(ProgressStep::Signing).await;
                let expected = stx.id()?;
                let key = self.hub.owning_key();
                let signature = self.hub.sign(&stx.proposal.canonical_bytes()?);
                self.send(&FlowMessage::Signed { key, signature }).await?;

                self.progress(ProgressStep::AwaitingFinality).await;
                match self.receive(self.hub.config().finality_wait_timeout).await? {
                    FlowMessage::Finalized(ntx) => {
                        let id = ntx.id()?;
                        if id != expected {
                            return Err(FlowError::Protocol(format!(
                                "finalized {} but signed {}",
                                id.short(),
                                expected.short()
                            )));
                        }
                        self.accept_finalized(ntx).await
                    }
                    other => Err(FlowError::Protocol(format!(
                        "expected Finalized, got {}",
                        other.name()
                    ))),
                }
            }
            other => Err(FlowError::Protocol(format!(
                "expected Propose or Finalized, got {}",
                other.name()
            ))),
        }
    }

    /// Everything this party requires before signing. `Err` carries the
    /// reason sent back to the initiator.
    fn check(
        &self,
        kind: FlowKind,
        stx: &SignedTransaction,
        dependencies: &[NotarizedTransaction],
    ) -> Result<(), String> {
        let proposal = &stx.proposal;
        if proposal.notary != *self.hub.notary().notary() {
            return Err(format!("Unknown notary {}.", proposal.notary));
        }

        stx.verify_signatures().map_err(|e| e.to_string())?;

        let initiator = self
            .hub
            .identities()
            .party_from_name(self.session.counterparty())
            .ok_or_else(|| format!("Unknown initiator {}.", self.session.counterparty()))?;
        if proposal.required_signers().contains(&initiator.owning_key)
            && !stx.signatures.contains_key(&initiator.owning_key)
        {
            return Err("The initiator has not signed.".into());
        }

        if !proposal.required_signers().contains(&self.hub.owning_key()) {
            return Err("Not a required signer of this transaction.".into());
        }

        let resolver = DependencyResolver::new(self.hub.vault(), dependencies)?;
        let ltx = proposal
            .to_ledger_transaction(&resolver)
            .map_err(|e| e.to_string())?;
        self.hub.verifier().verify(&ltx).map_err(|e| e.to_string())?;

        let kinds: BTreeSet<FlowKind> = ltx
            .commands
            .iter()
            .map(|c| FlowKind::of_command(&c.kind))
            .collect();
        if !kinds.contains(&kind) {
            return Err(format!("Proposed as {kind} but carries no {kind} command."));
        }
        for kind in kinds {
            self.hub.policy(kind).check(&ltx)?;
        }
        Ok(())
    }

    async fn accept_finalized(&mut self, ntx: NotarizedTransaction) -> FlowResult<TxId> {
        let tx_id = ntx.id()?;
        let notary = &ntx.proposal().notary;
        if *notary != *self.hub.notary().notary() {
            return Err(FlowError::Protocol(format!("finalized by unknown notary {notary}")));
        }
        if let Err(e) = ntx.verify() {
            let party = match e {
                TypesError::InvalidSignature { key } | TypesError::UnexpectedSigner { key } => self
                    .hub
                    .party_for_key(&key)
                    .map(|p| p.name)
                    .unwrap_or_else(|_| self.session.counterparty().clone()),
                TypesError::InvalidNotarySignature => notary.name.clone(),
                other => return Err(FlowError::VerificationRejected(other.to_string())),
            };
            return Err(FlowError::SignatureInvalid { party });
        }

        record_locally(&self.hub, &ntx).await?;
        self.send(&FlowMessage::FinalityAck { tx_id }).await?;
        self.progress(ProgressStep::Recorded).await;
        info!(
            flow_id = %self.flow_id,
            tx_id = %tx_id.short(),
            from = %self.session.counterparty(),
            "[lf-04] Finalized transaction recorded"
        );
        Ok(tx_id)
    }

    async fn send(&mut self, message: &FlowMessage) -> FlowResult<()> {
        self.session.send(message.to_bytes()?).await?;
        Ok(())
    }

    async fn receive(&mut self, wait: Duration) -> FlowResult<FlowMessage> {
        let bytes = tokio::time::timeout(wait, self.session.receive())
            .await
            .map_err(|_| {
                FlowError::Protocol(format!(
                    "nothing from {} within {wait:?}",
                    self.session.counterparty()
                ))
            })??;
        FlowMessage::from_bytes(&bytes)
    }

    async fn progress(&self, step: ProgressStep) {
        self.hub.progress(self.flow_id, FlowRole::Responder, step).await;
    }

    async fn fail(&self, err: &FlowError) {
        warn!(
            flow_id = %self.flow_id,
            from = %self.session.counterparty(),
            error = %err,
            "[lf-04] Responder failed"
        );
        self.progress(ProgressStep::Failed).await;
        self.hub
            .emit(LedgerEvent::FlowFailed {
                flow_id: self.flow_id,
                party: self.hub.name().clone(),
                role: FlowRole::Responder,
                reason: err.to_string(),
            })
            .await;
    }
}

/// Resolves inputs from the local vault, then from verified dependencies.
struct DependencyResolver<'a> {
    vault: &'a Vault,
    supplied: BTreeMap<StateRef, LedgerState>,
}

impl<'a> DependencyResolver<'a> {
    fn new(vault: &'a Vault, dependencies: &[NotarizedTransaction]) -> Result<Self, String> {
        let mut supplied = BTreeMap::new();
        for dependency in dependencies {
            dependency
                .verify()
                .map_err(|e| format!("Invalid dependency: {e}"))?;
            let outputs = dependency
                .proposal()
                .output_refs()
                .map_err(|e| e.to_string())?;
            for output in outputs {
                supplied.insert(output.reference, output.state);
            }
        }
        Ok(Self { vault, supplied })
    }
}

impl StateResolver for DependencyResolver<'_> {
    fn resolve(&self, state_ref: &StateRef) -> Option<LedgerState> {
        self.vault
            .resolve(state_ref)
            .or_else(|| self.supplied.get(state_ref).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::TestNet;
    use lf_01_contracts::DealAcceptance;
    use lf_03_notary::NotaryVerdict;
    use shared_types::{
        Card, CardCommand, CardState, Command, CommandKind, Party, Rank, Suit,
        TransactionProposal,
    };

    fn deal(dealer: &ServiceHub, player: &Party) -> TransactionProposal {
        TransactionProposal::new(dealer.notary().notary().clone())
            .with_output(LedgerState::card(CardState {
                card: Card::new(Rank::Five, Suit::Diamonds),
                dealer: dealer.me().clone(),
                player: player.clone(),
                game_id: Uuid::new_v4(),
            }))
            .with_command(Command::new(
                CommandKind::Card(CardCommand::Create),
                [dealer.owning_key(), player.owning_key],
            ))
    }

    async fn reply(session: &mut Box<dyn FlowSession>) -> FlowMessage {
        FlowMessage::from_bytes(&session.receive().await.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_bystander_refuses_to_sign() {
        let net = TestNet::new();
        let dealer = net.node("O=Dealer");
        let alice = net.node("O=Alice");
        let bob = net.node("O=Bob");

        let proposal = deal(&dealer, bob.me());
        let signature = dealer.sign(&proposal.canonical_bytes().unwrap());
        let stx = SignedTransaction::new(proposal).with_signature(dealer.owning_key(), signature);

        let mut session = dealer.open_session(alice.name()).unwrap();
        let propose = FlowMessage::Propose {
            kind: FlowKind::Deal,
            stx,
            dependencies: Vec::new(),
        };
        session.send(propose.to_bytes().unwrap()).await.unwrap();

        match reply(&mut session).await {
            FlowMessage::Reject { reason } => {
                assert_eq!(reason, "Not a required signer of this transaction.")
            }
            other => panic!("expected Reject, got {}", other.name()),
        }
    }

    fn signed_deal(dealer: &ServiceHub, player: &Party) -> SignedTransaction {
        let proposal = deal(dealer, player);
        let signature = dealer.sign(&proposal.canonical_bytes().unwrap());
        SignedTransaction::new(proposal).with_signature(dealer.owning_key(), signature)
    }

    #[tokio::test]
    async fn test_policy_follows_commands_not_label() {
        let net = TestNet::new();
        let dealer = net.node("O=Dealer");
        let picky = net.node_with(
            "O=Picky",
            vec![(
                FlowKind::Deal,
                Arc::new(DealAcceptance::restricted_to([Card::new(Rank::Ace, Suit::Spades)])),
            )],
        );

        for label in [FlowKind::Deal, FlowKind::CreateGame] {
            let mut session = dealer.open_session(picky.name()).unwrap();
            let propose = FlowMessage::Propose {
                kind: label,
                stx: signed_deal(&dealer, picky.me()),
                dependencies: Vec::new(),
            };
            session.send(propose.to_bytes().unwrap()).await.unwrap();

            match reply(&mut session).await {
                FlowMessage::Reject { .. } => {}
                other => panic!("{label}: expected Reject, got {}", other.name()),
            }
        }
        assert_eq!(picky.vault().transaction_count(), 0);
    }

    #[tokio::test]
    async fn test_label_must_match_commands() {
        let net = TestNet::new();
        let dealer = net.node("O=Dealer");
        let alice = net.node("O=Alice");

        let mut session = dealer.open_session(alice.name()).unwrap();
        let propose = FlowMessage::Propose {
            kind: FlowKind::RevealCommunityCard,
            stx: signed_deal(&dealer, alice.me()),
            dependencies: Vec::new(),
        };
        session.send(propose.to_bytes().unwrap()).await.unwrap();

        match reply(&mut session).await {
            FlowMessage::Reject { reason } => assert_eq!(
                reason,
                "Proposed as reveal-community-card but carries no reveal-community-card command."
            ),
            other => panic!("expected Reject, got {}", other.name()),
        }
    }

    #[tokio::test]
    async fn test_unsigned_by_initiator_rejected() {
        let net = TestNet::new();
        let dealer = net.node("O=Dealer");
        let alice = net.node("O=Alice");

        let stx = SignedTransaction::new(deal(&dealer, alice.me()));
        let mut session = dealer.open_session(alice.name()).unwrap();
        let propose = FlowMessage::Propose {
            kind: FlowKind::Deal,
            stx,
            dependencies: Vec::new(),
        };
        session.send(propose.to_bytes().unwrap()).await.unwrap();

        assert!(matches!(reply(&mut session).await, FlowMessage::Reject { .. }));
    }

    #[tokio::test]
    async fn test_close_after_signing_persists_nothing() {
        let net = TestNet::new();
        let dealer = net.node("O=Dealer");
        let alice = net.node("O=Alice");

        let proposal = deal(&dealer, alice.me());
        let signature = dealer.sign(&proposal.canonical_bytes().unwrap());
        let stx = SignedTransaction::new(proposal).with_signature(dealer.owning_key(), signature);

        let mut session = dealer.open_session(alice.name()).unwrap();
        let propose = FlowMessage::Propose {
            kind: FlowKind::Deal,
            stx,
            dependencies: Vec::new(),
        };
        session.send(propose.to_bytes().unwrap()).await.unwrap();
        assert!(matches!(reply(&mut session).await, FlowMessage::Signed { .. }));
        session.close();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(alice.vault().transaction_count(), 0);
    }

    #[tokio::test]
    async fn test_observer_records_and_acks() {
        let net = TestNet::new();
        let dealer = net.node("O=Dealer");
        let alice = net.node("O=Alice");

        let proposal = deal(&dealer, alice.me());
        let bytes = proposal.canonical_bytes().unwrap();
        let stx = SignedTransaction::new(proposal)
            .with_signature(dealer.owning_key(), dealer.sign(&bytes))
            .with_signature(alice.owning_key(), alice.sign(&bytes));
        let NotaryVerdict::Accepted(notary_signature) = net.notary.notarise(&stx) else {
            panic!("notary refused");
        };
        let ntx = NotarizedTransaction {
            signed: stx,
            notary_signature,
        };
        let tx_id = ntx.id().unwrap();

        for _ in 0..2 {
            let mut session = dealer.open_session(alice.name()).unwrap();
            session
                .send(FlowMessage::Finalized(ntx.clone()).to_bytes().unwrap())
                .await
                .unwrap();
            match reply(&mut session).await {
                FlowMessage::FinalityAck { tx_id: acked } => assert_eq!(acked, tx_id),
                other => panic!("expected FinalityAck, got {}", other.name()),
            }
        }
        assert_eq!(alice.vault().transaction_count(), 1);
    }

    #[tokio::test]
    async fn test_observer_rejects_bad_notary_signature() {
        let net = TestNet::new();
        let dealer = net.node("O=Dealer");
        let alice = net.node("O=Alice");

        let proposal = deal(&dealer, alice.me());
        let bytes = proposal.canonical_bytes().unwrap();
        let stx = SignedTransaction::new(proposal)
            .with_signature(dealer.owning_key(), dealer.sign(&bytes))
            .with_signature(alice.owning_key(), alice.sign(&bytes));
        let forged = NotarizedTransaction {
            notary_signature: dealer.sign(&stx.id().unwrap().0),
            signed: stx,
        };

        let mut session = dealer.open_session(alice.name()).unwrap();
        session
            .send(FlowMessage::Finalized(forged).to_bytes().unwrap())
            .await
            .unwrap();

        assert!(session.receive().await.is_err());
        assert_eq!(alice.vault().transaction_count(), 0);
    }
}
