//! # Initiator Flow
//!
//! ```text
//! Building ─▶ Verifying ─▶ Signing ─▶ Collecting ─▶ Notarising ─▶ Finalising ─▶ Done
//!     └───────────┴───────────┴────────────┴─────────────┴─────────────┴──▶ Failed(reason)
//! ```
//!
//! Every transition is written to the hub's [`CheckpointStore`] before the
//! next phase starts, and every collected signature updates the current
//! checkpoint. [`InitiatorFlow::resume`] continues from the last one:
//! Collecting asks only signers still missing, Notarising resubmits (the
//! notary is idempotent), Finalising delivers over fresh sessions.
//!
//! [`CheckpointStore`]: crate::ports::outbound::CheckpointStore

use crate::collector::{collect_signatures, Counterparty};
use crate::domain::checkpoint::{FlowCheckpoint, FlowPhase};
use crate::domain::error::{FlowError, FlowOutcome, FlowResult, FlowWarning};
use crate::domain::wire::FlowKind;
use crate::finality::finalise;
use crate::hub::ServiceHub;
use crate::notarise::notarise_with_retry;
use shared_bus::{FlowRole, FlowSession, LedgerEvent};
use shared_types::{
    NotarizedTransaction, PartyName, SignedTransaction, TransactionProposal, TxId, TypesError,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct InitiatorFlow {
    hub: Arc<ServiceHub>,
    checkpoint: FlowCheckpoint,
    /// Sessions kept open from Collecting for Finalising. Never checkpointed.
    sessions: Vec<Box<dyn FlowSession>>,
}

impl InitiatorFlow {
    pub fn new(hub: Arc<ServiceHub>, kind: FlowKind, proposal: TransactionProposal) -> Self {
        let checkpoint = FlowCheckpoint::new(hub.name().clone(), kind, proposal);
        Self {
            hub,
            checkpoint,
            sessions: Vec::new(),
        }
    }

    /// Continue a flow from its last checkpoint.
    pub fn resume(hub: Arc<ServiceHub>, checkpoint: FlowCheckpoint) -> Self {
        info!(
            flow_id = %checkpoint.flow_id,
            phase = ?checkpoint.phase,
            "[lf-04] Resuming flow from checkpoint"
        );
        Self {
            hub,
            checkpoint,
            sessions: Vec::new(),
        }
    }

    pub fn flow_id(&self) -> Uuid {
        self.checkpoint.flow_id
    }

    pub fn checkpoint(&self) -> &FlowCheckpoint {
        &self.checkpoint
    }

    /// Drive the flow to `Done` or `Failed`.
    pub async fn run(mut self) -> FlowResult<FlowOutcome> {
        if self.checkpoint.phase == FlowPhase::Building {
            self.hub
                .emit(LedgerEvent::FlowStarted {
                    flow_id: self.flow_id(),
                    party: self.hub.name().clone(),
                    kind: self.checkpoint.kind.to_string(),
                })
                .await;
        }

        loop {
            match self.step().await {
                Ok(Some(outcome)) => return Ok(outcome),
                Ok(None) => {}
                Err(err) => {
                    self.fail(&err).await;
                    return Err(err);
                }
            }
        }
    }

    async fn step(&mut self) -> FlowResult<Option<FlowOutcome>> {
        match self.checkpoint.phase.clone() {
            FlowPhase::Building => {
                self.advance(FlowPhase::Verifying).await?;
            }
            FlowPhase::Verifying => {
                self.verify()?;
                self.advance(FlowPhase::Signing).await?;
            }
            FlowPhase::Signing => {
                self.sign()?;
                self.advance(FlowPhase::Collecting).await?;
            }
            FlowPhase::Collecting => {
                self.collect().await?;
                self.advance(FlowPhase::Notarising).await?;
            }
            FlowPhase::Notarising => {
                let signed = self.signed()?.clone();
                let ntx = notarise_with_retry(&self.hub, self.flow_id(), &signed).await?;
                self.checkpoint.unconfirmed = self.recipients()?;
                self.checkpoint.notarized = Some(ntx);
                self.advance(FlowPhase::Finalising).await?;
            }
            FlowPhase::Finalising => {
                let ntx = self.notarized()?.clone();
                let recipients = self.checkpoint.unconfirmed.clone();
                let sessions = std::mem::take(&mut self.sessions);
                self.checkpoint.unconfirmed =
                    finalise(&self.hub, self.flow_id(), &ntx, sessions, &recipients).await?;
                self.advance(FlowPhase::Done).await?;
            }
            FlowPhase::Done => return self.complete().await.map(Some),
            FlowPhase::Failed(reason) => {
                return Err(FlowError::Checkpoint(format!(
                    "flow {} already failed: {reason}",
                    self.flow_id()
                )))
            }
        }
        Ok(None)
    }

    fn verify(&self) -> FlowResult<()> {
        let ltx = self
            .checkpoint
            .proposal
            .to_ledger_transaction(&**self.hub.vault())
            .map_err(|e| match e {
                TypesError::UnresolvedInput(input) => FlowError::MissingInput(input.to_string()),
                other => other.into(),
            })?;
        self.hub
            .verifier()
            .verify(&ltx)
            .map_err(|e| FlowError::VerificationRejected(e.to_string()))
    }

    fn sign(&mut self) -> FlowResult<()> {
        let proposal = &self.checkpoint.proposal;
        let mut signed = SignedTransaction::new(proposal.clone());
        let me = self.hub.owning_key();
        if proposal.required_signers().contains(&me) {
            signed.add_signature(me, self.hub.sign(&proposal.canonical_bytes()?));
        }

        self.checkpoint.pending_signers = signed
            .missing_signers()
            .iter()
            .map(|key| self.hub.party_for_key(key).map(|p| p.name))
            .collect::<FlowResult<_>>()?;
        self.checkpoint.signed = Some(signed);
        Ok(())
    }

    async fn collect(&mut self) -> FlowResult<()> {
        let signed = self.signed()?.clone();
        let me = self.hub.owning_key();
        let missing: Vec<_> = signed
            .missing_signers()
            .into_iter()
            .filter(|key| *key != me)
            .collect();
        if missing.is_empty() {
            return Ok(());
        }

        let mut counterparties = Vec::with_capacity(missing.len());
        for key in &missing {
            let party = self.hub.party_for_key(key)?;
            let session = self.hub.open_session(&party.name)?;
            counterparties.push(Counterparty { party, session });
        }
        let dependencies = self.dependencies();
        debug!(
            flow_id = %self.flow_id(),
            counterparties = counterparties.len(),
            dependencies = dependencies.len(),
            "[lf-04] Collecting signatures"
        );

        let hub = self.hub.clone();
        let flow_id = self.flow_id();
        let kind = self.checkpoint.kind;
        let checkpoint = &mut self.checkpoint;
        let collected = collect_signatures(
            &hub,
            flow_id,
            kind,
            signed,
            dependencies,
            counterparties,
            |party, stx| {
                checkpoint.signed = Some(stx.clone());
                checkpoint.pending_signers.retain(|name| *name != party.name);
                hub.checkpoints().save(checkpoint)
            },
        )
        .await?;

        collected
            .stx
            .verify_required_signatures()
            .map_err(|e| FlowError::Protocol(e.to_string()))?;
        self.checkpoint.signed = Some(collected.stx);
        self.checkpoint.pending_signers.clear();
        self.sessions = collected.sessions;
        Ok(())
    }

    async fn complete(&mut self) -> FlowResult<FlowOutcome> {
        let transaction = self.notarized()?.clone();
        let tx_id = transaction.id()?;
        let warnings = if self.checkpoint.unconfirmed.is_empty() {
            Vec::new()
        } else {
            vec![FlowWarning::PartialDelivery {
                unconfirmed: self.checkpoint.unconfirmed.clone(),
            }]
        };

        self.hub
            .emit(LedgerEvent::FlowCompleted {
                flow_id: self.flow_id(),
                party: self.hub.name().clone(),
                tx_id,
            })
            .await;
        info!(
            flow_id = %self.flow_id(),
            kind = %self.checkpoint.kind,
            tx_id = %tx_id.short(),
            partial = !warnings.is_empty(),
            "[lf-04] Flow done"
        );

        Ok(FlowOutcome {
            flow_id: self.flow_id(),
            transaction,
            warnings,
        })
    }

    async fn advance(&mut self, phase: FlowPhase) -> FlowResult<()> {
        debug!(
            flow_id = %self.flow_id(),
            from = ?self.checkpoint.phase,
            to = ?phase,
            "[lf-04] Phase transition"
        );
        self.checkpoint.phase = phase;
        self.hub.checkpoints().save(&self.checkpoint)?;
        self.hub
            .progress(self.flow_id(), FlowRole::Initiator, self.checkpoint.phase.step())
            .await;
        Ok(())
    }

    async fn fail(&mut self, err: &FlowError) {
        for session in self.sessions.iter_mut() {
            session.close();
        }
        self.sessions.clear();

        let reason = err.to_string();
        warn!(
            flow_id = %self.flow_id(),
            phase = ?self.checkpoint.phase,
            kind = err.kind(),
            error = %reason,
            "[lf-04] Flow failed"
        );
        if !matches!(self.checkpoint.phase, FlowPhase::Failed(_)) {
            self.checkpoint.phase = FlowPhase::Failed(reason.clone());
            if let Err(e) = self.hub.checkpoints().save(&self.checkpoint) {
                warn!(flow_id = %self.flow_id(), error = %e, "[lf-04] Could not checkpoint failure");
            }
        }
        self.hub
            .progress(self.flow_id(), FlowRole::Initiator, self.checkpoint.phase.step())
            .await;
        self.hub
            .emit(LedgerEvent::FlowFailed {
                flow_id: self.flow_id(),
                party: self.hub.name().clone(),
                role: FlowRole::Initiator,
                reason,
            })
            .await;
    }

    /// Every other party that must end up holding the transaction.
    fn recipients(&self) -> FlowResult<Vec<PartyName>> {
        let proposal = &self.checkpoint.proposal;
        let mut names: BTreeSet<PartyName> = proposal
            .outputs
            .iter()
            .flat_map(|state| state.participants())
            .map(|party| party.name)
            .collect();
        for key in proposal.required_signers() {
            names.insert(self.hub.party_for_key(&key)?.name);
        }
        names.remove(self.hub.name());
        Ok(names.into_iter().collect())
    }

    /// Notarized transactions that produced this proposal's inputs.
    fn dependencies(&self) -> Vec<NotarizedTransaction> {
        let producers: BTreeSet<TxId> = self
            .checkpoint
            .proposal
            .inputs
            .iter()
            .map(|input| input.txhash)
            .collect();
        producers
            .iter()
            .filter_map(|id| self.hub.vault().transaction(id))
            .collect()
    }

    fn signed(&self) -> FlowResult<&SignedTransaction> {
        self.checkpoint
            .signed
            .as_ref()
            .ok_or_else(|| FlowError::Checkpoint("no signed transaction recorded".into()))
    }

    fn notarized(&self) -> FlowResult<&NotarizedTransaction> {
        self.checkpoint
            .notarized
            .as_ref()
            .ok_or_else(|| FlowError::Checkpoint("no notarized transaction recorded".into()))
    }
}
