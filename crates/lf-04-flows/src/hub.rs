//! # Service Hub
//!
//! Everything one party's flows reach for, injected once per node.

use crate::adapters::InMemoryCheckpointStore;
use crate::config::FlowConfig;
use crate::domain::error::{FlowError, FlowResult};
use crate::domain::wire::FlowKind;
use crate::finality::RedeliveryQueue;
use crate::ports::outbound::{CheckpointStore, IdentityService};
use lf_01_contracts::{AcceptAll, AcceptancePolicy, ContractVerifier, LedgerContracts};
use lf_02_vault::Vault;
use lf_03_notary::NotaryClient;
use parking_lot::RwLock;
use shared_bus::{
    EventPublisher, FlowRole, FlowSession, InMemoryEventBus, LedgerEvent, ProgressStep,
    SessionTransport,
};
use shared_crypto::SigningCapability;
use shared_types::{Party, PartyName, PublicKey, Signature};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;
use uuid::Uuid;

pub struct ServiceHub {
    me: Party,
    signer: Arc<dyn SigningCapability>,
    vault: Arc<Vault>,
    verifier: Arc<dyn ContractVerifier>,
    notary: Arc<dyn NotaryClient>,
    transport: Arc<dyn SessionTransport>,
    identities: Arc<dyn IdentityService>,
    bus: Arc<InMemoryEventBus>,
    checkpoints: Arc<dyn CheckpointStore>,
    config: FlowConfig,
    redelivery: RedeliveryQueue,
    policies: RwLock<HashMap<FlowKind, Arc<dyn AcceptancePolicy>>>,
}

impl ServiceHub {
    pub fn builder(
        name: PartyName,
        signer: Arc<dyn SigningCapability>,
        vault: Arc<Vault>,
    ) -> ServiceHubBuilder {
        ServiceHubBuilder {
            name,
            signer,
            vault,
            verifier: Arc::new(LedgerContracts),
            notary: None,
            transport: None,
            identities: None,
            bus: None,
            checkpoints: Arc::new(InMemoryCheckpointStore::new()),
            config: FlowConfig::default(),
            policies: HashMap::new(),
        }
    }

    pub fn me(&self) -> &Party {
        &self.me
    }

    pub fn name(&self) -> &PartyName {
        &self.me.name
    }

    pub fn vault(&self) -> &Arc<Vault> {
        &self.vault
    }

    pub fn verifier(&self) -> &dyn ContractVerifier {
        self.verifier.as_ref()
    }

    pub fn notary(&self) -> &dyn NotaryClient {
        self.notary.as_ref()
    }

    pub fn identities(&self) -> &dyn IdentityService {
        self.identities.as_ref()
    }

    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }

    pub fn checkpoints(&self) -> &dyn CheckpointStore {
        self.checkpoints.as_ref()
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn redelivery(&self) -> &RedeliveryQueue {
        &self.redelivery
    }

    pub fn sign(&self, bytes: &[u8]) -> Signature {
        self.signer.sign(bytes).into()
    }

    pub fn owning_key(&self) -> PublicKey {
        self.me.owning_key
    }

    /// Open a session to `to`.
    pub fn open_session(&self, to: &PartyName) -> FlowResult<Box<dyn FlowSession>> {
        Ok(self.transport.open(&self.me.name, to)?)
    }

    /// Party owning `key`, or `UnknownParty`.
    pub fn party_for_key(&self, key: &PublicKey) -> FlowResult<Party> {
        if *key == self.me.owning_key {
            return Ok(self.me.clone());
        }
        self.identities
            .party_from_key(key)
            .ok_or(FlowError::UnknownParty(*key))
    }

    /// Acceptance policy this party applies when asked to sign `kind`.
    pub fn policy(&self, kind: FlowKind) -> Arc<dyn AcceptancePolicy> {
        self.policies
            .read()
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| Arc::new(AcceptAll))
    }

    pub fn set_policy(&self, kind: FlowKind, policy: Arc<dyn AcceptancePolicy>) {
        self.policies.write().insert(kind, policy);
    }

    pub(crate) async fn emit(&self, event: LedgerEvent) {
        let delivered = self.bus.publish(event).await;
        trace!(party = %self.me.name, delivered, "Event published");
    }

    pub(crate) async fn progress(&self, flow_id: Uuid, role: FlowRole, step: ProgressStep) {
        self.emit(LedgerEvent::FlowProgress {
            flow_id,
            party: self.me.name.clone(),
            role,
            step,
        })
        .await;
    }
}

impl std::fmt::Debug for ServiceHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHub")
            .field("me", &self.me)
            .field("notary", self.notary.notary())
            .finish_non_exhaustive()
    }
}

pub struct ServiceHubBuilder {
    name: PartyName,
    signer: Arc<dyn SigningCapability>,
    vault: Arc<Vault>,
    verifier: Arc<dyn ContractVerifier>,
    notary: Option<Arc<dyn NotaryClient>>,
    transport: Option<Arc<dyn SessionTransport>>,
    identities: Option<Arc<dyn IdentityService>>,
    bus: Option<Arc<InMemoryEventBus>>,
    checkpoints: Arc<dyn CheckpointStore>,
    config: FlowConfig,
    policies: HashMap<FlowKind, Arc<dyn AcceptancePolicy>>,
}

impl ServiceHubBuilder {
    pub fn notary(mut self, notary: Arc<dyn NotaryClient>) -> Self {
        self.notary = Some(notary);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn SessionTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn identities(mut self, identities: Arc<dyn IdentityService>) -> Self {
        self.identities = Some(identities);
        self
    }

    pub fn bus(mut self, bus: Arc<InMemoryEventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn verifier(mut self, verifier: Arc<dyn ContractVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn checkpoints(mut self, checkpoints: Arc<dyn CheckpointStore>) -> Self {
        self.checkpoints = checkpoints;
        self
    }

    pub fn config(mut self, config: FlowConfig) -> Self {
        self.config = config;
        self
    }

    pub fn policy(mut self, kind: FlowKind, policy: Arc<dyn AcceptancePolicy>) -> Self {
        self.policies.insert(kind, policy);
        self
    }

    /// Fails when a collaborator without a sensible default is missing.
    pub fn build(self) -> FlowResult<ServiceHub> {
        let missing = |what: &str| FlowError::Misconfigured(format!("service hub needs a {what}"));
        let me = Party::new(self.name, self.signer.public_key().into());
        Ok(ServiceHub {
            me,
            signer: self.signer,
            vault: self.vault,
            verifier: self.verifier,
            notary: self.notary.ok_or_else(|| missing("notary client"))?,
            transport: self.transport.ok_or_else(|| missing("session transport"))?,
            identities: self.identities.ok_or_else(|| missing("identity service"))?,
            bus: self.bus.unwrap_or_else(|| Arc::new(InMemoryEventBus::new())),
            checkpoints: self.checkpoints,
            config: self.config,
            redelivery: RedeliveryQueue::new(),
            policies: RwLock::new(self.policies),
        })
    }
}
