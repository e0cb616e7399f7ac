//! Shared fixture: an in-process network whose parties can be built with
//! non-default collaborators (flaky notaries, crashing checkpoint stores,
//! silent responders).

use std::sync::Arc;

use lf_01_contracts::AcceptancePolicy;
use lf_02_vault::Vault;
use lf_03_notary::{LocalNotaryClient, NotaryService};
use lf_04_flows::{
    CreateGameFlow, FlowConfig, FlowKind, FlowMessage, NetworkMap, ServiceHub, ServiceHubBuilder,
};
use node_runtime::ResponderDispatcher;
use shared_bus::{FlowSession, InMemoryEventBus, SessionRouter};
use shared_crypto::{Ed25519KeyPair, SigningCapability};
use shared_types::{GameState, Party, PartyName, PublicKey, Signature};

pub const DEALER: &str = "O=Dealer,L=London,C=GB";
pub const PLAYER1: &str = "O=Player1,L=New York,C=US";
pub const PLAYER2: &str = "O=Player2,L=Paris,C=FR";

pub struct Harness {
    pub router: Arc<SessionRouter>,
    pub map: Arc<NetworkMap>,
    pub notary: Arc<NotaryService>,
    pub bus: Arc<InMemoryEventBus>,
}

impl Harness {
    pub fn new() -> Self {
        let notary = Arc::new(NotaryService::new(
            PartyName::new("O=Notary,L=Zurich,C=CH"),
            Arc::new(Ed25519KeyPair::generate()),
        ));
        let map = Arc::new(NetworkMap::new());
        map.add(notary.identity().clone());
        Self {
            router: Arc::new(SessionRouter::new()),
            map,
            notary,
            bus: Arc::new(InMemoryEventBus::new()),
        }
    }

    /// A builder wired to this network with a fresh in-memory vault.
    pub fn builder(&self, name: &str, signer: Arc<Ed25519KeyPair>) -> ServiceHubBuilder {
        self.builder_with_vault(signer, Vault::in_memory(PartyName::new(name)))
    }

    pub fn builder_with_vault(&self, signer: Arc<Ed25519KeyPair>, vault: Vault) -> ServiceHubBuilder {
        ServiceHub::builder(
            vault.owner().clone(),
            signer as Arc<dyn SigningCapability>,
            Arc::new(vault),
        )
        .notary(Arc::new(LocalNotaryClient::new(self.notary.clone())))
        .transport(self.router.clone())
        .identities(self.map.clone())
        .bus(self.bus.clone())
        .config(FlowConfig::fast())
    }

    /// Publish the party and start its responder dispatch loop.
    pub fn start(&self, builder: ServiceHubBuilder) -> Arc<ServiceHub> {
        let hub = Arc::new(builder.build().unwrap());
        self.map.add(hub.me().clone());
        let inbox = self.router.register(hub.name().clone());
        tokio::spawn(ResponderDispatcher::new(hub.clone(), inbox).run());
        hub
    }

    pub fn node(&self, name: &str) -> Arc<ServiceHub> {
        self.start(self.builder(name, Arc::new(Ed25519KeyPair::generate())))
    }

    pub fn node_with_policy(
        &self,
        name: &str,
        kind: FlowKind,
        policy: Arc<dyn AcceptancePolicy>,
    ) -> Arc<ServiceHub> {
        self.start(
            self.builder(name, Arc::new(Ed25519KeyPair::generate()))
                .policy(kind, policy),
        )
    }

    /// A party that signs every proposal but never acknowledges finality.
    /// Sessions are held open so the initiator sees a timeout, not a close.
    pub fn silent_node(&self, name: &str, signer: Arc<Ed25519KeyPair>) {
        let party = PartyName::new(name);
        let key: PublicKey = signer.public_key().into();
        self.map.add(Party::new(party.clone(), key));

        let mut inbox = self.router.register(party);
        tokio::spawn(async move {
            let mut held: Vec<Box<dyn FlowSession>> = Vec::new();
            while let Some(mut session) = inbox.accept().await {
                if let Ok(bytes) = session.receive().await {
                    if let Ok(FlowMessage::Propose { stx, .. }) = FlowMessage::from_bytes(&bytes) {
                        let bytes = stx.proposal.canonical_bytes().unwrap();
                        let signature: Signature = signer.sign(&bytes).into();
                        let reply = FlowMessage::Signed { key, signature };
                        let _ = session.send(reply.to_bytes().unwrap()).await;
                        // Swallow the Finalized frame.
                        let _ = session.receive().await;
                    }
                }
                held.push(session);
            }
        });
    }
}

/// Run CreateGame from `dealer` for `players` and return the new game.
pub async fn create_game(dealer: &Arc<ServiceHub>, players: &[&Arc<ServiceHub>]) -> GameState {
    let names = players.iter().map(|p| p.name().clone()).collect();
    let outcome = CreateGameFlow::new(names).run(dealer.clone()).await.unwrap();
    assert!(!outcome.is_partial());
    outcome.transaction.proposal().outputs[0]
        .as_game()
        .unwrap()
        .clone()
}
