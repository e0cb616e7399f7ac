//! In-process network for unit tests.

use crate::adapters::NetworkMap;
use crate::config::FlowConfig;
use crate::domain::wire::FlowKind;
use crate::hub::ServiceHub;
use crate::responder::ResponderFlow;
use lf_01_contracts::AcceptancePolicy;
use lf_02_vault::Vault;
use lf_03_notary::{LocalNotaryClient, NotaryService};
use shared_bus::{InMemoryEventBus, SessionRouter};
use shared_crypto::{Ed25519KeyPair, SigningCapability};
use shared_types::PartyName;
use std::sync::Arc;

pub struct TestNet {
    pub router: Arc<SessionRouter>,
    pub map: Arc<NetworkMap>,
    pub notary: Arc<NotaryService>,
    pub bus: Arc<InMemoryEventBus>,
}

impl TestNet {
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

    /// A party whose responder loop is running.
    pub fn node(&self, name: &str) -> Arc<ServiceHub> {
        self.node_with(name, Vec::new())
    }

    pub fn node_with(
        &self,
        name: &str,
        policies: Vec<(FlowKind, Arc<dyn AcceptancePolicy>)>,
    ) -> Arc<ServiceHub> {
        let name = PartyName::new(name);
        let signer: Arc<dyn SigningCapability> = Arc::new(Ed25519KeyPair::generate());
        let mut builder = ServiceHub::builder(
            name.clone(),
            signer,
            Arc::new(Vault::in_memory(name.clone())),
        )
        .notary(Arc::new(LocalNotaryClient::new(self.notary.clone())))
        .transport(self.router.clone())
        .identities(self.map.clone())
        .bus(self.bus.clone())
        .config(FlowConfig::fast());
        for (kind, policy) in policies {
            builder = builder.policy(kind, policy);
        }
        let hub = Arc::new(builder.build().unwrap());
        self.map.add(hub.me().clone());

        let mut inbox = self.router.register(name);
        let responder_hub = hub.clone();
        tokio::spawn(async move {
            while let Some(session) = inbox.accept().await {
                let hub = responder_hub.clone();
                tokio::spawn(async move {
                    let _ = ResponderFlow::new(hub, session).run().await;
                });
            }
        });
        hub
    }
}
