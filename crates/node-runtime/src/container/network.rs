//! # Local Network
//!
//! An in-process network: one notary and any number of party nodes that
//! share a session router, an identity directory and an event bus.
//!
//! With `persistent_vaults` every party keeps two files under `data_dir`:
//! its vault, and a node store holding its identity seed and its flow
//! checkpoints. Restarting from the same directory brings back the same
//! identities, so checkpointed flows can be resumed.

use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;

use lf_01_contracts::AcceptancePolicy;
use lf_02_vault::{FileBackedKVStore, KeyValueStore, Vault};
use lf_03_notary::{LocalNotaryClient, NotaryService};
use lf_04_flows::{FlowKind, KvCheckpointStore, NetworkMap, ServiceHub};
use shared_bus::{InMemoryEventBus, SessionRouter};
use shared_crypto::{Ed25519KeyPair, SigningCapability};
use shared_types::PartyName;
use tokio::task::JoinHandle;
use tracing::info;

use crate::container::config::NodeConfig;
use crate::container::node::{LedgerNode, NodeError, NodeResult};
use crate::handlers::MetricsRecorder;

const IDENTITY_SEED_KEY: &[u8] = b"identity/seed";

pub struct LocalNetwork {
    config: NodeConfig,
    router: Arc<SessionRouter>,
    map: Arc<NetworkMap>,
    bus: Arc<InMemoryEventBus>,
    notary: Arc<NotaryService>,
    nodes: BTreeMap<PartyName, LedgerNode>,
}

impl LocalNetwork {
    /// A network with only the notary configured in `config`.
    pub fn new(config: NodeConfig) -> NodeResult<Self> {
        let keys = match open_node_store(&config, &config.notary)? {
            Some(mut store) => load_or_create_identity(&mut store)?,
            None => Ed25519KeyPair::generate(),
        };
        let notary = Arc::new(NotaryService::new(
            PartyName::new(config.notary.as_str()),
            Arc::new(keys),
        ));
        let map = Arc::new(NetworkMap::new());
        map.add(notary.identity().clone());

        info!(
            notary = %notary.identity().name,
            persistent = config.persistent_vaults,
            "[node] Local network created"
        );

        Ok(Self {
            config,
            router: Arc::new(SessionRouter::new()),
            map,
            bus: Arc::new(InMemoryEventBus::new()),
            notary,
            nodes: BTreeMap::new(),
        })
    }

    /// The configured dealer and players, all started.
    pub fn from_config(config: NodeConfig) -> NodeResult<Self> {
        if config.players.iter().any(|p| *p == config.dealer) {
            return Err(NodeError::Config(format!(
                "{} cannot be both dealer and player",
                config.dealer
            )));
        }
        let mut network = Self::new(config)?;
        let names: Vec<String> = std::iter::once(network.config.dealer.clone())
            .chain(network.config.players.iter().cloned())
            .collect();
        for name in names {
            network.add_node(&name)?;
        }
        Ok(network)
    }

    pub fn add_node(&mut self, name: &str) -> NodeResult<&LedgerNode> {
        self.add_node_with(name, Vec::new())
    }

    /// Start a party whose responders apply `policies` per flow kind.
    pub fn add_node_with(
        &mut self,
        name: &str,
        policies: Vec<(FlowKind, Arc<dyn AcceptancePolicy>)>,
    ) -> NodeResult<&LedgerNode> {
        let party = PartyName::new(name);
        if self.nodes.contains_key(&party) || self.router.is_registered(&party) {
            return Err(NodeError::Config(format!("{party} is already on the network")));
        }

        let vault = Arc::new(self.open_vault(&party)?);
        let (keys, checkpoints) = match open_node_store(&self.config, party.as_str())? {
            Some(mut store) => {
                let keys = load_or_create_identity(&mut store)?;
                (keys, Some(Arc::new(KvCheckpointStore::new(Box::new(store)))))
            }
            None => (Ed25519KeyPair::generate(), None),
        };
        let signer: Arc<dyn SigningCapability> = Arc::new(keys);

        let mut builder = ServiceHub::builder(party.clone(), signer, vault)
            .notary(Arc::new(LocalNotaryClient::new(Arc::clone(&self.notary))))
            .transport(self.router.clone())
            .identities(self.map.clone())
            .bus(Arc::clone(&self.bus))
            .config(self.config.flow.clone());
        if let Some(checkpoints) = checkpoints {
            builder = builder.checkpoints(checkpoints);
        }
        for (kind, policy) in policies {
            builder = builder.policy(kind, policy);
        }
        let hub = Arc::new(builder.build()?);
        self.map.add(hub.me().clone());

        let node = LedgerNode::start(
            hub,
            Arc::clone(&self.router),
            self.config.redelivery_interval,
        );
        Ok(self.nodes.entry(party).or_insert(node))
    }

    fn open_vault(&self, party: &PartyName) -> NodeResult<Vault> {
        if !self.config.persistent_vaults {
            return Ok(Vault::in_memory(party.clone()));
        }
        ensure_data_dir(&self.config)?;
        let store = FileBackedKVStore::open(self.config.vault_path(party.as_str()))?;
        Ok(Vault::open(party.clone(), Box::new(store))?)
    }

    pub fn node(&self, name: &str) -> NodeResult<&LedgerNode> {
        self.nodes
            .get(&PartyName::new(name))
            .ok_or_else(|| NodeError::UnknownNode(name.to_string()))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &LedgerNode> {
        self.nodes.values()
    }

    pub fn dealer(&self) -> NodeResult<&LedgerNode> {
        self.node(&self.config.dealer)
    }

    /// Player names from the configuration.
    pub fn players(&self) -> Vec<PartyName> {
        self.config.players.iter().map(PartyName::new).collect()
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn router(&self) -> &Arc<SessionRouter> {
        &self.router
    }

    pub fn identities(&self) -> &Arc<NetworkMap> {
        &self.map
    }

    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }

    pub fn notary(&self) -> &Arc<NotaryService> {
        &self.notary
    }

    /// Drive every node's checkpointed flows that never finished. Returns
    /// how many were picked up; individual failures are logged by the node.
    pub async fn resume_unfinished(&self) -> NodeResult<usize> {
        let mut resumed = 0;
        for node in self.nodes.values() {
            resumed += node.resume_unfinished().await?.len();
        }
        Ok(resumed)
    }

    /// Feed every bus event into the Prometheus counters.
    pub fn spawn_metrics(&self) -> JoinHandle<()> {
        let recorder = MetricsRecorder::new(&self.bus);
        tokio::spawn(recorder.run())
    }

    pub async fn shutdown(&self) {
        for node in self.nodes.values() {
            node.shutdown().await;
        }
        info!("[node] Local network stopped");
    }
}

fn ensure_data_dir(config: &NodeConfig) -> NodeResult<()> {
    fs::create_dir_all(&config.data_dir).map_err(|e| {
        NodeError::Config(format!(
            "cannot create data dir {}: {e}",
            config.data_dir.display()
        ))
    })
}

/// The node store for `party`, when state is kept on disk.
fn open_node_store(config: &NodeConfig, party: &str) -> NodeResult<Option<FileBackedKVStore>> {
    if !config.persistent_vaults {
        return Ok(None);
    }
    ensure_data_dir(config)?;
    Ok(Some(FileBackedKVStore::open(config.node_store_path(party))?))
}

/// The key pair kept in `store`, or a fresh one written there.
fn load_or_create_identity(store: &mut dyn KeyValueStore) -> NodeResult<Ed25519KeyPair> {
    if let Some(bytes) = store.get(IDENTITY_SEED_KEY)? {
        let seed: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            NodeError::Config(format!("identity seed has {} bytes, expected 32", bytes.len()))
        })?;
        return Ok(Ed25519KeyPair::from_seed(seed));
    }
    let keys = Ed25519KeyPair::generate();
    store.put(IDENTITY_SEED_KEY, &keys.to_seed())?;
    Ok(keys)
}
