//! # Ledger Node
//!
//! One party: its service hub plus the tasks that keep it responsive.
//!
//! ```text
//!            ┌──────────── LedgerNode ────────────┐
//!  sessions ─┼─▶ ResponderDispatcher ─▶ ResponderFlow (per session)
//!            │                                     │
//!            │   RedeliveryTask (every interval)   │
//!            │                                     │
//!  start_flow┼─▶ CreateGame / Deal / Reveal ─▶ InitiatorFlow
//!            └─────────────────────────────────────┘
//! ```
//!
//! Every spawned loop listens on one `watch` channel; `shutdown` flips it,
//! deregisters the party and waits for the loops to exit.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use lf_04_flows::{
    CreateGameFlow, DealFlow, FlowError, FlowOutcome, FlowResult, InitiatorFlow,
    RevealCommunityCardFlow, ServiceHub,
};
use parking_lot::Mutex;
use shared_bus::SessionRouter;
use shared_types::{Card, ContractId, Deck, GameId, PartyName, StateAndRef};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::handlers::{RedeliveryTask, ResponderDispatcher};

/// Node-level failures.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error("Vault error: {0}")]
    Vault(#[from] lf_02_vault::VaultError),

    #[error("Storage error: {0}")]
    Storage(#[from] lf_02_vault::KVStoreError),

    #[error("Flow task aborted: {0}")]
    Join(String),

    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type NodeResult<T> = Result<T, NodeError>;

pub struct LedgerNode {
    hub: Arc<ServiceHub>,
    router: Arc<SessionRouter>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl LedgerNode {
    /// Register the party with `router` and spawn its responder dispatch
    /// and redelivery loops.
    pub fn start(
        hub: Arc<ServiceHub>,
        router: Arc<SessionRouter>,
        redelivery_interval: Duration,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let inbox = router.register(hub.name().clone());

        let dispatcher = ResponderDispatcher::new(Arc::clone(&hub), inbox);
        let mut dispatch_shutdown = shutdown_rx.clone();
        let name = hub.name().clone();
        let dispatch = tokio::spawn(async move {
            tokio::select! {
                _ = dispatcher.run() => {}
                _ = dispatch_shutdown.changed() => {
                    info!(party = %name, "[node] Responder dispatch stopping");
                }
            }
        });

        let redelivery = RedeliveryTask::new(Arc::clone(&hub), redelivery_interval);
        let mut redelivery_shutdown = shutdown_rx;
        let name = hub.name().clone();
        let redeliver = tokio::spawn(async move {
            tokio::select! {
                _ = redelivery.run() => {}
                _ = redelivery_shutdown.changed() => {
                    info!(party = %name, "[node] Redelivery task stopping");
                }
            }
        });

        info!(party = %hub.name(), key = %hub.owning_key(), "[node] Node started");

        Self {
            hub,
            router,
            shutdown_tx,
            tasks: Mutex::new(vec![dispatch, redeliver]),
        }
    }

    pub fn hub(&self) -> &Arc<ServiceHub> {
        &self.hub
    }

    pub fn name(&self) -> &PartyName {
        self.hub.name()
    }

    /// Run a flow on its own task and wait for its result.
    pub async fn start_flow<F, Fut, T>(&self, flow: F) -> NodeResult<T>
    where
        F: FnOnce(Arc<ServiceHub>) -> Fut,
        Fut: Future<Output = FlowResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let handle = tokio::spawn(flow(Arc::clone(&self.hub)));
        match handle.await {
            Ok(result) => Ok(result?),
            Err(e) => {
                error!(party = %self.name(), error = %e, "[node] Flow task aborted");
                Err(NodeError::Join(e.to_string()))
            }
        }
    }

    pub async fn create_game(&self, players: Vec<PartyName>) -> NodeResult<FlowOutcome> {
        self.start_flow(move |hub| CreateGameFlow::new(players).run(hub))
            .await
    }

    /// Deal every player their hand from `deck`.
    pub async fn deal(
        &self,
        deck: &mut Deck,
        players: Vec<PartyName>,
        game_id: GameId,
    ) -> NodeResult<Vec<FlowOutcome>> {
        let flow = DealFlow::from_deck(deck, players, game_id)?;
        self.start_flow(move |hub| flow.run(hub)).await
    }

    pub async fn reveal_community_card(
        &self,
        game_id: GameId,
        card: Card,
    ) -> NodeResult<FlowOutcome> {
        let flow = RevealCommunityCardFlow::for_game(&self.hub, game_id, card)?;
        self.start_flow(move |hub| flow.run(hub)).await
    }

    /// The live game record for `game_id`, if this party holds it.
    pub fn game(&self, game_id: GameId) -> Option<StateAndRef> {
        self.hub
            .vault()
            .live_states_of(ContractId::Game)
            .into_iter()
            .find(|s| s.state.as_game().is_some_and(|g| g.game_id == game_id))
    }

    /// Drive every checkpointed flow that never reached a terminal phase.
    pub async fn resume_unfinished(&self) -> NodeResult<Vec<FlowResult<FlowOutcome>>> {
        let checkpoints = self.hub.checkpoints().unfinished()?;
        if !checkpoints.is_empty() {
            info!(
                party = %self.name(),
                count = checkpoints.len(),
                "[node] Resuming unfinished flows"
            );
        }

        let mut results = Vec::with_capacity(checkpoints.len());
        for checkpoint in checkpoints {
            let flow_id = checkpoint.flow_id;
            let result = self
                .start_flow(move |hub| InitiatorFlow::resume(hub, checkpoint).run())
                .await;
            match result {
                Ok(outcome) => results.push(Ok(outcome)),
                Err(NodeError::Flow(e)) => {
                    warn!(party = %self.name(), %flow_id, error = %e, "[node] Resumed flow failed");
                    results.push(Err(e));
                }
                Err(other) => return Err(other),
            }
        }
        Ok(results)
    }

    /// Stop the background loops and leave the network.
    pub async fn shutdown(&self) {
        info!(party = %self.name(), "[node] Initiating shutdown");

        if let Err(e) = self.shutdown_tx.send(true) {
            error!(party = %self.name(), "[node] Failed to send shutdown signal: {}", e);
        }
        self.router.deregister(self.name());

        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                warn!(party = %self.name(), error = %e, "[node] Background task ended abnormally");
            }
        }

        info!(party = %self.name(), "[node] Shutdown complete");
    }
}

impl std::fmt::Debug for LedgerNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerNode")
            .field("party", self.name())
            .finish_non_exhaustive()
    }
}
