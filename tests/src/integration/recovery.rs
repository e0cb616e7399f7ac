//! # Checkpoint Recovery
//!
//! An initiator that dies mid-flow resumes from its last checkpoint after a
//! restart without asking anybody to sign twice, and re-notarising a
//! transaction the notary already accepted is harmless.

#[cfg(test)]
mod tests {
    use std::mem::discriminant;
    use std::sync::Arc;
    use std::time::Duration;

    use lf_02_vault::{FileBackedKVStore, Vault};
    use lf_04_flows::{
        CheckpointStore, FlowCheckpoint, FlowError, FlowPhase, FlowResult,
        InMemoryCheckpointStore, InitiatorFlow, RevealCommunityCardFlow, ServiceHub,
    };
    use parking_lot::Mutex;
    use shared_bus::{EventFilter, EventTopic, LedgerEvent};
    use shared_crypto::Ed25519KeyPair;
    use shared_types::{Card, ContractId, PartyName, Rank, Suit};
    use uuid::Uuid;

    use crate::integration::harness::{create_game, Harness, DEALER, PLAYER1, PLAYER2};

    /// Wraps a durable store. Saving `crash_at` kills the "process": that
    /// save and every later one is lost until `restart`.
    struct CrashingStore {
        durable: InMemoryCheckpointStore,
        crash_at: Mutex<Option<FlowPhase>>,
        crashed: Mutex<bool>,
    }

    impl CrashingStore {
        fn new(crash_at: FlowPhase) -> Self {
            Self {
                durable: InMemoryCheckpointStore::new(),
                crash_at: Mutex::new(Some(crash_at)),
                crashed: Mutex::new(false),
            }
        }

        fn restart(&self) {
            *self.crash_at.lock() = None;
            *self.crashed.lock() = false;
        }
    }

    impl CheckpointStore for CrashingStore {
        fn save(&self, checkpoint: &FlowCheckpoint) -> FlowResult<()> {
            let hits = self
                .crash_at
                .lock()
                .as_ref()
                .is_some_and(|phase| discriminant(phase) == discriminant(&checkpoint.phase));
            let mut crashed = self.crashed.lock();
            if hits {
                *crashed = true;
            }
            if *crashed {
                return Err(FlowError::Checkpoint("node crashed".to_string()));
            }
            self.durable.save(checkpoint)
        }

        fn load(&self, flow_id: &Uuid) -> FlowResult<Option<FlowCheckpoint>> {
            self.durable.load(flow_id)
        }

        fn remove(&self, flow_id: &Uuid) -> FlowResult<()> {
            self.durable.remove(flow_id)
        }

        fn unfinished(&self) -> FlowResult<Vec<FlowCheckpoint>> {
            self.durable.unfinished()
        }
    }

    fn dealer_with(net: &Harness, store: Arc<CrashingStore>) -> Arc<ServiceHub> {
        net.start(
            net.builder(DEALER, Arc::new(Ed25519KeyPair::generate()))
                .checkpoints(store),
        )
    }

    async fn crash_then_resume(
        dealer: &Arc<ServiceHub>,
        store: &CrashingStore,
        flow: InitiatorFlow,
    ) -> lf_04_flows::FlowOutcome {
        let flow_id = flow.flow_id();
        let err = flow.run().await.unwrap_err();
        assert!(matches!(err, FlowError::Checkpoint(_)));

        store.restart();
        let unfinished = store.unfinished().unwrap();
        assert_eq!(unfinished.len(), 1);
        assert_eq!(unfinished[0].flow_id, flow_id);

        let outcome = InitiatorFlow::resume(dealer.clone(), unfinished[0].clone())
            .run()
            .await
            .unwrap();
        assert_eq!(outcome.flow_id, flow_id);
        assert!(store.unfinished().unwrap().is_empty());
        outcome
    }

    #[tokio::test]
    async fn test_resume_after_signatures_skips_collection() {
        let net = Harness::new();
        let store = Arc::new(CrashingStore::new(FlowPhase::Notarising));
        let dealer = dealer_with(&net, store.clone());
        let p1 = net.node(PLAYER1);
        let p2 = net.node(PLAYER2);
        let game = create_game(&dealer, &[&p1, &p2]).await;
        let mut flow_events = net.bus.subscribe(EventFilter::topics(vec![EventTopic::Flow]));

        let reveal = RevealCommunityCardFlow::for_game(&dealer, game.game_id, Card::new(Rank::Four, Suit::Clubs))
            .unwrap();
        let proposal = reveal.proposal(&dealer).unwrap();
        let flow = InitiatorFlow::new(dealer.clone(), lf_04_flows::FlowKind::RevealCommunityCard, proposal);
        let outcome = crash_then_resume(&dealer, &store, flow).await;
        let tx_id = outcome.tx_id().unwrap();

        // Each player signed once, before the crash.
        let signed_by: Vec<PartyName> = flow_events
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                LedgerEvent::SignatureCollected { from, .. } => Some(from),
                _ => None,
            })
            .collect();
        assert_eq!(signed_by.len(), 2);

        tokio::time::sleep(Duration::from_millis(50)).await;
        for hub in [&dealer, &p1, &p2] {
            assert!(hub.vault().contains(&tx_id), "{} missing reveal", hub.name());
            let games = hub.vault().live_states_of(ContractId::Game);
            assert_eq!(games[0].state.as_game().unwrap().community_cards.len(), 1);
        }
    }

    #[tokio::test]
    async fn test_resume_after_notary_accept_is_idempotent() {
        let net = Harness::new();
        let store = Arc::new(CrashingStore::new(FlowPhase::Finalising));
        let dealer = dealer_with(&net, store.clone());
        let p1 = net.node(PLAYER1);
        let game = create_game(&dealer, &[&p1]).await;
        let game_ref = dealer.vault().live_states_of(ContractId::Game)[0].reference;

        let proposal = RevealCommunityCardFlow::for_game(&dealer, game.game_id, Card::new(Rank::Five, Suit::Clubs))
            .unwrap()
            .proposal(&dealer)
            .unwrap();
        let flow = InitiatorFlow::new(dealer.clone(), lf_04_flows::FlowKind::RevealCommunityCard, proposal);

        // The notary committed before the crash; nobody recorded anything.
        let outcome = crash_then_resume(&dealer, &store, flow).await;
        let tx_id = outcome.tx_id().unwrap();
        assert_eq!(net.notary.uniqueness().consumed_by(&game_ref), Some(tx_id));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(dealer.vault().contains(&tx_id));
        assert!(p1.vault().contains(&tx_id));
        assert_eq!(p1.vault().consumed_by(&game_ref), Some(tx_id));
    }

    #[tokio::test]
    async fn test_file_backed_vault_keeps_records_across_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("player1.vault");
        let net = Harness::new();
        let dealer = net.node(DEALER);

                let vault = Vault::open(
            PLAYER1.into(),
            Box::new(FileBackedKVStore::open(&path).unwrap()),
        )
        .unwrap();
        let p1 = net.start(net.builder_with_vault(Arc::new(Ed25519KeyPair::generate()), vault));
        let game = create_game(&dealer, &[&p1]).await;
        net.router.deregister(p1.name());
        drop(p1);

        let reopened = Vault::open(
            PLAYER1.into(),
            Box::new(FileBackedKVStore::open(&path).unwrap()),
        )
        .unwrap();
        assert_eq!(reopened.transaction_count(), 1);
        let live = reopened.live_states_of(ContractId::Game);
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].state.as_game().unwrap().game_id, game.game_id);
    }
}
