//! # Finality Delivery
//!
//! Redelivering a recorded transaction is harmless, and a participant that
//! never acknowledges is reported, queued and caught up later.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use lf_04_flows::{redeliver_pending, DealFlow, FlowWarning};
    use node_runtime::RedeliveryTask;
    use shared_bus::{EventFilter, EventTopic, LedgerEvent};
    use shared_crypto::Ed25519KeyPair;
    use shared_types::{Card, PartyName, Rank, Suit};

    use crate::integration::harness::{create_game, Harness, DEALER, PLAYER1, PLAYER2};

    #[tokio::test]
    async fn test_redelivery_is_idempotent() {
        let net = Harness::new();
        let dealer = net.node(DEALER);
        let player = net.node(PLAYER1);
        let game = create_game(&dealer, &[&player]).await;
        let recorded = player.vault().transaction_count();
        let tx_id = player.vault().transactions()[0].id().unwrap();

        // Queue a delivery the player already acknowledged, twice over.
        dealer.redelivery().enqueue(tx_id, [player.name().clone()]);
        assert_eq!(redeliver_pending(&dealer).await.unwrap(), 1);
        dealer.redelivery().enqueue(tx_id, [player.name().clone()]);
        assert_eq!(redeliver_pending(&dealer).await.unwrap(), 1);

        assert!(dealer.redelivery().is_empty());
        assert_eq!(player.vault().transaction_count(), recorded);
        assert_eq!(player.vault().live_states().len(), 1);
        assert_eq!(
            player.vault().live_states()[0].state.as_game().unwrap().game_id,
            game.game_id
        );
    }

    #[tokio::test]
    async fn test_silent_participant_is_reported_then_caught_up() {
        let net = Harness::new();
        let dealer = net.node(DEALER);
        let p1 = net.node(PLAYER1);
        let p2_keys = Arc::new(Ed25519KeyPair::generate());
        net.silent_node(PLAYER2, p2_keys.clone());
        let mut delivery = net
            .bus
            .subscribe(EventFilter::topics(vec![EventTopic::Delivery]));

        let outcome = lf_04_flows::CreateGameFlow::new(vec![
            p1.name().clone(),
            PLAYER2.into(),
        ])
        .run(dealer.clone())
        .await
        .unwrap();
        let tx_id = outcome.tx_id().unwrap();

        // Done, but flagged: the silent player signed and never acknowledged.
        assert_eq!(
            outcome.warnings,
            vec![FlowWarning::PartialDelivery {
                unconfirmed: vec![PLAYER2.into()]
            }]
        );
        assert!(dealer.vault().contains(&tx_id));
        assert!(p1.vault().contains(&tx_id));
        assert_eq!(dealer.redelivery().len(), 1);
        assert!(delivery.drain().iter().any(|e| matches!(
            e,
            LedgerEvent::PartialDelivery { unconfirmed, .. } if *unconfirmed == [PartyName::new(PLAYER2)]
        )));

        // The player comes back with a working node and the same key.
        net.router.deregister(&PLAYER2.into());
        let p2 = net.start(net.builder(PLAYER2, p2_keys));

        assert_eq!(redeliver_pending(&dealer).await.unwrap(), 1);
        assert!(dealer.redelivery().is_empty());
        assert!(p2.vault().contains(&tx_id));
        assert!(delivery
            .drain()
            .iter()
            .any(|e| matches!(e, LedgerEvent::Redelivered { to, .. } if *to == *p2.name())));
    }

    #[tokio::test]
    async fn test_node_redelivery_task_drains_queue() {
        let net = Harness::new();
        let dealer = net.node(DEALER);
        let p1_keys = Arc::new(Ed25519KeyPair::generate());
        net.silent_node(PLAYER1, p1_keys.clone());

        let game = create_game_partial(&net, &dealer).await;
        assert_eq!(dealer.redelivery().len(), 1);

        let task = RedeliveryTask::new(dealer.clone(), Duration::from_millis(10));
        // Still silent: nothing acknowledged, entry stays queued.
        assert_eq!(task.tick().await, 0);
        assert_eq!(dealer.redelivery().len(), 1);

        net.router.deregister(&PLAYER1.into());
        let p1 = net.start(net.builder(PLAYER1, p1_keys));
        let runner = tokio::spawn(task.run());
        tokio::time::timeout(Duration::from_secs(2), async {
            while !dealer.redelivery().is_empty() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        runner.abort();

        assert!(p1.vault().contains(&game));

        // Deals to a caught-up player work normally afterwards.
        let game_id = p1.vault().live_states()[0].state.as_game().unwrap().game_id;
        let outcomes = DealFlow::new(
            vec![Card::new(Rank::King, Suit::Hearts), Card::new(Rank::Queen, Suit::Hearts)],
            vec![p1.name().clone()],
            game_id,
        )
        .run(dealer.clone())
        .await
        .unwrap();
        assert!(outcomes.iter().all(|o| !o.is_partial()));
    }

    async fn create_game_partial(
        net: &Harness,
        dealer: &Arc<lf_04_flows::ServiceHub>,
    ) -> shared_types::TxId {
        let outcome = lf_04_flows::CreateGameFlow::new(vec![PLAYER1.into()])
            .run(dealer.clone())
            .await
            .unwrap();
        assert!(outcome.is_partial());
        assert_eq!(net.router.sessions_opened(), 1);
        outcome.tx_id().unwrap()
    }
}
