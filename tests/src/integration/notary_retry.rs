//! # Notary Availability
//!
//! An unavailable notary is retried with backoff; retries are safe because
//! commits are idempotent. A notary that never comes back fails the flow
//! without any vault recording.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use lf_03_notary::{LocalNotaryClient, NotaryClient, NotaryService, NotaryVerdict};
    use lf_04_flows::{CreateGameFlow, FlowError, RevealCommunityCardFlow};
    use shared_bus::{EventFilter, EventTopic, LedgerEvent, NotaryOutcome};
    use shared_crypto::Ed25519KeyPair;
    use shared_types::{Card, ContractId, Party, Rank, SignedTransaction, Suit};

    use crate::integration::harness::{create_game, Harness, DEALER, PLAYER1};

    /// Commits for real on the wrapped notary, but once armed reports the
    /// next verdicts as lost.
    struct LossyNotary {
        inner: LocalNotaryClient,
        drops_left: AtomicU32,
    }

    impl LossyNotary {
        fn new(service: Arc<NotaryService>) -> Self {
            Self {
                inner: LocalNotaryClient::new(service),
                drops_left: AtomicU32::new(0),
            }
        }

        fn arm(&self, drops: u32) {
            self.drops_left.store(drops, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl NotaryClient for LossyNotary {
        fn notary(&self) -> &Party {
            self.inner.notary()
        }

        async fn notarise(&self, stx: &SignedTransaction) -> NotaryVerdict {
            let verdict = self.inner.notarise(stx).await;
            let dropped = self
                .drops_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if dropped {
                NotaryVerdict::Unavailable
            } else {
                verdict
            }
        }
    }

    /// Never answers at all.
    struct HungNotary(Party);

    #[async_trait]
    impl NotaryClient for HungNotary {
        fn notary(&self) -> &Party {
            &self.0
        }

        async fn notarise(&self, _stx: &SignedTransaction) -> NotaryVerdict {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_lost_verdicts_are_retried_idempotently() {
        let net = Harness::new();
        let p1 = net.node(PLAYER1);
        let lossy = Arc::new(LossyNotary::new(net.notary.clone()));
        let dealer = net.start(
            net.builder(DEALER, Arc::new(Ed25519KeyPair::generate()))
                .notary(lossy.clone()),
        );

        let game = create_game(&dealer, &[&p1]).await;
        let game_ref = dealer.vault().live_states_of(ContractId::Game)[0].clone();
        let mut verdicts = net
            .bus
            .subscribe(EventFilter::topics(vec![EventTopic::Notary]));
        lossy.arm(2);
        let outcome = RevealCommunityCardFlow::for_game(&dealer, game.game_id, Card::new(Rank::Nine, Suit::Diamonds))
            .unwrap()
            .run(dealer.clone())
            .await
            .unwrap();

        // The first two replies were lost after the commit; the third attempt
        // hits the idempotent path and is accepted for the same transaction.
        let outcomes: Vec<(NotaryOutcome, u32)> = verdicts
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                LedgerEvent::NotaryVerdict { outcome, attempt, .. } => Some((outcome, attempt)),
                _ => None,
            })
            .collect();
        assert_eq!(
            outcomes,
            vec![
                (NotaryOutcome::Unavailable, 1),
                (NotaryOutcome::Unavailable, 2),
                (NotaryOutcome::Accepted, 3),
            ]
        );
        assert_eq!(
            net.notary.uniqueness().consumed_by(&game_ref.reference),
            Some(outcome.tx_id().unwrap())
        );
        assert!(p1.vault().contains(&outcome.tx_id().unwrap()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_notary_exhausts_attempts() {
        let net = Harness::new();
        let p1 = net.node(PLAYER1);
        let hung = Arc::new(HungNotary(net.notary.identity().clone()));
        let dealer = net.start(
            net.builder(DEALER, Arc::new(Ed25519KeyPair::generate()))
                .notary(hung),
        );

        let err = CreateGameFlow::new(vec![p1.name().clone()])
            .run(dealer.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::TransientUnavailable { attempts: 3 }));
        assert!(err.is_retryable());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(dealer.vault().transaction_count(), 0);
        assert_eq!(p1.vault().transaction_count(), 0);
    }
}
