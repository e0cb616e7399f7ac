//! # Double Spend
//!
//! Two flows consuming the same game state. The notary's uniqueness check
//! decides: exactly one commits and every vault sees exactly one successor.

#[cfg(test)]
mod tests {
    use lf_04_flows::{FlowError, RevealCommunityCardFlow};
    use shared_types::{Card, ContractId, Rank, Suit};

    use crate::integration::harness::{create_game, Harness, DEALER, PLAYER1, PLAYER2};

    #[tokio::test]
    async fn test_concurrent_reveals_commit_exactly_once() {
        let net = Harness::new();
        let dealer = net.node(DEALER);
        let p1 = net.node(PLAYER1);
        let p2 = net.node(PLAYER2);
        let game = create_game(&dealer, &[&p1, &p2]).await;

        let live = dealer.vault().live_states_of(ContractId::Game);
        assert_eq!(live.len(), 1);
        let game_ref = live[0].clone();

        let ten = RevealCommunityCardFlow::new(game_ref.clone(), Card::new(Rank::Ten, Suit::Clubs));
        let jack = RevealCommunityCardFlow::new(game_ref.clone(), Card::new(Rank::Jack, Suit::Clubs));
        let (a, b) = tokio::join!(ten.run(dealer.clone()), jack.run(dealer.clone()));

        let (winner, loser) = match (a, b) {
            (Ok(won), Err(lost)) | (Err(lost), Ok(won)) => (won, lost),
            (a, b) => panic!("expected one winner, got {:?} and {:?}", a.is_ok(), b.is_ok()),
        };
        let winner_id = winner.tx_id().unwrap();
        match loser {
            FlowError::DoubleSpendConflict(conflict) => {
                assert_eq!(conflict.consuming_tx_id(), Some(winner_id));
                assert!(conflict.consumed.contains_key(&game_ref.reference));
            }
            other => panic!("expected a double-spend conflict, got {other}"),
        }
        assert_eq!(net.notary.uniqueness().consumed_by(&game_ref.reference), Some(winner_id));

        // Give responders of the losing flow time to observe the close.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        for hub in [&dealer, &p1, &p2] {
            let vault = hub.vault();
            // CreateGame plus the winning reveal, nothing from the loser.
            assert_eq!(vault.transaction_count(), 2);
            assert_eq!(vault.consumed_by(&game_ref.reference), Some(winner_id));
            let games = vault.live_states_of(ContractId::Game);
            assert_eq!(games.len(), 1);
            let successor = games[0].state.as_game().unwrap();
            assert_eq!(successor.game_id, game.game_id);
            assert_eq!(successor.community_cards.len(), 1);
        }
    }

    #[tokio::test]
    async fn test_stale_reference_conflicts_after_commit() {
        let net = Harness::new();
        let dealer = net.node(DEALER);
        let p1 = net.node(PLAYER1);
        create_game(&dealer, &[&p1]).await;
        let stale = dealer.vault().live_states_of(ContractId::Game)[0].clone();

        let first = RevealCommunityCardFlow::new(stale.clone(), Card::new(Rank::Two, Suit::Spades))
            .run(dealer.clone())
            .await
            .unwrap();
        let err = RevealCommunityCardFlow::new(stale.clone(), Card::new(Rank::Three, Suit::Spades))
            .run(dealer.clone())
            .await
            .unwrap_err();

        assert_eq!(err.consuming_tx_id(), Some(first.tx_id().unwrap()));
        assert!(!err.is_retryable());
        assert_eq!(p1.vault().transaction_count(), 2);
    }
}
