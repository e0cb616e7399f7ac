//! # Rejection Atomicity
//!
//! One counterparty declining aborts the attempt for everybody: no vault
//! records anything and the notary consumes nothing.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use lf_01_contracts::{AcceptancePolicy, DealAcceptance};
    use lf_04_flows::{
        CreateGameFlow, DealFlow, FlowError, FlowKind, InitiatorFlow, RevealCommunityCardFlow,
    };
    use shared_types::{
        Card, CardCommand, CardState, Command, CommandKind, ContractId, LedgerState,
        LedgerTransaction, Rank, Suit, TransactionProposal,
    };

    use crate::integration::harness::{create_game, Harness, DEALER, PLAYER1, PLAYER2};

    struct NoNewGames;

    impl AcceptancePolicy for NoNewGames {
        fn name(&self) -> &'static str {
            "no-new-games"
        }

        fn check(&self, _tx: &LedgerTransaction) -> Result<(), String> {
            Err("Not joining another table.".to_string())
        }
    }

    #[tokio::test]
    async fn test_one_refusal_leaves_every_vault_untouched() {
        let net = Harness::new();
        let dealer = net.node(DEALER);
        let willing = net.node(PLAYER1);
        let unwilling =
            net.node_with_policy(PLAYER2, FlowKind::CreateGame, Arc::new(NoNewGames));

        let err = CreateGameFlow::new(vec![willing.name().clone(), unwilling.name().clone()])
            .run(dealer.clone())
            .await
            .unwrap_err();

        match err {
            FlowError::CounterpartyRejected { party, reason } => {
                assert_eq!(party, *unwilling.name());
                assert!(reason.contains("Not joining another table."));
            }
            other => panic!("expected a counterparty rejection, got {other}"),
        }

        // The willing player may already have signed; it must still drop
        // the proposal once the initiator gives up.
        tokio::time::sleep(Duration::from_millis(50)).await;
        for hub in [&dealer, &willing, &unwilling] {
            assert_eq!(hub.vault().transaction_count(), 0, "{} recorded", hub.name());
        }
        assert_eq!(net.notary.uniqueness().consumed_count(), 0);
    }

    #[tokio::test]
    async fn test_refused_reveal_keeps_game_live() {
        let net = Harness::new();
        let dealer = net.node(DEALER);
        let p1 = net.node(PLAYER1);
        let p2 = net.node_with_policy(
            PLAYER2,
            FlowKind::RevealCommunityCard,
            Arc::new(NoNewGames),
        );
        let game = create_game(&dealer, &[&p1, &p2]).await;

        let err = RevealCommunityCardFlow::for_game(&dealer, game.game_id, Card::new(Rank::Ace, Suit::Hearts))
            .unwrap()
            .run(dealer.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::CounterpartyRejected { .. }));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(net.notary.uniqueness().consumed_count(), 0);
        for hub in [&dealer, &p1, &p2] {
            let games = hub.vault().live_states_of(ContractId::Game);
            assert_eq!(games.len(), 1);
            assert!(games[0].state.as_game().unwrap().community_cards.is_empty());
            assert!(hub.vault().consumed_states().is_empty());
        }
    }

    #[tokio::test]
    async fn test_player_refuses_card_outside_allowed_set() {
        let net = Harness::new();
        let dealer = net.node(DEALER);
        let picky = net.node_with_policy(
            PLAYER1,
            FlowKind::Deal,
            Arc::new(DealAcceptance::restricted_to([Card::new(Rank::Ace, Suit::Spades)])),
        );
        let game = create_game(&dealer, &[&picky]).await;

        let cards = vec![
            Card::new(Rank::Ace, Suit::Spades),
            Card::new(Rank::Two, Suit::Clubs),
        ];
        let err = DealFlow::new(cards, vec![picky.name().clone()], game.game_id)
            .run(dealer.clone())
            .await
            .unwrap_err();
        match err {
            FlowError::CounterpartyRejected { reason, .. } => {
                assert!(reason.contains("I won't accept invalid cards."));
            }
            other => panic!("expected a counterparty rejection, got {other}"),
        }

        // The first card was fine and stays committed; the second never was.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let hand = picky.vault().live_states_of(ContractId::Card);
        assert_eq!(hand.len(), 1);
        assert_eq!(
            hand[0].state.as_card().unwrap().card,
            Card::new(Rank::Ace, Suit::Spades)
        );
    }

    #[tokio::test]
    async fn test_mislabelled_deal_still_meets_deal_policy() {
        let net = Harness::new();
        let dealer = net.node(DEALER);
        let picky = net.node_with_policy(
            PLAYER1,
            FlowKind::Deal,
            Arc::new(DealAcceptance::restricted_to([Card::new(Rank::Ace, Suit::Spades)])),
        );
        let game = create_game(&dealer, &[&picky]).await;

        let state = LedgerState::card(CardState {
            card: Card::new(Rank::Two, Suit::Clubs),
            dealer: dealer.me().clone(),
            player: picky.me().clone(),
            game_id: game.game_id,
        });
        let signers = state.participants().into_iter().map(|p| p.owning_key);
        let proposal = TransactionProposal::new(dealer.notary().notary().clone())
            .with_output(state)
            .with_command(Command::new(CommandKind::Card(CardCommand::Create), signers));

        let err = InitiatorFlow::new(dealer.clone(), FlowKind::CreateGame, proposal)
            .run()
            .await
            .unwrap_err();
        match err {
            FlowError::CounterpartyRejected { party, .. } => assert_eq!(party, *picky.name()),
            other => panic!("expected a counterparty rejection, got {other}"),
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        for hub in [&dealer, &picky] {
            assert!(hub.vault().live_states_of(ContractId::Card).is_empty());
        }
    }
}
