//! # End-to-End Commit
//!
//! The dealer deals one card to a player: both vaults end up with the same
//! single live state and nothing consumed. A dealer dealing to themself
//! never gets past local verification.

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use lf_04_flows::{DealFlow, FlowError, FlowKind, FlowPhase, InitiatorFlow, CARDS_PER_PLAYER};
    use shared_bus::{EventFilter, EventTopic, LedgerEvent, ProgressStep};
    use shared_types::{
        Card, CardCommand, CardState, Command, CommandKind, ContractId, Deck, LedgerState, Rank,
        Suit, TransactionProposal,
    };
    use uuid::Uuid;

    use crate::integration::harness::{create_game, Harness, DEALER, PLAYER1, PLAYER2};

    fn deal_one(
        dealer: &lf_04_flows::ServiceHub,
        player: &lf_04_flows::ServiceHub,
        card: Card,
    ) -> TransactionProposal {
        let state = LedgerState::card(CardState {
            card,
            dealer: dealer.me().clone(),
            player: player.me().clone(),
            game_id: Uuid::new_v4(),
        });
        let signers = state.participants().into_iter().map(|p| p.owning_key);
        TransactionProposal::new(dealer.notary().notary().clone())
            .with_output(state)
            .with_command(Command::new(CommandKind::Card(CardCommand::Create), signers))
    }

    #[tokio::test]
    async fn test_single_card_deal_reaches_both_vaults() {
        let net = Harness::new();
        let dealer = net.node(DEALER);
        let player = net.node(PLAYER1);
        let mut events = net.bus.subscribe(EventFilter::topics(vec![EventTopic::Flow]));

        let proposal = deal_one(&dealer, &player, Card::new(Rank::Ace, Suit::Spades));
        let outcome = InitiatorFlow::new(dealer.clone(), FlowKind::Deal, proposal)
            .run()
            .await
            .unwrap();
        let tx_id = outcome.tx_id().unwrap();
        assert!(outcome.warnings.is_empty());

        for hub in [&dealer, &player] {
            let vault = hub.vault();
            assert!(vault.contains(&tx_id));
            assert_eq!(vault.live_states().len(), 1);
            assert!(vault.consumed_states().is_empty());
            let live = &vault.live_states()[0];
            assert_eq!(live.reference.txhash, tx_id);
            assert_eq!(live.state.as_card().unwrap().card, Card::new(Rank::Ace, Suit::Spades));
        }

        let initiator_steps: Vec<ProgressStep> = events
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                LedgerEvent::FlowProgress { party, step, .. } if party == *dealer.name() => {
                    Some(step)
                }
                _ => None,
            })
            .collect();
        assert_eq!(initiator_steps.first(), Some(&ProgressStep::Verifying));
        assert_eq!(initiator_steps.last(), Some(&ProgressStep::Done));
    }

    #[tokio::test]
    async fn test_dealer_cannot_deal_to_themself() {
        let net = Harness::new();
        let dealer = net.node(DEALER);

        let proposal = deal_one(&dealer, &dealer, Card::new(Rank::Two, Suit::Hearts));
        let flow = InitiatorFlow::new(dealer.clone(), FlowKind::Deal, proposal);
        let flow_id = flow.flow_id();
        let err = flow.run().await.unwrap_err();

        assert!(matches!(err, FlowError::VerificationRejected(_)));
        assert_eq!(
            err.to_string(),
            "Verification rejected: The dealer and player cannot be the same entity."
        );
        assert_eq!(net.router.sessions_opened(), 0);
        assert_eq!(dealer.vault().transaction_count(), 0);
        let checkpoint = dealer.checkpoints().load(&flow_id).unwrap().unwrap();
        assert!(matches!(checkpoint.phase, FlowPhase::Failed(_)));
    }

    #[tokio::test]
    async fn test_full_hand_for_two_players() {
        let net = Harness::new();
        let dealer = net.node(DEALER);
        let p1 = net.node(PLAYER1);
        let p2 = net.node(PLAYER2);
        let game = create_game(&dealer, &[&p1, &p2]).await;

        let mut deck = Deck::shuffled();
        let flow = DealFlow::from_deck(
            &mut deck,
            vec![p1.name().clone(), p2.name().clone()],
            game.game_id,
        )
        .unwrap();
        let dealt: BTreeSet<Card> = flow.cards.iter().copied().collect();
        let outcomes = flow.run(dealer.clone()).await.unwrap();
        assert_eq!(outcomes.len(), 2 * CARDS_PER_PLAYER);

        // Each player sees only their own hand; the dealer sees every card.
        for player in [&p1, &p2] {
            let hand = player.vault().live_states_of(ContractId::Card);
            assert_eq!(hand.len(), CARDS_PER_PLAYER);
            for card in &hand {
                assert_eq!(card.state.as_card().unwrap().player, *player.me());
            }
        }
        let dealer_cards: BTreeSet<Card> = dealer
            .vault()
            .live_states_of(ContractId::Card)
            .iter()
            .map(|s| s.state.as_card().unwrap().card)
            .collect();
        assert_eq!(dealer_cards, dealt);
        assert!(!deck.contains(dealt.iter().next().unwrap()));
    }
}
