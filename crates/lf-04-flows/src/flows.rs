//! # Card Game Flows
//!
//! The business flows a dealer starts. Each builds a proposal and hands it
//! to an [`InitiatorFlow`]; players answer through their responder loop
//! with the acceptance policy registered for the flow kind.

use crate::domain::error::{FlowError, FlowOutcome, FlowResult};
use crate::domain::wire::FlowKind;
use crate::hub::ServiceHub;
use crate::initiator::InitiatorFlow;
use shared_bus::SessionError;
use shared_types::{
    Card, CardCommand, CardState, Command, CommandKind, ContractId, Deck, GameCommand, GameId,
    GameState, LedgerState, Party, PartyName, PublicKey, StateAndRef, TransactionProposal,
};
use std::sync::Arc;
use tracing::info;

/// Cards each player receives in [`DealFlow`].
pub const CARDS_PER_PLAYER: usize = 2;

fn resolve_party(hub: &ServiceHub, name: &PartyName) -> FlowResult<Party> {
    hub.identities()
        .party_from_name(name)
        .ok_or_else(|| SessionError::UnknownParty(name.clone()).into())
}

fn signers_of(state: &LedgerState) -> Vec<PublicKey> {
    state.participants().iter().map(|p| p.owning_key).collect()
}

/// Open a new game with this node as dealer. Every player signs.
#[derive(Debug, Clone)]
pub struct CreateGameFlow {
    pub players: Vec<PartyName>,
}

impl CreateGameFlow {
    pub fn new(players: Vec<PartyName>) -> Self {
        Self { players }
    }

    pub fn proposal(&self, hub: &ServiceHub) -> FlowResult<TransactionProposal> {
        let players = self
            .players
            .iter()
            .map(|name| resolve_party(hub, name))
            .collect::<FlowResult<Vec<_>>>()?;
        let game = LedgerState::game(GameState::new(hub.me().clone(), players));
        let command = Command::new(CommandKind::Game(GameCommand::Create), signers_of(&game));

        Ok(TransactionProposal::new(hub.notary().notary().clone())
            .with_output(game)
            .with_command(command))
    }

    pub async fn run(self, hub: Arc<ServiceHub>) -> FlowResult<FlowOutcome> {
        let proposal = self.proposal(&hub)?;
        InitiatorFlow::new(hub, FlowKind::CreateGame, proposal)
            .run()
            .await
    }
}

/// Deal two cards to every player, one transaction per card, signed by
/// the dealer and the receiving player.
#[derive(Debug, Clone)]
pub struct DealFlow {
    pub cards: Vec<Card>,
    pub players: Vec<PartyName>,
    pub game_id: GameId,
}

impl DealFlow {
    pub fn new(cards: Vec<Card>, players: Vec<PartyName>, game_id: GameId) -> Self {
        Self {
            cards,
            players,
            game_id,
        }
    }

    /// Take the cards off the top of `deck`.
    pub fn from_deck(deck: &mut Deck, players: Vec<PartyName>, game_id: GameId) -> FlowResult<Self> {
        let needed = players.len() * CARDS_PER_PLAYER;
        let cards = deck.deal(needed).ok_or_else(|| {
            FlowError::VerificationRejected(format!(
                "deck holds {} cards, {needed} needed",
                deck.remaining()
            ))
        })?;
        Ok(Self::new(cards, players, game_id))
    }

    pub fn proposals(&self, hub: &ServiceHub) -> FlowResult<Vec<TransactionProposal>> {
        let needed = self.players.len() * CARDS_PER_PLAYER;
        if self.cards.len() < needed {
            return Err(FlowError::VerificationRejected(format!(
                "{} cards cannot deal {CARDS_PER_PLAYER} to each of {} players",
                self.cards.len(),
                self.players.len()
            )));
        }

        let notary = hub.notary().notary().clone();
        let mut cards = self.cards.iter();
        let mut proposals = Vec::with_capacity(needed);
        for name in &self.players {
            let player = resolve_party(hub, name)?;
            for card in cards.by_ref().take(CARDS_PER_PLAYER) {
                let state = LedgerState::card(CardState {
                    card: *card,
                    dealer: hub.me().clone(),
                    player: player.clone(),
                    game_id: self.game_id,
                });
                let command =
                    Command::new(CommandKind::Card(CardCommand::Create), signers_of(&state));
                proposals.push(
                    TransactionProposal::new(notary.clone())
                        .with_output(state)
                        .with_command(command),
                );
            }
        }
        Ok(proposals)
    }

    /// Stops at the first failed deal; earlier deals stay committed.
    pub async fn run(self, hub: Arc<ServiceHub>) -> FlowResult<Vec<FlowOutcome>> {
        let mut outcomes = Vec::new();
        for proposal in self.proposals(&hub)? {
            let outcome = InitiatorFlow::new(hub.clone(), FlowKind::Deal, proposal)
                .run()
                .await?;
            outcomes.push(outcome);
        }
        info!(
            game_id = %self.game_id,
            dealt = outcomes.len(),
            "[lf-04] Deal complete"
        );
        Ok(outcomes)
    }
}

/// Consume the live game state and turn one card face up.
#[derive(Debug, Clone)]
pub struct RevealCommunityCardFlow {
    pub game: StateAndRef,
    pub card: Card,
}

impl RevealCommunityCardFlow {
    pub fn new(game: StateAndRef, card: Card) -> Self {
        Self { game, card }
    }

    /// Reveal on the game this node currently holds live for `game_id`.
    pub fn for_game(hub: &ServiceHub, game_id: GameId, card: Card) -> FlowResult<Self> {
        let game = hub
            .vault()
            .live_states_of(ContractId::Game)
            .into_iter()
            .find(|s| s.state.as_game().is_some_and(|g| g.game_id == game_id))
            .ok_or_else(|| FlowError::MissingInput(format!("no live game {game_id}")))?;
        Ok(Self::new(game, card))
    }

    pub fn proposal(&self, hub: &ServiceHub) -> FlowResult<TransactionProposal> {
        let game = self.game.state.as_game().ok_or_else(|| {
            FlowError::VerificationRejected(format!("{} is not a game state", self.game.reference))
        })?;
        let next = LedgerState::game(game.with_community_card(self.card));
        let command = Command::new(
            CommandKind::Game(GameCommand::RevealCommunityCard { card: self.card }),
            signers_of(&next),
        );
        Ok(TransactionProposal::new(hub.notary().notary().clone())
            .with_input(self.game.reference)
            .with_output(next)
            .with_command(command))
    }

    pub async fn run(self, hub: Arc<ServiceHub>) -> FlowResult<FlowOutcome> {
        let proposal = self.proposal(&hub)?;
        InitiatorFlow::new(hub, FlowKind::RevealCommunityCard, proposal)
            .run()
            .await
    }
}
