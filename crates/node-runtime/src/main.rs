//! # LedgerFlow Node
//!
//! Demo entry point: starts an in-process network (notary, dealer,
//! players), runs a full hand of flows and logs what every vault holds.
//!
//! ## Flow Sequence
//!
//! ```text
//!  Dealer ──CreateGame──▶ Players        game state recorded by everyone
//!  Dealer ──Deal ×2/player──▶ Player     one card state per transaction
//!  Dealer ──RevealCommunityCard──▶ All   consumes the game, records successor
//! ```
//!
//! ## Environment
//!
//! See `NodeConfig::from_env`, `FlowConfig::from_env` and
//! `TelemetryConfig::from_env` for every `LF_*` variable.

use anyhow::{Context, Result};
use ledger_telemetry::{gather_text, init_telemetry};
use node_runtime::{LocalNetwork, NodeConfig};
use shared_types::{Deck, StatePayload};
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::from_env();
    init_telemetry(&config.telemetry).context("Failed to initialize telemetry")?;

    info!("===========================================");
    info!("  LedgerFlow Node v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let network = LocalNetwork::from_config(config).context("Failed to start network")?;
    let metrics = network.spawn_metrics();

    let resumed = network
        .resume_unfinished()
        .await
        .context("Failed to resume checkpointed flows")?;
    if resumed > 0 {
        info!(resumed, "Resumed flows left unfinished by the last run");
    }

    let result = run_hand(&network).await;

    log_vaults(&network);
    match gather_text() {
        Ok(text) => debug!("Metrics:\n{}", text),
        Err(e) => warn!("Failed to render metrics: {}", e),
    }

    network.shutdown().await;
    metrics.abort();
    result
}

/// Create a game, deal every player a hand and turn one card face up.
async fn run_hand(network: &LocalNetwork) -> Result<()> {
    let dealer = network.dealer()?;
    let players = network.players();

    let created = dealer
        .create_game(players.clone())
        .await
        .context("CreateGame flow failed")?;
    let game_id = created
        .transaction
        .proposal()
        .outputs
        .iter()
        .find_map(|s| s.as_game())
        .map(|g| g.game_id)
        .context("CreateGame produced no game state")?;
    info!(%game_id, tx_id = %created.tx_id()?.short(), "Game created");

    let mut deck = Deck::shuffled();
    let dealt = dealer
        .deal(&mut deck, players, game_id)
        .await
        .context("Deal flow failed")?;
    info!(%game_id, dealt = dealt.len(), remaining = deck.remaining(), "Hands dealt");

    let card = deck.deal_one().context("Deck is empty")?;
    let revealed = dealer
        .reveal_community_card(game_id, card)
        .await
        .context("RevealCommunityCard flow failed")?;
    info!(%game_id, %card, tx_id = %revealed.tx_id()?.short(), "Community card revealed");

    for outcome in std::iter::once(&created)
        .chain(&dealt)
        .chain(std::iter::once(&revealed))
        .filter(|o| o.is_partial())
    {
        warn!(
            flow_id = %outcome.flow_id,
            warnings = ?outcome.warnings,
            "Flow finished with unconfirmed participants"
        );
    }
    Ok(())
}

fn log_vaults(network: &LocalNetwork) {
    for node in network.nodes() {
        let vault = node.hub().vault();
        info!(
            party = %node.name(),
            transactions = vault.transaction_count(),
            live = vault.live_states().len(),
            consumed = vault.consumed_states().len(),
            "Vault contents"
        );
        for state in vault.live_states() {
            match &state.state.payload {
                StatePayload::Card(card) => info!(
                    party = %node.name(),
                    at = %state.reference,
                    "  {} dealt to {}",
                    card.card,
                    card.player.name.organisation()
                ),
                StatePayload::Game(game) => info!(
                    party = %node.name(),
                    at = %state.reference,
                    "  game {} with {} player(s), community: {:?}",
                    game.game_id,
                    game.players.len(),
                    game.community_cards
                ),
            }
        }
    }
}
