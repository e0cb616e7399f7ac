//! # Node Configuration
//!
//! Everything a node or a local network needs, loaded from the environment.
//! Party names are X.500-style and contain commas, so `LF_PLAYERS` is a
//! semicolon-separated list.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use ledger_telemetry::TelemetryConfig;
use lf_04_flows::FlowConfig;

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Root for file-backed state; each party gets its own files.
    pub data_dir: PathBuf,
    /// Keep vaults, identities and flow checkpoints under `data_dir` so a
    /// restarted network resumes where it stopped.
    pub persistent_vaults: bool,
    /// Notary identity.
    pub notary: String,
    /// Party that initiates the card flows.
    pub dealer: String,
    /// Players at the table.
    pub players: Vec<String>,
    /// How often queued finality deliveries are retried.
    pub redelivery_interval: Duration,
    /// Flow timeouts and retry bounds.
    pub flow: FlowConfig,
    /// Logging setup.
    pub telemetry: TelemetryConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            persistent_vaults: false,
            notary: "O=Notary,L=Zurich,C=CH".to_string(),
            dealer: "O=Dealer,L=London,C=GB".to_string(),
            players: vec![
                "O=Player1,L=New York,C=US".to_string(),
                "O=Player2,L=Paris,C=FR".to_string(),
            ],
            redelivery_interval: Duration::from_secs(5),
            flow: FlowConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LF_DATA_DIR`: vault directory (default: ./data)
    /// - `LF_PERSISTENT_VAULTS`: file-backed vaults (default: false)
    /// - `LF_NOTARY`: notary name
    /// - `LF_DEALER`: dealer name
    /// - `LF_PLAYERS`: `;`-separated player names
    /// - `LF_REDELIVERY_INTERVAL_MS`: redelivery period (default: 5000)
    ///
    /// Flow and telemetry settings come from their own `from_env`.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let players = env::var("LF_PLAYERS")
            .ok()
            .map(|v| parse_players(&v))
            .filter(|players| !players.is_empty())
            .unwrap_or(defaults.players);

        Self {
            data_dir: env::var("LF_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),

            persistent_vaults: env::var("LF_PERSISTENT_VAULTS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.persistent_vaults),

            notary: env::var("LF_NOTARY").unwrap_or(defaults.notary),
            dealer: env::var("LF_DEALER").unwrap_or(defaults.dealer),
            players,

            redelivery_interval: env::var("LF_REDELIVERY_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.redelivery_interval),

            flow: FlowConfig::from_env(),
            telemetry: TelemetryConfig::from_env(),
        }
    }

    /// Vault file for `party`.
    pub fn vault_path(&self, party: &str) -> PathBuf {
        self.party_file(party, "vault")
    }

    /// Identity seed and flow checkpoints for `party`.
    pub fn node_store_path(&self, party: &str) -> PathBuf {
        self.party_file(party, "node")
    }

    fn party_file(&self, party: &str, extension: &str) -> PathBuf {
        let file: String = party
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        self.data_dir.join(format!("{file}.{extension}"))
    }
}

fn parse_players(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
