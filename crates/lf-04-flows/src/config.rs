//! Flow timing configuration from environment variables.

use std::env;
use std::time::Duration;

/// Timeouts and retry bounds applied at every suspension point.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Wait for one counterparty's signature reply. Expiry is a rejection.
    pub session_timeout: Duration,

    /// Wait for one notary verdict. Expiry counts as `Unavailable`.
    pub notary_timeout: Duration,

    /// Total notarisation attempts while the notary is unavailable.
    pub notary_max_attempts: u32,

    /// Backoff before the second attempt; doubles on each further attempt.
    pub notary_backoff_base: Duration,

    /// Wait for one participant's finality acknowledgement.
    pub finality_timeout: Duration,

    /// How long a responder that has signed waits for the finalized
    /// transaction before giving up.
    pub finality_wait_timeout: Duration,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            session_timeout: Duration::from_secs(30),
            notary_timeout: Duration::from_secs(10),
            notary_max_attempts: 5,
            notary_backoff_base: Duration::from_millis(100),
            finality_timeout: Duration::from_secs(30),
            finality_wait_timeout: Duration::from_secs(120),
        }
    }
}

impl FlowConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LF_SESSION_TIMEOUT_MS`: signature reply timeout (default: 30000)
    /// - `LF_NOTARY_TIMEOUT_MS`: per-attempt notary timeout (default: 10000)
    /// - `LF_NOTARY_MAX_ATTEMPTS`: notarisation attempts (default: 5)
    /// - `LF_NOTARY_BACKOFF_MS`: initial retry backoff (default: 100)
    /// - `LF_FINALITY_TIMEOUT_MS`: acknowledgement timeout (default: 30000)
    /// - `LF_FINALITY_WAIT_MS`: responder wait for finality (default: 120000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            session_timeout: millis("LF_SESSION_TIMEOUT_MS").unwrap_or(defaults.session_timeout),
            notary_timeout: millis("LF_NOTARY_TIMEOUT_MS").unwrap_or(defaults.notary_timeout),
            notary_max_attempts: env::var("LF_NOTARY_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.notary_max_attempts),
            notary_backoff_base: millis("LF_NOTARY_BACKOFF_MS")
                .unwrap_or(defaults.notary_backoff_base),
            finality_timeout: millis("LF_FINALITY_TIMEOUT_MS")
                .unwrap_or(defaults.finality_timeout),
            finality_wait_timeout: millis("LF_FINALITY_WAIT_MS")
                .unwrap_or(defaults.finality_wait_timeout),
        }
    }

    /// Backoff before attempt `attempt + 1`, for `attempt >= 1`.
    pub fn notary_backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.notary_backoff_base.saturating_mul(1u32 << shift)
    }

    /// Short timeouts for tests and local demos.
    pub fn fast() -> Self {
        Self {
            session_timeout: Duration::from_millis(500),
            notary_timeout: Duration::from_millis(200),
            notary_max_attempts: 3,
            notary_backoff_base: Duration::from_millis(5),
            finality_timeout: Duration::from_millis(300),
            finality_wait_timeout: Duration::from_secs(2),
        }
    }
}

fn millis(key: &str) -> Option<Duration> {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
}
