//! # Ledger Telemetry
//!
//! Logging and metrics for LedgerFlow nodes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ledger_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_telemetry(&TelemetryConfig::from_env())?;
//!     // flows now log and count
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LF_SERVICE_NAME` | `ledgerflow` | Service name in logs |
//! | `LF_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `LF_JSON_LOGS` | `false` | JSON log lines |
//! | `LF_CONSOLE_OUTPUT` | `true` | Print logs to stdout |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    gather_text, register_metrics, FLOWS_COMPLETED, FLOWS_FAILED, FLOWS_STARTED,
    NOTARY_RETRIES, NOTARY_VERDICTS, PARTIAL_DELIVERIES, PENDING_REDELIVERIES, REDELIVERIES,
    SIGNATURES_COLLECTED, VAULT_RECORDS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics, then install the log subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
