//! Prometheus metrics for LedgerFlow nodes.
//!
//! All metrics follow the naming convention: `lf_<area>_<metric>_<unit>`.
//! Every node of an in-process network shares these statics; the `party`
//! label tells them apart.

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Registry for every LedgerFlow metric.
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // FLOW METRICS
    // =========================================================================

    pub static ref FLOWS_STARTED: IntCounterVec = IntCounterVec::new(
        Opts::new("lf_flows_started_total", "Initiator flows started"),
        &["party", "kind"]
    ).expect("metric creation failed");

    pub static ref FLOWS_COMPLETED: IntCounterVec = IntCounterVec::new(
        Opts::new("lf_flows_completed_total", "Initiator flows that reached Done"),
        &["party"]
    ).expect("metric creation failed");

    pub static ref FLOWS_FAILED: IntCounterVec = IntCounterVec::new(
        Opts::new("lf_flows_failed_total", "Flows that reached Failed"),
        &["party", "role"]  // role: initiator/responder
    ).expect("metric creation failed");

    pub static ref SIGNATURES_COLLECTED: IntCounterVec = IntCounterVec::new(
        Opts::new("lf_flows_signatures_collected_total", "Counterparty signatures accepted"),
        &["party"]
    ).expect("metric creation failed");

    // =========================================================================
    // NOTARY METRICS
    // =========================================================================

    pub static ref NOTARY_VERDICTS: IntCounterVec = IntCounterVec::new(
        Opts::new("lf_notary_verdicts_total", "Notary verdicts seen by flows"),
        &["outcome"]  // outcome: accepted/conflict/rejected/unavailable
    ).expect("metric creation failed");

    pub static ref NOTARY_RETRIES: IntCounterVec = IntCounterVec::new(
        Opts::new("lf_notary_retries_total", "Notarisation attempts after the first"),
        &["party"]
    ).expect("metric creation failed");

    // =========================================================================
    // VAULT AND DELIVERY METRICS
    // =========================================================================

    pub static ref VAULT_RECORDS: IntCounterVec = IntCounterVec::new(
        Opts::new("lf_vault_records_total", "Transactions appended to a vault"),
        &["party"]
    ).expect("metric creation failed");

    pub static ref PARTIAL_DELIVERIES: IntCounterVec = IntCounterVec::new(
        Opts::new("lf_finality_partial_deliveries_total", "Flows done with unconfirmed participants"),
        &["party"]
    ).expect("metric creation failed");

    pub static ref REDELIVERIES: IntCounterVec = IntCounterVec::new(
        Opts::new("lf_finality_redeliveries_total", "Queued deliveries later acknowledged"),
        &["party"]
    ).expect("metric creation failed");

    pub static ref PENDING_REDELIVERIES: IntGaugeVec = IntGaugeVec::new(
        Opts::new("lf_finality_pending_redeliveries", "Deliveries waiting for a retry"),
        &["party"]
    ).expect("metric creation failed");
}

/// Register all metrics with [`REGISTRY`]. Safe to call more than once.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Flows
        Box::new(FLOWS_STARTED.clone()),
        Box::new(FLOWS_COMPLETED.clone()),
        Box::new(FLOWS_FAILED.clone()),
        Box::new(SIGNATURES_COLLECTED.clone()),
        // Notary
        Box::new(NOTARY_VERDICTS.clone()),
        Box::new(NOTARY_RETRIES.clone()),
        // Vault and delivery
        Box::new(VAULT_RECORDS.clone()),
        Box::new(PARTIAL_DELIVERIES.clone()),
        Box::new(REDELIVERIES.clone()),
        Box::new(PENDING_REDELIVERIES.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn gather_text() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_twice() {
        register_metrics().unwrap();
        register_metrics().unwrap();
    }

    #[test]
    fn test_counter_in_exposition() {
        register_metrics().unwrap();
        VAULT_RECORDS.with_label_values(&["O=Exposition"]).inc();

        let text = gather_text().unwrap();
        assert!(text.contains("lf_vault_records_total"));
        assert!(text.contains("O=Exposition"));
    }
}
