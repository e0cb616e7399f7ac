//! # Metrics Recorder
//!
//! Maps bus events onto the Prometheus counters. Flows never touch metrics
//! directly; they only publish events.

use ledger_telemetry::{
    metric_inc, FLOWS_COMPLETED, FLOWS_FAILED, FLOWS_STARTED, NOTARY_RETRIES, NOTARY_VERDICTS,
    PARTIAL_DELIVERIES, REDELIVERIES, SIGNATURES_COLLECTED, VAULT_RECORDS,
};
use shared_bus::{EventFilter, FlowRole, InMemoryEventBus, LedgerEvent, Subscription};
use tracing::debug;

pub struct MetricsRecorder {
    subscription: Subscription,
}

impl MetricsRecorder {
    pub fn new(bus: &InMemoryEventBus) -> Self {
        Self {
            subscription: bus.subscribe(EventFilter::all()),
        }
    }

    /// Update counters for one event.
    pub fn record(event: &LedgerEvent) {
        match event {
            LedgerEvent::FlowStarted { party, kind, .. } => {
                metric_inc!(FLOWS_STARTED, &[party.as_str(), kind.as_str()]);
            }
            LedgerEvent::FlowCompleted { party, .. } => {
                metric_inc!(FLOWS_COMPLETED, &[party.as_str()]);
            }
            LedgerEvent::FlowFailed { party, role, .. } => {
                let role = match role {
                    FlowRole::Initiator => "initiator",
                    FlowRole::Responder => "responder",
                };
                metric_inc!(FLOWS_FAILED, &[party.as_str(), role]);
            }
            LedgerEvent::SignatureCollected { party, .. } => {
                metric_inc!(SIGNATURES_COLLECTED, &[party.as_str()]);
            }
            LedgerEvent::NotaryVerdict {
                party,
                outcome,
                attempt,
                ..
            } => {
                metric_inc!(NOTARY_VERDICTS, &[outcome.as_str()]);
                if *attempt > 1 {
                    metric_inc!(NOTARY_RETRIES, &[party.as_str()]);
                }
            }
            LedgerEvent::TransactionRecorded { party, .. } => {
                metric_inc!(VAULT_RECORDS, &[party.as_str()]);
            }
            LedgerEvent::PartialDelivery { party, .. } => {
                metric_inc!(PARTIAL_DELIVERIES, &[party.as_str()]);
            }
            LedgerEvent::Redelivered { party, .. } => {
                metric_inc!(REDELIVERIES, &[party.as_str()]);
            }
            LedgerEvent::FlowProgress { .. } => {}
        }
    }

    /// Run until the bus is dropped.
    pub async fn run(mut self) {
        while let Some(event) = self.subscription.recv().await {
            Self::record(&event);
        }
        debug!("[node] Event bus closed, metrics recorder stopping");
    }
}
