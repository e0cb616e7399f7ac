//! # Redelivery Task
//!
//! Periodically retries finality deliveries that were never acknowledged.

use std::sync::Arc;
use std::time::Duration;

use ledger_telemetry::PENDING_REDELIVERIES;
use lf_04_flows::{redeliver_pending, ServiceHub};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

pub struct RedeliveryTask {
    hub: Arc<ServiceHub>,
    interval: Duration,
}

impl RedeliveryTask {
    pub fn new(hub: Arc<ServiceHub>, interval: Duration) -> Self {
        Self { hub, interval }
    }

    /// One pass over the queue. Returns how many deliveries were acknowledged.
    pub async fn tick(&self) -> usize {
        let delivered = if self.hub.redelivery().is_empty() {
            0
        } else {
            match redeliver_pending(&self.hub).await {
                Ok(delivered) => {
                    if delivered > 0 {
                        info!(
                            party = %self.hub.name(),
                            delivered,
                            "[lf-04] Redelivered finalized transactions"
                        );
                    }
                    delivered
                }
                Err(e) => {
                    warn!(party = %self.hub.name(), error = %e, "[lf-04] Redelivery pass failed");
                    0
                }
            }
        };

        PENDING_REDELIVERIES
            .with_label_values(&[self.hub.name().as_str()])
            .set(self.hub.redelivery().len() as i64);
        delivered
    }

    /// Tick forever. The caller cancels by dropping the future.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }
}
