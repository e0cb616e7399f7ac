//! # Event Publisher
//!
//! The sending half of the observational bus. Flows, the notary and the
//! vault hooks publish and move on; a lagging or absent subscriber never
//! holds up a commit.

use crate::events::{EventFilter, EventTopic, LedgerEvent};
use crate::subscriber::{EventStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Where flow hubs send their events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Returns how many subscribers were live when `event` was sent.
    async fn publish(&self, event: LedgerEvent) -> usize;
}

/// Broadcast bus shared by every node of a local network.
///
/// Events carry the emitting party, so one bus serves the whole network and
/// each subscriber narrows it down with an [`EventFilter`].
pub struct InMemoryEventBus {
    sender: broadcast::Sender<LedgerEvent>,
    /// Events sent per topic, counted whether or not anyone listened.
    sent: Mutex<HashMap<EventTopic, u64>>,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// A bus that buffers `capacity` events per subscriber before it lags.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            sent: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(topics = ?filter.topics, parties = ?filter.parties, "Event subscription opened");
        Subscription::new(self.sender.subscribe(), filter)
    }

    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.sender.subscribe(), filter)
    }

    /// Live subscriptions and streams.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Events sent on `topic`. `EventTopic::All` gives the total.
    #[must_use]
    pub fn published(&self, topic: EventTopic) -> u64 {
        let sent = self.sent.lock();
        match topic {
            EventTopic::All => sent.values().sum(),
            topic => sent.get(&topic).copied().unwrap_or(0),
        }
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: LedgerEvent) -> usize {
        let topic = event.topic();
        *self.sent.lock().entry(topic).or_insert(0) += 1;

        // No receivers is the normal case for a node nobody is watching.
        let receivers = self.sender.send(event).unwrap_or(0);
        trace!(?topic, receivers, "Event published");
        receivers
    }
}
