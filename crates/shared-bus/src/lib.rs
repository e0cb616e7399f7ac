//! # Shared Bus - Sessions and Events
//!
//! Two kinds of plumbing shared by every LedgerFlow node:
//!
//! - **Flow sessions** (`session`): the reliable ordered channels the
//!   commitment protocol runs over. These carry correctness-critical frames.
//! - **Event bus** (`publisher`/`subscriber`): fire-and-forget observational
//!   events (progress, notary verdicts, vault appends). Nothing depends on
//!   their delivery.
//!
//! ```text
//! ┌──────────────┐   FlowSession frames   ┌──────────────┐
//! │   Dealer     │ ◀════════════════════▶ │   Player     │
//! │              │                        │              │
//! └──────┬───────┘                        └──────┬───────┘
//!        │ publish()                             │ publish()
//!        ▼                                       ▼
//!  ┌─────────────────────────────────────────────────────┐
//!  │                 InMemoryEventBus                    │ ──▶ subscribe()
//!  └─────────────────────────────────────────────────────┘
//! ```

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod session;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, FlowRole, LedgerEvent, NotaryOutcome, ProgressStep};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use session::{
    ChannelSession, FlowSession, SessionError, SessionInbox, SessionRouter, SessionTransport,
};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
