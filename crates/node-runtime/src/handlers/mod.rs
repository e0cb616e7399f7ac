//! # Node Handlers
//!
//! Long-running tasks a node spawns at startup.

pub mod dispatch;
pub mod metrics;
pub mod redelivery;

pub use dispatch::ResponderDispatcher;
pub use metrics::MetricsRecorder;
pub use redelivery::RedeliveryTask;
