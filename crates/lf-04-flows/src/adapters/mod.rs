mod checkpoint_store;
mod network_map;

pub use checkpoint_store::{InMemoryCheckpointStore, KvCheckpointStore};
pub use network_map::NetworkMap;
