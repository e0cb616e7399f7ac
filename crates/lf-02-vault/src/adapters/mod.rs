//! Storage adapters for the [`KeyValueStore`](crate::ports::outbound::KeyValueStore) port.

mod file;
mod memory;

pub use file::FileBackedKVStore;
pub use memory::InMemoryKVStore;
