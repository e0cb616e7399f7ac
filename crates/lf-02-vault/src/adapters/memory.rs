use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{apply_batch, scan, BatchOperation, KeyValueStore};
use std::collections::BTreeMap;

/// In-memory key-value store for tests and ephemeral nodes.
#[derive(Debug, Default)]
pub struct InMemoryKVStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl InMemoryKVStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        self.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        apply_batch(&mut self.data, operations);
        Ok(())
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        Ok(self.data.contains_key(key))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError> {
        Ok(scan(&self.data, prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_kv_store() {
        let mut store = InMemoryKVStore::new();

        store.put(b"key1", b"value1").unwrap();
        store.put(b"key2", b"value2").unwrap();

        assert_eq!(store.get(b"key1").unwrap(), Some(b"value1".to_vec()));
        assert_eq!(store.get(b"key3").unwrap(), None);
        assert!(store.exists(b"key2").unwrap());
        assert!(!store.exists(b"key3").unwrap());
    }

    #[test]
    fn test_prefix_scan_is_ordered() {
        let mut store = InMemoryKVStore::new();

        store.put(b"log/2", b"b").unwrap();
        store.put(b"log/1", b"a").unwrap();
        store.put(b"tx/1", b"t").unwrap();

        let log = store.prefix_scan(b"log/").unwrap();
        assert_eq!(
            log,
            vec![
                (b"log/1".to_vec(), b"a".to_vec()),
                (b"log/2".to_vec(), b"b".to_vec())
            ]
        );
    }

    #[test]
    fn test_batch_with_delete() {
        let mut store = InMemoryKVStore::new();
        store.put(b"stale", b"x").unwrap();

        store
            .atomic_batch_write(vec![
                BatchOperation::put(b"a".to_vec(), b"1".to_vec()),
                BatchOperation::delete(b"stale".to_vec()),
            ])
            .unwrap();

        assert!(store.exists(b"a").unwrap());
        assert!(!store.exists(b"stale").unwrap());
    }
}
