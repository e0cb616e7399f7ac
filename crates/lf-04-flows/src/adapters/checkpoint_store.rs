use crate::domain::checkpoint::FlowCheckpoint;
use crate::domain::error::{FlowError, FlowResult};
use crate::ports::outbound::CheckpointStore;
use lf_02_vault::{BatchOperation, KVStoreError, KeyValueStore};
use parking_lot::{Mutex, RwLock};
use shared_types::{decode, encode};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

const CHECKPOINT_PREFIX: &[u8] = b"ckpt/";

/// Checkpoints held as their encoded bytes, exactly as a durable store
/// would see them.
#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    entries: RwLock<HashMap<Uuid, Vec<u8>>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl CheckpointStore for InMemoryCheckpointStore {
    fn save(&self, checkpoint: &FlowCheckpoint) -> FlowResult<()> {
        let bytes = encode(checkpoint).map_err(|e| FlowError::Checkpoint(e.to_string()))?;
        self.entries.write().insert(checkpoint.flow_id, bytes);
        Ok(())
    }

    fn load(&self, flow_id: &Uuid) -> FlowResult<Option<FlowCheckpoint>> {
        self.entries
            .read()
            .get(flow_id)
            .map(|bytes| decode(bytes).map_err(|e| FlowError::Checkpoint(e.to_string())))
            .transpose()
    }

    fn remove(&self, flow_id: &Uuid) -> FlowResult<()> {
        self.entries.write().remove(flow_id);
        Ok(())
    }

    fn unfinished(&self) -> FlowResult<Vec<FlowCheckpoint>> {
        let entries = self.entries.read();
        let mut out = Vec::new();
        for bytes in entries.values() {
            let checkpoint: FlowCheckpoint =
                decode(bytes).map_err(|e| FlowError::Checkpoint(e.to_string()))?;
            if !checkpoint.phase.is_terminal() {
                out.push(checkpoint);
            }
        }
        Ok(out)
    }
}

/// Checkpoints in a `KeyValueStore` under `ckpt/<flow id>`. Backed by a
/// `FileBackedKVStore`, they survive a process restart.
pub struct KvCheckpointStore {
    store: Mutex<Box<dyn KeyValueStore>>,
}

impl KvCheckpointStore {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    fn key(flow_id: &Uuid) -> Vec<u8> {
        let mut key = CHECKPOINT_PREFIX.to_vec();
        key.extend_from_slice(flow_id.as_bytes());
        key
    }
}

fn store_error(e: KVStoreError) -> FlowError {
    FlowError::Checkpoint(e.to_string())
}

fn decode_checkpoint(bytes: &[u8]) -> FlowResult<FlowCheckpoint> {
    decode(bytes).map_err(|e| FlowError::Checkpoint(e.to_string()))
}

impl CheckpointStore for KvCheckpointStore {
    fn save(&self, checkpoint: &FlowCheckpoint) -> FlowResult<()> {
        let bytes = encode(checkpoint).map_err(|e| FlowError::Checkpoint(e.to_string()))?;
        self.store
            .lock()
            .put(&Self::key(&checkpoint.flow_id), &bytes)
            .map_err(store_error)?;
        debug!(flow_id = %checkpoint.flow_id, phase = ?checkpoint.phase, "[lf-04] Checkpoint saved");
        Ok(())
    }

    fn load(&self, flow_id: &Uuid) -> FlowResult<Option<FlowCheckpoint>> {
        self.store
            .lock()
            .get(&Self::key(flow_id))
            .map_err(store_error)?
            .map(|bytes| decode_checkpoint(&bytes))
            .transpose()
    }

    fn remove(&self, flow_id: &Uuid) -> FlowResult<()> {
        self.store
            .lock()
            .atomic_batch_write(vec![BatchOperation::delete(Self::key(flow_id))])
            .map_err(store_error)
    }

    fn unfinished(&self) -> FlowResult<Vec<FlowCheckpoint>> {
        let entries = self
            .store
            .lock()
            .prefix_scan(CHECKPOINT_PREFIX)
            .map_err(store_error)?;
        let mut out = Vec::new();
        for (_, bytes) in entries {
            let checkpoint = decode_checkpoint(&bytes)?;
            if !checkpoint.phase.is_terminal() {
                out.push(checkpoint);
            }
        }
        Ok(out)
    }
}
