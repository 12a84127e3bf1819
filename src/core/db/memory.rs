use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;

use crate::core::db::kv::KvStore;

/// In-process store. Clones share the same slots, which lets a test drop a
/// cart and restore a fresh one from what was "persisted".
#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.slots.lock().get(key).map(|value| value.as_bytes().to_vec()))
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.slots.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.slots.lock().remove(key);
        Ok(())
    }
}
