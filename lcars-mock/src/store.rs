use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use lcars_core::KvStore;
use lcars_types::LcarsError;

/// In-memory key/value store with atomic single-key semantics.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.lock().expect("mutex poisoned").len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LcarsError> {
        Ok(self.data.lock().expect("mutex poisoned").get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), LcarsError> {
        self.data
            .lock()
            .expect("mutex poisoned")
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), LcarsError> {
        self.data.lock().expect("mutex poisoned").remove(key);
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, LcarsError> {
        Ok(self
            .data
            .lock()
            .expect("mutex poisoned")
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
