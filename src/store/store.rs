use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::time::Instant;

use crate::store::error::StoreError;

// ============================================================================
// KeyValueStore trait
// ============================================================================

/// Asynchronous key-value store with last-write-wins semantics and no
/// transactions across keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Values for `keys`; missing keys are absent from the result.
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError>;

    async fn set(&self, items: Map<String, Value>) -> Result<(), StoreError>;

    async fn remove(&self, keys: &[&str]) -> Result<(), StoreError>;

    /// Wipe every key.
    async fn clear(&self) -> Result<(), StoreError>;
}

// ============================================================================
// MemoryStore
// ============================================================================

/// One `set` call as seen by a `MemoryStore`.
#[derive(Debug, Clone)]
pub struct StoreWrite {
    pub at: Instant,
    pub keys: Vec<String>,
}

#[derive(Default)]
struct MemoryInner {
    values: HashMap<String, Value>,
    writes: Vec<StoreWrite>,
    unavailable: bool,
}

/// In-process store. Records every write with its (tokio) timestamp.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().unavailable = unavailable;
    }

    pub fn writes(&self) -> Vec<StoreWrite> {
        self.inner.lock().writes.clone()
    }

    pub fn raw(&self, key: &str) -> Option<Value> {
        self.inner.lock().values.get(key).cloned()
    }

    fn check(inner: &MemoryInner) -> Result<(), StoreError> {
        if inner.unavailable {
            return Err(StoreError::Unavailable("memory store switched off".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError> {
        let inner = self.inner.lock();
        Self::check(&inner)?;
        Ok(keys
            .iter()
            .filter_map(|k| inner.values.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, items: Map<String, Value>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        Self::check(&inner)?;
        let keys = items.keys().cloned().collect();
        inner.values.extend(items);
        inner.writes.push(StoreWrite {
            at: Instant::now(),
            keys,
        });
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        Self::check(&inner)?;
        for key in keys {
            inner.values.remove(*key);
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        Self::check(&inner)?;
        inner.values.clear();
        Ok(())
    }
}
