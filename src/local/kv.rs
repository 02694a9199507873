//! In-process key-value store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::cluster::kv::{KvError, KvStore};

#[derive(Debug, Clone)]
struct Slot {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Slot {
    fn new(value: Vec<u8>, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.and_then(|ttl| Instant::now().checked_add(ttl)),
        }
    }

    fn is_live(&self) -> bool {
        self.expires_at.map_or(true, |at| Instant::now() < at)
    }
}

/// A thread-safe, TTL-aware map standing in for the cluster store.
///
/// Cloning shares the same map, so several simulated nodes can point at one
/// instance.
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    inner: Arc<DashMap<String, Slot>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.inner.iter().filter(|r| r.value().is_live()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        Ok(self
            .inner
            .get(key)
            .filter(|r| r.value().is_live())
            .map(|r| r.value().value.clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), KvError> {
        self.inner.insert(key.to_string(), Slot::new(value, ttl));
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<bool, KvError> {
        match self.inner.entry(key.to_string()) {
            Entry::Occupied(mut slot) => {
                if slot.get().is_live() {
                    return Ok(false);
                }
                slot.insert(Slot::new(value, Some(ttl)));
                Ok(true)
            }
            Entry::Vacant(slot) => {
                slot.insert(Slot::new(value, Some(ttl)));
                Ok(true)
            }
        }
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: &[u8],
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<bool, KvError> {
        match self.inner.get_mut(key) {
            Some(mut slot) if slot.is_live() && slot.value == expected => {
                *slot = Slot::new(value, ttl);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn compare_and_delete(&self, key: &str, expected: &[u8]) -> Result<bool, KvError> {
        Ok(self
            .inner
            .remove_if(key, |_, slot| slot.is_live() && slot.value == expected)
            .is_some())
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        self.inner.remove(key);
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, KvError> {
        let mut keys: Vec<String> = self
            .inner
            .iter()
            .filter(|r| r.key().starts_with(prefix) && r.value().is_live())
            .map(|r| r.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}
