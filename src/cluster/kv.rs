//! Cluster-shared key-value store port.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a key-value backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KvError {
    /// Backend could not be reached or refused the operation.
    #[error("KV backend unavailable: {0}")]
    Unavailable(String),

    /// Stored value could not be decoded.
    #[error("malformed value under {key}: {reason}")]
    Malformed { key: String, reason: String },
}

/// Shared state visible to every node of the cluster.
///
/// Expired keys behave exactly like absent keys.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError>;

    /// Unconditional write, with an optional time to live.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), KvError>;

    /// Write only when the key is absent. Returns whether the value was written.
    async fn set_if_absent(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<bool, KvError>;

    /// Write only when the current value equals `expected`.
    async fn compare_and_set(
        &self,
        key: &str,
        expected: &[u8],
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<bool, KvError>;

    /// Delete only when the current value equals `expected`.
    async fn compare_and_delete(&self, key: &str, expected: &[u8]) -> Result<bool, KvError>;

    async fn delete(&self, key: &str) -> Result<(), KvError>;

    /// All live keys starting with `prefix`.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, KvError>;
}
