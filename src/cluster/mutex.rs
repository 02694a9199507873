//! Cluster-wide named mutex.
//!
//! # Protocol
//! ```text
//! lock():    set_if_absent(mutex_<name>, holder token, lease)
//!              ├─ written      → held; refresh lease every lease/2
//!              └─ already held → wait poll_delay(attempt), try again
//! release(): stop refresher → compare_and_delete(mutex_<name>, holder token)
//! ```
//!
//! A holder that dies without releasing loses the lock when its lease runs
//! out. Backend errors end acquisition at once; waiting on a held lock is
//! not a retry.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::cluster::backoff::poll_delay;
use crate::cluster::kv::{KvError, KvStore};

/// Key prefix for mutex entries in the shared store.
pub const MUTEX_KEY_PREFIX: &str = "mutex_";

/// Errors from cluster mutex operations.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("mutex name must not be empty")]
    EmptyName,

    #[error("lock backend error: {0}")]
    Backend(#[from] KvError),
}

/// A named lock shared by every node using the same store.
#[derive(Clone)]
pub struct ClusterMutex {
    kv: Arc<dyn KvStore>,
    name: String,
    key: String,
    lease: Duration,
}

impl std::fmt::Debug for ClusterMutex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterMutex")
            .field("name", &self.name)
            .field("lease", &self.lease)
            .finish()
    }
}

impl ClusterMutex {
    pub fn new(kv: Arc<dyn KvStore>, name: &str, lease: Duration) -> Result<Self, LockError> {
        if name.is_empty() {
            return Err(LockError::EmptyName);
        }
        Ok(Self {
            kv,
            name: name.to_string(),
            key: format!("{MUTEX_KEY_PREFIX}{name}"),
            lease,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait until this node holds the lock.
    pub async fn lock(&self) -> Result<ClusterLockGuard, LockError> {
        let holder = Uuid::new_v4().to_string();
        let mut attempt = 0u32;

        while !self
            .kv
            .set_if_absent(&self.key, holder.clone().into_bytes(), self.lease)
            .await?
        {
            attempt = attempt.saturating_add(1);
            let wait = poll_delay(attempt);
            tracing::trace!(mutex = %self.name, attempt, wait_ms = wait.as_millis() as u64, "Mutex held elsewhere, waiting");
            tokio::time::sleep(wait).await;
        }

        tracing::debug!(mutex = %self.name, holder = %holder, "Mutex acquired");

        let refresh = CancellationToken::new();
        tokio::spawn(refresh_lease(
            self.kv.clone(),
            self.key.clone(),
            holder.clone(),
            self.lease,
            refresh.clone(),
        ));

        Ok(ClusterLockGuard {
            kv: self.kv.clone(),
            name: self.name.clone(),
            key: self.key.clone(),
            holder,
            refresh,
            released: false,
        })
    }
}

async fn refresh_lease(
    kv: Arc<dyn KvStore>,
    key: String,
    holder: String,
    lease: Duration,
    stop: CancellationToken,
) {
    let period = (lease / 2).max(Duration::from_millis(10));
    let Some(start) = tokio::time::Instant::now().checked_add(period) else {
        return;
    };
    let mut ticker = tokio::time::interval_at(start, period);

    loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => return,
            _ = ticker.tick() => {
                match kv.compare_and_set(&key, holder.as_bytes(), holder.clone().into_bytes(), Some(lease)).await {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::warn!(key = %key, "Mutex lease lost before release");
                        return;
                    }
                    Err(e) => {
                        tracing::error!(key = %key, error = %e, "Failed to refresh mutex lease");
                        return;
                    }
                }
            }
        }
    }
}

/// Ownership of a [`ClusterMutex`].
///
/// Release consumes the guard so it can only happen once. A guard dropped
/// without [`ClusterLockGuard::release`] releases in the background.
pub struct ClusterLockGuard {
    kv: Arc<dyn KvStore>,
    name: String,
    key: String,
    holder: String,
    refresh: CancellationToken,
    released: bool,
}

impl std::fmt::Debug for ClusterLockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterLockGuard")
            .field("name", &self.name)
            .field("holder", &self.holder)
            .finish()
    }
}

impl ClusterLockGuard {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Random token identifying this holder.
    pub fn holder(&self) -> &str {
        &self.holder
    }

    pub async fn release(mut self) -> Result<(), LockError> {
        self.released = true;
        self.refresh.cancel();

        if !self.kv.compare_and_delete(&self.key, self.holder.as_bytes()).await? {
            tracing::warn!(mutex = %self.name, "Mutex lease had already expired at release");
        }
        tracing::debug!(mutex = %self.name, "Mutex released");
        Ok(())
    }
}

impl Drop for ClusterLockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.refresh.cancel();

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(mutex = %self.name, "Mutex dropped outside a runtime, waiting for lease expiry");
            return;
        };
        let kv = self.kv.clone();
        let key = std::mem::take(&mut self.key);
        let holder = std::mem::take(&mut self.holder);
        handle.spawn(async move {
            if let Err(e) = kv.compare_and_delete(&key, holder.as_bytes()).await {
                tracing::error!(key = %key, error = %e, "Failed to release dropped mutex");
            }
        });
    }
}
