//! Handler designation.
//!
//! The handler is the node doing singleton maintenance work. Designation is a
//! freshness heuristic, not an exclusive leader election: the elector simply
//! keeps writing its cluster ID under [`HANDLER_KEY`], and readers trust the
//! most recently refreshed claimant as long as it is fresh enough. A stale
//! writer from an earlier epoch can still overwrite the value, so consumers
//! must always check `refreshed_at_ms` rather than mere presence.
//!
//! # States
//! ```text
//! not tracking ──(maintenance flag set)──▶ tracking
//! tracking: write now, then write on every tick
//! tracking ──(shutdown fired | write failed)──▶ stopped
//! ```

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant};

use crate::cluster::kv::{KvError, KvStore};
use crate::lifecycle::shutdown::ShutdownSignal;

/// Shared store key holding the current designation.
pub const HANDLER_KEY: &str = "handler_id";

/// Designation lives this many refresh intervals without being rewritten.
const TTL_INTERVALS: u32 = 3;

/// The most recent handler claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerDesignation {
    pub cluster_id: String,
    /// Wall clock time of the last refresh, milliseconds since epoch.
    pub refreshed_at_ms: u64,
}

impl HandlerDesignation {
    fn now(cluster_id: &str) -> Self {
        Self {
            cluster_id: cluster_id.to_string(),
            refreshed_at_ms: now_ms(),
        }
    }

    /// Age of this claim at the current wall clock time.
    pub fn age(&self) -> Duration {
        Duration::from_millis(now_ms().saturating_sub(self.refreshed_at_ms))
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Periodically claims the handler designation for this node.
pub struct HandlerElector {
    kv: Arc<dyn KvStore>,
    cluster_id: String,
    interval: Duration,
}

impl HandlerElector {
    pub fn new(kv: Arc<dyn KvStore>, cluster_id: impl Into<String>, interval: Duration) -> Self {
        Self {
            kv,
            cluster_id: cluster_id.into(),
            interval,
        }
    }

    async fn claim(&self) -> Result<(), KvError> {
        let designation = HandlerDesignation::now(&self.cluster_id);
        let value = serde_json::to_vec(&designation).map_err(|e| KvError::Malformed {
            key: HANDLER_KEY.to_string(),
            reason: e.to_string(),
        })?;
        // An interval too large to multiply leaves the designation without expiry.
        let ttl = self.interval.checked_mul(TTL_INTERVALS);
        self.kv.set(HANDLER_KEY, value, ttl).await
    }

    /// Run the refresh loop until shutdown or the first failed write.
    pub async fn run(self, shutdown: ShutdownSignal) {
        if shutdown.is_fired() {
            return;
        }

        tracing::info!(cluster_id = %self.cluster_id, "Calls handler, setting state");
        if let Err(e) = self.claim().await {
            tracing::error!(error = %e, "Failed to set handler designation");
            return;
        }

        let Some(start) = Instant::now().checked_add(self.interval) else {
            shutdown.fired().await;
            return;
        };
        let mut ticker = time::interval_at(start, self.interval);
        loop {
            tokio::select! {
                biased;
                _ = shutdown.fired() => {
                    tracing::debug!("Handler elector received shutdown signal, exiting loop");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.claim().await {
                        tracing::error!(error = %e, "Failed to refresh handler designation");
                        return;
                    }
                }
            }
        }
    }

    /// Read the designation, returning it only if refreshed within `max_age`.
    pub async fn current_handler(
        kv: &dyn KvStore,
        max_age: Duration,
    ) -> Result<Option<HandlerDesignation>, KvError> {
        let Some(raw) = kv.get(HANDLER_KEY).await? else {
            return Ok(None);
        };
        let designation: HandlerDesignation =
            serde_json::from_slice(&raw).map_err(|e| KvError::Malformed {
                key: HANDLER_KEY.to_string(),
                reason: e.to_string(),
            })?;

        if designation.age() > max_age {
            tracing::debug!(cluster_id = %designation.cluster_id, "Ignoring stale handler designation");
            return Ok(None);
        }
        Ok(Some(designation))
    }
}
