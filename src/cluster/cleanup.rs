//! Shared call state cleanup.
//!
//! Run by the sole designated maintenance node on activation and on
//! deactivation, so that calls left behind by a crashed or stopped cluster do
//! not appear to be ongoing.

use crate::cluster::kv::{KvError, KvStore};

/// Key prefix of per-channel call state entries.
pub const CALL_STATE_PREFIX: &str = "call_";

/// Delete all per-call state. Returns the number of entries removed.
pub async fn clean_up_state(kv: &dyn KvStore) -> Result<usize, KvError> {
    let keys = kv.list_keys(CALL_STATE_PREFIX).await?;
    for key in &keys {
        kv.delete(key).await?;
    }

    if !keys.is_empty() {
        tracing::info!(removed = keys.len(), "Cleaned up stale call state");
    }
    Ok(keys.len())
}
