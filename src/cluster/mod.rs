//! Cluster coordination subsystem.
//!
//! # Data Flow
//! ```text
//! kv.rs (shared store port)
//!     → mutex.rs   (exactly-once bootstrap actions across nodes)
//!     → handler.rs (periodic, freshness based handler designation)
//!     → cleanup.rs (maintenance node wipes stale call state)
//! ```
//!
//! # Design Decisions
//! - The mutex is the only cluster-wide exclusion primitive
//! - Handler designation is best effort; readers judge freshness
//! - No retries on backend errors; callers decide

pub mod backoff;
pub mod cleanup;
pub mod handler;
pub mod kv;
pub mod mutex;

pub use handler::{HandlerDesignation, HandlerElector};
pub use kv::{KvError, KvStore};
pub use mutex::{ClusterLockGuard, ClusterMutex, LockError};
