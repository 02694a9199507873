//! Host process port.
//!
//! # Data Flow
//! ```text
//! Host (trait, implemented by the embedding process)
//!     → license.rs  (entitlement questions)
//!     → identity.rs (service identity + session under the cluster mutex)
//!     → cluster status, commands, telemetry, realtime signaling
//! ```
//!
//! # Design Decisions
//! - Narrow async trait; the node never reaches into host internals
//! - Every host call may fail; callers decide whether failure is fatal

pub mod identity;
pub mod license;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

pub use identity::IdentityBootstrapper;
pub use license::{License, LicenseChecker};

/// Failure reported by the host.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{operation} failed: {message}")]
pub struct HostError {
    pub operation: &'static str,
    pub message: String,
}

impl HostError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// Host-side view of this node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterStatus {
    /// Identifier of this node within the cluster.
    pub cluster_id: String,
}

/// Description of the singleton service identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIdentitySpec {
    pub username: String,
    pub display_name: String,
    pub description: String,
    pub owner_id: String,
}

/// An authenticated session. `expires_at_ms == None` never expires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub identity_id: String,
    pub token: String,
    pub expires_at_ms: Option<u64>,
}

/// A message exchanged between cluster nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterEvent {
    pub sender_id: String,
    pub kind: String,
    pub payload: Vec<u8>,
}

/// Realtime signaling message destined for connected clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalMessage {
    pub session_id: String,
    pub payload: Vec<u8>,
}

/// Services the embedding host provides to the node.
#[async_trait]
pub trait Host: Send + Sync {
    /// Status of this node as seen by the host.
    async fn cluster_status(&self) -> Result<ClusterStatus, HostError>;

    /// Whether the host runs as part of a multi-node cluster.
    fn is_clustered(&self) -> bool;

    /// Current license, if any.
    fn license(&self) -> Option<License>;

    /// Look up the identity by username, creating it if absent. Returns its ID.
    async fn ensure_identity(&self, spec: &ServiceIdentitySpec) -> Result<String, HostError>;

    async fn create_session(&self, identity_id: &str, expires_at_ms: Option<u64>) -> Result<Session, HostError>;

    async fn revoke_session(&self, session_id: &str) -> Result<(), HostError>;

    async fn register_commands(&self) -> Result<(), HostError>;

    async fn unregister_commands(&self) -> Result<(), HostError>;

    async fn teardown_telemetry(&self) -> Result<(), HostError>;

    /// Subscribe to inter-node events.
    fn cluster_events(&self) -> broadcast::Receiver<ClusterEvent>;

    /// Deliver a realtime message to clients.
    async fn publish_signal(&self, message: SignalMessage) -> Result<(), HostError>;
}
