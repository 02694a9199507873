//! Single-process host.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::host::{
    ClusterEvent, ClusterStatus, Host, HostError, License, ServiceIdentitySpec, Session, SignalMessage,
};

const EVENT_BUFFER: usize = 256;

/// Host for a node running on its own, without an embedding server.
pub struct LocalHost {
    cluster_id: String,
    clustered: AtomicBool,
    license: ArcSwap<Option<License>>,
    /// username → identity ID
    identities: DashMap<String, String>,
    /// session ID → session
    sessions: DashMap<String, Session>,
    commands_registered: AtomicBool,
    events: broadcast::Sender<ClusterEvent>,
    published: AtomicUsize,
}

impl LocalHost {
    pub fn new(cluster_id: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            cluster_id: cluster_id.into(),
            clustered: AtomicBool::new(false),
            license: ArcSwap::from_pointee(None),
            identities: DashMap::new(),
            sessions: DashMap::new(),
            commands_registered: AtomicBool::new(false),
            events,
            published: AtomicUsize::new(0),
        }
    }

    pub fn set_clustered(&self, clustered: bool) {
        self.clustered.store(clustered, Ordering::Relaxed);
    }

    pub fn set_license(&self, license: Option<License>) {
        self.license.store(Arc::new(license));
    }

    /// Inject a cluster event. Returns how many subscribers received it.
    pub fn emit(&self, event: ClusterEvent) -> usize {
        self.events.send(event).unwrap_or(0)
    }

    pub fn identity_count(&self) -> usize {
        self.identities.len()
    }

    /// Sessions created and not yet revoked.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn commands_registered(&self) -> bool {
        self.commands_registered.load(Ordering::Relaxed)
    }

    pub fn published_count(&self) -> usize {
        self.published.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Host for LocalHost {
    async fn cluster_status(&self) -> Result<ClusterStatus, HostError> {
        Ok(ClusterStatus {
            cluster_id: self.cluster_id.clone(),
        })
    }

    fn is_clustered(&self) -> bool {
        self.clustered.load(Ordering::Relaxed)
    }

    fn license(&self) -> Option<License> {
        **self.license.load()
    }

    async fn ensure_identity(&self, spec: &ServiceIdentitySpec) -> Result<String, HostError> {
        if spec.username.is_empty() {
            return Err(HostError::new("ensure_identity", "username must not be empty"));
        }
        let id = self
            .identities
            .entry(spec.username.clone())
            .or_insert_with(|| {
                tracing::info!(username = %spec.username, owner = %spec.owner_id, "Created service identity");
                Uuid::new_v4().to_string()
            })
            .clone();
        Ok(id)
    }

    async fn create_session(&self, identity_id: &str, expires_at_ms: Option<u64>) -> Result<Session, HostError> {
        let session = Session {
            id: Uuid::new_v4().to_string(),
            identity_id: identity_id.to_string(),
            token: Uuid::new_v4().simple().to_string(),
            expires_at_ms,
        };
        self.sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    async fn revoke_session(&self, session_id: &str) -> Result<(), HostError> {
        self.sessions
            .remove(session_id)
            .map(|_| ())
            .ok_or_else(|| HostError::new("revoke_session", format!("unknown session {session_id}")))
    }

    async fn register_commands(&self) -> Result<(), HostError> {
        self.commands_registered.store(true, Ordering::Relaxed);
        Ok(())
    }

    async fn unregister_commands(&self) -> Result<(), HostError> {
        self.commands_registered.store(false, Ordering::Relaxed);
        Ok(())
    }

    async fn teardown_telemetry(&self) -> Result<(), HostError> {
        Ok(())
    }

    fn cluster_events(&self) -> broadcast::Receiver<ClusterEvent> {
        self.events.subscribe()
    }

    async fn publish_signal(&self, message: SignalMessage) -> Result<(), HostError> {
        self.published.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(session_id = %message.session_id, bytes = message.payload.len(), "Realtime message published");
        Ok(())
    }
}
