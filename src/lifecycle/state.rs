//! Shared node state.
//!
//! One mutex guards the whole aggregate. Never hold the guard across a call
//! into a collaborator; clone the handle out, drop the guard, then await.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::host::Session;
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::recording::RecordingJobs;
use crate::relay::{BackendKind, RelayBackend, RelayServerConfig};

/// Everything background tasks and the orchestrator share.
#[derive(Default)]
pub struct NodeState {
    /// This node's cluster ID, set once the relay backend is up.
    pub node_id: Option<String>,
    pub backend: Option<RelayBackend>,
    /// Published by the recording setup task once the runner is configured.
    pub recording: Option<RecordingJobs>,
    pub session: Option<Session>,
}

/// Owning context passed to every component.
pub struct NodeContext {
    state: Mutex<NodeState>,
    shutdown: ShutdownSignal,
}

impl NodeContext {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(NodeState::default()),
            shutdown: ShutdownSignal::new(),
        })
    }

    /// Lock the aggregate.
    pub async fn lock(&self) -> MutexGuard<'_, NodeState> {
        self.state.lock().await
    }

    pub fn shutdown(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    /// Clone of the active backend handle.
    pub async fn backend(&self) -> Option<RelayBackend> {
        self.state.lock().await.backend.clone()
    }

    /// Point-in-time copy of the observable state.
    pub async fn snapshot(&self) -> NodeSnapshot {
        let state = self.state.lock().await;
        let (external_endpoint, embedded_config) = match &state.backend {
            Some(RelayBackend::External(relay)) => (Some(relay.endpoint.clone()), None),
            Some(RelayBackend::Embedded(relay)) => (None, Some(relay.config.clone())),
            None => (None, None),
        };

        NodeSnapshot {
            node_id: state.node_id.clone(),
            backend: state.backend.as_ref().map(RelayBackend::kind),
            external_endpoint,
            embedded_config,
            recording_image: state.recording.as_ref().map(|r| r.runner_image.clone()),
            session_id: state.session.as_ref().map(|s| s.id.clone()),
            shutdown_fired: self.shutdown.is_fired(),
        }
    }
}

/// Read-only view of [`NodeState`], for status reporting and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSnapshot {
    pub node_id: Option<String>,
    pub backend: Option<BackendKind>,
    pub external_endpoint: Option<String>,
    pub embedded_config: Option<RelayServerConfig>,
    pub recording_image: Option<String>,
    pub session_id: Option<String>,
    pub shutdown_fired: bool,
}

impl NodeSnapshot {
    /// Nothing has been published or fired.
    pub fn is_pristine(&self) -> bool {
        *self == NodeSnapshot::default()
    }
}
