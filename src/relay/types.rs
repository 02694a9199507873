//! Relay backend types and ports.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::{IceServerConfig, NodeConfig};
use crate::host::{ClusterEvent, SignalMessage};

/// Errors from relay backend construction and control.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RelayError {
    #[error("failed to create relay server: {0}")]
    Create(String),

    #[error("failed to start relay server: {0}")]
    Start(String),

    #[error("failed to stop relay server: {0}")]
    Stop(String),

    #[error("failed to create rtcd manager: {0}")]
    Delegate(String),

    #[error("failed to close rtcd manager: {0}")]
    Close(String),

    #[error("failed to handle cluster event: {0}")]
    Event(String),
}

/// TURN settings handed to the embedded server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnConfig {
    /// Present only in server side TURN mode; clients otherwise use their
    /// own per-session credentials.
    pub static_auth_secret: Option<String>,
    pub credentials_expiration_minutes: u32,
}

/// Everything the embedded relay server is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayServerConfig {
    pub udp_address: String,
    pub tcp_address: String,
    pub udp_port: u16,
    pub tcp_port: u16,
    pub host_override: String,
    pub ice_servers: Vec<IceServerConfig>,
    pub turn: TurnConfig,
    pub enable_ipv6: bool,
}

impl RelayServerConfig {
    pub fn from_config(config: &NodeConfig) -> Self {
        let static_auth_secret = config
            .server_side_turn
            .then(|| config.turn_static_auth_secret.clone());

        Self {
            udp_address: config.udp_server_address.clone(),
            tcp_address: config.tcp_server_address.clone(),
            udp_port: config.udp_server_port,
            tcp_port: config.tcp_server_port,
            host_override: config.ice_host_override.clone(),
            ice_servers: config.ice_servers.clone(),
            turn: TurnConfig {
                static_auth_secret,
                credentials_expiration_minutes: config.turn_credentials_expiration_minutes,
            },
            enable_ipv6: config.enable_ipv6,
        }
    }
}

/// The in-process media relay engine.
#[async_trait]
pub trait RelayServer: Send + Sync {
    async fn start(&self) -> Result<(), RelayError>;

    async fn stop(&self) -> Result<(), RelayError>;

    /// Signaling the server wants delivered to clients. Only the first call
    /// returns the receiver.
    fn take_outbound(&self) -> Option<mpsc::Receiver<SignalMessage>>;

    async fn handle_cluster_event(&self, event: ClusterEvent) -> Result<(), RelayError>;
}

/// Client side of an external relay service, owning its connection pool.
#[async_trait]
pub trait RelayDelegate: Send + Sync {
    fn endpoint(&self) -> &str;

    async fn handle_cluster_event(&self, event: ClusterEvent) -> Result<(), RelayError>;

    async fn close(&self) -> Result<(), RelayError>;
}

/// Builds relay backends.
#[async_trait]
pub trait RelayFactory: Send + Sync {
    fn new_server(&self, config: &RelayServerConfig) -> Result<Arc<dyn RelayServer>, RelayError>;

    async fn new_delegate(&self, endpoint: &str) -> Result<Arc<dyn RelayDelegate>, RelayError>;
}

/// An embedded relay server together with the config it was built from.
#[derive(Clone)]
pub struct EmbeddedRelay {
    pub config: RelayServerConfig,
    pub server: Arc<dyn RelayServer>,
}

/// A delegate bound to an external relay endpoint.
#[derive(Clone)]
pub struct ExternalRelay {
    pub endpoint: String,
    pub manager: Arc<dyn RelayDelegate>,
}

/// The single active relay backend of a node.
#[derive(Clone)]
pub enum RelayBackend {
    Embedded(EmbeddedRelay),
    External(ExternalRelay),
}

/// Which variant a [`RelayBackend`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Embedded,
    External,
}

impl RelayBackend {
    pub fn kind(&self) -> BackendKind {
        match self {
            RelayBackend::Embedded(_) => BackendKind::Embedded,
            RelayBackend::External(_) => BackendKind::External,
        }
    }

    pub async fn handle_cluster_event(&self, event: ClusterEvent) -> Result<(), RelayError> {
        match self {
            RelayBackend::Embedded(relay) => relay.server.handle_cluster_event(event).await,
            RelayBackend::External(relay) => relay.manager.handle_cluster_event(event).await,
        }
    }
}

impl std::fmt::Debug for RelayBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayBackend::Embedded(relay) => f
                .debug_struct("Embedded")
                .field("config", &relay.config)
                .finish_non_exhaustive(),
            RelayBackend::External(relay) => f
                .debug_struct("External")
                .field("endpoint", &relay.endpoint)
                .finish_non_exhaustive(),
        }
    }
}
