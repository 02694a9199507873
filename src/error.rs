//! Top-level error type for node activation.

use thiserror::Error;

use crate::cluster::kv::KvError;
use crate::cluster::mutex::LockError;
use crate::config::loader::ConfigError;
use crate::host::HostError;
use crate::lifecycle::orchestrator::Phase;
use crate::recording::JobServiceError;
use crate::relay::RelayError;

/// Everything that can abort activation.
#[derive(Debug, Error)]
pub enum NodeError {
    /// The disable flag is set in the environment.
    #[error("disabled by environment flag")]
    Disabled,

    /// `activate` was called on a node that is not idle.
    #[error("cannot activate a node in phase {0}")]
    InvalidPhase(Phase),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to set configuration: {0}")]
    ConfigOverride(#[source] ConfigError),

    #[error("cluster store error: {0}")]
    Kv(#[from] KvError),

    #[error("cluster lock error: {0}")]
    Lock(#[from] LockError),

    #[error("host error: {0}")]
    Host(#[from] HostError),

    #[error("relay backend error: {0}")]
    Relay(#[from] RelayError),

    #[error("failed to create job service: {0}")]
    JobService(#[from] JobServiceError),
}

/// Result type for activation steps.
pub type NodeResult<T> = Result<T, NodeError>;
