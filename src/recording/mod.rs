//! Call recording job subsystem.
//!
//! # Data Flow
//! ```text
//! license.recordings && config.enable_recordings && manifest recorder version
//!     → bootstrap.rs: connect job service (sync, fatal on error)
//!     → background: update job runner image (async, degrade on error)
//!     → NodeState.recording = RecordingJobs
//! ```
//!
//! # Design Decisions
//! - A slow job service handshake never blocks activation
//! - The job service manages its own resources; deactivation only drops the handle

pub mod bootstrap;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

pub use bootstrap::{PendingRecording, RecordingBootstrapper};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JobServiceError {
    #[error("cannot connect to {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("failed to update job runner: {0}")]
    UpdateRunner(String),
}

/// Client of the external job service executing recordings.
#[async_trait]
pub trait JobService: Send + Sync {
    /// Pin the image recording jobs run with.
    async fn update_job_runner(&self, image: &str) -> Result<(), JobServiceError>;
}

/// Builds job service clients.
pub trait JobServiceFactory: Send + Sync {
    fn connect(&self, endpoint: &str) -> Result<Arc<dyn JobService>, JobServiceError>;
}

/// A configured recording job subsystem.
#[derive(Clone)]
pub struct RecordingJobs {
    pub runner_image: String,
    pub service: Arc<dyn JobService>,
}

impl std::fmt::Debug for RecordingJobs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingJobs")
            .field("runner_image", &self.runner_image)
            .finish_non_exhaustive()
    }
}
