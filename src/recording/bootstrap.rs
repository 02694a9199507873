//! Recording job bootstrap.

use std::sync::Arc;

use crate::config::{Manifest, NodeConfig};
use crate::host::LicenseChecker;
use crate::lifecycle::state::NodeContext;
use crate::recording::{JobService, JobServiceError, JobServiceFactory, RecordingJobs};

pub struct RecordingBootstrapper {
    factory: Arc<dyn JobServiceFactory>,
}

impl RecordingBootstrapper {
    pub fn new(factory: Arc<dyn JobServiceFactory>) -> Self {
        Self { factory }
    }

    /// Check the gate and connect the job service client.
    ///
    /// Returns `Ok(None)` when recordings are not licensed, not enabled, or
    /// the recorder version is missing from the manifest. Connecting is the
    /// only fallible step and its error is fatal to activation.
    pub fn prepare(
        &self,
        license: &LicenseChecker,
        config: &NodeConfig,
        manifest: &Manifest,
    ) -> Result<Option<PendingRecording>, JobServiceError> {
        if !license.recordings_allowed() {
            tracing::debug!("Recordings not allowed by license, skipping job service");
            return Ok(None);
        }
        if !config.recordings_enabled() {
            tracing::debug!("Recordings disabled, skipping job service");
            return Ok(None);
        }
        let Some(runner_image) = manifest.recorder_image() else {
            tracing::warn!("Recorder version missing from manifest, skipping job service");
            return Ok(None);
        };

        tracing::debug!(endpoint = %config.job_service_url, "Initializing job service");
        let service = self.factory.connect(config.job_service_url.trim())?;

        Ok(Some(PendingRecording {
            runner_image,
            service,
        }))
    }
}

/// A connected job service whose runner is not configured yet.
pub struct PendingRecording {
    runner_image: String,
    service: Arc<dyn JobService>,
}

impl PendingRecording {
    pub fn runner_image(&self) -> &str {
        &self.runner_image
    }

    /// Update the job runner and publish the subsystem into shared state.
    ///
    /// Runs detached from activation. Failure is logged and only disables
    /// recordings.
    pub async fn configure(self, ctx: Arc<NodeContext>) {
        tracing::debug!(image = %self.runner_image, "Updating job runner");

        let updated = tokio::select! {
            biased;
            _ = ctx.shutdown().fired() => {
                tracing::debug!("Shutdown fired before job runner update finished");
                return;
            }
            result = self.service.update_job_runner(&self.runner_image) => result,
        };

        if let Err(e) = updated {
            tracing::error!(error = %e, "Failed to update job runner");
            return;
        }

        let mut state = ctx.lock().await;
        if ctx.shutdown().is_fired() {
            return;
        }
        state.recording = Some(RecordingJobs {
            runner_image: self.runner_image,
            service: self.service,
        });
        tracing::debug!("Job service initialized successfully");
    }
}
