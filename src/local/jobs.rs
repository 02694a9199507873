//! In-process job service.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use url::Url;

use crate::recording::{JobService, JobServiceError, JobServiceFactory};

#[derive(Default)]
struct Inner {
    connections: AtomicUsize,
    runner: ArcSwapOption<String>,
    fail_updates: AtomicBool,
}

/// Job service stand-in; acts as its own factory. Clones share state.
#[derive(Clone, Default)]
pub struct LocalJobs {
    inner: Arc<Inner>,
}

impl LocalJobs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of clients connected so far.
    pub fn connections(&self) -> usize {
        self.inner.connections.load(Ordering::Relaxed)
    }

    /// Image the runner is pinned to.
    pub fn runner(&self) -> Option<String> {
        self.inner.runner.load_full().map(|image| (*image).clone())
    }

    /// Make runner updates fail.
    pub fn fail_updates(&self, fail: bool) {
        self.inner.fail_updates.store(fail, Ordering::Relaxed);
    }
}

impl JobServiceFactory for LocalJobs {
    fn connect(&self, endpoint: &str) -> Result<Arc<dyn JobService>, JobServiceError> {
        Url::parse(endpoint).map_err(|e| JobServiceError::Connect {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        self.inner.connections.fetch_add(1, Ordering::Relaxed);
        Ok(Arc::new(self.clone()))
    }
}

#[async_trait]
impl JobService for LocalJobs {
    async fn update_job_runner(&self, image: &str) -> Result<(), JobServiceError> {
        if self.inner.fail_updates.load(Ordering::Relaxed) {
            return Err(JobServiceError::UpdateRunner(format!("runner {image} rejected")));
        }
        self.inner.runner.store(Some(Arc::new(image.to_string())));
        Ok(())
    }
}
