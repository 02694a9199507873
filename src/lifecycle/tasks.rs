//! Background task registry.
//!
//! Every detached task of an activation is spawned here so deactivation can
//! join it. Tasks are expected to exit on the shutdown signal; those still
//! running when the drain deadline passes are aborted.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinSet;

/// Outcome of draining a [`TaskSet`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Tasks that returned on their own.
    pub finished: Vec<&'static str>,
    /// Tasks that panicked.
    pub panicked: usize,
    /// Tasks aborted at the deadline.
    pub aborted: usize,
}

/// Named, joinable background tasks.
#[derive(Debug, Default)]
pub struct TaskSet {
    inner: JoinSet<&'static str>,
    spawned: Vec<&'static str>,
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks not yet joined.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Names of every task spawned so far, in spawn order.
    pub fn spawned(&self) -> &[&'static str] {
        &self.spawned
    }

    pub fn spawn<F>(&mut self, name: &'static str, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.inner.spawn(async move {
            fut.await;
            name
        });
        self.spawned.push(name);
        tracing::trace!(task = name, pending = self.inner.len(), "Background task spawned");
    }

    /// Join every task, aborting whatever is left after `deadline`.
    pub async fn drain(&mut self, deadline: Duration) -> DrainReport {
        let mut report = DrainReport::default();

        let joined = tokio::time::timeout(deadline, async {
            while let Some(result) = self.inner.join_next().await {
                match result {
                    Ok(name) => report.finished.push(name),
                    Err(e) if e.is_panic() => {
                        tracing::error!(error = %e, "Background task panicked");
                        report.panicked += 1;
                    }
                    Err(_) => {}
                }
            }
        })
        .await;

        if joined.is_err() {
            report.aborted = self.inner.len();
            tracing::warn!(remaining = report.aborted, "Background tasks did not exit before deadline, aborting");
            self.inner.abort_all();
            while self.inner.join_next().await.is_some() {}
        }

        tracing::debug!(
            finished = report.finished.len(),
            panicked = report.panicked,
            aborted = report.aborted,
            "Background tasks drained"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::shutdown::ShutdownSignal;

    #[tokio::test]
    async fn test_drain_joins_cooperative_tasks() {
        let shutdown = ShutdownSignal::new();
        let mut tasks = TaskSet::new();
        for name in ["a", "b"] {
            let shutdown = shutdown.clone();
            tasks.spawn(name, async move { shutdown.fired().await });
        }
        assert_eq!(tasks.len(), 2);

        shutdown.fire();
        let mut report = tasks.drain(Duration::from_secs(1)).await;
        report.finished.sort();
        assert_eq!(report.finished, vec!["a", "b"]);
        assert_eq!(report.aborted, 0);
        assert!(tasks.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_aborts_stragglers() {
        let mut tasks = TaskSet::new();
        tasks.spawn("stuck", std::future::pending());
        tasks.spawn("quick", async {});

        let report = tasks.drain(Duration::from_secs(5)).await;
        assert_eq!(report.finished, vec!["quick"]);
        assert_eq!(report.aborted, 1);
        assert_eq!(tasks.spawned(), &["stuck", "quick"]);
    }

    #[tokio::test]
    async fn test_panics_are_counted() {
        let mut tasks = TaskSet::new();
        tasks.spawn("boom", async { panic!("boom") });

        let report = tasks.drain(Duration::from_secs(1)).await;
        assert_eq!(report.panicked, 1);
        assert!(report.finished.is_empty());
    }
}
