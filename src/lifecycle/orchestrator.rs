//! Activation and deactivation sequencing.
//!
//! # Activation (fail-fast)
//! ```text
//! disable flag → license checker → [maintenance node] state cleanup
//!   → register commands → cluster status → load + validate config
//!   → [cloud] default_enabled override → identity + session
//!   → [gate] recording setup (background) → relay backend selection
//!   → embedded: [flag] handler elector, topology listener, signal writer
//!   → external: topology listener
//! ```
//!
//! # Deactivation (best-effort)
//! ```text
//! fire shutdown → close external relay → stop embedded relay
//!   → [maintenance node] state cleanup → unregister commands
//!   → teardown telemetry → revoke session → drain tasks → clear state
//! ```
//!
//! An orchestrator is single use: `Idle → Active → Stopped`, or
//! `Idle → Failed`. A supervisor wanting to retry builds a new one.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::cluster::cleanup::clean_up_state;
use crate::cluster::handler::HandlerElector;
use crate::cluster::kv::KvStore;
use crate::cluster::mutex::ClusterMutex;
use crate::config::{ConfigSource, EnvFlags, Manifest, NodeConfig, RuntimeConfig};
use crate::error::{NodeError, NodeResult};
use crate::host::identity::IDENTITY_MUTEX;
use crate::host::{Host, IdentityBootstrapper, LicenseChecker};
use crate::lifecycle::state::NodeContext;
use crate::lifecycle::tasks::{DrainReport, TaskSet};
use crate::recording::{JobServiceFactory, RecordingBootstrapper};
use crate::relay::topology::run_topology_listener;
use crate::relay::writer::run_signal_writer;
use crate::relay::{RelayBackend, RelayBackendSelector, RelayFactory};

/// External collaborators the node is wired to.
#[derive(Clone)]
pub struct Collaborators {
    pub host: Arc<dyn Host>,
    pub kv: Arc<dyn KvStore>,
    pub config: Arc<dyn ConfigSource>,
    pub relays: Arc<dyn RelayFactory>,
    pub jobs: Arc<dyn JobServiceFactory>,
}

/// Lifecycle phase of an [`Orchestrator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Active,
    Failed,
    Stopped,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Active => "active",
            Phase::Failed => "failed",
            Phase::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// A best-effort teardown step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TeardownStep {
    CloseExternalRelay,
    StopEmbeddedRelay,
    CleanUpState,
    UnregisterCommands,
    TeardownTelemetry,
    RevokeSession,
}

/// What deactivation did. Failures are already logged; this is for inspection.
#[derive(Debug, Clone, Default)]
pub struct TeardownReport {
    /// Steps executed, in order.
    pub attempted: Vec<TeardownStep>,
    /// Steps that failed, with their error.
    pub failures: Vec<(TeardownStep, String)>,
    pub drain: DrainReport,
}

impl TeardownReport {
    fn record<E: fmt::Display>(&mut self, step: TeardownStep, result: Result<(), E>) {
        self.attempted.push(step);
        if let Err(e) = result {
            tracing::error!(step = ?step, error = %e, "Teardown step failed");
            self.failures.push((step, e.to_string()));
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Brings a node up and down.
pub struct Orchestrator {
    deps: Collaborators,
    flags: EnvFlags,
    manifest: Manifest,
    ctx: Arc<NodeContext>,
    tasks: TaskSet,
    phase: Phase,
    commands_registered: bool,
    drain_timeout: Duration,
}

impl Orchestrator {
    pub fn new(deps: Collaborators, flags: EnvFlags, manifest: Manifest) -> Self {
        Self {
            deps,
            flags,
            manifest,
            ctx: NodeContext::new(),
            tasks: TaskSet::new(),
            phase: Phase::Idle,
            commands_registered: false,
            drain_timeout: Duration::from_secs(RuntimeConfig::default().drain_timeout_secs),
        }
    }

    pub fn context(&self) -> Arc<NodeContext> {
        self.ctx.clone()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Names of the background tasks spawned by activation.
    pub fn spawned_tasks(&self) -> &[&'static str] {
        self.tasks.spawned()
    }

    /// The node performs singleton maintenance when it is alone or flagged.
    fn is_single_handler(&self) -> bool {
        !self.deps.host.is_clustered() || self.flags.is_handler
    }

    /// Run the activation sequence. Any error leaves the node inactive.
    pub async fn activate(&mut self) -> NodeResult<()> {
        if self.phase != Phase::Idle {
            tracing::error!(phase = %self.phase, "Activate called on a used node");
            return Err(NodeError::InvalidPhase(self.phase));
        }

        tracing::debug!("Activating");
        match self.run_activation().await {
            Ok(()) => {
                self.phase = Phase::Active;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Activation failed");
                self.roll_back().await;
                self.phase = Phase::Failed;
                Err(e)
            }
        }
    }

    async fn run_activation(&mut self) -> NodeResult<()> {
        if self.flags.disabled {
            tracing::info!("Disable flag is set, exiting");
            return Err(NodeError::Disabled);
        }

        let license = LicenseChecker::new(self.deps.host.clone());

        if self.is_single_handler() {
            clean_up_state(self.deps.kv.as_ref()).await?;
        }

        self.deps.host.register_commands().await?;
        self.commands_registered = true;

        let status = self.deps.host.cluster_status().await?;

        let mut config = self.deps.config.load()?;
        self.drain_timeout = Duration::from_secs(config.runtime.drain_timeout_secs);

        // Managed cloud installs get calls in every channel regardless of the
        // configured default.
        if license.is_cloud() {
            let updated = NodeConfig {
                default_enabled: Some(true),
                ..(*config).clone()
            };
            self.deps.config.store(updated).map_err(NodeError::ConfigOverride)?;
            config = self.deps.config.current();
        }

        let mutex = ClusterMutex::new(
            self.deps.kv.clone(),
            IDENTITY_MUTEX,
            Duration::from_secs(config.runtime.lock_lease_secs),
        )?;
        let session = IdentityBootstrapper::new(self.deps.host.clone(), mutex, &self.manifest.id)
            .ensure_identity_and_session()
            .await?;
        self.ctx.lock().await.session = Some(session);

        if let Some(pending) =
            RecordingBootstrapper::new(self.deps.jobs.clone()).prepare(&license, &config, &self.manifest)?
        {
            self.tasks.spawn("recording_setup", pending.configure(self.ctx.clone()));
        }

        let backend = RelayBackendSelector::new(self.deps.relays.clone(), license)
            .select(&config)
            .await?;

        {
            let mut state = self.ctx.lock().await;
            state.node_id = Some(status.cluster_id.clone());
            state.backend = Some(backend.clone());
        }

        if let RelayBackend::Embedded(relay) = &backend {
            if self.flags.is_handler {
                let elector = HandlerElector::new(
                    self.deps.kv.clone(),
                    status.cluster_id.clone(),
                    Duration::from_secs(config.runtime.handler_refresh_secs),
                );
                self.tasks.spawn("handler_elector", elector.run(self.ctx.shutdown().clone()));
            }

            if let Some(outbound) = relay.server.take_outbound() {
                self.tasks.spawn(
                    "signal_writer",
                    run_signal_writer(self.deps.host.clone(), outbound, self.ctx.shutdown().clone()),
                );
            } else {
                tracing::warn!("Relay server exposes no outbound channel, signal writer not started");
            }
        }

        self.tasks.spawn(
            "topology_listener",
            run_topology_listener(self.ctx.clone(), self.deps.host.cluster_events()),
        );

        tracing::info!(cluster_id = %status.cluster_id, backend = ?backend.kind(), "Activated");
        Ok(())
    }

    /// Discard what a failed activation created in-process.
    async fn roll_back(&mut self) {
        if !self.tasks.is_empty() {
            self.ctx.shutdown().fire();
            self.tasks.drain(self.drain_timeout).await;
        }

        let session = {
            let mut state = self.ctx.lock().await;
            state.recording = None;
            state.session.take()
        };
        if let Some(session) = session {
            if let Err(e) = self.deps.host.revoke_session(&session.id).await {
                tracing::error!(error = %e, "Failed to revoke session after failed activation");
            }
        }

        if self.commands_registered {
            if let Err(e) = self.deps.host.unregister_commands().await {
                tracing::error!(error = %e, "Failed to unregister commands after failed activation");
            }
            self.commands_registered = false;
        }
    }

    /// Tear the node down. Never fails; problems are logged and reported.
    pub async fn deactivate(&mut self) -> TeardownReport {
        let mut report = TeardownReport::default();
        if self.phase != Phase::Active {
            tracing::warn!(phase = %self.phase, "Deactivate called on inactive node");
            return report;
        }

        tracing::debug!("Deactivating");
        self.ctx.shutdown().fire();

        let backend = self.ctx.lock().await.backend.take();
        match backend {
            Some(RelayBackend::External(relay)) => {
                report.record(TeardownStep::CloseExternalRelay, relay.manager.close().await);
            }
            Some(RelayBackend::Embedded(relay)) => {
                report.record(TeardownStep::StopEmbeddedRelay, relay.server.stop().await);
            }
            None => {}
        }

        if self.is_single_handler() {
            let cleaned = clean_up_state(self.deps.kv.as_ref()).await.map(|_| ());
            report.record(TeardownStep::CleanUpState, cleaned);
        }

        report.record(TeardownStep::UnregisterCommands, self.deps.host.unregister_commands().await);
        self.commands_registered = false;

        report.record(TeardownStep::TeardownTelemetry, self.deps.host.teardown_telemetry().await);

        let session = self.ctx.lock().await.session.take();
        if let Some(session) = session {
            report.record(TeardownStep::RevokeSession, self.deps.host.revoke_session(&session.id).await);
        }

        report.drain = self.tasks.drain(self.drain_timeout).await;

        {
            let mut state = self.ctx.lock().await;
            state.recording = None;
            state.node_id = None;
        }

        self.phase = Phase::Stopped;
        tracing::info!(failed_steps = report.failures.len(), "Deactivated");
        report
    }
}
