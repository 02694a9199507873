//! Shared fixtures for the lifecycle integration tests.
//!
//! Collaborators here wrap the in-process implementations and add call
//! recording and failure injection.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use calls_node::cluster::handler::HANDLER_KEY;
use calls_node::cluster::kv::{KvError, KvStore};
use calls_node::config::{EnvFlags, Manifest, NodeConfig, StaticConfigSource};
use calls_node::host::{
    ClusterEvent, ClusterStatus, Host, HostError, License, ServiceIdentitySpec, Session, SignalMessage,
};
use calls_node::local::{LocalHost, LocalJobs, MemoryKv};
use calls_node::relay::{RelayDelegate, RelayError, RelayFactory, RelayServer, RelayServerConfig};
use calls_node::{Collaborators, Orchestrator};

pub const CLUSTER_ID: &str = "node-a";

pub fn manifest() -> Manifest {
    Manifest {
        id: "com.mattermost.calls".into(),
        version: "1.0.0".into(),
        props: HashMap::from([("calls_recorder_version".to_string(), serde_json::json!("v0.8.0"))]),
    }
}

pub fn full_license() -> License {
    License {
        recordings: true,
        relay_delegation: true,
        cloud: false,
    }
}

pub fn handler_flags() -> EnvFlags {
    EnvFlags {
        disabled: false,
        is_handler: true,
    }
}

// --- Host ---

/// [`LocalHost`] with a call log and per-operation failures.
pub struct ScriptedHost {
    pub inner: LocalHost,
    failing: Mutex<HashSet<&'static str>>,
    calls: Mutex<Vec<&'static str>>,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self {
            inner: LocalHost::new(CLUSTER_ID),
            failing: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn fail(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == operation).count()
    }

    fn enter(&self, operation: &'static str) -> Result<(), HostError> {
        self.calls.lock().unwrap().push(operation);
        if self.failing.lock().unwrap().contains(operation) {
            return Err(HostError::new(operation, "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl Host for ScriptedHost {
    async fn cluster_status(&self) -> Result<ClusterStatus, HostError> {
        self.enter("cluster_status")?;
        self.inner.cluster_status().await
    }

    fn is_clustered(&self) -> bool {
        self.inner.is_clustered()
    }

    fn license(&self) -> Option<License> {
        self.inner.license()
    }

    async fn ensure_identity(&self, spec: &ServiceIdentitySpec) -> Result<String, HostError> {
        self.enter("ensure_identity")?;
        self.inner.ensure_identity(spec).await
    }

    async fn create_session(&self, identity_id: &str, expires_at_ms: Option<u64>) -> Result<Session, HostError> {
        self.enter("create_session")?;
        self.inner.create_session(identity_id, expires_at_ms).await
    }

    async fn revoke_session(&self, session_id: &str) -> Result<(), HostError> {
        self.enter("revoke_session")?;
        self.inner.revoke_session(session_id).await
    }

    async fn register_commands(&self) -> Result<(), HostError> {
        self.enter("register_commands")?;
        self.inner.register_commands().await
    }

    async fn unregister_commands(&self) -> Result<(), HostError> {
        self.enter("unregister_commands")?;
        self.inner.unregister_commands().await
    }

    async fn teardown_telemetry(&self) -> Result<(), HostError> {
        self.enter("teardown_telemetry")?;
        self.inner.teardown_telemetry().await
    }

    fn cluster_events(&self) -> broadcast::Receiver<ClusterEvent> {
        self.inner.cluster_events()
    }

    async fn publish_signal(&self, message: SignalMessage) -> Result<(), HostError> {
        self.enter("publish_signal")?;
        self.inner.publish_signal(message).await
    }
}

// --- KV ---

/// [`MemoryKv`] counting handler designation writes.
#[derive(Default)]
pub struct CountingKv {
    pub inner: MemoryKv,
    handler_writes: AtomicUsize,
    fail_list: AtomicBool,
    fail_writes: AtomicBool,
}

impl CountingKv {
    pub fn handler_writes(&self) -> usize {
        self.handler_writes.load(Ordering::SeqCst)
    }

    pub fn fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    /// Make `set` and `set_if_absent` fail. Attempts are still counted.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_write(&self) -> Result<(), KvError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(KvError::Unavailable("injected failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl KvStore for CountingKv {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), KvError> {
        if key == HANDLER_KEY {
            self.handler_writes.fetch_add(1, Ordering::SeqCst);
        }
        self.check_write()?;
        self.inner.set(key, value, ttl).await
    }

    async fn set_if_absent(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<bool, KvError> {
        self.check_write()?;
        self.inner.set_if_absent(key, value, ttl).await
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: &[u8],
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<bool, KvError> {
        self.inner.compare_and_set(key, expected, value, ttl).await
    }

    async fn compare_and_delete(&self, key: &str, expected: &[u8]) -> Result<bool, KvError> {
        self.inner.compare_and_delete(key, expected).await
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        self.inner.delete(key).await
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, KvError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(KvError::Unavailable("injected failure".into()));
        }
        self.inner.list_keys(prefix).await
    }
}

// --- Relays ---

pub struct ScriptedServer {
    pub config: RelayServerConfig,
    pub started: AtomicBool,
    pub stopped: AtomicBool,
    pub events: AtomicUsize,
    fail_start: bool,
    fail_stop: bool,
    outbound_tx: mpsc::Sender<SignalMessage>,
    outbound_rx: Mutex<Option<mpsc::Receiver<SignalMessage>>>,
}

impl ScriptedServer {
    pub async fn send(&self, session_id: &str) {
        let message = SignalMessage {
            session_id: session_id.to_string(),
            payload: b"{}".to_vec(),
        };
        self.outbound_tx.send(message).await.unwrap();
    }
}

#[async_trait]
impl RelayServer for ScriptedServer {
    async fn start(&self) -> Result<(), RelayError> {
        if self.fail_start {
            return Err(RelayError::Start("port in use".into()));
        }
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<(), RelayError> {
        self.stopped.store(true, Ordering::SeqCst);
        if self.fail_stop {
            return Err(RelayError::Stop("injected failure".into()));
        }
        Ok(())
    }

    fn take_outbound(&self) -> Option<mpsc::Receiver<SignalMessage>> {
        self.outbound_rx.lock().unwrap().take()
    }

    async fn handle_cluster_event(&self, _event: ClusterEvent) -> Result<(), RelayError> {
        self.events.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct ScriptedDelegate {
    pub endpoint: String,
    pub closed: AtomicBool,
    pub events: AtomicUsize,
    fail_close: bool,
}

#[async_trait]
impl RelayDelegate for ScriptedDelegate {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn handle_cluster_event(&self, _event: ClusterEvent) -> Result<(), RelayError> {
        self.events.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<(), RelayError> {
        self.closed.store(true, Ordering::SeqCst);
        if self.fail_close {
            return Err(RelayError::Close("injected failure".into()));
        }
        Ok(())
    }
}

/// Relay factory keeping every backend it built.
#[derive(Default)]
pub struct ScriptedRelays {
    pub fail_start: AtomicBool,
    pub fail_stop: AtomicBool,
    pub fail_close: AtomicBool,
    servers: Mutex<Vec<Arc<ScriptedServer>>>,
    delegates: Mutex<Vec<Arc<ScriptedDelegate>>>,
}

impl ScriptedRelays {
    pub fn servers(&self) -> Vec<Arc<ScriptedServer>> {
        self.servers.lock().unwrap().clone()
    }

    pub fn delegates(&self) -> Vec<Arc<ScriptedDelegate>> {
        self.delegates.lock().unwrap().clone()
    }
}

#[async_trait]
impl RelayFactory for ScriptedRelays {
    fn new_server(&self, config: &RelayServerConfig) -> Result<Arc<dyn RelayServer>, RelayError> {
        let (outbound_tx, outbound_rx) = mpsc::channel(16);
        let server = Arc::new(ScriptedServer {
            config: config.clone(),
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            events: AtomicUsize::new(0),
            fail_start: self.fail_start.load(Ordering::SeqCst),
            fail_stop: self.fail_stop.load(Ordering::SeqCst),
            outbound_tx,
            outbound_rx: Mutex::new(Some(outbound_rx)),
        });
        self.servers.lock().unwrap().push(server.clone());
        Ok(server)
    }

    async fn new_delegate(&self, endpoint: &str) -> Result<Arc<dyn RelayDelegate>, RelayError> {
        let delegate = Arc::new(ScriptedDelegate {
            endpoint: endpoint.to_string(),
            closed: AtomicBool::new(false),
            events: AtomicUsize::new(0),
            fail_close: self.fail_close.load(Ordering::SeqCst),
        });
        self.delegates.lock().unwrap().push(delegate.clone());
        Ok(delegate)
    }
}

// --- Harness ---

pub struct Harness {
    pub host: Arc<ScriptedHost>,
    pub kv: Arc<CountingKv>,
    pub relays: Arc<ScriptedRelays>,
    pub jobs: LocalJobs,
    pub config: Arc<StaticConfigSource>,
}

impl Harness {
    pub fn new(config: NodeConfig) -> Self {
        Self {
            host: Arc::new(ScriptedHost::new()),
            kv: Arc::new(CountingKv::default()),
            relays: Arc::new(ScriptedRelays::default()),
            jobs: LocalJobs::new(),
            config: Arc::new(StaticConfigSource::new(config)),
        }
    }

    pub fn with_license(self, license: License) -> Self {
        self.host.inner.set_license(Some(license));
        self
    }

    pub fn orchestrator(&self, flags: EnvFlags) -> Orchestrator {
        let deps = Collaborators {
            host: self.host.clone(),
            kv: self.kv.clone(),
            config: self.config.clone(),
            relays: self.relays.clone(),
            jobs: Arc::new(self.jobs.clone()),
        };
        Orchestrator::new(deps, flags, manifest())
    }
}

/// Poll `check` until it holds or a second has passed.
pub async fn eventually<F: Fn() -> bool>(check: F) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
