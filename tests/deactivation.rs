//! Best-effort teardown against scripted collaborators.

use std::sync::atomic::Ordering;

use calls_node::cluster::kv::KvStore;
use calls_node::config::{EnvFlags, NodeConfig};
use calls_node::lifecycle::TeardownStep;
use calls_node::Phase;

mod common;

use common::{full_license, handler_flags, Harness};

#[tokio::test]
async fn test_embedded_teardown_order() {
    let harness = Harness::new(NodeConfig::default());
    let mut node = harness.orchestrator(EnvFlags::default());
    node.activate().await.unwrap();

    let report = node.deactivate().await;

    assert!(report.is_clean());
    assert_eq!(
        report.attempted,
        vec![
            TeardownStep::StopEmbeddedRelay,
            TeardownStep::CleanUpState,
            TeardownStep::UnregisterCommands,
            TeardownStep::TeardownTelemetry,
            TeardownStep::RevokeSession,
        ]
    );
    assert_eq!(report.drain.aborted, 0);
    assert_eq!(report.drain.finished.len(), 2);

    assert!(harness.relays.servers()[0].stopped.load(Ordering::SeqCst));
    assert_eq!(harness.host.inner.session_count(), 0);
    assert!(!harness.host.inner.commands_registered());
    assert_eq!(node.phase(), Phase::Stopped);

    let snapshot = node.context().snapshot().await;
    assert!(snapshot.shutdown_fired);
    assert!(snapshot.backend.is_none());
    assert!(snapshot.node_id.is_none());
    assert!(snapshot.session_id.is_none());
}

#[tokio::test]
async fn test_external_teardown_closes_delegate() {
    let config = NodeConfig {
        rtcd_url: "relay.example:8443".into(),
        ..Default::default()
    };
    let harness = Harness::new(config).with_license(full_license());
    harness.host.inner.set_clustered(true);
    let mut node = harness.orchestrator(EnvFlags::default());
    node.activate().await.unwrap();

    let report = node.deactivate().await;

    assert!(report.is_clean());
    assert_eq!(report.attempted[0], TeardownStep::CloseExternalRelay);
    assert!(!report.attempted.contains(&TeardownStep::StopEmbeddedRelay));
    assert!(!report.attempted.contains(&TeardownStep::CleanUpState));
    assert!(harness.relays.delegates()[0].closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_every_step_runs_despite_failures() {
    let harness = Harness::new(NodeConfig::default());
    harness.relays.fail_stop.store(true, Ordering::SeqCst);
    let mut node = harness.orchestrator(handler_flags());
    node.activate().await.unwrap();

    harness.kv.fail_list(true);
    harness.host.fail("unregister_commands");
    harness.host.fail("teardown_telemetry");
    harness.host.fail("revoke_session");

    let report = node.deactivate().await;

    let failed: Vec<_> = report.failures.iter().map(|(step, _)| *step).collect();
    assert_eq!(
        failed,
        vec![
            TeardownStep::StopEmbeddedRelay,
            TeardownStep::CleanUpState,
            TeardownStep::UnregisterCommands,
            TeardownStep::TeardownTelemetry,
            TeardownStep::RevokeSession,
        ]
    );
    assert_eq!(report.attempted.len(), 5);
    assert_eq!(report.drain.aborted, 0);
    assert_eq!(node.phase(), Phase::Stopped);
    assert!(node.context().snapshot().await.backend.is_none());
}

#[tokio::test]
async fn test_call_state_cleared_on_teardown() {
    let harness = Harness::new(NodeConfig::default());
    let mut node = harness.orchestrator(EnvFlags::default());
    node.activate().await.unwrap();

    harness.kv.set("call_channel1", b"{}".to_vec(), None).await.unwrap();
    node.deactivate().await;

    assert!(harness.kv.get("call_channel1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_deactivate_without_activation_is_noop() {
    let harness = Harness::new(NodeConfig::default());
    let mut node = harness.orchestrator(EnvFlags::default());

    let report = node.deactivate().await;

    assert!(report.attempted.is_empty());
    assert_eq!(node.phase(), Phase::Idle);
    assert!(harness.host.calls().is_empty());
    assert!(!node.context().snapshot().await.shutdown_fired);
}

#[tokio::test]
async fn test_second_deactivate_is_noop() {
    let harness = Harness::new(NodeConfig::default());
    let mut node = harness.orchestrator(EnvFlags::default());
    node.activate().await.unwrap();

    node.deactivate().await;
    let calls = harness.host.calls().len();
    let report = node.deactivate().await;

    assert!(report.attempted.is_empty());
    assert_eq!(harness.host.calls().len(), calls);
}

#[tokio::test]
async fn test_recording_cleared_on_teardown() {
    let config = NodeConfig {
        enable_recordings: true,
        job_service_url: "http://jobs.local:8045".into(),
        ..Default::default()
    };
    let harness = Harness::new(config).with_license(full_license());
    let mut node = harness.orchestrator(EnvFlags::default());
    node.activate().await.unwrap();

    let report = node.deactivate().await;

    assert!(report.drain.finished.contains(&"recording_setup"));
    assert!(node.context().snapshot().await.recording_image.is_none());
}
