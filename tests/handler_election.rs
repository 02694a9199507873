//! Handler designation written by an activated maintenance node.

use std::time::Duration;

use calls_node::cluster::handler::{HandlerElector, HANDLER_KEY};
use calls_node::cluster::kv::KvStore;
use calls_node::config::{EnvFlags, NodeConfig, RuntimeConfig};

mod common;

use common::{handler_flags, Harness, CLUSTER_ID};

fn config() -> NodeConfig {
    NodeConfig {
        runtime: RuntimeConfig {
            handler_refresh_secs: 10,
            ..Default::default()
        },
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_designation_refreshed_until_shutdown() {
    let harness = Harness::new(config());
    let mut node = harness.orchestrator(handler_flags());
    node.activate().await.unwrap();
    assert!(node.spawned_tasks().contains(&"handler_elector"));

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(harness.kv.handler_writes(), 1);

    let designation = HandlerElector::current_handler(harness.kv.as_ref(), Duration::from_secs(30))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(designation.cluster_id, CLUSTER_ID);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(harness.kv.handler_writes(), 2);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(harness.kv.handler_writes(), 3);

    node.deactivate().await;
    let writes = harness.kv.handler_writes();

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(harness.kv.handler_writes(), writes);
}

#[tokio::test]
async fn test_no_designation_without_flag() {
    let harness = Harness::new(config());
    let mut node = harness.orchestrator(EnvFlags::default());
    node.activate().await.unwrap();

    tokio::task::yield_now().await;

    assert!(!node.spawned_tasks().contains(&"handler_elector"));
    assert_eq!(harness.kv.handler_writes(), 0);
    assert!(harness.kv.get(HANDLER_KEY).await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_failed_write_stops_refreshing() {
    let harness = Harness::new(config());
    let mut node = harness.orchestrator(handler_flags());
    node.activate().await.unwrap();

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(harness.kv.handler_writes(), 1);

    harness.kv.fail_writes(true);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(harness.kv.handler_writes(), 2);

    tokio::time::sleep(Duration::from_secs(100)).await;
    assert_eq!(harness.kv.handler_writes(), 2);

    let report = node.deactivate().await;
    assert!(report.drain.finished.contains(&"handler_elector"));
}
