//! Cluster topology listener.
//!
//! Forwards inter-node events to whichever relay backend is active. A failed
//! forward affects only that event; the listener keeps running until shutdown
//! or until the host closes the event stream.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};

use crate::host::ClusterEvent;
use crate::lifecycle::state::NodeContext;

pub async fn run_topology_listener(ctx: Arc<NodeContext>, mut events: broadcast::Receiver<ClusterEvent>) {
    tracing::debug!("Cluster events handler starting");

    loop {
        tokio::select! {
            biased;
            _ = ctx.shutdown().fired() => {
                tracing::debug!("Cluster events handler received shutdown signal, exiting loop");
                break;
            }
            event = events.recv() => match event {
                Ok(event) => forward(&ctx, event).await,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Cluster events handler lagging, events dropped");
                }
                Err(RecvError::Closed) => {
                    tracing::debug!("Cluster event stream closed");
                    break;
                }
            },
        }
    }
}

async fn forward(ctx: &NodeContext, event: ClusterEvent) {
    let Some(backend) = ctx.backend().await else {
        tracing::debug!(kind = %event.kind, "No active relay backend, dropping cluster event");
        return;
    };

    let kind = event.kind.clone();
    let sender = event.sender_id.clone();
    if let Err(e) = backend.handle_cluster_event(event).await {
        tracing::error!(kind = %kind, sender = %sender, error = %e, "Failed to handle cluster event");
    }
}
