//! Outbound signaling pump for the embedded relay.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::host::{Host, SignalMessage};
use crate::lifecycle::shutdown::ShutdownSignal;

/// Drain the server's outbound queue into the host's realtime channel.
///
/// A message the host refuses is logged and dropped; later messages still go
/// out.
pub async fn run_signal_writer(
    host: Arc<dyn Host>,
    mut outbound: mpsc::Receiver<SignalMessage>,
    shutdown: ShutdownSignal,
) {
    loop {
        tokio::select! {
            biased;
            _ = shutdown.fired() => {
                tracing::debug!("Signal writer received shutdown signal, exiting loop");
                break;
            }
            message = outbound.recv() => {
                let Some(message) = message else {
                    tracing::debug!("Relay outbound channel closed");
                    break;
                };
                let session_id = message.session_id.clone();
                if let Err(e) = host.publish_signal(message).await {
                    tracing::error!(session_id = %session_id, error = %e, "Failed to send realtime message");
                }
            }
        }
    }
}
