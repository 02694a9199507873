//! Service identity bootstrap.
//!
//! Every node runs this on activation. The cluster mutex makes the
//! look-up-or-create step exactly-once across the cluster, while each node
//! still mints its own non-expiring session.

use std::sync::Arc;

use crate::cluster::mutex::ClusterMutex;
use crate::error::NodeError;
use crate::host::{Host, ServiceIdentitySpec, Session};

/// Name of the cluster mutex guarding identity creation.
pub const IDENTITY_MUTEX: &str = "ensure_identity";

pub struct IdentityBootstrapper {
    host: Arc<dyn Host>,
    mutex: ClusterMutex,
    spec: ServiceIdentitySpec,
}

impl IdentityBootstrapper {
    pub fn new(host: Arc<dyn Host>, mutex: ClusterMutex, owner_id: &str) -> Self {
        Self {
            host,
            mutex,
            spec: ServiceIdentitySpec {
                username: "calls".to_string(),
                display_name: "Calls".to_string(),
                description: "Calls Bot".to_string(),
                owner_id: owner_id.to_string(),
            },
        }
    }

    /// Ensure the singleton identity exists and mint a session for it.
    pub async fn ensure_identity_and_session(&self) -> Result<Session, NodeError> {
        let guard = self.mutex.lock().await?;

        let result = self.ensure_locked().await;

        // Release on every path; a failed release only matters if nothing else failed.
        let released = guard.release().await;
        let session = result?;
        if let Err(e) = released {
            if let Err(revoke) = self.host.revoke_session(&session.id).await {
                tracing::error!(error = %revoke, "Failed to revoke session after lock release error");
            }
            return Err(e.into());
        }

        tracing::debug!(identity_id = %session.identity_id, "Service session created");
        Ok(session)
    }

    async fn ensure_locked(&self) -> Result<Session, NodeError> {
        let identity_id = self.host.ensure_identity(&self.spec).await?;
        let session = self.host.create_session(&identity_id, None).await?;
        Ok(session)
    }
}
