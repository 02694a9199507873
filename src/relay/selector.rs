//! Relay backend selection.
//!
//! # Decision
//! ```text
//! rtcd_url set AND license allows delegation
//!     → External: build delegate for rtcd_url (embedded server never built)
//! otherwise
//!     → Embedded: build RelayServerConfig → construct server → start
//! ```
//!
//! Selection runs once per activation. Either branch is final; a failed
//! construction or start aborts activation and the half-built server is dropped.

use std::sync::Arc;

use crate::config::NodeConfig;
use crate::host::LicenseChecker;
use crate::relay::types::{
    EmbeddedRelay, ExternalRelay, RelayBackend, RelayError, RelayFactory, RelayServerConfig,
};

pub struct RelayBackendSelector {
    factory: Arc<dyn RelayFactory>,
    license: LicenseChecker,
}

impl RelayBackendSelector {
    pub fn new(factory: Arc<dyn RelayFactory>, license: LicenseChecker) -> Self {
        Self { factory, license }
    }

    pub async fn select(&self, config: &NodeConfig) -> Result<RelayBackend, RelayError> {
        if let Some(endpoint) = config.rtcd_endpoint() {
            if self.license.relay_delegation_allowed() {
                let manager = self.factory.new_delegate(endpoint).await?;
                tracing::debug!(endpoint = %endpoint, "rtcd client manager initialized successfully");
                return Ok(RelayBackend::External(ExternalRelay {
                    endpoint: endpoint.to_string(),
                    manager,
                }));
            }
            tracing::warn!(
                endpoint = %endpoint,
                "rtcd_url is set but the license does not allow delegation, using embedded relay"
            );
        }

        let server_config = RelayServerConfig::from_config(config);
        let server = self.factory.new_server(&server_config)?;
        server.start().await?;

        tracing::info!(
            udp_port = server_config.udp_port,
            tcp_port = server_config.tcp_port,
            ipv6 = server_config.enable_ipv6,
            "Embedded relay server started"
        );
        Ok(RelayBackend::Embedded(EmbeddedRelay {
            config: server_config,
            server,
        }))
    }
}
