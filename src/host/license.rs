//! Entitlement checks.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::host::Host;

/// Capability flags granted by the host license.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    /// Call recordings may be enabled.
    pub recordings: bool,
    /// Media relaying may be delegated to an external service.
    pub relay_delegation: bool,
    /// Installation is a managed cloud deployment.
    pub cloud: bool,
}

/// Answers capability questions from the host's current license.
///
/// The license is re-read on every question so a license change is picked up
/// without reactivation.
#[derive(Clone)]
pub struct LicenseChecker {
    host: Arc<dyn Host>,
}

impl LicenseChecker {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self { host }
    }

    pub fn recordings_allowed(&self) -> bool {
        self.host.license().is_some_and(|l| l.recordings)
    }

    pub fn relay_delegation_allowed(&self) -> bool {
        self.host.license().is_some_and(|l| l.relay_delegation)
    }

    pub fn is_cloud(&self) -> bool {
        self.host.license().is_some_and(|l| l.cloud)
    }
}
