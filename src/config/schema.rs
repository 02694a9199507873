//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a calls node.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for a calls node.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct NodeConfig {
    /// Whether calls are enabled in every channel by default.
    pub default_enabled: Option<bool>,

    /// Enable call recordings.
    pub enable_recordings: bool,

    /// Endpoint of the job service running recordings.
    pub job_service_url: String,

    /// Endpoint of an external relay service. Empty means embedded relay.
    pub rtcd_url: String,

    /// UDP address the embedded relay listens on (empty = all interfaces).
    pub udp_server_address: String,

    /// TCP address the embedded relay listens on (empty = all interfaces).
    pub tcp_server_address: String,

    /// UDP port for ICE traffic.
    pub udp_server_port: u16,

    /// TCP port for ICE traffic.
    pub tcp_server_port: u16,

    /// Host (IP or name) advertised in ICE candidates instead of the local one.
    pub ice_host_override: String,

    /// STUN/TURN servers handed to clients.
    pub ice_servers: Vec<IceServerConfig>,

    /// Generate short-lived TURN credentials from a static secret.
    pub server_side_turn: bool,

    /// Static secret used when `server_side_turn` is on.
    pub turn_static_auth_secret: String,

    /// Lifetime of generated TURN credentials.
    pub turn_credentials_expiration_minutes: u32,

    /// Listen on IPv6 as well.
    pub enable_ipv6: bool,

    /// Lifecycle tuning.
    pub runtime: RuntimeConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            default_enabled: Some(false),
            enable_recordings: false,
            job_service_url: String::new(),
            rtcd_url: String::new(),
            udp_server_address: String::new(),
            tcp_server_address: String::new(),
            udp_server_port: 8443,
            tcp_server_port: 8443,
            ice_host_override: String::new(),
            ice_servers: Vec::new(),
            server_side_turn: false,
            turn_static_auth_secret: String::new(),
            turn_credentials_expiration_minutes: 1440,
            enable_ipv6: false,
            runtime: RuntimeConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl NodeConfig {
    pub fn recordings_enabled(&self) -> bool {
        self.enable_recordings
    }

    /// External relay endpoint, if one is configured.
    pub fn rtcd_endpoint(&self) -> Option<&str> {
        let url = self.rtcd_url.trim();
        (!url.is_empty()).then_some(url)
    }
}

/// A STUN or TURN server entry.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Default)]
pub struct IceServerConfig {
    /// Server URLs (e.g., "stun:stun.example.com:3478").
    pub urls: Vec<String>,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub credential: String,
}

/// Timing knobs for the lifecycle machinery.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Interval between handler designation refreshes in seconds.
    pub handler_refresh_secs: u64,

    /// Lease of a cluster mutex in seconds.
    pub lock_lease_secs: u64,

    /// Time allowed for background tasks to exit on deactivation.
    pub drain_timeout_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            handler_refresh_secs: 10,
            lock_lease_secs: 15,
            drain_timeout_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON lines instead of human readable logs.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
