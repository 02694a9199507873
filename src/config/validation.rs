//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ports, lifetimes, intervals)
//! - Check feature prerequisites (recordings need a job service, TURN needs a secret)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: NodeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::NodeConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} must be at most {max}")]
    TooLarge { field: &'static str, max: u64 },

    #[error("{field} is not a valid URL: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field} is not a valid IP address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("recordings are enabled but job_service_url is empty")]
    MissingJobService,

    #[error("server side TURN is enabled but turn_static_auth_secret is empty")]
    MissingTurnSecret,

    #[error("ICE server #{index} has no URLs")]
    EmptyIceServer { index: usize },

    #[error("ICE server URL must use stun:, turn: or turns: scheme: {0}")]
    InvalidIceUrl(String),
}

/// Upper bound for runtime intervals, in seconds.
pub const MAX_RUNTIME_SECS: u64 = 3600;

/// Validate a node configuration, collecting every error found.
pub fn validate_config(config: &NodeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.udp_server_port == 0 {
        errors.push(ValidationError::Zero { field: "udp_server_port" });
    }
    if config.tcp_server_port == 0 {
        errors.push(ValidationError::Zero { field: "tcp_server_port" });
    }
    if config.turn_credentials_expiration_minutes == 0 {
        errors.push(ValidationError::Zero { field: "turn_credentials_expiration_minutes" });
    }
    if config.runtime.handler_refresh_secs == 0 {
        errors.push(ValidationError::Zero { field: "runtime.handler_refresh_secs" });
    }
    if config.runtime.lock_lease_secs == 0 {
        errors.push(ValidationError::Zero { field: "runtime.lock_lease_secs" });
    }
    check_at_most(&mut errors, "runtime.handler_refresh_secs", config.runtime.handler_refresh_secs);
    check_at_most(&mut errors, "runtime.lock_lease_secs", config.runtime.lock_lease_secs);
    check_at_most(&mut errors, "runtime.drain_timeout_secs", config.runtime.drain_timeout_secs);

    check_address(&mut errors, "udp_server_address", &config.udp_server_address);
    check_address(&mut errors, "tcp_server_address", &config.tcp_server_address);

    if let Some(endpoint) = config.rtcd_endpoint() {
        check_url(&mut errors, "rtcd_url", endpoint);
    }

    if config.enable_recordings {
        if config.job_service_url.trim().is_empty() {
            errors.push(ValidationError::MissingJobService);
        } else {
            check_url(&mut errors, "job_service_url", config.job_service_url.trim());
        }
    }

    if config.server_side_turn && config.turn_static_auth_secret.is_empty() {
        errors.push(ValidationError::MissingTurnSecret);
    }

    for (index, server) in config.ice_servers.iter().enumerate() {
        if server.urls.is_empty() {
            errors.push(ValidationError::EmptyIceServer { index });
        }
        for url in &server.urls {
            let scheme_ok = ["stun:", "turn:", "turns:"].iter().any(|s| url.starts_with(s));
            if !scheme_ok {
                errors.push(ValidationError::InvalidIceUrl(url.clone()));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_at_most(errors: &mut Vec<ValidationError>, field: &'static str, value: u64) {
    if value > MAX_RUNTIME_SECS {
        errors.push(ValidationError::TooLarge {
            field,
            max: MAX_RUNTIME_SECS,
        });
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if Url::parse(value).is_err() {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if !value.is_empty() && value.parse::<std::net::IpAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
