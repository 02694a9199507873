//! Cluster-aware lifecycle orchestration for a real-time calls node.

pub mod cluster;
pub mod config;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod local;
pub mod observability;
pub mod recording;
pub mod relay;

pub use config::schema::NodeConfig;
pub use error::{NodeError, NodeResult};
pub use lifecycle::{Collaborators, Orchestrator, Phase, ShutdownSignal};
