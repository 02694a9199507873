//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → source.rs (ArcSwap<NodeConfig>, read by activation)
//!
//! env.rs:      CALLS_NODE_DISABLE / CALLS_NODE_IS_HANDLER
//! manifest.rs: static deployment metadata (recorder image version)
//! ```
//!
//! # Design Decisions
//! - Config is read once per activation; backend selection is only re-evaluated on restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod env;
pub mod loader;
pub mod manifest;
pub mod schema;
pub mod source;
pub mod validation;

pub use env::EnvFlags;
pub use loader::ConfigError;
pub use manifest::Manifest;
pub use schema::{IceServerConfig, NodeConfig, ObservabilityConfig, RuntimeConfig};
pub use source::{ConfigSource, FileConfigSource, StaticConfigSource};
