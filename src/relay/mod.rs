//! Media relay backend subsystem.
//!
//! # Data Flow
//! ```text
//! NodeConfig + LicenseChecker
//!     → selector.rs (choose exactly one backend)
//!     → types.rs    (RelayBackend::Embedded | RelayBackend::External)
//!     → published into NodeState
//!
//! Background:
//!     topology.rs: host cluster events → active backend
//!     writer.rs:   embedded server outbound signaling → host
//! ```
//!
//! # Design Decisions
//! - The two backends never coexist within one process lifetime
//! - Selection is re-evaluated only on restart
//! - The relay engine and the external service protocol stay behind traits

pub mod selector;
pub mod topology;
pub mod types;
pub mod writer;

pub use selector::RelayBackendSelector;
pub use types::{
    BackendKind, EmbeddedRelay, ExternalRelay, RelayBackend, RelayDelegate, RelayError, RelayFactory,
    RelayServer, RelayServerConfig, TurnConfig,
};
