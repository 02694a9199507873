//! In-process collaborators.
//!
//! Used by the standalone `calls-node` binary and by tests. Every type here
//! implements one of the collaborator traits without leaving the process.

pub mod host;
pub mod jobs;
pub mod kv;
pub mod relay;

pub use host::LocalHost;
pub use jobs::LocalJobs;
pub use kv::MemoryKv;
pub use relay::{LocalDelegate, LocalRelayFactory, LocalRelayServer};
