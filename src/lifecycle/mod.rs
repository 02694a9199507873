//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Activation (orchestrator.rs):
//!     Flags → License → Config → Identity → Recording → Relay → Background tasks
//!
//! Deactivation (orchestrator.rs):
//!     Fire shutdown → Stop relay → Cleanup → Revoke session → Drain tasks
//!
//! Shared (state.rs, shutdown.rs, tasks.rs):
//!     NodeContext { Mutex<NodeState>, ShutdownSignal } + TaskSet
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → deactivate the standalone node
//! ```
//!
//! # Design Decisions
//! - Ordered activation, fail fast: any step error aborts and is returned
//! - Reverse deactivation, best effort: every step runs, errors are logged
//! - One shutdown signal is the only cancellation mechanism
//! - Drain has a deadline: stragglers are aborted

pub mod orchestrator;
pub mod shutdown;
pub mod signals;
pub mod state;
pub mod tasks;

pub use orchestrator::{Collaborators, Orchestrator, Phase, TeardownReport, TeardownStep};
pub use shutdown::ShutdownSignal;
pub use state::{NodeContext, NodeSnapshot, NodeState};
pub use tasks::{DrainReport, TaskSet};
