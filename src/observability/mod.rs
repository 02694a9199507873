//! Observability subsystem.
//!
//! Logging only. Every subsystem emits `tracing` events with structured
//! fields; `logging.rs` decides where they go.

pub mod logging;

pub use logging::init_logging;
