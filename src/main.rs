//! Calls node
//!
//! Runs a single node with in-process collaborators.
//!
//! # Architecture Overview
//!
//! ```text
//!   config.toml ──▶ FileConfigSource ─┐
//!   manifest.json ──▶ Manifest ───────┤
//!   CALLS_NODE_* env ──▶ EnvFlags ────┤
//!                                     ▼
//!   ┌──────────────────────────────────────────────────────────┐
//!   │                      Orchestrator                        │
//!   │                                                          │
//!   │  activate:   license → identity → recording → relay      │
//!   │                                    │                     │
//!   │                                    ▼                     │
//!   │  tasks:  handler elector, topology listener, writer      │
//!   │                                                          │
//!   │  deactivate: shutdown → relay → cleanup → drain          │
//!   └───────┬─────────────┬──────────────┬──────────────┬──────┘
//!           ▼             ▼              ▼              ▼
//!       LocalHost     MemoryKv   LocalRelayFactory   LocalJobs
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use calls_node::config::{ConfigSource, EnvFlags, FileConfigSource, Manifest};
use calls_node::lifecycle::signals::wait_for_termination;
use calls_node::local::{LocalHost, LocalJobs, LocalRelayFactory, MemoryKv};
use calls_node::observability::init_logging;
use calls_node::{Collaborators, Orchestrator};

#[derive(Parser)]
#[command(name = "calls-node")]
#[command(about = "Standalone calls node", long_about = None)]
struct Cli {
    /// Node configuration (TOML)
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Plugin manifest (JSON)
    #[arg(short, long, default_value = "plugin.json")]
    manifest: PathBuf,

    /// Identifier this node reports in cluster status
    #[arg(long, default_value = "standalone")]
    cluster_id: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let source = Arc::new(FileConfigSource::new(&cli.config));
    let config = source.load()?;
    init_logging(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "calls-node starting");

    let manifest = Manifest::load(&cli.manifest)?;
    tracing::info!(id = %manifest.id, version = %manifest.version, "Manifest loaded");

    let deps = Collaborators {
        host: Arc::new(LocalHost::new(cli.cluster_id)),
        kv: Arc::new(MemoryKv::new()),
        config: source,
        relays: Arc::new(LocalRelayFactory),
        jobs: Arc::new(LocalJobs::new()),
    };

    let mut node = Orchestrator::new(deps, EnvFlags::from_env(), manifest);
    node.activate().await?;

    wait_for_termination().await;

    let report = node.deactivate().await;
    if !report.is_clean() {
        tracing::warn!(failures = report.failures.len(), "Shutdown completed with errors");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
