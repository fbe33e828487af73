//! Hivemind worker entry point.
//!
//! Launched by supervisord with `--spec <path>` pointing at the file
//! generated at agent-creation time. Initialises tracing, loads the
//! spec, builds the orchestrator, and runs the event loop until
//! interrupted.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use hivemind_worker::orchestrator::{AgentCliBackend, Orchestrator};
use hivemind_worker::runtime;
use hivemind_worker::spec::WorkerSpec;

#[derive(Parser)]
#[command(name = "hivemind-worker", version)]
struct Args {
    /// Path to the worker spec file
    #[arg(long)]
    spec: PathBuf,

    /// Message bus URL
    #[arg(
        long,
        env = "HIVEMIND_REDIS_URL",
        default_value = "redis://127.0.0.1:6379"
    )]
    redis_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let spec = WorkerSpec::load(&args.spec)?;
    tracing::info!(agent = %spec.agent, channel = %spec.channel, "worker starting");

    let backend = AgentCliBackend::from_config(&spec.config);
    let orchestrator = Orchestrator::new(&spec.agent, &spec.subagents, backend);
    runtime::run(&spec, &args.redis_url, &orchestrator).await
}
