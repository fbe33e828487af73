//! Agent lifecycle commands.
//!
//! Thin wiring layer: parse arguments, assemble the manager from the
//! loaded configuration, call one lifecycle operation and render its
//! result. All decisions live in [`crate::manager`].

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;

use hivemind_common::{AgentConfig, LifecycleError};

use crate::command_runner::TokioCommandRunner;
use crate::config::ManagerConfig;
use crate::manager::AgentManager;
use crate::output::{OutputContext, format_error};
use crate::supervisor::Supervisorctl;

/// Agent subcommands.
#[derive(Subcommand)]
pub enum AgentCommand {
    /// Generate worker artifacts from an agent config file
    Create {
        /// Path to the agent config JSON file
        file: PathBuf,
    },
    /// Register with supervisord and start the worker
    Start {
        /// Agent name
        name: String,
        /// Owner the agent belongs to
        #[arg(long)]
        owner: Option<String>,
    },
    /// Stop the worker (artifacts are kept)
    Stop {
        /// Agent name
        name: String,
        /// Owner the agent belongs to
        #[arg(long)]
        owner: Option<String>,
    },
    /// Stop the worker and remove its artifacts
    Delete {
        /// Agent name
        name: String,
        /// Owner the agent belongs to
        #[arg(long)]
        owner: Option<String>,
    },
    /// List agents with their supervisor state
    List {
        /// Only show agents belonging to this owner
        #[arg(long)]
        owner: Option<String>,
    },
    /// Show status details for one agent
    Get {
        /// Agent name
        name: String,
        /// Owner the agent belongs to
        #[arg(long)]
        owner: Option<String>,
    },
}

/// Execute an agent subcommand.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or the
/// lifecycle operation fails.
pub async fn run(ctx: &OutputContext, cmd: AgentCommand) -> Result<()> {
    let config = ManagerConfig::load()?;
    let supervisor = Supervisorctl::new(
        TokioCommandRunner::default(),
        config.supervisorctl_bin.clone(),
        config.supervisor_conf.clone(),
    );
    let manager = AgentManager::new(&config, supervisor);

    match cmd {
        AgentCommand::Create { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("cannot read agent config {}", file.display()))?;
            let agent: AgentConfig = serde_json::from_str(&raw)
                .with_context(|| format!("invalid agent config {}", file.display()))?;
            let created = manager.create(&agent).await.map_err(|e| fail(ctx, e))?;
            if ctx.json {
                ctx.emit_json(&created);
            } else {
                ctx.success(&created.message);
                ctx.kv("spec", &created.spec_path);
                ctx.kv("stanza", &created.stanza_path);
            }
        }
        AgentCommand::Start { name, owner } => {
            let started = manager
                .start(owner.as_deref(), &name)
                .await
                .map_err(|e| fail(ctx, e))?;
            if ctx.json {
                ctx.emit_json(&started);
            } else {
                ctx.success(&started.message);
                ctx.kv("status", &started.status.to_string());
            }
        }
        AgentCommand::Stop { name, owner } => {
            let message = manager
                .stop(owner.as_deref(), &name)
                .await
                .map_err(|e| fail(ctx, e))?;
            if ctx.json {
                ctx.emit_json(&serde_json::json!({ "message": message }));
            } else {
                ctx.success(&message);
            }
        }
        AgentCommand::Delete { name, owner } => {
            let message = manager
                .delete(owner.as_deref(), &name)
                .await
                .map_err(|e| fail(ctx, e))?;
            if ctx.json {
                ctx.emit_json(&serde_json::json!({ "message": message }));
            } else {
                ctx.success(&message);
            }
        }
        AgentCommand::List { owner } => {
            let summaries = manager.list(owner.as_deref()).await.map_err(|e| fail(ctx, e))?;
            if ctx.json {
                ctx.emit_json(&summaries);
            } else if summaries.is_empty() {
                ctx.warn("no agents found");
            } else {
                ctx.header("agents");
                for summary in &summaries {
                    let pid = summary
                        .pid
                        .map_or_else(String::new, |pid| format!(" pid {pid}"));
                    let file_note = if summary.file_exists { "" } else { " (no file)" };
                    ctx.kv(
                        &summary.agent,
                        &format!("{}{pid}{file_note}", summary.status),
                    );
                }
            }
        }
        AgentCommand::Get { name, owner } => {
            let details = manager
                .get(owner.as_deref(), &name)
                .await
                .map_err(|e| fail(ctx, e))?;
            if ctx.json {
                ctx.emit_json(&details);
            } else {
                ctx.header(&details.name);
                if let Some(owner) = &details.owner {
                    ctx.kv("owner", owner);
                }
                ctx.kv("status", &details.status.to_string());
                ctx.kv("file", &details.file);
            }
        }
    }
    Ok(())
}

/// Render a lifecycle failure (JSON error object in `--json` mode)
/// and convert it for propagation.
fn fail(ctx: &OutputContext, err: LifecycleError) -> anyhow::Error {
    if ctx.json {
        println!("{}", format_error(&err.to_string(), error_code(&err)));
    }
    err.into()
}

fn error_code(err: &LifecycleError) -> &'static str {
    match err {
        LifecycleError::Conflict { .. } => "CONFLICT",
        LifecycleError::NotFound { .. } => "NOT_FOUND",
        LifecycleError::InvalidName(_) => "INVALID_NAME",
        LifecycleError::SupervisorSyncFailed { .. } => "SUPERVISOR_SYNC_FAILED",
        LifecycleError::StartFailed { .. } => "START_FAILED",
        LifecycleError::StopFailed { .. } => "STOP_FAILED",
        LifecycleError::Template(_) => "TEMPLATE",
        LifecycleError::Store(_) => "STORE",
        LifecycleError::Supervisor(_) => "SUPERVISOR_UNAVAILABLE",
    }
}
