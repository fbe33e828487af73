//! Orchestrator — plans a task across the configured sub-agents by
//! composing one prompt and delegating execution to a backend.
//!
//! The backend is trait-abstracted so the event loop can be tested
//! without spawning the external agent CLI.

use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, warn};

use hivemind_common::SubAgentSpec;

/// Executes one composed prompt and returns the response text.
#[allow(async_fn_in_trait)]
pub trait TaskBackend {
    async fn execute(&self, prompt: &str) -> Result<String>;
}

/// Holds the deduplicated sub-agent roster and composes prompts.
pub struct Orchestrator<B> {
    backend: B,
    agent: String,
    subagents: Vec<SubAgentSpec>,
}

impl<B: TaskBackend> Orchestrator<B> {
    /// Build the orchestrator from the ordered sub-agent list.
    /// Duplicate sub-agent names collapse to the last declaration.
    #[must_use]
    pub fn new(agent: &str, subagents: &[SubAgentSpec], backend: B) -> Self {
        let mut roster: Vec<SubAgentSpec> = Vec::new();
        for spec in subagents {
            if let Some(existing) = roster.iter_mut().find(|s| s.name == spec.name) {
                *existing = spec.clone();
            } else {
                roster.push(spec.clone());
            }
        }
        Self {
            backend,
            agent: agent.to_string(),
            subagents: roster,
        }
    }

    #[must_use]
    pub fn subagent_names(&self) -> Vec<&str> {
        self.subagents.iter().map(|s| s.name.as_str()).collect()
    }

    /// Run one task to completion through the backend.
    ///
    /// # Errors
    ///
    /// Propagates backend failures; callers in the event loop log
    /// them instead of terminating.
    pub async fn orchestrate(&self, task: &str) -> Result<String> {
        let prompt = self.compose_prompt(task);
        debug!(agent = %self.agent, task, "dispatching task");
        self.backend.execute(&prompt).await
    }

    fn compose_prompt(&self, task: &str) -> String {
        let mut prompt = format!(
            "You are '{}', an orchestrator coordinating these sub-agents:\n",
            self.agent
        );
        for spec in &self.subagents {
            prompt.push_str(&format!(
                "- {} (model {}): {}",
                spec.name, spec.model, spec.instruction
            ));
            if !spec.servers.is_empty() {
                prompt.push_str(&format!(" [tools: {}]", spec.servers.join(", ")));
            }
            prompt.push('\n');
        }
        prompt.push_str(
            "\nPlan which sub-agents to involve, then execute the task.\n\nTask: ",
        );
        prompt.push_str(task);
        prompt
    }
}

/// Production backend: shells out to an external agent CLI in
/// one-shot prompt mode and captures its stdout as the response.
pub struct AgentCliBackend {
    bin: String,
    args: Vec<String>,
    workdir: Option<PathBuf>,
}

impl AgentCliBackend {
    /// Build from the spec's opaque config blob. Recognized keys:
    /// `command` (default `claude`), `args` (default `["-p"]`),
    /// `workdir`. Everything else in the blob is ignored here.
    #[must_use]
    pub fn from_config(config: &Value) -> Self {
        let bin = config
            .get("command")
            .and_then(Value::as_str)
            .unwrap_or("claude")
            .to_string();
        let args = match config.get("args").and_then(Value::as_array) {
            None => vec!["-p".to_string()],
            Some(values) => values
                .iter()
                .filter_map(|value| match value.as_str() {
                    Some(arg) => Some(arg.to_string()),
                    None => {
                        warn!(entry = %value, "ignoring non-string entry in config args");
                        None
                    }
                })
                .collect(),
        };
        let workdir = config
            .get("workdir")
            .and_then(Value::as_str)
            .map(PathBuf::from);
        Self { bin, args, workdir }
    }
}

impl TaskBackend for AgentCliBackend {
    async fn execute(&self, prompt: &str) -> Result<String> {
        let mut cmd = tokio::process::Command::new(&self.bin);
        cmd.args(&self.args)
            .arg(prompt)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output()
            .await
            .with_context(|| format!("failed to spawn {}", self.bin))?;
        if !output.status.success() {
            anyhow::bail!(
                "{} exited with {}: {}",
                self.bin,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
