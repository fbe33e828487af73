//! Worker spec file — the artifact the CLI generates at agent
//! creation and supervisord hands to this binary via `--spec`.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use hivemind_common::{PollingSpec, SubAgentSpec};

/// Deserialized worker spec. Field order mirrors the generated file.
#[derive(Debug, Deserialize)]
pub struct WorkerSpec {
    /// Agent name, used for log context only.
    pub agent: String,
    /// Message-bus channel this worker subscribes to.
    pub channel: String,
    /// Task executed once against the orchestrator before the main
    /// loop starts.
    #[serde(default)]
    pub initial_task: Option<String>,
    /// Periodic orchestrator invocation, if configured.
    #[serde(default)]
    pub polling: Option<PollingSpec>,
    /// Ordered sub-agent list composed under the orchestrator.
    pub subagents: Vec<SubAgentSpec>,
    /// Opaque config blob passed through from the agent definition.
    #[serde(default)]
    pub config: serde_json::Value,
}

impl WorkerSpec {
    /// Load and parse a spec file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid
    /// worker spec.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read worker spec {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid worker spec {}", path.display()))
    }
}

/// Extract the task text from an inbound payload.
///
/// A structured payload tagged `type: "user"` carries the task in its
/// `content` field; anything else — non-JSON text, JSON without the
/// tag, a missing `content` — is forwarded verbatim rather than
/// dropped.
#[must_use]
pub fn task_from_payload(payload: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(payload)
        && value.get("type").and_then(serde_json::Value::as_str) == Some("user")
        && let Some(content) = value.get("content")
    {
        return match content {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        };
    }
    payload.to_string()
}
