use serde::{Deserialize, Serialize};

/// Identifies one agent: an optional owner plus a name unique to that
/// owner. Single-tenant deployments leave `owner` unset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentKey {
    pub owner: Option<String>,
    pub name: String,
}

impl AgentKey {
    #[must_use]
    pub fn new(owner: Option<&str>, name: &str) -> Self {
        Self {
            owner: owner.map(String::from),
            name: name.to_string(),
        }
    }
}

impl std::fmt::Display for AgentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.owner {
            Some(owner) => write!(f, "{owner}/{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// One named unit of behavior composed under the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubAgentSpec {
    pub name: String,
    pub instruction: String,
    #[serde(default)]
    pub servers: Vec<String>,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_model() -> String {
    "haiku".to_string()
}

/// Periodic polling configuration for a worker: invoke the
/// orchestrator with `prompt` every `interval_secs` seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollingSpec {
    pub interval_secs: u64,
    pub prompt: String,
}

/// Everything needed to materialize one agent: identity, the ordered
/// sub-agent list, an opaque config blob passed through to the
/// generated worker, and the optional startup/polling tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub username: Option<String>,
    pub name: String,
    pub subagents: Vec<SubAgentSpec>,
    #[serde(default)]
    pub json_config: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polling: Option<PollingSpec>,
}

impl AgentConfig {
    #[must_use]
    pub fn key(&self) -> AgentKey {
        AgentKey::new(self.username.as_deref(), &self.name)
    }
}

/// Supervisord's view of a worker's state.
///
/// Supervisord reports more states than these (BACKOFF, STOPPING,
/// EXITED, ...); anything not listed maps to `Unknown`.
/// `NotConfigured` is synthesized for agents that have artifact files
/// but no supervisord registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SupervisorState {
    Running,
    Stopped,
    Starting,
    Fatal,
    NotConfigured,
    Unknown,
}

impl SupervisorState {
    /// Parse a state token from `supervisorctl status` output.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        match token {
            "RUNNING" => Self::Running,
            "STOPPED" => Self::Stopped,
            "STARTING" => Self::Starting,
            "FATAL" => Self::Fatal,
            _ => Self::Unknown,
        }
    }

    /// Whether the worker process is actually running.
    #[must_use]
    pub fn is_active(self) -> bool {
        self == Self::Running
    }
}

impl std::fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let token = match self {
            Self::Running => "RUNNING",
            Self::Stopped => "STOPPED",
            Self::Starting => "STARTING",
            Self::Fatal => "FATAL",
            Self::NotConfigured => "NOT_CONFIGURED",
            Self::Unknown => "unknown",
        };
        f.write_str(token)
    }
}

/// One line of `supervisorctl status`: program name, state, pid.
/// Never cached — every query re-asks supervisord.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorEntry {
    pub program: String,
    pub state: SupervisorState,
    pub pid: Option<u32>,
}

/// Result of `create`: where the two artifacts were written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedAgent {
    pub message: String,
    pub spec_path: String,
    pub stanza_path: String,
}

/// Result of `start`: the observed post-start state plus the raw
/// `supervisorctl start` output for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartedAgent {
    pub message: String,
    pub status: SupervisorState,
    pub start_output: String,
}

/// One row of `list`: the merged file-system and supervisord views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSummary {
    pub agent: String,
    pub file_exists: bool,
    pub is_active: bool,
    pub status: SupervisorState,
    pub pid: Option<u32>,
}

/// Result of `get`: best-effort status for one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDetails {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub status: SupervisorState,
    pub file: String,
    pub exists: bool,
}
