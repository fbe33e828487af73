//! Shared test helpers: output constructors and agent config builders.

#![allow(dead_code)]
#![allow(clippy::expect_used)]

use std::process::{ExitStatus, Output};

use hivemind_common::AgentConfig;

// ── Cross-platform ExitStatus construction ───────────────────────────────────

/// Build an `ExitStatus` from a logical exit code (0 = success, non-zero = failure).
///
/// On Unix the raw wait-status encodes the exit code in bits 8–15, so we shift.
/// On Windows `ExitStatusExt::from_raw` takes the exit code directly.
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    #[allow(clippy::cast_sign_loss)]
    ExitStatus::from_raw(code as u32)
}

// ── Output constructors ──────────────────────────────────────────────────────

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(code: i32, stdout: &[u8], stderr: &[u8]) -> Output {
    Output {
        status: exit_status(code),
        stdout: stdout.to_vec(),
        stderr: stderr.to_vec(),
    }
}

// ── Agent config builders ────────────────────────────────────────────────────

/// Minimal agent config: a single sub-agent, no owner, no tasks.
pub fn agent_config(name: &str) -> AgentConfig {
    serde_json::from_value(serde_json::json!({
        "name": name,
        "subagents": [
            { "name": "research", "instruction": "dig into the request" }
        ],
        "json_config": { "command": "claude" }
    }))
    .expect("valid agent config")
}

/// Agent config owned by `owner`.
pub fn owned_agent_config(owner: &str, name: &str) -> AgentConfig {
    let mut config = agent_config(name);
    config.username = Some(owner.to_string());
    config
}
