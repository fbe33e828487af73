//! Worker artifact generation — pure functions, no I/O, no async.
//!
//! Each function accepts agent configuration and returns a `String`
//! containing the artifact content. The caller is responsible for
//! writing to disk. Serialization is canonical and order-preserving
//! (struct field order plus `serde_json`'s `preserve_order` map), so
//! regenerating from the same `AgentConfig` is byte-identical.

use std::path::Path;

use serde_json::json;

use hivemind_common::{AgentConfig, SubAgentSpec, TemplateError};

use crate::template;

/// Channel the generated worker subscribes to, derived from the
/// program name so every worker's topic is unique per deployment.
#[must_use]
pub fn worker_channel(program: &str) -> String {
    format!("agent:{program}")
}

/// Render the worker-spec file for `config`.
///
/// The conditional entries (initial task, polling) render as complete
/// `"key": value,` lines when configured and as empty strings when
/// not — their omission leaves no dangling markers in the output.
///
/// # Errors
///
/// Returns [`TemplateError::PlaceholderNotFound`] if the template is
/// out of sync with this generator.
pub fn render_worker_spec(
    template: &str,
    config: &AgentConfig,
    program: &str,
) -> Result<String, TemplateError> {
    let substitutions = [
        ("agent_name", config.name.clone()),
        ("channel", worker_channel(program)),
        ("initial_task_entry", initial_task_entry(config.initial_task.as_deref())),
        ("polling_entry", polling_entry(config)),
        ("subagents", subagents_json(&config.subagents)),
        ("json_config", format!("{:#}", config.json_config)),
    ];
    template::render(template, &substitutions)
}

/// Generate the supervisord registration stanza for one worker.
///
/// Workers are registered but never auto-started (`autostart=false`,
/// starting is an explicit lifecycle action) and restarted by
/// supervisord on crash without manager involvement
/// (`autorestart=true`). Both output streams go to the per-agent log.
#[must_use]
pub fn supervisor_stanza(
    program: &str,
    worker_bin: &str,
    spec_path: &Path,
    directory: &Path,
    log_path: &Path,
) -> String {
    let spec = spec_path.display();
    let dir = directory.display();
    let log = log_path.display();

    let mut out = String::new();
    out.push_str("; generated by hivemind from agent configuration - do not edit\n");
    out.push_str(&format!("[program:{program}]\n"));
    out.push_str(&format!("command={worker_bin} --spec {spec}\n"));
    out.push_str(&format!("directory={dir}\n"));
    out.push_str("autostart=false\n");
    out.push_str("autorestart=true\n");
    out.push_str(&format!("stderr_logfile={log}\n"));
    out.push_str(&format!("stdout_logfile={log}\n"));
    out
}

fn initial_task_entry(task: Option<&str>) -> String {
    match task {
        Some(task) => {
            let quoted = serde_json::Value::String(task.to_string());
            format!("\"initial_task\": {quoted},\n  ")
        }
        None => String::new(),
    }
}

fn polling_entry(config: &AgentConfig) -> String {
    match &config.polling {
        Some(polling) => {
            let value = json!({
                "interval_secs": polling.interval_secs,
                "prompt": polling.prompt,
            });
            format!("\"polling\": {value},\n  ")
        }
        None => String::new(),
    }
}

fn subagents_json(subagents: &[SubAgentSpec]) -> String {
    let value = serde_json::Value::Array(
        subagents
            .iter()
            .map(|s| {
                json!({
                    "name": s.name,
                    "instruction": s.instruction,
                    "servers": s.servers,
                    "model": s.model,
                })
            })
            .collect(),
    );
    format!("{value:#}")
}
