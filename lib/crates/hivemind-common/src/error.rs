//! Typed error taxonomy for the control plane.
//!
//! All variants implement `thiserror::Error` and convert to
//! `anyhow::Error` via `?` at the command layer. Generation-time
//! failures ([`TemplateError`]) are deployment defects, not user
//! errors — the embedded template and the generator ship together.

use thiserror::Error;

use crate::types::AgentKey;

// ── Generation errors ─────────────────────────────────────────────────────────

/// Errors from the template renderer.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("worker template '{0}' not found among embedded assets")]
    TemplateMissing(String),

    #[error("placeholder '{{{{{0}}}}}' not present in worker template (template/generator version mismatch)")]
    PlaceholderNotFound(String),
}

// ── Workspace store errors ────────────────────────────────────────────────────

/// Errors from the filesystem-backed workspace store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("agent '{key}' already exists")]
    AlreadyExists { key: AgentKey },

    #[error("{op} {path}: {source}")]
    Io {
        op: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ── Supervisor adapter errors ─────────────────────────────────────────────────

/// Classified failures from the external process supervisor.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// A supervisorctl subcommand exited non-zero. Carries captured
    /// output so callers can surface full diagnostics.
    #[error("'{command}' exited with code {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stdout: String,
        stderr: String,
    },

    /// Status was queried for a program supervisord has never seen.
    #[error("program '{0}' is not known to supervisord")]
    ProgramUnknown(String),

    /// The supervisord control endpoint itself cannot be reached.
    #[error("supervisord control endpoint unreachable: {0}")]
    Unavailable(String),
}

// ── Lifecycle errors ──────────────────────────────────────────────────────────

/// Errors surfaced by the lifecycle manager to its callers.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("agent '{key}' already exists")]
    Conflict { key: AgentKey },

    #[error("agent '{key}' not found")]
    NotFound { key: AgentKey },

    #[error("invalid agent or owner name '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidName(String),

    /// `reread`/`update` failed while syncing freshly written
    /// stanzas; `detail` carries both captured outputs plus a full
    /// status dump.
    #[error("failed to sync supervisord configuration: {detail}")]
    SupervisorSyncFailed {
        detail: String,
        #[source]
        source: SupervisorError,
    },

    /// `supervisorctl start` failed; `detail` includes a dump of all
    /// known supervisor programs to aid diagnosis.
    #[error("failed to start '{program}': {detail}")]
    StartFailed {
        program: String,
        detail: String,
        #[source]
        source: SupervisorError,
    },

    #[error("failed to stop '{program}'")]
    StopFailed {
        program: String,
        #[source]
        source: SupervisorError,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
}
