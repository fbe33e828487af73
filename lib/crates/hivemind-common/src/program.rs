//! Supervisord program-name derivation.
//!
//! The program name is the join key between the filesystem view and
//! the supervisord view: `{owner}_{name}_agent` in multi-tenant
//! deployments, `{name}_agent` in single-tenant ones. Owners and
//! agent names must not contain underscores, otherwise parsing the
//! key back apart would be ambiguous — [`AGENT_NAME_RE`] enforces
//! that before any name reaches the supervisor or the filesystem.

use std::sync::LazyLock;

use regex::Regex;

/// Lowercase alphanumeric with interior hyphens, 1-32 characters.
/// Checked before any path interpolation to prevent path traversal,
/// and to keep program names unambiguous (no underscores).
pub static AGENT_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Safety: compile-time constant pattern — cannot fail.
    #[allow(clippy::expect_used)]
    Regex::new(r"^[a-z0-9]([a-z0-9-]{0,31})?$").expect("valid regex")
});

/// Returns `true` if `name` is valid as an agent name or owner name.
#[must_use]
pub fn is_valid_agent_name(name: &str) -> bool {
    AGENT_NAME_RE.is_match(name)
}

/// Derive the supervisord program name for an agent.
#[must_use]
pub fn derive_program_name(owner: Option<&str>, name: &str) -> String {
    match owner {
        Some(owner) => format!("{owner}_{name}_agent"),
        None => format!("{name}_agent"),
    }
}

/// Parse a program name back into `(owner, name)`.
///
/// Returns `None` for programs without the `_agent` suffix — those
/// belong to other supervisord tenants and are ignored entirely.
#[must_use]
pub fn parse_program_name(program: &str) -> Option<(Option<String>, String)> {
    let stem = program.strip_suffix("_agent")?;
    if stem.is_empty() {
        return None;
    }
    match stem.split_once('_') {
        Some((owner, name)) => Some((Some(owner.to_string()), name.to_string())),
        None => Some((None, stem.to_string())),
    }
}
