//! Manager configuration — constructed once at process start and
//! passed by reference to every component that needs it.
//!
//! Overrides load from `~/.hivemind/config.json` when present;
//! everything has a working default so a bare `hivemind` invocation
//! needs no setup beyond a running supervisord.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Process-lifetime configuration for the lifecycle manager.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Root of the per-owner workspace tree.
    pub base_dir: PathBuf,
    /// The supervisorctl binary to invoke.
    pub supervisorctl_bin: String,
    /// Optional supervisord config path, passed as `-c <path>`.
    pub supervisor_conf: Option<String>,
    /// The worker binary launched by generated stanzas.
    pub worker_bin: String,
    /// Working directory recorded in generated stanzas.
    pub workdir: PathBuf,
}

/// On-disk override file shape — every field optional.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    base_dir: Option<PathBuf>,
    supervisorctl_bin: Option<String>,
    supervisor_conf: Option<String>,
    worker_bin: Option<String>,
    workdir: Option<PathBuf>,
}

impl ManagerConfig {
    /// Load configuration: defaults under `~/.hivemind`, overridden
    /// by `~/.hivemind/config.json` if that file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined or
    /// the override file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
        let root = home.join(".hivemind");
        let overrides = read_config_file(&root.join("config.json"))?;
        Ok(Self::from_parts(&root, overrides))
    }

    /// Build a config rooted at an explicit directory (used in tests).
    #[must_use]
    pub fn with_root(root: &std::path::Path) -> Self {
        Self::from_parts(root, ConfigFile::default())
    }

    fn from_parts(root: &std::path::Path, overrides: ConfigFile) -> Self {
        Self {
            base_dir: overrides.base_dir.unwrap_or_else(|| root.join("agents")),
            supervisorctl_bin: overrides
                .supervisorctl_bin
                .unwrap_or_else(|| "supervisorctl".to_string()),
            supervisor_conf: overrides.supervisor_conf,
            worker_bin: overrides
                .worker_bin
                .unwrap_or_else(|| "hivemind-worker".to_string()),
            workdir: overrides.workdir.unwrap_or_else(|| root.to_path_buf()),
        }
    }
}

fn read_config_file(path: &std::path::Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("parsing config file {}", path.display()))
}
