//! Filesystem-backed workspace store.
//!
//! Owns the on-disk artifacts for every agent: per owner, an
//! `agents/` directory of generated worker specs (`{name}_agent.json`)
//! and log files, and a `supervisor/` directory of registration
//! stanzas (`{name}.conf`). File presence under `agents/` is the
//! source of truth for "does this agent exist".
//!
//! Single-tenant deployments (owner `None`) keep both directories
//! directly under the base dir.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use hivemind_common::{AgentKey, StoreError};

/// Suffix of generated worker-spec files.
const SPEC_SUFFIX: &str = "_agent.json";

pub struct WorkspaceStore {
    base: PathBuf,
}

impl WorkspaceStore {
    #[must_use]
    pub fn new(base: PathBuf) -> Self {
        Self { base }
    }

    fn owner_root(&self, owner: Option<&str>) -> PathBuf {
        match owner {
            Some(owner) => self.base.join(owner),
            None => self.base.clone(),
        }
    }

    #[must_use]
    pub fn agents_dir(&self, owner: Option<&str>) -> PathBuf {
        self.owner_root(owner).join("agents")
    }

    #[must_use]
    pub fn supervisor_dir(&self, owner: Option<&str>) -> PathBuf {
        self.owner_root(owner).join("supervisor")
    }

    #[must_use]
    pub fn spec_path(&self, owner: Option<&str>, name: &str) -> PathBuf {
        self.agents_dir(owner).join(format!("{name}{SPEC_SUFFIX}"))
    }

    #[must_use]
    pub fn stanza_path(&self, owner: Option<&str>, name: &str) -> PathBuf {
        self.supervisor_dir(owner).join(format!("{name}.conf"))
    }

    #[must_use]
    pub fn log_path(&self, owner: Option<&str>, name: &str) -> PathBuf {
        self.agents_dir(owner).join(format!("{name}_logs.log"))
    }

    /// Whether a worker-spec file exists for `(owner, name)`.
    #[must_use]
    pub fn exists(&self, owner: Option<&str>, name: &str) -> bool {
        self.spec_path(owner, name).exists()
    }

    /// Whether a registration stanza exists for `(owner, name)`.
    #[must_use]
    pub fn stanza_exists(&self, owner: Option<&str>, name: &str) -> bool {
        self.stanza_path(owner, name).exists()
    }

    /// Write both artifacts for a new agent. Creation is strictly
    /// additive: an existing spec file fails with `AlreadyExists`,
    /// never a silent overwrite. A failed stanza write removes the
    /// spec file again, so a failed create leaves nothing behind.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] for a duplicate key, or
    /// [`StoreError::Io`] if directory creation or a write fails.
    pub fn write(
        &self,
        owner: Option<&str>,
        name: &str,
        spec: &str,
        stanza: &str,
    ) -> Result<(PathBuf, PathBuf), StoreError> {
        self.ensure_dirs(owner)?;
        let spec_path = self.spec_path(owner, name);
        if spec_path.exists() {
            return Err(StoreError::AlreadyExists {
                key: AgentKey::new(owner, name),
            });
        }
        write_file(&spec_path, spec)?;
        let stanza_path = self.stanza_path(owner, name);
        if let Err(e) = write_file(&stanza_path, stanza) {
            // A half-written pair would make every later create fail
            // Conflict and every start fail NotFound; roll the spec
            // file back so creation stays all-or-nothing.
            let _ = std::fs::remove_file(&spec_path);
            return Err(e);
        }
        Ok((spec_path, stanza_path))
    }

    /// Delete both artifact files. Absence of either is not an error,
    /// which makes agent deletion idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] only for real filesystem failures.
    pub fn remove(&self, owner: Option<&str>, name: &str) -> Result<(), StoreError> {
        remove_file_if_present(&self.spec_path(owner, name))?;
        remove_file_if_present(&self.stanza_path(owner, name))?;
        Ok(())
    }

    /// Create the agent's log file if it does not exist yet.
    /// Supervisord expects the file to be there before the first start.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be created.
    pub fn ensure_log_file(&self, owner: Option<&str>, name: &str) -> Result<PathBuf, StoreError> {
        self.ensure_dirs(owner)?;
        let path = self.log_path(owner, name);
        if !path.exists() {
            write_file(&path, "")?;
        }
        Ok(path)
    }

    /// Enumerate agent names for `owner`, inferred from spec-file
    /// presence. A missing directory means no agents, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be read.
    pub fn list_names(&self, owner: Option<&str>) -> Result<Vec<String>, StoreError> {
        let dir = self.agents_dir(owner);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error("reading", &dir, e)),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_error("reading", &dir, e))?;
            let file_name = entry.file_name();
            if let Some(name) = file_name.to_string_lossy().strip_suffix(SPEC_SUFFIX) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Enumerate all owner directories (multi-tenant deployments).
    /// An owner is any base-dir subdirectory holding an `agents/` dir.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the base directory cannot be read.
    pub fn list_owners(&self) -> Result<Vec<String>, StoreError> {
        let entries = match std::fs::read_dir(&self.base) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error("reading", &self.base, e)),
        };
        let mut owners = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_error("reading", &self.base, e))?;
            if entry.path().join("agents").is_dir() {
                owners.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        owners.sort();
        Ok(owners)
    }

    /// Create the per-owner directory pair. Idempotent — a no-op when
    /// already present.
    fn ensure_dirs(&self, owner: Option<&str>) -> Result<(), StoreError> {
        for dir in [self.agents_dir(owner), self.supervisor_dir(owner)] {
            std::fs::create_dir_all(&dir).map_err(|e| io_error("creating", &dir, e))?;
        }
        Ok(())
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), StoreError> {
    std::fs::write(path, content).map_err(|e| io_error("writing", path, e))
}

fn remove_file_if_present(path: &Path) -> Result<(), StoreError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_error("removing", path, e)),
    }
}

fn io_error(op: &'static str, path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        op,
        path: path.display().to_string(),
        source,
    }
}
