//! Lifecycle manager — orchestrates generation, the workspace store
//! and the supervisor adapter to implement create/start/stop/delete/
//! list/get.
//!
//! No agent state is held here: "does it exist" is answered by file
//! presence, "is it running" by asking supervisord. The only local
//! state is a per-program lock registry so concurrent mutations of
//! one agent are serialized while distinct agents stay independent.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use hivemind_common::{
    AgentConfig, AgentDetails, AgentKey, AgentSummary, CreatedAgent, LifecycleError, StartedAgent,
    StoreError, SupervisorEntry, SupervisorError, SupervisorState, derive_program_name,
    is_valid_agent_name, parse_program_name,
};

use crate::assets;
use crate::config::ManagerConfig;
use crate::generator;
use crate::store::WorkspaceStore;
use crate::supervisor::Supervisor;

/// Owner names that would collide with the store's own directories.
const RESERVED_OWNERS: &[&str] = &["agents", "supervisor"];

pub struct AgentManager<S> {
    supervisor: S,
    store: WorkspaceStore,
    worker_bin: String,
    workdir: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: Supervisor> AgentManager<S> {
    #[must_use]
    pub fn new(config: &ManagerConfig, supervisor: S) -> Self {
        Self {
            supervisor,
            store: WorkspaceStore::new(config.base_dir.clone()),
            worker_bin: config.worker_bin.clone(),
            workdir: config.workdir.clone(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Generate and write both artifacts for a new agent. Does not
    /// register or start anything — supervisord first learns about
    /// the program on `start`.
    ///
    /// # Errors
    ///
    /// `Conflict` if a spec file already exists for this key;
    /// `InvalidName` for names that would make the program-name
    /// derivation ambiguous; template/store errors otherwise.
    pub async fn create(&self, config: &AgentConfig) -> Result<CreatedAgent, LifecycleError> {
        let owner = config.username.as_deref();
        validate_key(owner, &config.name)?;
        let key = config.key();
        let program = derive_program_name(owner, &config.name);
        let _guard = self.guard(&program).await;

        if self.store.exists(owner, &config.name) {
            return Err(LifecycleError::Conflict { key });
        }

        let template = assets::worker_template()?;
        let spec = generator::render_worker_spec(template, config, &program)?;
        let stanza = generator::supervisor_stanza(
            &program,
            &self.worker_bin,
            &self.store.spec_path(owner, &config.name),
            &self.workdir,
            &self.store.log_path(owner, &config.name),
        );

        let (spec_path, stanza_path) = self
            .store
            .write(owner, &config.name, &spec, &stanza)
            .map_err(|e| match e {
                StoreError::AlreadyExists { key } => LifecycleError::Conflict { key },
                other => other.into(),
            })?;

        Ok(CreatedAgent {
            message: format!("Agent '{key}' created"),
            spec_path: spec_path.display().to_string(),
            stanza_path: stanza_path.display().to_string(),
        })
    }

    /// Sync supervisord with the on-disk stanzas, then start the
    /// worker and report the observed post-start state.
    ///
    /// Starting an already-running worker is forwarded verbatim —
    /// supervisord's own answer (error or no-op) is not masked here.
    ///
    /// # Errors
    ///
    /// `NotFound` if either artifact file is missing (supervisord is
    /// not contacted in that case); `SupervisorSyncFailed` if
    /// `reread`/`update` fail; `StartFailed` with a full program dump
    /// if the start command itself fails.
    pub async fn start(
        &self,
        owner: Option<&str>,
        name: &str,
    ) -> Result<StartedAgent, LifecycleError> {
        validate_key(owner, name)?;
        let key = AgentKey::new(owner, name);
        let program = derive_program_name(owner, name);
        let _guard = self.guard(&program).await;

        if !self.store.exists(owner, name) || !self.store.stanza_exists(owner, name) {
            return Err(LifecycleError::NotFound { key });
        }
        self.store.ensure_log_file(owner, name)?;

        // Supervisord does not watch the filesystem: reread + update
        // must run before start so the freshly written stanza exists
        // from its point of view.
        let reread_out = match self.supervisor.reread().await {
            Ok(out) => out,
            Err(e) => return Err(self.sync_failure("reread", "", e).await),
        };
        if let Err(e) = self.supervisor.update().await {
            return Err(self.sync_failure("update", &reread_out, e).await);
        }

        let start_output = match self.supervisor.start(&program).await {
            Ok(out) => out,
            Err(e) => return Err(self.start_failure(&program, e).await),
        };

        // Post-start query is best-effort: report what supervisord
        // says, degrading to `unknown` rather than failing the start.
        let status = match self.supervisor.status(Some(&program)).await {
            Ok(entries) => entries
                .first()
                .map_or(SupervisorState::Unknown, |entry| entry.state),
            Err(_) => SupervisorState::Unknown,
        };

        Ok(StartedAgent {
            message: format!("Agent '{key}' started"),
            status,
            start_output,
        })
    }

    /// Stop the worker. Stopping an already-stopped worker is
    /// forwarded to supervisord, not special-cased.
    ///
    /// # Errors
    ///
    /// `StopFailed` with captured diagnostics on non-zero exit.
    pub async fn stop(&self, owner: Option<&str>, name: &str) -> Result<String, LifecycleError> {
        validate_key(owner, name)?;
        let key = AgentKey::new(owner, name);
        let program = derive_program_name(owner, name);
        let _guard = self.guard(&program).await;

        match self.supervisor.stop(&program).await {
            Ok(_) => Ok(format!("Agent '{key}' stopped")),
            Err(source @ SupervisorError::Unavailable(_)) => {
                Err(LifecycleError::Supervisor(source))
            }
            Err(source) => Err(LifecycleError::StopFailed { program, source }),
        }
    }

    /// Stop (best-effort), remove both artifact files, and make
    /// supervisord forget the program. Idempotent: deleting an agent
    /// that does not exist succeeds silently.
    ///
    /// # Errors
    ///
    /// Store failures and `reread`/`update` failures propagate; a
    /// failed stop (already stopped, never started) does not.
    pub async fn delete(&self, owner: Option<&str>, name: &str) -> Result<String, LifecycleError> {
        validate_key(owner, name)?;
        let key = AgentKey::new(owner, name);
        let program = derive_program_name(owner, name);
        let _guard = self.guard(&program).await;

        // Best-effort: "already stopped" / "never started" must not
        // abort the deletion.
        let _ = self.supervisor.stop(&program).await;

        self.store.remove(owner, name)?;

        let reread_out = match self.supervisor.reread().await {
            Ok(out) => out,
            Err(e) => return Err(self.sync_failure("reread", "", e).await),
        };
        if let Err(e) = self.supervisor.update().await {
            return Err(self.sync_failure("update", &reread_out, e).await);
        }

        Ok(format!("Agent '{key}' deleted"))
    }

    /// Merge the filesystem view (authoritative for artifact
    /// existence) with supervisord's view (authoritative for run
    /// state and pid). An agent present in both appears exactly once;
    /// a registration without a file is reported with
    /// `file_exists = false`; a file without a registration reports
    /// `NOT_CONFIGURED`.
    ///
    /// # Errors
    ///
    /// Store enumeration failures propagate; a dead supervisor
    /// control endpoint degrades to an empty supervisor view.
    pub async fn list(&self, owner: Option<&str>) -> Result<Vec<AgentSummary>, LifecycleError> {
        validate_owner(owner)?;
        let mut supervisor_view: HashMap<AgentKey, SupervisorEntry> = HashMap::new();
        if let Ok(entries) = self.supervisor.status(None).await {
            for entry in entries {
                if let Some((entry_owner, name)) = parse_program_name(&entry.program) {
                    let key = AgentKey {
                        owner: entry_owner,
                        name,
                    };
                    if owner.is_none_or(|f| key.owner.as_deref() == Some(f)) {
                        supervisor_view.insert(key, entry);
                    }
                }
            }
        }

        let mut summaries = Vec::new();
        for key in self.file_keys(owner)? {
            let summary = match supervisor_view.remove(&key) {
                Some(entry) => AgentSummary {
                    agent: key.to_string(),
                    file_exists: true,
                    is_active: entry.state.is_active(),
                    status: entry.state,
                    pid: entry.pid,
                },
                None => AgentSummary {
                    agent: key.to_string(),
                    file_exists: true,
                    is_active: false,
                    status: SupervisorState::NotConfigured,
                    pid: None,
                },
            };
            summaries.push(summary);
        }

        // Whatever is left in the supervisor view is an orphaned
        // registration (stanza removed by hand, program still known).
        for (key, entry) in supervisor_view {
            summaries.push(AgentSummary {
                agent: key.to_string(),
                file_exists: false,
                is_active: entry.state.is_active(),
                status: entry.state,
                pid: entry.pid,
            });
        }

        summaries.sort_by(|a, b| a.agent.cmp(&b.agent));
        Ok(summaries)
    }

    /// Best-effort status for one agent.
    ///
    /// # Errors
    ///
    /// `NotFound` if no spec file exists; status-query failures
    /// degrade the reported state instead of failing the call.
    pub async fn get(
        &self,
        owner: Option<&str>,
        name: &str,
    ) -> Result<AgentDetails, LifecycleError> {
        validate_key(owner, name)?;
        let key = AgentKey::new(owner, name);
        if !self.store.exists(owner, name) {
            return Err(LifecycleError::NotFound { key });
        }

        let program = derive_program_name(owner, name);
        let status = match self.supervisor.status(Some(&program)).await {
            Ok(entries) => entries
                .first()
                .map_or(SupervisorState::Unknown, |entry| entry.state),
            Err(SupervisorError::ProgramUnknown(_)) => SupervisorState::NotConfigured,
            Err(_) => SupervisorState::Unknown,
        };

        Ok(AgentDetails {
            name: name.to_string(),
            owner: owner.map(String::from),
            status,
            file: self.store.spec_path(owner, name).display().to_string(),
            exists: true,
        })
    }

    fn file_keys(&self, owner: Option<&str>) -> Result<Vec<AgentKey>, StoreError> {
        let mut keys = Vec::new();
        match owner {
            Some(owner) => {
                for name in self.store.list_names(Some(owner))? {
                    keys.push(AgentKey::new(Some(owner), &name));
                }
            }
            None => {
                for name in self.store.list_names(None)? {
                    keys.push(AgentKey::new(None, &name));
                }
                for owner in self.store.list_owners()? {
                    for name in self.store.list_names(Some(&owner))? {
                        keys.push(AgentKey::new(Some(&owner), &name));
                    }
                }
            }
        }
        Ok(keys)
    }

    /// Take the per-program lock, creating it on first use.
    async fn guard(&self, program: &str) -> OwnedMutexGuard<()> {
        let cell = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(program.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        cell.lock_owned().await
    }

    async fn sync_failure(
        &self,
        stage: &str,
        prior_output: &str,
        source: SupervisorError,
    ) -> LifecycleError {
        if matches!(source, SupervisorError::Unavailable(_)) {
            return LifecycleError::Supervisor(source);
        }
        let mut detail = format!("{stage}: {source}");
        if !prior_output.is_empty() {
            detail.push_str(&format!(" (after reread: {prior_output})"));
        }
        detail.push_str(&self.status_dump().await);
        LifecycleError::SupervisorSyncFailed { detail, source }
    }

    async fn start_failure(&self, program: &str, source: SupervisorError) -> LifecycleError {
        if matches!(source, SupervisorError::Unavailable(_)) {
            return LifecycleError::Supervisor(source);
        }
        let detail = format!("{source}{}", self.status_dump().await);
        LifecycleError::StartFailed {
            program: program.to_string(),
            detail,
            source,
        }
    }

    /// Dump of all known supervisor programs, appended to start/sync
    /// failure diagnostics. Best-effort.
    async fn status_dump(&self) -> String {
        match self.supervisor.status(None).await {
            Ok(entries) if !entries.is_empty() => {
                let listing: Vec<String> = entries
                    .iter()
                    .map(|e| format!("{} {}", e.program, e.state))
                    .collect();
                format!("; all supervisor programs: {}", listing.join(", "))
            }
            _ => String::new(),
        }
    }
}

fn validate_key(owner: Option<&str>, name: &str) -> Result<(), LifecycleError> {
    validate_owner(owner)?;
    if !is_valid_agent_name(name) {
        return Err(LifecycleError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Owner names reach the store as path components, so they are
/// checked before any path interpolation — including the `list`
/// filter, which otherwise never goes through `validate_key`.
fn validate_owner(owner: Option<&str>) -> Result<(), LifecycleError> {
    if let Some(owner) = owner {
        if !is_valid_agent_name(owner) || RESERVED_OWNERS.contains(&owner) {
            return Err(LifecycleError::InvalidName(owner.to_string()));
        }
    }
    Ok(())
}
