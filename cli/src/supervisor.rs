//! Supervisor adapter — drives supervisord through `supervisorctl`.
//!
//! Trait-based so lifecycle tests can use doubles instead of a live
//! supervisord. Every query re-asks the external process; nothing is
//! cached here, supervisord alone owns the authoritative state.

use std::process::Output;

use hivemind_common::{SupervisorEntry, SupervisorError, SupervisorState};

use crate::command_runner::CommandRunner;

/// The four control operations this system relies on from the
/// process supervisor, plus status. `reread` rescans stanza
/// directories, `update` activates pending registration changes —
/// supervisord does not watch the filesystem, so both must run after
/// any stanza write before a `start`.
#[allow(async_fn_in_trait)]
pub trait Supervisor {
    /// Run `supervisorctl reread`, returning captured stdout.
    async fn reread(&self) -> Result<String, SupervisorError>;

    /// Run `supervisorctl update`, returning captured stdout.
    async fn update(&self) -> Result<String, SupervisorError>;

    /// Query one program, or all known programs when `program` is
    /// `None`.
    async fn status(&self, program: Option<&str>)
    -> Result<Vec<SupervisorEntry>, SupervisorError>;

    /// Run `supervisorctl start <program>`, returning captured stdout.
    async fn start(&self, program: &str) -> Result<String, SupervisorError>;

    /// Run `supervisorctl stop <program>`, returning captured stdout.
    async fn stop(&self, program: &str) -> Result<String, SupervisorError>;
}

/// Production adapter invoking the `supervisorctl` binary.
pub struct Supervisorctl<R> {
    runner: R,
    bin: String,
    conf: Option<String>,
}

impl<R: CommandRunner> Supervisorctl<R> {
    /// `conf`, when set, is passed as `-c <path>` to every invocation.
    #[must_use]
    pub fn new(runner: R, bin: String, conf: Option<String>) -> Self {
        Self { runner, bin, conf }
    }

    async fn exec(&self, args: &[&str]) -> Result<Output, SupervisorError> {
        let mut full: Vec<&str> = Vec::with_capacity(args.len() + 2);
        if let Some(conf) = &self.conf {
            full.push("-c");
            full.push(conf);
        }
        full.extend_from_slice(args);
        self.runner
            .run(&self.bin, &full)
            .await
            .map_err(|e| SupervisorError::Unavailable(format!("{e:#}")))
    }

    fn command_line(&self, args: &[&str]) -> String {
        format!("{} {}", self.bin, args.join(" "))
    }
}

impl<R: CommandRunner> Supervisor for Supervisorctl<R> {
    async fn reread(&self) -> Result<String, SupervisorError> {
        let output = self.exec(&["reread"]).await?;
        classify(self.command_line(&["reread"]), &output)
    }

    async fn update(&self) -> Result<String, SupervisorError> {
        let output = self.exec(&["update"]).await?;
        classify(self.command_line(&["update"]), &output)
    }

    async fn status(
        &self,
        program: Option<&str>,
    ) -> Result<Vec<SupervisorEntry>, SupervisorError> {
        let args: Vec<&str> = match program {
            Some(name) => vec!["status", name],
            None => vec!["status"],
        };
        let output = self.exec(&args).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if is_unreachable(&stdout) || is_unreachable(&stderr) {
            return Err(SupervisorError::Unavailable(stdout.trim().to_string()));
        }
        if let Some(name) = program
            && stdout.contains("no such process")
        {
            return Err(SupervisorError::ProgramUnknown(name.to_string()));
        }
        // `supervisorctl status` exits non-zero when any program is
        // stopped; the output is still a well-formed listing, so parse
        // whatever came back and only fail on an empty, failed result.
        let entries: Vec<SupervisorEntry> =
            stdout.lines().filter_map(parse_status_line).collect();
        if entries.is_empty() && !output.status.success() && !stdout.trim().is_empty() {
            return Err(command_failed(self.command_line(&args), &output));
        }
        Ok(entries)
    }

    async fn start(&self, program: &str) -> Result<String, SupervisorError> {
        let args = ["start", program];
        let output = self.exec(&args).await?;
        classify(self.command_line(&args), &output)
    }

    async fn stop(&self, program: &str) -> Result<String, SupervisorError> {
        let args = ["stop", program];
        let output = self.exec(&args).await?;
        classify(self.command_line(&args), &output)
    }
}

/// Parse one line of `supervisorctl status` output:
/// `name  RUNNING  pid 1234, uptime 0:00:05`.
#[must_use]
pub fn parse_status_line(line: &str) -> Option<SupervisorEntry> {
    let mut parts = line.split_whitespace();
    let program = parts.next()?.to_string();
    let state = SupervisorState::from_token(parts.next()?);

    let mut pid = None;
    let mut rest = parts;
    while let Some(token) = rest.next() {
        if token == "pid" {
            pid = rest
                .next()
                .and_then(|t| t.trim_end_matches(',').parse::<u32>().ok());
            break;
        }
    }
    Some(SupervisorEntry {
        program,
        state,
        pid,
    })
}

fn classify(command: String, output: &Output) -> Result<String, SupervisorError> {
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if output.status.success() {
        return Ok(stdout);
    }
    if is_unreachable(&stdout) || is_unreachable(&stderr) {
        let detail = if stderr.is_empty() { stdout } else { stderr };
        return Err(SupervisorError::Unavailable(detail));
    }
    Err(SupervisorError::CommandFailed {
        command,
        code: output.status.code().unwrap_or(-1),
        stdout,
        stderr,
    })
}

fn command_failed(command: String, output: &Output) -> SupervisorError {
    SupervisorError::CommandFailed {
        command,
        code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

fn is_unreachable(text: &str) -> bool {
    text.contains("refused connection")
        || text.contains("no such file")
        || text.contains("SHUTDOWN_STATE")
}
