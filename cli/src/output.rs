//! Terminal output: stylesheet, message helpers and `--json` mode.

use console::Term;
use owo_colors::{OwoColorize as _, Style};

/// Centralized stylesheet for CLI output colors.
#[derive(Default, Clone)]
pub struct Styles {
    /// Success messages (green)
    pub success: Style,
    /// Warning messages (yellow)
    pub warning: Style,
    /// Error messages (red)
    pub error: Style,
    /// Dimmed/secondary text
    pub dim: Style,
    /// Headers/section titles
    pub header: Style,
    /// Active worker state
    pub active: Style,
    /// Inactive worker state
    pub inactive: Style,
}

impl Styles {
    /// Apply colors to the stylesheet.
    pub fn colorize(&mut self) {
        self.success = Style::new().green();
        self.warning = Style::new().yellow();
        self.error = Style::new().red();
        self.dim = Style::new().dimmed();
        self.header = Style::new().bold().cyan();
        self.active = Style::new().green().bold();
        self.inactive = Style::new().dimmed();
    }
}

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether stdout is a TTY.
    pub is_tty: bool,
    /// Whether to emit machine-readable JSON instead of styled text.
    pub json: bool,
    /// Whether to suppress non-error output.
    pub quiet: bool,
}

impl OutputContext {
    /// Create output context based on CLI flags and environment.
    #[must_use]
    pub fn new(json: bool, no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let use_colors = !no_color && !json && is_tty && std::env::var("NO_COLOR").is_err();

        let mut styles = Styles::default();
        if use_colors {
            styles.colorize();
        }

        Self {
            styles,
            is_tty,
            json,
            quiet,
        }
    }

    /// Print a success message prefixed with `✓`. Suppressed when
    /// `quiet` or in JSON mode.
    pub fn success(&self, msg: &str) {
        if !self.quiet && !self.json {
            println!("  {} {msg}", "✓".style(self.styles.success));
        }
    }

    /// Print a warning message prefixed with `⚠`. Suppressed when
    /// `quiet` or in JSON mode.
    pub fn warn(&self, msg: &str) {
        if !self.quiet && !self.json {
            println!("  {} {msg}", "⚠".style(self.styles.warning));
        }
    }

    /// Print an error message prefixed with `✗` to stderr. Never suppressed.
    pub fn error(&self, msg: &str) {
        eprintln!("  {} {msg}", "✗".style(self.styles.error));
    }

    /// Print a section header. Suppressed when `quiet` or in JSON mode.
    pub fn header(&self, msg: &str) {
        if !self.quiet && !self.json {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// Print a key-value pair with the key dimmed. Suppressed when
    /// `quiet` or in JSON mode.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet && !self.json {
            println!("  {}  {value}", key.style(self.styles.dim));
        }
    }

    /// Pretty-print a serializable payload as JSON to stdout. Used by
    /// every `--json` code path.
    pub fn emit_json<T: serde::Serialize>(&self, payload: &T) {
        // Only non-finite floats and non-string map keys fail, and the
        // response types carry neither.
        let value = serde_json::json!(payload);
        println!("{value:#}");
    }
}

/// JSON error object emitted by `--json` code paths when a command fails.
#[must_use]
pub fn format_error(message: &str, code: &str) -> String {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    format!("{obj:#}")
}
