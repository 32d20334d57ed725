use crate::config::{ScriptEntry, ToolsConfig};
use crate::error::ToolError;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

/// Maximum captured bytes per stream.
const MAX_OUTPUT_BYTES: usize = 256 * 1024;
/// Environment variables safe to pass to analysis scripts.
/// Only functional variables are included -- never API keys or secrets.
const SAFE_ENV_VARS: &[&str] = &[
    "PATH", "HOME", "TERM", "LANG", "LC_ALL", "LC_CTYPE", "USER", "SHELL",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutcome {
    pub name: String,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

impl ScriptOutcome {
    /// One-line summary for the action log.
    pub fn summary(&self) -> String {
        let status = if self.success { "ok" } else { "failed" };
        let output = crate::utils::text::first_line(self.stdout.trim());
        if output.is_empty() {
            format!("{}: {status}", self.name)
        } else {
            format!(
                "{}: {status} ({})",
                self.name,
                crate::utils::text::truncate_with_ellipsis(output, 120)
            )
        }
    }
}

/// Runs configured analysis scripts as opaque subprocesses.
pub struct ScriptRunner {
    scripts: Vec<ScriptEntry>,
    timeout: Duration,
    workspace_dir: PathBuf,
}

impl ScriptRunner {
    pub fn new(config: &ToolsConfig, workspace_dir: PathBuf) -> Self {
        Self {
            scripts: config.scripts.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            workspace_dir,
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.scripts.iter().map(|script| script.name.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    pub async fn run(&self, name: &str) -> Result<ScriptOutcome, ToolError> {
        let entry = self
            .scripts
            .iter()
            .find(|script| script.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ToolError::NotFound {
                name: name.to_string(),
            })?;
        self.execute(entry).await
    }

    /// Every configured script, in order. Failures do not stop the rest.
    pub async fn run_all(&self) -> Vec<Result<ScriptOutcome, ToolError>> {
        let mut results = Vec::with_capacity(self.scripts.len());
        for entry in &self.scripts {
            results.push(self.execute(entry).await);
        }
        results
    }

    async fn execute(&self, entry: &ScriptEntry) -> Result<ScriptOutcome, ToolError> {
        let command_path = shellexpand::tilde(&entry.command).into_owned();
        let mut cmd = match entry.interpreter.as_deref() {
            Some(interpreter) => {
                let mut cmd = tokio::process::Command::new(interpreter);
                cmd.arg(&command_path);
                cmd
            }
            None => tokio::process::Command::new(&command_path),
        };

        cmd.current_dir(&self.workspace_dir)
            .env_clear()
            .stdin(Stdio::null())
            .kill_on_drop(true);
        for var in SAFE_ENV_VARS {
            if let Ok(val) = std::env::var(var) {
                cmd.env(var, val);
            }
        }
        cmd.env("HERALD_WORKSPACE", &self.workspace_dir);

        tracing::debug!(tool = entry.name.as_str(), command = command_path.as_str(), "running script");
        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(error)) => {
                return Err(ToolError::Spawn {
                    name: entry.name.clone(),
                    message: error.to_string(),
                });
            }
            Err(_) => {
                return Err(ToolError::Timeout {
                    name: entry.name.clone(),
                    secs: self.timeout.as_secs(),
                });
            }
        };

        let outcome = ScriptOutcome {
            name: entry.name.clone(),
            exit_code: output.status.code(),
            stdout: capped(&output.stdout),
            stderr: capped(&output.stderr),
            success: output.status.success(),
        };
        if !outcome.success {
            tracing::warn!(
                tool = outcome.name.as_str(),
                exit_code = ?outcome.exit_code,
                "script exited unsuccessfully: {}",
                outcome.stderr.trim()
            );
        } else if !outcome.stderr.trim().is_empty() {
            tracing::warn!(tool = outcome.name.as_str(), "script wrote to stderr: {}", outcome.stderr.trim());
        }
        Ok(outcome)
    }
}

fn capped(bytes: &[u8]) -> String {
    let mut text = String::from_utf8_lossy(bytes).into_owned();
    if text.len() > MAX_OUTPUT_BYTES {
        text.truncate(text.floor_char_boundary(MAX_OUTPUT_BYTES));
        text.push_str("\n... [output truncated]");
    }
    text
}
