//! External process execution.

use std::process::{Command, Stdio};
use tracing::debug;

/// Captured result of a finished process.
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

impl CommandOutput {
    /// Diagnostic text for error reports: stderr, or stdout if stderr is empty.
    pub fn diagnostics(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

/// Runs `cmd` to completion with stdout/stderr captured.
///
/// Blocks the calling thread; async callers go through `spawn_blocking`.
pub fn run_captured(cmd: &mut Command) -> std::io::Result<CommandOutput> {
    debug!(command = ?cmd, "running external command");

    let output = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        success: output.status.success(),
    })
}
