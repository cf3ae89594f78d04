use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::info;

use super::combined_output;

/// Pipes the content of `path` into the clipboard program's stdin.
pub(crate) fn execute(program: &str, args: &[String], path: &Path) -> Result<()> {
    info!("Action: Copy '{}' to clipboard with `{}`", path.display(), program);
    let content = fs::read(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to execute clipboard command: {}", program))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(&content)
            .with_context(|| format!("Failed to write to clipboard command: {}", program))?;
    }

    let output = child
        .wait_with_output()
        .with_context(|| format!("Failed to wait for clipboard command: {}", program))?;
    if !output.status.success() {
        anyhow::bail!(
            "copy to clipboard failed with status {}: {}",
            output.status,
            combined_output(&output)
        );
    }
    Ok(())
}
