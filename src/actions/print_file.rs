use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Writes the file content followed by a newline.
pub(crate) fn execute<W: Write>(path: &Path, mut out: W) -> Result<()> {
    let data = fs::read(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    out.write_all(&data)
        .and_then(|()| out.write_all(b"\n"))
        .and_then(|()| out.flush())
        .context("Failed to write converted file to output")?;
    Ok(())
}
