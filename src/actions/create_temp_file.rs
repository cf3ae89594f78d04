use anyhow::{Context, Result};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Creates an empty scratch file named `<prefix><random>`, in `dir` or the
/// system temp directory. The file is removed when the handle is dropped.
pub(crate) fn execute(prefix: &str, dir: Option<&Path>) -> Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(prefix);
    let file = match dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .with_context(|| format!("Failed to create temp file '{}*'", prefix))?;
    debug!("created temp file {}", file.path().display());
    Ok(file)
}
