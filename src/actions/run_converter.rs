use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, info};

use super::combined_output;
use crate::config::Converter;

pub(crate) fn execute(converter: &Converter, input: &Path, output: &Path) -> Result<()> {
    let args = converter.args_for(input, output);
    info!("Action: Run converter `{} {}`", converter.program, args.join(" "));

    let result = Command::new(&converter.program)
        .args(&args)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("Failed to execute converter: {}", converter.program))?;

    let combined = combined_output(&result);
    if !result.status.success() {
        anyhow::bail!("convert failed with status {}: {}", result.status, combined);
    }
    if !combined.is_empty() {
        debug!("converter output: {}", combined);
    }
    Ok(())
}
