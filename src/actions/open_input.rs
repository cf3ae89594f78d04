use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use tracing::debug;

use crate::fs::{expand_home, STDIN_PLACEHOLDER};

pub fn execute(path: &str) -> Result<Box<dyn Read>> {
    if path == STDIN_PLACEHOLDER {
        debug!("reading markdown from stdin");
        return Ok(Box::new(io::stdin().lock()));
    }
    let expanded_path = expand_home(Path::new(path))?;
    debug!("reading markdown from {}", expanded_path.display());
    let file = File::open(&expanded_path)
        .with_context(|| format!("Failed to open file: {}", expanded_path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}
