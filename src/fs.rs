use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Path argument meaning "read standard input".
pub const STDIN_PLACEHOLDER: &str = "-";

pub fn expand_home(path: &Path) -> Result<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => {
            let home = dirs::home_dir().context("Failed to determine home directory")?;
            Ok(home.join(rest))
        }
        Err(_) => Ok(path.to_path_buf()),
    }
}
