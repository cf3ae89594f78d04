use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const INPUT_PLACEHOLDER: &str = "{input}";
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub converter: Converter,
    pub clipboard: Clipboard,
}

/// External program turning the extracted drawing into a diagram file.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Converter {
    pub program: String,
    /// `{input}` and `{output}` are replaced with the scratch file paths.
    pub args: Vec<String>,
}

impl Default for Converter {
    fn default() -> Self {
        Converter {
            program: "exconv".to_string(),
            args: ["gliffy", "-i", INPUT_PLACEHOLDER, "-o", OUTPUT_PLACEHOLDER]
                .iter()
                .map(|arg| arg.to_string())
                .collect(),
        }
    }
}

impl Converter {
    pub fn args_for(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.display().to_string();
        let output = output.display().to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(INPUT_PLACEHOLDER, &input)
                    .replace(OUTPUT_PLACEHOLDER, &output)
            })
            .collect()
    }
}

/// Program reading the converted file on stdin and putting it on the clipboard.
/// Without a program the converted file is printed instead.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Clipboard {
    pub program: Option<String>,
    pub args: Vec<String>,
}

impl Default for Clipboard {
    fn default() -> Self {
        let program = if cfg!(target_os = "macos") {
            Some("pbcopy".to_string())
        } else {
            None
        };
        Clipboard {
            program,
            args: Vec::new(),
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("obex2drawio").join("config.toml"))
    }

    /// Loads `path` if given, else the default location. Only a missing
    /// default file falls back to built-in settings.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("no config file, using defaults");
                    Ok(Config::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        info!("Config path: {}", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}
