use anyhow::{Context, Result};
use colored::*;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tempfile::PersistError;
use tracing::{info, warn};

use crate::actions::{copy_to_clipboard, create_temp_file, open_input, print_file, run_converter};
use crate::config::{Config, Converter};
use crate::extract::extract_to;

pub const JSON_PREFIX: &str = "obex2drawio.json.";
pub const DIAGRAM_PREFIX: &str = "obex2drawio.gliffy.";

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    /// Copy the result to the clipboard when a clipboard program is configured.
    pub clip: bool,
    /// Remove the scratch files once done.
    pub delete: bool,
    pub temp_dir: Option<PathBuf>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            clip: true,
            delete: true,
            temp_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Extract { source: String },
    Convert { converter: Converter },
    CopyToClipboard { program: String, args: Vec<String> },
    Print,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Extract { source } => write!(f, "Extract json block from '{}'", source),
            Step::Convert { converter } => write!(
                f,
                "Run converter: `{} {}`",
                converter.program,
                converter.args.join(" ")
            ),
            Step::CopyToClipboard { program, args } if args.is_empty() => {
                write!(f, "Copy converted file to clipboard with `{}`", program)
            }
            Step::CopyToClipboard { program, args } => write!(
                f,
                "Copy converted file to clipboard with `{} {}`",
                program,
                args.join(" ")
            ),
            Step::Print => write!(f, "Print converted file"),
        }
    }
}

/// Scratch files shared by the steps of one run.
struct Scratch {
    json: PathBuf,
    diagram: PathBuf,
}

impl Step {
    fn execute(&self, scratch: &Scratch, out: &mut dyn Write) -> Result<()> {
        match self {
            Step::Extract { source } => {
                info!("Action: Extract json block from '{}'", source);
                let reader = open_input::execute(source)?;
                let file = File::create(&scratch.json).with_context(|| {
                    format!("Failed to open temp file: {}", scratch.json.display())
                })?;
                extract_to(BufWriter::new(file), reader)
                    .with_context(|| format!("extract excalidraw data from '{}' failed", source))?;
            }
            Step::Convert { converter } => {
                run_converter::execute(converter, &scratch.json, &scratch.diagram)?;
            }
            Step::CopyToClipboard { program, args } => {
                copy_to_clipboard::execute(program, args, &scratch.diagram)?;
            }
            Step::Print => {
                print_file::execute(&scratch.diagram, out)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionPlan {
    pub steps: Vec<Step>,
    pub keep_temp_files: bool,
    pub temp_dir: Option<PathBuf>,
}

impl ConversionPlan {
    pub fn new(source: &str, config: &Config, options: &ConvertOptions) -> Self {
        let mut steps = vec![
            Step::Extract {
                source: source.to_string(),
            },
            Step::Convert {
                converter: config.converter.clone(),
            },
        ];
        match (&config.clipboard.program, options.clip) {
            (Some(program), true) => steps.push(Step::CopyToClipboard {
                program: program.clone(),
                args: config.clipboard.args.clone(),
            }),
            (None, true) => {
                info!("no clipboard program configured, printing instead");
                steps.push(Step::Print);
            }
            (_, false) => steps.push(Step::Print),
        }
        ConversionPlan {
            steps,
            keep_temp_files: !options.delete,
            temp_dir: options.temp_dir.clone(),
        }
    }

    pub fn render(&self) -> String {
        let mut lines = vec!["--- Conversion Plan ---".to_string()];
        for (i, step) in self.steps.iter().enumerate() {
            lines.push(format!("{}. {}", i + 1, step));
        }
        let temp_files = if self.keep_temp_files { "kept" } else { "deleted afterwards" };
        lines.push(format!("Temp files: {}", temp_files));
        lines.push("-----------------------".to_string());
        lines.join("\n")
    }

    pub fn display(&self) {
        println!("{}", self.render().cyan());
    }

    /// Runs every step in order, stopping at the first failure. Scratch files
    /// are removed afterwards unless the plan keeps them, even on failure.
    pub fn execute<W: Write>(&self, mut out: W) -> Result<()> {
        let dir = self.temp_dir.as_deref();
        let json = create_temp_file::execute(JSON_PREFIX, dir)?;
        let diagram = create_temp_file::execute(DIAGRAM_PREFIX, dir)?;
        let scratch = Scratch {
            json: json.path().to_path_buf(),
            diagram: diagram.path().to_path_buf(),
        };

        let total = self.steps.len();
        let mut result = self.steps.iter().enumerate().try_for_each(|(i, step)| {
            info!("Step {}/{}: {}", i + 1, total, step);
            step.execute(&scratch, &mut out)
        });

        if self.keep_temp_files {
            for file in [json, diagram] {
                result = record_kept(file.keep(), result);
            }
        }
        result
    }
}

/// Folds the outcome of keeping a scratch file into the run's result. A step
/// failure takes precedence; a keep failure on top of it is only logged.
fn record_kept(kept: Result<(File, PathBuf), PersistError>, result: Result<()>) -> Result<()> {
    match (kept, result) {
        (Ok((_, path)), result) => {
            info!("Kept temp file: {}", path.display());
            result
        }
        (Err(e), Ok(())) => Err(e).context("Failed to keep temp file"),
        (Err(e), Err(step_error)) => {
            warn!("Failed to keep temp file {}: {}", e.file.path().display(), e.error);
            Err(step_error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Clipboard;
    use std::fs;

    fn config(clipboard: Option<&str>) -> Config {
        Config {
            converter: Converter::default(),
            clipboard: Clipboard {
                program: clipboard.map(str::to_string),
                args: Vec::new(),
            },
        }
    }

    #[test]
    fn test_plan_copies_when_clipboard_configured() {
        let plan = ConversionPlan::new("a.md", &config(Some("pbcopy")), &ConvertOptions::default());
        assert_eq!(
            plan.steps,
            vec![
                Step::Extract {
                    source: "a.md".to_string()
                },
                Step::Convert {
                    converter: Converter::default()
                },
                Step::CopyToClipboard {
                    program: "pbcopy".to_string(),
                    args: Vec::new()
                },
            ]
        );
        assert!(!plan.keep_temp_files);
    }

    #[test]
    fn test_plan_prints_without_clipboard() {
        let plan = ConversionPlan::new("a.md", &config(None), &ConvertOptions::default());
        assert_eq!(plan.steps.last(), Some(&Step::Print));
    }

    #[test]
    fn test_plan_prints_when_clip_disabled() {
        let options = ConvertOptions {
            clip: false,
            delete: false,
            temp_dir: None,
        };
        let plan = ConversionPlan::new("a.md", &config(Some("pbcopy")), &options);
        assert_eq!(plan.steps.last(), Some(&Step::Print));
        assert!(plan.keep_temp_files);
    }

    #[test]
    fn test_render() {
        let plan = ConversionPlan::new("a.md", &config(Some("pbcopy")), &ConvertOptions::default());
        assert_eq!(
            plan.render(),
            "--- Conversion Plan ---\n\
             1. Extract json block from 'a.md'\n\
             2. Run converter: `exconv gliffy -i {input} -o {output}`\n\
             3. Copy converted file to clipboard with `pbcopy`\n\
             Temp files: deleted afterwards\n\
             -----------------------"
        );
    }

    fn keep_failure() -> PersistError {
        PersistError {
            error: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            file: tempfile::NamedTempFile::new().expect("temp file"),
        }
    }

    #[test]
    fn test_keep_failure_does_not_hide_step_error() {
        let step_error = anyhow::anyhow!("convert failed with status 1");
        let err = record_kept(Err(keep_failure()), Err(step_error)).unwrap_err();
        assert_eq!(err.to_string(), "convert failed with status 1");
    }

    #[test]
    fn test_keep_failure_after_successful_run() {
        let err = record_kept(Err(keep_failure()), Ok(())).unwrap_err();
        assert_eq!(err.to_string(), "Failed to keep temp file");
    }

    #[test]
    fn test_kept_file_passes_result_through() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let kept = tempfile::NamedTempFile::new_in(dir.path())?.keep();
        let err = record_kept(kept, Err(anyhow::anyhow!("extract failed"))).unwrap_err();
        assert_eq!(err.to_string(), "extract failed");
        assert_eq!(fs::read_dir(dir.path())?.count(), 1);
        Ok(())
    }

    #[cfg(unix)]
    mod execution {
        use super::*;
        use std::path::Path;

        const DRAWING: &str = "# Drawing\n```json\n{\"type\":\"excalidraw\"}\n```\n";

        /// Path of the kept scratch file with `prefix` in `dir`, if any.
        fn find_scratch_file(dir: &Path, prefix: &str) -> Result<Option<PathBuf>> {
            for entry in fs::read_dir(dir)
                .with_context(|| format!("Failed to list directory: {}", dir.display()))?
            {
                let path = entry?.path();
                let matches = path
                    .file_name()
                    .map(|name| name.to_string_lossy().starts_with(prefix))
                    .unwrap_or(false);
                if matches {
                    return Ok(Some(path));
                }
            }
            Ok(None)
        }

        fn copying_config() -> Config {
            Config {
                converter: Converter {
                    program: "cp".to_string(),
                    args: vec!["{input}".to_string(), "{output}".to_string()],
                },
                clipboard: Clipboard {
                    program: None,
                    args: Vec::new(),
                },
            }
        }

        fn options(dir: &Path, delete: bool) -> ConvertOptions {
            ConvertOptions {
                clip: true,
                delete,
                temp_dir: Some(dir.to_path_buf()),
            }
        }

        #[test]
        fn test_execute_prints_converted_file() -> Result<()> {
            let source_dir = tempfile::tempdir()?;
            let scratch_dir = tempfile::tempdir()?;
            let source = source_dir.path().join("drawing.excalidraw.md");
            fs::write(&source, DRAWING)?;

            let plan = ConversionPlan::new(
                &source.display().to_string(),
                &copying_config(),
                &options(scratch_dir.path(), true),
            );
            let mut out = Vec::new();
            plan.execute(&mut out)?;

            assert_eq!(out, b"{\"type\":\"excalidraw\"}\n\n");
            assert_eq!(fs::read_dir(scratch_dir.path())?.count(), 0);
            Ok(())
        }

        #[test]
        fn test_execute_keeps_scratch_files() -> Result<()> {
            let source_dir = tempfile::tempdir()?;
            let scratch_dir = tempfile::tempdir()?;
            let source = source_dir.path().join("drawing.excalidraw.md");
            fs::write(&source, DRAWING)?;

            let plan = ConversionPlan::new(
                &source.display().to_string(),
                &copying_config(),
                &options(scratch_dir.path(), false),
            );
            plan.execute(Vec::new())?;

            let json = find_scratch_file(scratch_dir.path(), JSON_PREFIX)?.expect("json scratch file");
            let diagram =
                find_scratch_file(scratch_dir.path(), DIAGRAM_PREFIX)?.expect("diagram scratch file");
            assert_eq!(fs::read_to_string(json)?, "{\"type\":\"excalidraw\"}\n");
            assert_eq!(fs::read_to_string(diagram)?, "{\"type\":\"excalidraw\"}\n");
            Ok(())
        }

        #[test]
        fn test_execute_stops_on_ambiguous_document() -> Result<()> {
            let source_dir = tempfile::tempdir()?;
            let scratch_dir = tempfile::tempdir()?;
            let source = source_dir.path().join("drawing.excalidraw.md");
            fs::write(&source, "```json\n1\n```\n\n```json\n2\n```\n")?;

            let plan = ConversionPlan::new(
                &source.display().to_string(),
                &copying_config(),
                &options(scratch_dir.path(), true),
            );
            let mut out = Vec::new();
            let err = plan.execute(&mut out).unwrap_err();

            let message = format!("{:#}", err);
            assert!(message.contains("extract excalidraw data"), "{message}");
            assert!(message.contains("invalid number of json blocks: 2"), "{message}");
            assert!(out.is_empty());
            assert_eq!(fs::read_dir(scratch_dir.path())?.count(), 0);
            Ok(())
        }

        #[test]
        fn test_execute_reports_converter_failure() -> Result<()> {
            let source_dir = tempfile::tempdir()?;
            let scratch_dir = tempfile::tempdir()?;
            let source = source_dir.path().join("drawing.excalidraw.md");
            fs::write(&source, DRAWING)?;

            let mut config = copying_config();
            config.converter.program = "false".to_string();
            let plan = ConversionPlan::new(
                &source.display().to_string(),
                &config,
                &options(scratch_dir.path(), true),
            );
            let err = plan.execute(Vec::new()).unwrap_err();
            assert!(err.to_string().starts_with("convert failed"));
            Ok(())
        }
    }
}
