use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::*;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use tracing::{debug, Level};

use obex2drawio::actions::open_input;
use obex2drawio::config::Config;
use obex2drawio::convert::{ConversionPlan, ConvertOptions};
use obex2drawio::extract_to;
use obex2drawio::fs::expand_home;

#[derive(Parser, Debug)]
#[command(name = "obex2drawio", version, about = "Convert Obsidian Excalidraw drawings for draw.io")]
struct Cli {
    /// Config file, defaults to <config dir>/obex2drawio/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log more; repeat for more detail
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract raw excalidraw json data from excalidraw.md
    Extract {
        /// Markdown file, or `-` for stdin
        file: String,
    },
    /// Convert excalidraw.md in obsidian to gliffy (supported by drawio) and copy it to the clipboard
    Convert {
        /// Markdown file, or `-` for stdin
        file: String,

        /// Copy to clipboard
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        clip: bool,

        /// Delete temp files
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        delete: bool,

        /// Directory for temp files, defaults to the system temp directory
        #[arg(long)]
        temp_dir: Option<PathBuf>,

        /// Show the steps without running them
        #[arg(long)]
        dry_run: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Extract { file } => {
            let reader = open_input::execute(&file)?;
            let stdout = io::stdout();
            extract_to(BufWriter::new(stdout.lock()), reader)
                .with_context(|| format!("extract failed for '{}'", file))?;
        }
        Commands::Convert {
            file,
            clip,
            delete,
            temp_dir,
            dry_run,
        } => {
            let config_path = cli.config.as_deref().map(expand_home).transpose()?;
            let config = Config::load(config_path.as_deref())?;
            debug!("{:?}", config);

            let options = ConvertOptions {
                clip,
                delete,
                temp_dir,
            };
            let plan = ConversionPlan::new(&file, &config, &options);
            if dry_run {
                plan.display();
                return Ok(());
            }
            plan.execute(io::stdout().lock())?;
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
