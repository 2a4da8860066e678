//! The command line interface for the sizing tool.
use crate::log;
use crate::model::Model;
use crate::output::{create_output_directory, get_output_dir};
use crate::settings::Settings;
use ::log::{info, warn};
use anyhow::{Context, Result, ensure};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

/// The command line interface for the sizing tool.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Commands,
}

/// Options for the run command
#[derive(Args)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Size the system described by a model folder.
    Run {
        /// Path to the model directory.
        model_dir: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Validate a model without solving it.
    Validate {
        /// Path to the model directory.
        model_dir: PathBuf,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { model_dir, opts } => handle_run_command(&model_dir, &opts),
            Self::Validate { model_dir } => handle_validate_command(&model_dir),
        }
    }
}

/// Parse CLI arguments and dispatch to the chosen command
pub fn run_cli() -> Result<()> {
    Cli::parse().command.execute()
}

/// Handle the `run` command.
pub fn handle_run_command(model_path: &Path, opts: &RunOpts) -> Result<()> {
    let settings = Settings::from_model_dir(model_path).context("Failed to load settings.")?;

    // Get path to output folder
    let pathbuf: PathBuf;
    let output_path = if let Some(p) = opts.output_dir.as_deref() {
        p
    } else {
        pathbuf = get_output_dir(model_path)?;
        &pathbuf
    };

    let overwrite = opts.overwrite || settings.overwrite;
    let cleared = clear_existing_output(output_path, overwrite)?;
    create_output_directory(output_path).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            output_path.display()
        )
    })?;

    // Initialise program logger
    log::init(Some(settings.log_level.as_str()), Some(output_path))
        .context("Failed to initialise logging.")?;

    // NB: We have to wait until the logger is initialised to display this warning
    if cleared {
        warn!("Existing output folder was overwritten");
    }

    let model = Model::from_path(model_path).context("Failed to load model.")?;
    info!("Loaded model from {}", model_path.display());
    info!("Output folder: {}", output_path.display());

    crate::simulation::run(&model, output_path)?;
    info!("Sizing complete!");

    Ok(())
}

/// Remove a pre-existing output folder, if overwriting is allowed.
fn clear_existing_output(output_path: &Path, overwrite: bool) -> Result<bool> {
    if !output_path.is_dir() {
        return Ok(false);
    }

    ensure!(
        overwrite,
        "Output folder {} already exists (pass --overwrite to replace it)",
        output_path.display()
    );
    fs::remove_dir_all(output_path).with_context(|| {
        format!(
            "Failed to remove output directory: {}",
            output_path.display()
        )
    })?;

    Ok(true)
}

/// Handle the `validate` command.
pub fn handle_validate_command(model_path: &Path) -> Result<()> {
    let settings = Settings::from_model_dir(model_path).context("Failed to load settings.")?;

    // No log files for the validate command
    log::init(Some(settings.log_level.as_str()), None)
        .context("Failed to initialise logging.")?;

    Model::from_path(model_path).context("Failed to validate model.")?;
    info!("Model validation successful!");

    Ok(())
}
