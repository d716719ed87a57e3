//! Heartseg - S1/S2 segmentation of phonocardiogram recordings.
//!
//! This crate band-passes and decimates heart-sound recordings, extracts a
//! Shannon-energy envelope, labels the envelope peaks as first (S1) or second
//! (S2) heart sounds and writes the sound domains as separate audio files.

#![warn(missing_docs)]

pub mod audio;
pub mod cli;
pub mod config;
pub mod constants;
pub mod dsp;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod segmentation;

use clap::Parser;
use cli::{Cli, Command, ConfigAction, SegmentArgs};
use config::{Config, config_file_path, load_config_file, load_default_config, save_config};
use output::{BatchSummary, progress};
use pipeline::{ProcessOptions, Processor, collect_input_files, process_file};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info};

pub use error::{Error, Result};

/// Main entry point for the heartseg CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.segment.verbose, cli.segment.quiet);

    if let Some(command) = cli.command {
        return handle_command(command, cli.segment.config.as_deref());
    }

    let mut config = load_config(cli.segment.config.as_deref())?;
    if let Some(dir) = &cli.segment.output_dir {
        config.output.dir.clone_from(dir);
    }

    segment_files(&cli.inputs, &cli.segment, config)
}

/// Load the configuration from an explicit path or the platform default.
///
/// An explicit path must exist; the default location may be absent.
fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) if !path.exists() => Err(Error::ConfigRead {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        }),
        Some(path) => load_config_file(path),
        None => load_default_config(),
    }
}

/// Segment input files with the given options.
fn segment_files(inputs: &[PathBuf], args: &SegmentArgs, config: Config) -> Result<()> {
    let total_start = Instant::now();

    let files = collect_input_files(inputs)?;
    if files.is_empty() {
        return Err(Error::NoValidAudioFiles);
    }

    info!("Found {} audio file(s) to segment", files.len());

    let processor = Processor::new(config)?;
    let options = ProcessOptions {
        subfolder: args.subfolder.clone(),
        no_write: args.no_write,
    };

    let progress_enabled = !args.quiet && !args.no_progress;
    let file_progress = progress::create_file_progress(files.len(), progress_enabled);

    let mut summary = BatchSummary::default();

    for file in &files {
        if let Some(name) = file.file_name() {
            progress::set_progress_file(file_progress.as_ref(), &name.to_string_lossy());
        }

        match process_file(file, &processor, &options) {
            Ok(result) => summary.push_ok(result),
            Err(e) => {
                error!("Failed to process {}: {}", file.display(), e);
                summary.push_failed(file, &e);

                if args.fail_fast {
                    progress::finish_progress(file_progress, "Failed");
                    return Err(e);
                }
            }
        }

        progress::inc_progress(file_progress.as_ref());
    }

    progress::finish_progress(file_progress, "Done");

    summary.log();
    info!(
        "Total time: {}",
        progress::format_duration(total_start.elapsed().as_secs_f32())
    );

    if let Some(path) = &args.summary {
        summary.write_json(path)?;
        info!("Wrote summary: {}", path.display());
    }

    Ok(())
}

/// Initialize tracing from the verbosity flags; `RUST_LOG` takes precedence.
fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter_str = if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn handle_command(command: Command, explicit_config: Option<&Path>) -> Result<()> {
    match command {
        Command::Config { action } => handle_config_command(action, explicit_config),
    }
}

#[allow(clippy::print_stdout)]
fn handle_config_command(action: ConfigAction, explicit_config: Option<&Path>) -> Result<()> {
    let path = match explicit_config {
        Some(path) => path.to_path_buf(),
        None => config_file_path()?,
    };

    match action {
        ConfigAction::Init => {
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                save_config(&Config::default(), &path)?;
                println!("Created configuration file: {}", path.display());
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_config(explicit_config)?;
            let contents = toml::to_string_pretty(&config)
                .map_err(|e| Error::ConfigSerialize { source: e })?;
            println!("{contents}");
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}
