//! CLI argument definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// S1/S2 heart-sound segmentation of phonocardiogram recordings.
#[derive(Debug, Parser)]
#[command(name = "heartseg")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Input files or directories to segment.
    pub inputs: Vec<PathBuf>,

    /// Common options for segmentation.
    #[command(flatten)]
    pub segment: SegmentArgs,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Arguments for segmenting recordings.
#[derive(Debug, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct SegmentArgs {
    /// Configuration file (default: platform config directory).
    #[arg(short, long, global = true, env = "HEARTSEG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base output directory (overrides config).
    #[arg(short, long, env = "HEARTSEG_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Subfolder under the output directory (default: input's parent directory name).
    #[arg(long)]
    pub subfolder: Option<String>,

    /// Segment without writing audio files.
    #[arg(long)]
    pub no_write: bool,

    /// Write a JSON summary of the run to this file.
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Stop on first error.
    #[arg(long)]
    pub fail_fast: bool,

    /// Disable the progress bar.
    #[arg(long)]
    pub no_progress: bool,

    /// Only show warnings and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
