use clap::{Parser, Subcommand};
use mf_core::{MediaKind, OutputFormat};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mediaforge")]
#[command(author, version, about = "Batch media conversion for images, audio and video")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a batch of files of one media kind
    Convert {
        /// Target format (e.g. png, mp3, webm)
        #[arg(short = 't', long = "to")]
        format: OutputFormat,

        /// Folder the converted files are written to
        #[arg(short, long)]
        output: PathBuf,

        /// Expected media kind; by default the first valid file decides
        #[arg(short, long)]
        kind: Option<MediaKind>,

        /// Maximum number of files converted at once
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Print the batch result as JSON
        #[arg(long)]
        json: bool,

        /// Files to convert
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print the media kind of each file
    Classify {
        /// Files to classify
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List accepted input extensions and output formats
    Formats {
        /// Only show this media kind
        kind: Option<MediaKind>,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Display version information
    Version,
}
