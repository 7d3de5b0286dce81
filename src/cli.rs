use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "webpforge")]
#[command(author, version, about = "Batch WebP generation for image upload trees")]
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
    /// Convert every image under the configured source paths once
    Run,

    /// Convert a single original and its thumbnail sizes
    Convert {
        /// Original image to convert
        #[arg(required = true)]
        file: PathBuf,
    },

    /// Remove the derived artifact of a deleted original
    Delete {
        /// Original image that was (or is about to be) deleted
        #[arg(required = true)]
        file: PathBuf,
    },

    /// Run conversions on the configured schedule until interrupted
    Daemon,

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Manage the SQLite attachment metadata store
    Metadata {
        #[command(subcommand)]
        command: MetadataCommands,
    },

    /// Display version information
    Version,
}

#[derive(Subcommand)]
pub enum MetadataCommands {
    /// Import a JSON map of relative path to attachment metadata
    Import {
        /// JSON file to import
        #[arg(required = true)]
        file: PathBuf,
    },
}
