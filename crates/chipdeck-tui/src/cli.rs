//! CLI argument parsing for chipdeck.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chipdeck")]
#[command(about = "Live template chips in the terminal", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file (defaults to ~/.config/chipdeck/config.json)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Template server socket (overrides backend.socketPath)
    #[arg(short, long, global = true)]
    pub socket: Option<PathBuf>,

    /// Enable debug logging (logs to $TMPDIR/chipdeck.log)
    #[arg(short, long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the configured chips and keep them live (default)
    Watch,

    /// Print the inline icon segments of some chip text as JSON
    Scan {
        /// Text to scan, e.g. "Hello [mdi:fire]!"
        text: String,
    },

    /// Print the cache key of every configured chip
    Hash,

    /// Validate the config file
    Check,
}
