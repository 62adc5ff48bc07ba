use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Capture and browse moments stored on this machine.
#[derive(Parser, Debug)]
#[command(name = "moments", version, about = "Local moment record store")]
pub struct Cli {
    /// Application directory; moments live under `<root>/moments`
    #[arg(long, env = "MOMENTS_ROOT", global = true)]
    pub root: Option<PathBuf>,
    /// trace|debug|info|warn|error
    #[arg(long, env = "MOMENTS_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,
    /// Defaults to `<root>/logs`
    #[arg(long, env = "MOMENTS_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Store a photo as a new moment
    Add {
        photo: PathBuf,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
        /// Take the photo file instead of copying it
        #[arg(long = "move")]
        move_source: bool,
    },
    /// List moments, newest first
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show one moment
    Show { id: String },
    /// Explain why a moment directory is or is not visible
    Inspect { id: String },
    /// Delete a moment and its photo
    Delete { id: String },
    /// Remove a moment directory even when it is not a visible record
    Purge { id: String },
    /// Print the gallery grid
    Grid {
        #[arg(long, default_value_t = 4)]
        columns: usize,
    },
    /// Print map pins and the region framing them
    Map {
        #[arg(long, requires = "viewer_lon", allow_negative_numbers = true)]
        viewer_lat: Option<f64>,
        #[arg(long, requires = "viewer_lat", allow_negative_numbers = true)]
        viewer_lon: Option<f64>,
    },
    /// Remove leftovers of interrupted creates and deletes
    Sweep,
    /// Check core linkage
    Ping,
}
