pub mod implementations;
pub mod printing;
pub mod utils;

use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};
use setforge_core::library::Library;

pub trait CommandHandler {
    type Output;

    fn handle(&self, library: &Library<'_>) -> Self::Output;
}

/// One of spec.md's output formats, shared by every command that emits a
/// playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    M3u8,
    Rekordbox,
    Traktor,
    Serato,
    Csv,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze a single audio file
    Analyze {
        /// Path to the audio file
        path: PathBuf,
        #[clap(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Analyze every audio file under a directory
    AnalyzeDir {
        /// Path to the directory to walk
        dir: PathBuf,
        #[clap(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Inspect or maintain the on-disk analysis cache
    Cache {
        #[clap(subcommand)]
        command: CacheCommand,
    },
    /// Suggest tracks related to a given one
    Suggest {
        #[clap(subcommand)]
        command: SuggestCommand,
    },
    /// Build a playlist via beam search against an energy curve
    Solve {
        /// Directory of candidate audio files
        #[clap(long)]
        pool: PathBuf,
        /// JSON file of `[{"position": 0.0, "energy": 4.0}, ...]` control points
        #[clap(long)]
        curve: PathBuf,
        /// Target playlist length
        #[clap(long)]
        len: usize,
        /// Optional seed tracks to start the search from
        #[clap(long)]
        seed: Vec<PathBuf>,
        #[clap(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Validate a playlist and report its quality score and issues
    Validate {
        /// Path to a playlist JSON file (the same shape `analyze-dir`/`solve` emit)
        playlist: PathBuf,
        /// Apply the safe auto-fixes before scoring
        #[clap(long)]
        fix: bool,
        #[clap(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Print cache statistics
    Stats,
    /// Drop entries whose source file or cache file no longer exists
    Optimize,
    /// Drop entries older than `--max-age-days` or past `--max-size-mb`
    Evict {
        #[clap(long)]
        max_age_days: Option<u64>,
        #[clap(long)]
        max_size_mb: Option<u64>,
    },
    /// Delete every cache entry
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum SuggestCommand {
    /// Nearest harmonically/energetically compatible tracks from the index
    Similar {
        /// Path to the base track
        path: PathBuf,
        #[clap(long, default_value_t = 10)]
        k: usize,
        #[clap(long, default_value_t = 0.5)]
        min_compat: f64,
    },
    /// Deliberately unexpected picks from a pool, for variety
    Surprise {
        /// Path to the base track
        path: PathBuf,
        /// Directory of candidate audio files to draw surprises from
        #[clap(long)]
        pool: PathBuf,
        #[clap(long, default_value_t = 10)]
        k: usize,
    },
}
