// src/cli/batch_args.rs
use clap::Args;
use std::path::PathBuf;

/// Arguments for directory batch processing.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Directory to scan for videos
    pub input: PathBuf,

    /// Recurse into subdirectories
    #[arg(short = 'r', long)]
    pub recursive: bool,

    /// Output format: srt, ass, or vtt
    #[arg(long)]
    pub format: Option<String>,

    /// Worker pool size (default: min(4, hardware parallelism))
    #[arg(long)]
    pub workers: Option<usize>,

    /// Use the translation service for cross-language anchor matching
    #[arg(long)]
    pub use_translation: bool,

    /// Permit global shifts beyond 5 seconds without confirmation
    #[arg(long)]
    pub allow_large_offset: bool,
}
