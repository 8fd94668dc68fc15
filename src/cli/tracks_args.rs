// src/cli/tracks_args.rs
use clap::Args;
use std::path::PathBuf;

/// Arguments for the track inspection command.
#[derive(Args, Debug)]
pub struct TracksArgs {
    /// Video container to inspect
    pub video: PathBuf,

    /// Rank candidates for this target language (zh, en, ja, ko)
    #[arg(long, default_value = "zh")]
    pub for_language: String,
}
