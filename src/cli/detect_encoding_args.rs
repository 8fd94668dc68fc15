// src/cli/detect_encoding_args.rs
use clap::Args;
use std::path::PathBuf;

/// Arguments for encoding detection and conversion.
#[derive(Args, Debug)]
pub struct DetectEncodingArgs {
    /// Subtitle files to inspect
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Rewrite each file in place as UTF-8 after detection
    #[arg(long)]
    pub convert: bool,
}
