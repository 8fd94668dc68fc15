// src/cli/merge_args.rs
use clap::Args;
use std::path::PathBuf;

/// Arguments for the single-job merge command.
///
/// A job needs two track sources: any mix of explicit subtitle files and
/// embedded streams picked from `--video`. Options mirror the engine's
/// configuration record; anything unset falls back to the config file.
#[derive(Args, Debug, Default)]
pub struct MergeArgs {
    /// Video container supplying embedded tracks and the output base name
    #[arg(short = 'v', long)]
    pub video: Option<PathBuf>,

    /// Primary-language subtitle file (typically the Chinese track)
    #[arg(short = 'p', long)]
    pub primary: Option<PathBuf>,

    /// Secondary-language subtitle file (typically the English track)
    #[arg(short = 's', long)]
    pub secondary: Option<PathBuf>,

    /// Output file path (default: <base>.<pri>-<sec>.<ext>)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Output format: srt, ass, or vtt
    #[arg(long)]
    pub format: Option<String>,

    /// Primary language code (zh, en, ja, ko)
    #[arg(long)]
    pub primary_lang: Option<String>,

    /// Secondary language code
    #[arg(long)]
    pub secondary_lang: Option<String>,

    /// Minimum anchor confidence for automatic adoption (0..1)
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Anti-flicker fuse distance in milliseconds
    #[arg(long)]
    pub time_threshold: Option<u32>,

    /// Anchor strategy: auto, first_line, scan, translation, manual
    #[arg(long)]
    pub strategy: Option<String>,

    /// Permit global shifts beyond 5 seconds without confirmation
    #[arg(long)]
    pub allow_large_offset: bool,

    /// Enable pre-anchor trim and the large-offset path for
    /// embedded-reference/external-shifted pairs
    #[arg(long)]
    pub mixed_realignment: bool,

    /// Use the translation service for cross-language anchor matching
    #[arg(long)]
    pub use_translation: bool,

    /// Explicit stream index for the primary track
    #[arg(long)]
    pub primary_track: Option<usize>,

    /// Explicit stream index for the secondary track
    #[arg(long)]
    pub secondary_track: Option<usize>,

    /// Keep the external track's clock and shift the embedded one
    #[arg(long, conflicts_with = "prefer_embedded")]
    pub prefer_external: bool,

    /// Keep the embedded track's clock and shift the external one
    #[arg(long)]
    pub prefer_embedded: bool,

    /// Prompt for a manual anchor choice when confidence is low
    #[arg(short = 'i', long)]
    pub interactive: bool,
}

impl MergeArgs {
    /// Check source combinations before execution.
    pub fn validate(&self) -> Result<(), String> {
        if self.video.is_none() {
            if self.primary.is_none() || self.secondary.is_none() {
                return Err(
                    "without --video, both --primary and --secondary subtitle files are required"
                        .to_string(),
                );
            }
            if self.primary_track.is_some() || self.secondary_track.is_some() {
                return Err("track overrides require --video".to_string());
            }
        }
        if let Some(format) = &self.format {
            if crate::core::formats::OutputFormat::from_name(format).is_none() {
                return Err(format!("unsupported output format: {}", format));
            }
        }
        if let Some(threshold) = self.threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(format!("threshold must be within [0, 1], got {}", threshold));
            }
        }
        if let Some(strategy) = &self.strategy {
            if crate::core::align::SyncStrategy::from_name(strategy).is_none() {
                return Err(format!("unknown sync strategy: {}", strategy));
            }
        }
        Ok(())
    }

    /// Fold CLI overrides into the loaded configuration.
    pub fn apply_to_config(&self, config: &mut crate::config::Config) {
        if let Some(format) = &self.format {
            config.formats.default_output = format.clone();
        }
        if let Some(threshold) = self.threshold {
            config.alignment.threshold = threshold;
        }
        if let Some(ms) = self.time_threshold {
            config.alignment.time_threshold_ms = ms;
        }
        if let Some(strategy) = &self.strategy {
            config.alignment.sync_strategy = strategy.clone();
        }
        if self.allow_large_offset {
            config.alignment.allow_large_offset = true;
        }
        if self.mixed_realignment {
            config.alignment.enable_mixed_realignment = true;
        }
        if self.use_translation {
            config.alignment.use_translation = true;
        }
        if let Some(lang) = &self.primary_lang {
            config.merge.primary_language = lang.clone();
        }
        if self.prefer_external {
            config.merge.reference_preference = "external".to_string();
        }
        if self.prefer_embedded {
            config.merge.reference_preference = "embedded".to_string();
        }
    }
}
