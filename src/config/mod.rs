//! Configuration management for bisub.
//!
//! Every option the engine recognizes is an explicit field here; there is
//! no string-keyed settings dictionary. Configuration is loaded from
//! defaults, then `$CONFIG_DIR/bisub/config.toml`, then `BISUB_*`
//! environment variables, and handed to components through the
//! [`ConfigService`] trait so tests can inject controlled values.

use serde::{Deserialize, Serialize};

pub mod service;
pub mod test_service;
pub mod validator;

pub use service::{ConfigService, ProductionConfigService};
pub use test_service::{TestConfigBuilder, TestConfigService};

/// Full application configuration for bisub.
///
/// # Examples
///
/// ```rust
/// use bisub_cli::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.alignment.threshold, 0.8);
/// assert_eq!(config.formats.default_output, "srt");
/// ```
///
/// # Serialization
///
/// The struct round-trips through TOML for the configuration file.
///
/// ```rust
/// use bisub_cli::config::Config;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let toml_str = toml::to_string(&Config::default())?;
/// assert!(toml_str.contains("[alignment]"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    /// General runtime options.
    pub general: GeneralConfig,
    /// Output format settings.
    pub formats: FormatsConfig,
    /// Alignment engine options.
    pub alignment: AlignmentConfig,
    /// Merge output options.
    pub merge: MergeConfig,
    /// Translation service settings.
    pub translator: TranslatorConfig,
    /// Batch processing parameters.
    pub parallel: ParallelConfig,
}

/// General runtime options.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GeneralConfig {
    /// Rename an existing output file to `<name>.bak` before overwriting.
    pub backup_enabled: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            backup_enabled: false,
        }
    }
}

/// Output format settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct FormatsConfig {
    /// Default merged output format: "srt", "ass", or "vtt".
    pub default_output: String,
}

impl Default for FormatsConfig {
    fn default() -> Self {
        Self {
            default_output: "srt".to_string(),
        }
    }
}

/// Alignment engine options.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Minimum anchor confidence for automatic adoption.
    pub threshold: f32,
    /// Relaxed confidence floor for large-offset (semantic) anchors.
    pub semantic_threshold: f32,
    /// Anti-flicker fuse distance in milliseconds.
    pub time_threshold_ms: u32,
    /// Anchor strategy: auto, first_line, scan, translation, manual.
    pub sync_strategy: String,
    /// Permit global shifts beyond 5 s without confirmation.
    pub allow_large_offset: bool,
    /// Enable pre-anchor trim and the large-offset path when the reference
    /// is embedded and the shifted track is external.
    pub enable_mixed_realignment: bool,
    /// Activate translation-assisted anchor strategies.
    pub use_translation: bool,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            threshold: 0.8,
            semantic_threshold: 0.15,
            time_threshold_ms: 100,
            sync_strategy: "auto".to_string(),
            allow_large_offset: false,
            enable_mixed_realignment: false,
            use_translation: false,
        }
    }
}

/// Merge output options.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct MergeConfig {
    /// Which language appears first in merged SRT text ("zh", "en", ...).
    pub primary_language: String,
    /// Reference-track designation: "auto", "embedded", or "external".
    pub reference_preference: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            primary_language: "zh".to_string(),
            reference_preference: "auto".to_string(),
        }
    }
}

/// Translation service settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TranslatorConfig {
    /// LibreTranslate-compatible endpoint base URL.
    pub endpoint: String,
    /// Optional API key sent with each request.
    pub api_key: Option<String>,
    /// Per-request deadline in seconds.
    pub timeout_seconds: u64,
    /// Maximum translator calls per alignment.
    pub max_calls_per_alignment: usize,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://libretranslate.com".to_string(),
            api_key: None,
            timeout_seconds: 30,
            max_calls_per_alignment: 10,
        }
    }
}

/// Batch processing parameters.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ParallelConfig {
    /// Worker pool size; 0 means `min(4, hardware_parallelism)`.
    pub max_workers: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self { max_workers: 0 }
    }
}

impl ParallelConfig {
    /// Effective worker count for this machine.
    pub fn effective_workers(&self) -> usize {
        if self.max_workers > 0 {
            self.max_workers
        } else {
            num_cpus::get().min(4).max(1)
        }
    }
}
