//! Configuration service system for dependency injection and test
//! isolation.
//!
//! All configuration access goes through the [`ConfigService`] trait:
//! production code uses [`ProductionConfigService`] (file + environment),
//! tests use [`super::TestConfigService`] with controlled values and no
//! global state.

use crate::Result;
use crate::config::{Config, validator};
use crate::error::BisubError;
use config::{Config as ConfigCrate, Environment, File};
use log::debug;
use std::path::PathBuf;
use std::sync::RwLock;

/// Configuration service trait for dependency injection.
pub trait ConfigService: Send + Sync {
    /// Get the current configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or validation fails.
    fn get_config(&self) -> Result<Config>;

    /// Force a reload from all sources, discarding cached values.
    fn reload(&self) -> Result<()>;

    /// Persist the current configuration to the default file location.
    fn save_config(&self) -> Result<()>;

    /// The path configuration is loaded from and saved to.
    fn config_file_path(&self) -> Result<PathBuf>;

    /// Read one configuration value by dot-separated key.
    fn get_config_value(&self, key: &str) -> Result<String>;

    /// Set one configuration value by dot-separated key and persist it.
    fn set_config_value(&self, key: &str, value: &str) -> Result<()>;

    /// Overwrite the configuration file with defaults and reload.
    fn reset_to_defaults(&self) -> Result<()>;
}

/// Production configuration service.
///
/// Sources in priority order: `BISUB_*` environment variables, the user
/// configuration file, built-in defaults. The loaded configuration is
/// cached until `reload`.
pub struct ProductionConfigService {
    cached: RwLock<Option<Config>>,
    config_path: PathBuf,
}

impl ProductionConfigService {
    /// Create a service using the standard config directory.
    pub fn new() -> Result<Self> {
        let config_path = dirs::config_dir()
            .ok_or_else(|| BisubError::config("cannot determine config directory"))?
            .join("bisub")
            .join("config.toml");
        Ok(Self {
            cached: RwLock::new(None),
            config_path,
        })
    }

    /// Create a service reading from an explicit file path.
    pub fn with_config_path(config_path: PathBuf) -> Self {
        Self {
            cached: RwLock::new(None),
            config_path,
        }
    }

    fn load(&self) -> Result<Config> {
        let mut builder = ConfigCrate::builder();
        if self.config_path.exists() {
            debug!("loading config from {}", self.config_path.display());
            builder = builder.add_source(File::from(self.config_path.as_path()));
        }
        builder = builder.add_source(Environment::with_prefix("BISUB").separator("__"));

        let raw = builder.build()?;
        let mut config: Config = raw.try_deserialize().unwrap_or_default();
        merge_missing_defaults(&mut config);
        validator::validate_config(&config)?;
        Ok(config)
    }

    fn write_config(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = toml::to_string_pretty(config)
            .map_err(|e| BisubError::config(format!("serialize failed: {}", e)))?;
        std::fs::write(&self.config_path, text)?;
        Ok(())
    }
}

/// The `config` crate only reports keys present in a source; re-apply the
/// defaults for anything a sparse file left empty.
fn merge_missing_defaults(config: &mut Config) {
    let defaults = Config::default();
    if config.formats.default_output.is_empty() {
        config.formats.default_output = defaults.formats.default_output;
    }
    if config.alignment.sync_strategy.is_empty() {
        config.alignment.sync_strategy = defaults.alignment.sync_strategy;
    }
    if config.merge.primary_language.is_empty() {
        config.merge.primary_language = defaults.merge.primary_language;
    }
    if config.merge.reference_preference.is_empty() {
        config.merge.reference_preference = defaults.merge.reference_preference;
    }
    if config.translator.endpoint.is_empty() {
        config.translator.endpoint = defaults.translator.endpoint;
    }
}

impl ConfigService for ProductionConfigService {
    fn get_config(&self) -> Result<Config> {
        {
            let cached = self.cached.read().unwrap();
            if let Some(config) = cached.as_ref() {
                return Ok(config.clone());
            }
        }
        let config = self.load()?;
        *self.cached.write().unwrap() = Some(config.clone());
        Ok(config)
    }

    fn reload(&self) -> Result<()> {
        let config = self.load()?;
        *self.cached.write().unwrap() = Some(config);
        Ok(())
    }

    fn save_config(&self) -> Result<()> {
        let config = self.get_config()?;
        self.write_config(&config)
    }

    fn config_file_path(&self) -> Result<PathBuf> {
        Ok(self.config_path.clone())
    }

    fn get_config_value(&self, key: &str) -> Result<String> {
        let config = self.get_config()?;
        read_config_key(&config, key)
    }

    fn set_config_value(&self, key: &str, value: &str) -> Result<()> {
        let mut config = self.get_config()?;
        write_config_key(&mut config, key, value)?;
        validator::validate_config(&config)?;
        self.write_config(&config)?;
        *self.cached.write().unwrap() = Some(config);
        Ok(())
    }

    fn reset_to_defaults(&self) -> Result<()> {
        self.write_config(&Config::default())?;
        self.reload()
    }
}

/// Read a configuration value by dot-separated key path.
pub fn read_config_key(config: &Config, key: &str) -> Result<String> {
    let value = match key {
        "general.backup_enabled" => config.general.backup_enabled.to_string(),
        "formats.default_output" => config.formats.default_output.clone(),
        "alignment.threshold" => config.alignment.threshold.to_string(),
        "alignment.semantic_threshold" => config.alignment.semantic_threshold.to_string(),
        "alignment.time_threshold_ms" => config.alignment.time_threshold_ms.to_string(),
        "alignment.sync_strategy" => config.alignment.sync_strategy.clone(),
        "alignment.allow_large_offset" => config.alignment.allow_large_offset.to_string(),
        "alignment.enable_mixed_realignment" => {
            config.alignment.enable_mixed_realignment.to_string()
        }
        "alignment.use_translation" => config.alignment.use_translation.to_string(),
        "merge.primary_language" => config.merge.primary_language.clone(),
        "merge.reference_preference" => config.merge.reference_preference.clone(),
        "translator.endpoint" => config.translator.endpoint.clone(),
        "translator.timeout_seconds" => config.translator.timeout_seconds.to_string(),
        "translator.max_calls_per_alignment" => {
            config.translator.max_calls_per_alignment.to_string()
        }
        "parallel.max_workers" => config.parallel.max_workers.to_string(),
        _ => return Err(BisubError::config(format!("unknown config key: {}", key))),
    };
    Ok(value)
}

/// Write a configuration value by dot-separated key path.
pub fn write_config_key(config: &mut Config, key: &str, value: &str) -> Result<()> {
    fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
        value
            .parse()
            .map_err(|_| BisubError::config(format!("invalid value for {}: {}", key, value)))
    }

    match key {
        "general.backup_enabled" => config.general.backup_enabled = parse(key, value)?,
        "formats.default_output" => config.formats.default_output = value.to_string(),
        "alignment.threshold" => config.alignment.threshold = parse(key, value)?,
        "alignment.semantic_threshold" => {
            config.alignment.semantic_threshold = parse(key, value)?
        }
        "alignment.time_threshold_ms" => config.alignment.time_threshold_ms = parse(key, value)?,
        "alignment.sync_strategy" => config.alignment.sync_strategy = value.to_string(),
        "alignment.allow_large_offset" => {
            config.alignment.allow_large_offset = parse(key, value)?
        }
        "alignment.enable_mixed_realignment" => {
            config.alignment.enable_mixed_realignment = parse(key, value)?
        }
        "alignment.use_translation" => config.alignment.use_translation = parse(key, value)?,
        "merge.primary_language" => config.merge.primary_language = value.to_string(),
        "merge.reference_preference" => config.merge.reference_preference = value.to_string(),
        "translator.endpoint" => config.translator.endpoint = value.to_string(),
        "translator.api_key" => config.translator.api_key = Some(value.to_string()),
        "translator.timeout_seconds" => config.translator.timeout_seconds = parse(key, value)?,
        "translator.max_calls_per_alignment" => {
            config.translator.max_calls_per_alignment = parse(key, value)?
        }
        "parallel.max_workers" => config.parallel.max_workers = parse(key, value)?,
        _ => return Err(BisubError::config(format!("unknown config key: {}", key))),
    }
    Ok(())
}

/// Every key accepted by `get`/`set`, for the config command listing.
pub const KNOWN_KEYS: &[&str] = &[
    "general.backup_enabled",
    "formats.default_output",
    "alignment.threshold",
    "alignment.semantic_threshold",
    "alignment.time_threshold_ms",
    "alignment.sync_strategy",
    "alignment.allow_large_offset",
    "alignment.enable_mixed_realignment",
    "alignment.use_translation",
    "merge.primary_language",
    "merge.reference_preference",
    "translator.endpoint",
    "translator.timeout_seconds",
    "translator.max_calls_per_alignment",
    "parallel.max_workers",
];
