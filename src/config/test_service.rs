//! Test configuration service with controlled behavior and no file or
//! environment access.

use crate::Result;
use crate::config::service::{read_config_key, write_config_key};
use crate::config::{Config, ConfigService};
use crate::error::BisubError;
use std::path::PathBuf;
use std::sync::RwLock;

/// In-memory configuration service for tests.
pub struct TestConfigService {
    config: RwLock<Config>,
}

impl TestConfigService {
    /// Wrap an explicit configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }

    /// Service with default configuration values.
    pub fn with_defaults() -> Self {
        Self::new(Config::default())
    }
}

impl ConfigService for TestConfigService {
    fn get_config(&self) -> Result<Config> {
        Ok(self.config.read().unwrap().clone())
    }

    fn reload(&self) -> Result<()> {
        Ok(())
    }

    fn save_config(&self) -> Result<()> {
        Ok(())
    }

    fn config_file_path(&self) -> Result<PathBuf> {
        Err(BisubError::config("test config service has no file path"))
    }

    fn get_config_value(&self, key: &str) -> Result<String> {
        read_config_key(&self.config.read().unwrap(), key)
    }

    fn set_config_value(&self, key: &str, value: &str) -> Result<()> {
        write_config_key(&mut self.config.write().unwrap(), key, value)
    }

    fn reset_to_defaults(&self) -> Result<()> {
        *self.config.write().unwrap() = Config::default();
        Ok(())
    }
}

/// Builder for test configurations.
///
/// # Examples
///
/// ```rust
/// use bisub_cli::config::TestConfigBuilder;
///
/// let config = TestConfigBuilder::new()
///     .with_alignment_threshold(0.3)
///     .with_use_translation(true)
///     .build_config();
/// assert_eq!(config.alignment.threshold, 0.3);
/// ```
#[derive(Default)]
pub struct TestConfigBuilder {
    config: Config,
}

impl TestConfigBuilder {
    /// Start from default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the automatic-adoption confidence threshold.
    pub fn with_alignment_threshold(mut self, threshold: f32) -> Self {
        self.config.alignment.threshold = threshold;
        self
    }

    /// Set the anti-flicker weld distance.
    pub fn with_time_threshold_ms(mut self, ms: u32) -> Self {
        self.config.alignment.time_threshold_ms = ms;
        self
    }

    /// Force an anchor strategy.
    pub fn with_sync_strategy(mut self, strategy: &str) -> Self {
        self.config.alignment.sync_strategy = strategy.to_string();
        self
    }

    /// Permit large offsets without confirmation.
    pub fn with_allow_large_offset(mut self, allow: bool) -> Self {
        self.config.alignment.allow_large_offset = allow;
        self
    }

    /// Enable mixed realignment (pre-anchor trim + large offset path).
    pub fn with_mixed_realignment(mut self, enable: bool) -> Self {
        self.config.alignment.enable_mixed_realignment = enable;
        self
    }

    /// Enable translation-assisted strategies.
    pub fn with_use_translation(mut self, enable: bool) -> Self {
        self.config.alignment.use_translation = enable;
        self
    }

    /// Set the merged-output primary language.
    pub fn with_primary_language(mut self, language: &str) -> Self {
        self.config.merge.primary_language = language.to_string();
        self
    }

    /// Set the default output format.
    pub fn with_output_format(mut self, format: &str) -> Self {
        self.config.formats.default_output = format.to_string();
        self
    }

    /// Set the batch worker count.
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.config.parallel.max_workers = workers;
        self
    }

    /// Finish and return the configuration.
    pub fn build_config(self) -> Config {
        self.config
    }

    /// Finish and wrap in a [`TestConfigService`].
    pub fn build_service(self) -> TestConfigService {
        TestConfigService::new(self.config)
    }
}
