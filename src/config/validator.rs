//! Configuration validation.

use crate::config::Config;
use crate::core::align::SyncStrategy;
use crate::core::formats::OutputFormat;
use crate::error::BisubError;

/// Validate a complete configuration, returning the first problem found.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    validate_unit_range("alignment.threshold", config.alignment.threshold)?;
    validate_unit_range(
        "alignment.semantic_threshold",
        config.alignment.semantic_threshold,
    )?;

    if OutputFormat::from_name(&config.formats.default_output).is_none() {
        return Err(BisubError::config(format!(
            "formats.default_output must be srt, ass, or vtt (got {})",
            config.formats.default_output
        )));
    }
    if SyncStrategy::from_name(&config.alignment.sync_strategy).is_none() {
        return Err(BisubError::config(format!(
            "alignment.sync_strategy must be auto, first_line, scan, translation, or manual (got {})",
            config.alignment.sync_strategy
        )));
    }
    if !matches!(
        config.merge.reference_preference.as_str(),
        "auto" | "embedded" | "external"
    ) {
        return Err(BisubError::config(format!(
            "merge.reference_preference must be auto, embedded, or external (got {})",
            config.merge.reference_preference
        )));
    }
    if config.translator.timeout_seconds == 0 {
        return Err(BisubError::config(
            "translator.timeout_seconds must be positive",
        ));
    }
    if config.translator.max_calls_per_alignment == 0 {
        return Err(BisubError::config(
            "translator.max_calls_per_alignment must be positive",
        ));
    }
    Ok(())
}

fn validate_unit_range(key: &str, value: f32) -> crate::Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(BisubError::config(format!(
            "{} must be within [0, 1] (got {})",
            key, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_threshold_out_of_range() {
        let mut config = Config::default();
        config.alignment.threshold = 1.5;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_bad_strategy_name() {
        let mut config = Config::default();
        config.alignment.sync_strategy = "psychic".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_bad_output_format() {
        let mut config = Config::default();
        config.formats.default_output = "pdf".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_bad_reference_preference() {
        let mut config = Config::default();
        config.merge.reference_preference = "whichever".to_string();
        assert!(validate_config(&config).is_err());
    }
}
