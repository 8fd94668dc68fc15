//! Command implementations, one `execute` per CLI subcommand.

pub mod batch_command;
pub mod config_command;
pub mod detect_encoding_command;
pub mod merge_command;
pub mod tracks_command;

use crate::core::language::LanguageTag;
use crate::error::BisubError;

/// Parse a user-facing language code ("zh", "en", "zh-TW", ...).
pub(crate) fn parse_language(code: &str) -> crate::Result<LanguageTag> {
    LanguageTag::from_container_tag(code)
        .ok_or_else(|| BisubError::config(format!("unknown language code: {}", code)))
}
