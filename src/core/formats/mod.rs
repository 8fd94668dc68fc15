//! Subtitle format handling: SRT, ASS/SSA, and VTT adapters.
//!
//! Each adapter converts between raw text content and the in-memory
//! [`Track`](crate::core::model::Track) model. Parsers are tolerant:
//! malformed events are logged and skipped without aborting the track.
//! Byte-level concerns (encoding detection, BOM, line endings, atomic
//! writes) live in [`manager::FormatManager`], not in the adapters.
//!
//! # Round-trip contract
//!
//! `parse(serialize(track))` yields a track with identical event timings,
//! texts, and style references; position tags and unknown fields survive
//! through each event's passthrough attributes.

pub mod ass;
pub mod encoding;
pub mod manager;
/// SubRip Text (.srt) subtitle format support
pub mod srt;
pub mod vtt;

use crate::core::model::Track;

/// Output formats the merger can serialize to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// SubRip with interleaved bilingual blocks.
    Srt,
    /// Dual-style Advanced SubStation Alpha.
    Ass,
    /// WebVTT, using the SRT merge algorithm.
    Vtt,
}

impl OutputFormat {
    /// File extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Srt => "srt",
            OutputFormat::Ass => "ass",
            OutputFormat::Vtt => "vtt",
        }
    }

    /// Parse from a user-supplied name or extension.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "srt" => Some(OutputFormat::Srt),
            "ass" | "ssa" => Some(OutputFormat::Ass),
            "vtt" => Some(OutputFormat::Vtt),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Trait implemented by each subtitle format adapter.
///
/// Adapters operate on UTF-8 text; the [`manager::FormatManager`] handles
/// the bytes-to-text step (encoding detection) and the text-to-bytes step
/// (BOM and line-ending policy).
pub trait SubtitleFormat {
    /// Parse content into a `Track`.
    ///
    /// Malformed events are logged and skipped; an error is returned only
    /// when the content as a whole cannot be this format.
    fn parse(&self, content: &str) -> crate::Result<Track>;

    /// Serialize a `Track` into format-specific text.
    fn serialize(&self, track: &Track) -> crate::Result<String>;

    /// Lightweight content sniff for format detection.
    fn detect(&self, content: &str) -> bool;

    /// Human-readable format name.
    fn format_name(&self) -> &'static str;

    /// Supported file extensions, lowercase, primary first.
    fn file_extensions(&self) -> &'static [&'static str];

    /// Whether files of this format are written with a UTF-8 BOM.
    fn writes_bom(&self) -> bool {
        false
    }
}
