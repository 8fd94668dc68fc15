//! Subtitle format manager that detects and dispatches to the appropriate
//! adapter, and owns every byte-level policy: encoding detection on read,
//! BOM and line endings on write, and atomic output (temp file + rename).
//!
//! # Examples
//!
//! ```rust,no_run
//! use bisub_cli::core::formats::manager::FormatManager;
//! let manager = FormatManager::new();
//! let content = "1\n00:00:01,000 --> 00:00:02,000\nHello world\n";
//! let track = manager.parse_auto(content).unwrap();
//! ```

use crate::core::formats::SubtitleFormat;
use crate::core::formats::encoding::{EncodingConverter, EncodingDetector, EncodingInfo};
use crate::core::model::Track;
use crate::error::BisubError;
use log::{debug, warn};
use std::path::Path;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Manager for subtitle format detection and adapter dispatch.
pub struct FormatManager {
    formats: Vec<Box<dyn SubtitleFormat + Send + Sync>>,
}

impl Default for FormatManager {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatManager {
    /// Create manager and register all formats
    pub fn new() -> Self {
        Self {
            formats: vec![
                Box::new(crate::core::formats::vtt::VttFormat),
                Box::new(crate::core::formats::ass::AssFormat),
                Box::new(crate::core::formats::srt::SrtFormat),
            ],
        }
    }

    /// Auto-detect format and parse
    pub fn parse_auto(&self, content: &str) -> crate::Result<Track> {
        for fmt in &self.formats {
            if fmt.detect(content) {
                return fmt.parse(content);
            }
        }
        Err(BisubError::subtitle_format(
            "Unknown",
            "Unknown subtitle format",
        ))
    }

    /// Get adapter by format name
    pub fn get_format(&self, name: &str) -> Option<&(dyn SubtitleFormat + Send + Sync)> {
        let lname = name.to_lowercase();
        self.formats
            .iter()
            .find(|f| f.format_name().to_lowercase() == lname)
            .map(|f| f.as_ref())
    }

    /// Get adapter by file extension
    pub fn get_format_by_extension(&self, ext: &str) -> Option<&(dyn SubtitleFormat + Send + Sync)> {
        let ext_lc = ext.to_lowercase();
        self.formats
            .iter()
            .find(|f| f.file_extensions().contains(&ext_lc.as_str()))
            .map(|f| f.as_ref())
    }

    /// Decode raw bytes to UTF-8 text using the encoding detector, or the
    /// declared encoding when the caller knows better.
    pub fn decode_bytes(
        &self,
        data: &[u8],
        declared: Option<EncodingInfo>,
    ) -> crate::Result<String> {
        let info = match declared {
            Some(info) => info,
            None => EncodingDetector::new().detect_encoding(data),
        };
        debug!(
            "decoding input as {} (confidence {:.2})",
            info.charset, info.confidence
        );
        let converter = EncodingConverter::new();
        let result = converter.convert_to_utf8(data, &info)?;
        if result.had_errors() {
            warn!(
                "encoding conversion produced {} replacement characters",
                result.replacement_count
            );
        }
        Ok(result.converted_text)
    }

    /// Parse raw bytes: detect encoding, convert to UTF-8, detect format.
    pub fn parse_bytes(&self, data: &[u8], declared: Option<EncodingInfo>) -> crate::Result<Track> {
        let content = self.decode_bytes(data, declared)?;
        self.parse_auto(&content)
    }

    /// Load a subtitle file with encoding detection and format dispatch.
    pub fn load_track(&self, file_path: &Path) -> crate::Result<Track> {
        if !file_path.exists() {
            return Err(BisubError::FileNotFound(
                file_path.display().to_string(),
            ));
        }
        let data = std::fs::read(file_path)?;
        self.parse_bytes(&data, None)
    }

    /// Serialize a track for the given extension, applying the BOM policy.
    pub fn serialize_for_extension(&self, track: &Track, ext: &str) -> crate::Result<Vec<u8>> {
        let fmt = self.get_format_by_extension(ext).ok_or_else(|| {
            BisubError::subtitle_format(ext, "Unsupported subtitle format for saving")
        })?;
        let text = fmt.serialize(track)?;
        let mut bytes = Vec::with_capacity(text.len() + 3);
        if fmt.writes_bom() {
            bytes.extend_from_slice(UTF8_BOM);
        }
        bytes.extend_from_slice(text.as_bytes());
        Ok(bytes)
    }

    /// Save a track to `file_path` atomically.
    ///
    /// Serialization and write are a single phase: the bytes land in a
    /// temp file in the destination directory, which is then renamed over
    /// the target. On any failure the temp file is removed and the
    /// filesystem is left untouched.
    pub fn save_track(&self, track: &Track, file_path: &Path) -> crate::Result<()> {
        let ext = file_path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let bytes = self.serialize_for_extension(track, ext)?;

        let dir = file_path.parent().unwrap_or_else(|| Path::new("."));
        let tmp_name = format!(
            ".{}.{}.tmp",
            file_path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("bisub-out"),
            uuid::Uuid::new_v4().simple()
        );
        let tmp_path = dir.join(tmp_name);

        if let Err(e) = std::fs::write(&tmp_path, &bytes) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(BisubError::output_write(
                file_path.to_path_buf(),
                format!("temp write failed: {}", e),
            ));
        }
        if let Err(e) = std::fs::rename(&tmp_path, file_path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(BisubError::output_write(
                file_path.to_path_buf(),
                format!("rename failed: {}", e),
            ));
        }
        Ok(())
    }
}
