//! OCR collaborator for image-based (PGS) subtitle streams.
//!
//! The engine only depends on the [`OcrProvider`] trait: PGS bytes go in,
//! SRT-text bytes come out. No OCR engine ships with this crate; the
//! orchestrator's PGS fallback path is exercised with mock providers.

use crate::core::language::LanguageTag;
use crate::error::BisubError;
use async_trait::async_trait;

/// OCR language hints, matching the usual engine language packs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrLanguage {
    /// English
    Eng,
    /// Simplified Chinese
    ChiSim,
    /// Traditional Chinese
    ChiTra,
    /// Japanese
    Jpn,
    /// Korean
    Kor,
}

impl OcrLanguage {
    /// Engine language-pack identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            OcrLanguage::Eng => "eng",
            OcrLanguage::ChiSim => "chi_sim",
            OcrLanguage::ChiTra => "chi_tra",
            OcrLanguage::Jpn => "jpn",
            OcrLanguage::Kor => "kor",
        }
    }
}

impl From<LanguageTag> for OcrLanguage {
    fn from(tag: LanguageTag) -> Self {
        match tag {
            LanguageTag::En => OcrLanguage::Eng,
            LanguageTag::ZhHans => OcrLanguage::ChiSim,
            LanguageTag::ZhHant => OcrLanguage::ChiTra,
            LanguageTag::Ja => OcrLanguage::Jpn,
            LanguageTag::Ko => OcrLanguage::Kor,
        }
    }
}

/// Converts an image-based subtitle stream into SRT text bytes.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Run OCR over raw PGS bytes with the given language hint.
    ///
    /// The returned bytes must parse as SRT; accuracy is not specified by
    /// this contract.
    async fn convert_pgs(&self, pgs_bytes: &[u8], language: OcrLanguage)
    -> crate::Result<Vec<u8>>;
}

/// Placeholder provider used when no OCR backend is configured.
#[derive(Debug, Default)]
pub struct NullOcrProvider;

#[async_trait]
impl OcrProvider for NullOcrProvider {
    async fn convert_pgs(
        &self,
        _pgs_bytes: &[u8],
        language: OcrLanguage,
    ) -> crate::Result<Vec<u8>> {
        Err(BisubError::ocr(format!(
            "no OCR provider configured (requested language pack: {})",
            language.as_str()
        )))
    }
}
