use crate::Result;
use crate::core::formats::encoding::charset::{Charset, EncodingInfo};
use encoding_rs::{BIG5, EUC_KR, Encoding, GB18030, GBK, SHIFT_JIS};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Encoding detection engine.
///
/// Detection runs in three stages: BOM sniffing, strict UTF-8 validation,
/// then trial decodes of the legacy CJK encodings scored by replacement
/// rate and CJK character density.
pub struct EncodingDetector {
    max_sample_size: usize,
}

/// Legacy encodings tried in order when the data is not valid UTF-8.
fn trial_encodings() -> [(Charset, &'static Encoding); 5] {
    [
        (Charset::Gbk, GBK),
        (Charset::Gb18030, GB18030),
        (Charset::Big5, BIG5),
        (Charset::ShiftJis, SHIFT_JIS),
        (Charset::EucKr, EUC_KR),
    ]
}

impl Default for EncodingDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl EncodingDetector {
    /// Create a detector with the default 8 KiB sample window.
    pub fn new() -> Self {
        Self {
            max_sample_size: 8192,
        }
    }

    /// Detect the encoding of a file by sampling its head.
    pub fn detect_file_encoding(&self, file_path: &Path) -> Result<EncodingInfo> {
        let mut file = File::open(file_path)?;
        let mut buffer = vec![0; self.max_sample_size];
        let bytes_read = file.read(&mut buffer)?;
        buffer.truncate(bytes_read);
        Ok(self.detect_encoding(&buffer))
    }

    /// Detect the encoding of a byte buffer.
    pub fn detect_encoding(&self, data: &[u8]) -> EncodingInfo {
        if let Some(info) = detect_bom(data) {
            return info;
        }

        if std::str::from_utf8(data).is_ok() {
            return EncodingInfo {
                charset: Charset::Utf8,
                confidence: if data.is_ascii() { 0.8 } else { 0.95 },
                bom_detected: false,
            };
        }

        // BOM-less UTF-16 shows up as alternating NUL bytes in text files.
        if let Some(info) = detect_bare_utf16(data) {
            return info;
        }

        let mut best = EncodingInfo {
            charset: Charset::Unknown,
            confidence: 0.0,
            bom_detected: false,
        };
        for (charset, encoding) in trial_encodings() {
            let confidence = trial_decode_confidence(data, encoding);
            if confidence > best.confidence {
                best = EncodingInfo {
                    charset,
                    confidence,
                    bom_detected: false,
                };
            }
        }

        if best.confidence < 0.3 {
            // Nothing decoded plausibly; report Windows-1252 as the
            // lossless fallback with low confidence.
            return EncodingInfo {
                charset: Charset::Windows1252,
                confidence: 0.2,
                bom_detected: false,
            };
        }
        best
    }
}

fn detect_bom(data: &[u8]) -> Option<EncodingInfo> {
    if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return Some(EncodingInfo {
            charset: Charset::Utf8,
            confidence: 1.0,
            bom_detected: true,
        });
    }
    if data.starts_with(&[0xFF, 0xFE]) {
        return Some(EncodingInfo {
            charset: Charset::Utf16Le,
            confidence: 1.0,
            bom_detected: true,
        });
    }
    if data.starts_with(&[0xFE, 0xFF]) {
        return Some(EncodingInfo {
            charset: Charset::Utf16Be,
            confidence: 1.0,
            bom_detected: true,
        });
    }
    None
}

fn detect_bare_utf16(data: &[u8]) -> Option<EncodingInfo> {
    if data.len() < 8 {
        return None;
    }
    let sample = &data[..data.len().min(512)];
    let even_nuls = sample.iter().step_by(2).filter(|&&b| b == 0).count();
    let odd_nuls = sample.iter().skip(1).step_by(2).filter(|&&b| b == 0).count();
    let half = sample.len() / 2;
    if odd_nuls > half * 3 / 4 && even_nuls < half / 8 {
        return Some(EncodingInfo {
            charset: Charset::Utf16Le,
            confidence: 0.85,
            bom_detected: false,
        });
    }
    if even_nuls > half * 3 / 4 && odd_nuls < half / 8 {
        return Some(EncodingInfo {
            charset: Charset::Utf16Be,
            confidence: 0.85,
            bom_detected: false,
        });
    }
    None
}

/// Confidence that `data` is encoded with `encoding`: penalize replacement
/// characters hard, reward CJK density in the decoded text.
fn trial_decode_confidence(data: &[u8], encoding: &'static Encoding) -> f32 {
    let (decoded, _, had_errors) = encoding.decode(data);
    let total_chars = decoded.chars().count().max(1);
    let replacements = decoded.chars().filter(|&c| c == '\u{FFFD}').count();
    if had_errors && replacements * 20 > total_chars {
        return 0.0;
    }
    let cjk = decoded
        .chars()
        .filter(|&c| {
            matches!(c as u32,
                0x3040..=0x30FF | 0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xAC00..=0xD7AF)
        })
        .count();
    let base = 1.0 - (replacements as f32 / total_chars as f32) * 20.0;
    let cjk_bonus = (cjk as f32 / total_chars as f32).min(0.3);
    (base * 0.7 + cjk_bonus).clamp(0.0, 1.0)
}
