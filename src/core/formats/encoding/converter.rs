use crate::Result;
use crate::core::formats::encoding::charset::{Charset, EncodingInfo};
use crate::error::BisubError;
use encoding_rs::{BIG5, EUC_KR, Encoding, GB18030, GBK, SHIFT_JIS, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252};
use std::collections::HashMap;

/// Result of an encoding conversion operation.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    /// The converted text, always UTF-8
    pub converted_text: String,
    /// The original character encoding that was detected
    pub original_encoding: Charset,
    /// Number of bytes processed during conversion
    pub bytes_processed: usize,
    /// Number of replacement characters produced
    pub replacement_count: usize,
}

impl ConversionResult {
    /// Whether the conversion produced any replacement characters.
    pub fn had_errors(&self) -> bool {
        self.replacement_count > 0
    }
}

/// Converts detected legacy encodings to UTF-8.
pub struct EncodingConverter {
    encoding_map: HashMap<Charset, &'static Encoding>,
}

impl Default for EncodingConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl EncodingConverter {
    /// Create converter and initialize encoding mapping
    pub fn new() -> Self {
        let mut encoding_map = HashMap::new();
        encoding_map.insert(Charset::Utf8, UTF_8);
        encoding_map.insert(Charset::Utf16Le, UTF_16LE);
        encoding_map.insert(Charset::Utf16Be, UTF_16BE);
        encoding_map.insert(Charset::Gbk, GBK);
        encoding_map.insert(Charset::Gb18030, GB18030);
        encoding_map.insert(Charset::Big5, BIG5);
        encoding_map.insert(Charset::ShiftJis, SHIFT_JIS);
        encoding_map.insert(Charset::EucKr, EUC_KR);
        encoding_map.insert(Charset::Windows1252, WINDOWS_1252);
        Self { encoding_map }
    }

    /// Convert data to UTF-8 according to the detected encoding info.
    ///
    /// BOM bytes are skipped before decoding so they never leak into the
    /// parsed text.
    pub fn convert_to_utf8(&self, data: &[u8], info: &EncodingInfo) -> Result<ConversionResult> {
        let slice = if info.bom_detected {
            skip_bom(data, &info.charset)
        } else {
            data
        };

        let encoding = self.encoding_map.get(&info.charset).ok_or_else(|| {
            BisubError::encoding(format!("unsupported encoding: {}", info.charset))
        })?;

        let (converted, _, _) = encoding.decode(slice);
        let replacement_count = converted.chars().filter(|&c| c == '\u{FFFD}').count();
        Ok(ConversionResult {
            converted_text: converted.into_owned(),
            original_encoding: info.charset,
            bytes_processed: data.len(),
            replacement_count,
        })
    }
}

fn skip_bom<'a>(data: &'a [u8], charset: &Charset) -> &'a [u8] {
    match charset {
        Charset::Utf8 if data.starts_with(&[0xEF, 0xBB, 0xBF]) => &data[3..],
        Charset::Utf16Le if data.starts_with(&[0xFF, 0xFE]) => &data[2..],
        Charset::Utf16Be if data.starts_with(&[0xFE, 0xFF]) => &data[2..],
        _ => data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(charset: Charset, bom: bool) -> EncodingInfo {
        EncodingInfo {
            charset,
            confidence: 1.0,
            bom_detected: bom,
        }
    }

    #[test]
    fn test_utf8_passthrough() {
        let converter = EncodingConverter::new();
        let result = converter
            .convert_to_utf8("hello 世界".as_bytes(), &info(Charset::Utf8, false))
            .unwrap();
        assert_eq!(result.converted_text, "hello 世界");
        assert!(!result.had_errors());
    }

    #[test]
    fn test_utf8_bom_stripped() {
        let converter = EncodingConverter::new();
        let mut data = vec![0xEF, 0xBB, 0xBF];
        data.extend_from_slice("text".as_bytes());
        let result = converter
            .convert_to_utf8(&data, &info(Charset::Utf8, true))
            .unwrap();
        assert_eq!(result.converted_text, "text");
    }

    #[test]
    fn test_gbk_conversion() {
        let converter = EncodingConverter::new();
        let original = "你好，世界。这是GBK编码的字幕。";
        let (encoded, _, _) = GBK.encode(original);
        let result = converter
            .convert_to_utf8(&encoded, &info(Charset::Gbk, false))
            .unwrap();
        assert_eq!(result.converted_text, original);
        assert!(!result.had_errors());
    }

    #[test]
    fn test_utf16le_conversion() {
        let converter = EncodingConverter::new();
        let mut data = vec![0xFF, 0xFE];
        data.extend("你好".encode_utf16().flat_map(|u| u.to_le_bytes()));
        let result = converter
            .convert_to_utf8(&data, &info(Charset::Utf16Le, true))
            .unwrap();
        assert_eq!(result.converted_text, "你好");
    }

    #[test]
    fn test_unknown_encoding_rejected() {
        let converter = EncodingConverter::new();
        let err = converter.convert_to_utf8(b"abc", &info(Charset::Unknown, false));
        assert!(err.is_err());
    }
}
