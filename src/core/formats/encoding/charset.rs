/// Character encodings supported by the subtitle processing system.
///
/// Covers the encodings most commonly seen in Chinese, Japanese, Korean,
/// and western subtitle files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Charset {
    /// UTF-8 encoding (Unicode)
    Utf8,
    /// UTF-16 Little Endian encoding
    Utf16Le,
    /// UTF-16 Big Endian encoding
    Utf16Be,
    /// GB18030 encoding (Chinese, superset of GBK)
    Gb18030,
    /// GBK encoding (Chinese Simplified)
    Gbk,
    /// Big5 encoding (Chinese Traditional)
    Big5,
    /// Shift JIS encoding (Japanese)
    ShiftJis,
    /// EUC-KR encoding (Korean)
    EucKr,
    /// Windows-1252 encoding (Western European)
    Windows1252,
    /// Unknown or undetectable encoding
    Unknown,
}

impl Charset {
    /// IANA-style name as reported to users.
    pub fn name(&self) -> &'static str {
        match self {
            Charset::Utf8 => "utf-8",
            Charset::Utf16Le => "utf-16le",
            Charset::Utf16Be => "utf-16be",
            Charset::Gb18030 => "gb18030",
            Charset::Gbk => "gbk",
            Charset::Big5 => "big5",
            Charset::ShiftJis => "shift_jis",
            Charset::EucKr => "euc-kr",
            Charset::Windows1252 => "windows-1252",
            Charset::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Charset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Encoding detection result information
#[derive(Debug, Clone)]
pub struct EncodingInfo {
    /// Detected character set
    pub charset: Charset,
    /// Detection confidence (0.0-1.0)
    pub confidence: f32,
    /// Whether BOM was detected
    pub bom_detected: bool,
}
