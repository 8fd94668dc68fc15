//! Character-encoding detection and conversion for subtitle files.
//!
//! Subtitle files in the wild arrive in GBK, GB18030, Big5, Shift-JIS, and
//! the UTF family; this module detects the charset from BOMs and byte
//! patterns, then converts everything to UTF-8 before parsing.

mod charset;
mod converter;
mod detector;

pub use charset::{Charset, EncodingInfo};
pub use converter::{ConversionResult, EncodingConverter};
pub use detector::EncodingDetector;
