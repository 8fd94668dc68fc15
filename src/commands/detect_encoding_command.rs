//! Encoding detection command: report each file's charset and optionally
//! rewrite it in place as UTF-8.

use crate::Result;
use crate::cli::DetectEncodingArgs;
use crate::cli::ui::{print_success, print_warning};
use crate::core::formats::encoding::{Charset, EncodingConverter, EncodingDetector};
use crate::error::BisubError;

/// Execute encoding detection (and optional conversion).
pub fn execute(args: DetectEncodingArgs) -> Result<()> {
    let detector = EncodingDetector::new();
    let converter = EncodingConverter::new();

    for file in &args.files {
        if !file.exists() {
            return Err(BisubError::FileNotFound(file.display().to_string()));
        }
        let info = detector.detect_file_encoding(file)?;
        println!(
            "{}: {} (confidence {:.2}{})",
            file.display(),
            info.charset,
            info.confidence,
            if info.bom_detected { ", BOM" } else { "" }
        );

        if args.convert {
            if info.charset == Charset::Utf8 && !info.bom_detected {
                continue;
            }
            let data = std::fs::read(file)?;
            let result = converter.convert_to_utf8(&data, &info)?;
            if result.had_errors() {
                print_warning(&format!(
                    "{}: conversion produced {} replacement characters",
                    file.display(),
                    result.replacement_count
                ));
            }
            std::fs::write(file, result.converted_text.as_bytes())?;
            print_success(&format!("{}: rewritten as UTF-8", file.display()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_detect_and_convert_gbk_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("movie.zh.srt");
        let srt = "1\n00:00:01,000 --> 00:00:03,000\n你好，世界。\n\n";
        let (encoded, _, _) = encoding_rs::GBK.encode(srt);
        std::fs::write(&path, &encoded).unwrap();

        let args = DetectEncodingArgs {
            files: vec![path.clone()],
            convert: true,
        };
        execute(args).unwrap();

        let converted = std::fs::read_to_string(&path).unwrap();
        assert!(converted.contains("你好，世界。"));
    }

    #[test]
    fn test_missing_file_errors() {
        let args = DetectEncodingArgs {
            files: vec![PathBuf::from("/no/such/file.srt")],
            convert: false,
        };
        assert!(matches!(
            execute(args),
            Err(BisubError::FileNotFound(_))
        ));
    }
}
