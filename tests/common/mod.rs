//! Shared helpers and collaborator doubles for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use bisub_cli::core::language::LanguageTag;
use bisub_cli::core::model::{CodecHint, Event, Track};
use bisub_cli::services::container::{ContainerProvider, SubtitleTrackInfo};
use bisub_cli::services::ocr::{OcrLanguage, OcrProvider};
use bisub_cli::services::translator::Translator;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Build a track from `(start_ms, end_ms, text)` triples.
pub fn track_from(events: &[(u32, u32, &str)]) -> Track {
    let mut track = Track::new(CodecHint::Srt);
    for (idx, (start, end, text)) in events.iter().enumerate() {
        track.events.push(Event::new(idx + 1, *start, *end, *text));
    }
    track
}

/// Render `(start_ms, end_ms, text)` triples as SRT content.
pub fn srt_content(events: &[(u32, u32, &str)]) -> String {
    let mut out = String::new();
    for (idx, (start, end, text)) in events.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            idx + 1,
            srt_timestamp(*start),
            srt_timestamp(*end),
            text
        ));
    }
    out
}

fn srt_timestamp(ms: u32) -> String {
    format!(
        "{:02}:{:02}:{:02},{:03}",
        ms / 3_600_000,
        (ms % 3_600_000) / 60_000,
        (ms % 60_000) / 1000,
        ms % 1000
    )
}

/// Write SRT content for the given events into `dir`.
pub fn write_srt(dir: &Path, name: &str, events: &[(u32, u32, &str)]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, srt_content(events)).unwrap();
    path
}

/// In-memory container double: stream metadata plus the SRT content that
/// "extraction" writes to the output path.
pub struct MockContainer {
    tracks: Vec<(SubtitleTrackInfo, Option<String>)>,
    /// Raw bytes handed out for PGS streams.
    pub pgs_payload: Vec<u8>,
}

impl MockContainer {
    pub fn new() -> Self {
        Self {
            tracks: Vec::new(),
            pgs_payload: b"mock-pgs-bytes".to_vec(),
        }
    }

    pub fn with_text_track(
        mut self,
        index: usize,
        language: &str,
        title: &str,
        forced: bool,
        events: &[(u32, u32, &str)],
    ) -> Self {
        self.tracks.push((
            SubtitleTrackInfo {
                index,
                codec: CodecHint::Srt,
                language_tag: Some(language.to_string()),
                title: if title.is_empty() {
                    None
                } else {
                    Some(title.to_string())
                },
                forced_flag: forced,
                default_flag: false,
            },
            Some(srt_content(events)),
        ));
        self
    }

    pub fn with_pgs_track(mut self, index: usize, language: &str) -> Self {
        self.tracks.push((
            SubtitleTrackInfo {
                index,
                codec: CodecHint::Pgs,
                language_tag: Some(language.to_string()),
                title: None,
                forced_flag: false,
                default_flag: true,
            },
            None,
        ));
        self
    }
}

#[async_trait]
impl ContainerProvider for MockContainer {
    async fn list_subtitle_tracks(
        &self,
        _video_path: &Path,
    ) -> bisub_cli::Result<Vec<SubtitleTrackInfo>> {
        Ok(self.tracks.iter().map(|(info, _)| info.clone()).collect())
    }

    async fn extract_track(
        &self,
        _video_path: &Path,
        index: usize,
        out_path: &Path,
        _target_codec: CodecHint,
    ) -> bisub_cli::Result<()> {
        let entry = self
            .tracks
            .iter()
            .find(|(info, _)| info.index == index)
            .ok_or_else(|| bisub_cli::error::BisubError::container("no such stream"))?;
        match &entry.1 {
            Some(content) => std::fs::write(out_path, content)?,
            None => std::fs::write(out_path, &self.pgs_payload)?,
        }
        Ok(())
    }
}

/// OCR double that returns fixed SRT bytes.
pub struct MockOcr {
    pub srt: String,
    pub requests: Mutex<Vec<OcrLanguage>>,
}

impl MockOcr {
    pub fn new(events: &[(u32, u32, &str)]) -> Self {
        Self {
            srt: srt_content(events),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl OcrProvider for MockOcr {
    async fn convert_pgs(
        &self,
        _pgs_bytes: &[u8],
        language: OcrLanguage,
    ) -> bisub_cli::Result<Vec<u8>> {
        self.requests.lock().unwrap().push(language);
        Ok(self.srt.clone().into_bytes())
    }
}

/// Translator double backed by a fixed text table.
pub struct TableTranslator {
    table: HashMap<String, String>,
}

impl TableTranslator {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            table: pairs
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl Translator for TableTranslator {
    async fn translate(
        &self,
        texts: &[String],
        _source: LanguageTag,
        _target: LanguageTag,
    ) -> bisub_cli::Result<Vec<String>> {
        Ok(texts
            .iter()
            .map(|t| {
                self.table
                    .get(t)
                    .cloned()
                    .unwrap_or_else(|| format!("untranslated {}", t))
            })
            .collect())
    }
}
