//! Container-extraction collaborator: lists and demuxes subtitle streams.
//!
//! The production implementation shells out to `ffprobe` for the stream
//! list (JSON) and `ffmpeg` for extraction, both bounded by a deadline
//! (900 s by default, `BISUB_EXTRACTION_TIMEOUT` seconds to override).

use crate::core::model::CodecHint;
use crate::error::BisubError;
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

/// Environment variable overriding the extraction deadline, in seconds.
pub const EXTRACTION_TIMEOUT_ENV: &str = "BISUB_EXTRACTION_TIMEOUT";

/// Default extraction deadline.
pub const DEFAULT_EXTRACTION_TIMEOUT: Duration = Duration::from_secs(900);

/// Metadata for one subtitle stream inside a container.
#[derive(Debug, Clone)]
pub struct SubtitleTrackInfo {
    /// Stream index within the container.
    pub index: usize,
    /// Subtitle codec of the stream.
    pub codec: CodecHint,
    /// Container language tag ("chi", "eng", ...), if present.
    pub language_tag: Option<String>,
    /// Stream title, if present.
    pub title: Option<String>,
    /// Forced disposition flag.
    pub forced_flag: bool,
    /// Default disposition flag.
    pub default_flag: bool,
}

/// Lists subtitle tracks and extracts one to a file.
#[async_trait]
pub trait ContainerProvider: Send + Sync {
    /// Enumerate the subtitle streams of `video_path`.
    async fn list_subtitle_tracks(
        &self,
        video_path: &Path,
    ) -> crate::Result<Vec<SubtitleTrackInfo>>;

    /// Extract stream `index` of `video_path` into `out_path`, transcoding
    /// text streams to `target_codec` (PGS streams are copied raw).
    async fn extract_track(
        &self,
        video_path: &Path,
        index: usize,
        out_path: &Path,
        target_codec: CodecHint,
    ) -> crate::Result<()>;
}

/// `ffprobe`/`ffmpeg` based container provider.
pub struct FfmpegContainerProvider {
    timeout: Duration,
}

impl Default for FfmpegContainerProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegContainerProvider {
    /// Create a provider with the default (or env-overridden) deadline.
    pub fn new() -> Self {
        let timeout = std::env::var(EXTRACTION_TIMEOUT_ENV)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_EXTRACTION_TIMEOUT);
        Self { timeout }
    }

    /// Create a provider with an explicit deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn run_with_deadline(
        &self,
        label: &str,
        command: &mut Command,
    ) -> crate::Result<Vec<u8>> {
        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                BisubError::container(format!(
                    "{} exceeded deadline of {:?}",
                    label, self.timeout
                ))
            })?
            .map_err(|e| BisubError::container(format!("{} failed to start: {}", label, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BisubError::container(format!(
                "{} exited with {}: {}",
                label,
                output.status,
                stderr.trim()
            )));
        }
        Ok(output.stdout)
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    index: usize,
    codec_name: Option<String>,
    #[serde(default)]
    tags: HashMap<String, String>,
    #[serde(default)]
    disposition: HashMap<String, i32>,
}

fn codec_from_name(name: &str) -> Option<CodecHint> {
    match name {
        "subrip" | "srt" => Some(CodecHint::Srt),
        "ass" => Some(CodecHint::Ass),
        "ssa" => Some(CodecHint::Ssa),
        "webvtt" => Some(CodecHint::Vtt),
        "hdmv_pgs_subtitle" => Some(CodecHint::Pgs),
        _ => None,
    }
}

fn encoder_for_codec(codec: CodecHint) -> &'static str {
    match codec {
        CodecHint::Srt => "srt",
        CodecHint::Ass | CodecHint::Ssa => "ass",
        CodecHint::Vtt => "webvtt",
        CodecHint::Pgs => "copy",
    }
}

#[async_trait]
impl ContainerProvider for FfmpegContainerProvider {
    async fn list_subtitle_tracks(
        &self,
        video_path: &Path,
    ) -> crate::Result<Vec<SubtitleTrackInfo>> {
        if !video_path.exists() {
            return Err(BisubError::FileNotFound(video_path.display().to_string()));
        }
        let mut command = Command::new("ffprobe");
        command
            .arg("-v")
            .arg("quiet")
            .arg("-print_format")
            .arg("json")
            .arg("-show_streams")
            .arg("-select_streams")
            .arg("s")
            .arg(video_path);

        let stdout = self.run_with_deadline("ffprobe", &mut command).await?;
        let parsed: FfprobeOutput = serde_json::from_slice(&stdout)?;

        let tracks: Vec<SubtitleTrackInfo> = parsed
            .streams
            .into_iter()
            .filter_map(|stream| {
                let codec = stream.codec_name.as_deref().and_then(codec_from_name)?;
                Some(SubtitleTrackInfo {
                    index: stream.index,
                    codec,
                    language_tag: stream.tags.get("language").cloned(),
                    title: stream.tags.get("title").cloned(),
                    forced_flag: stream.disposition.get("forced").copied().unwrap_or(0) != 0,
                    default_flag: stream.disposition.get("default").copied().unwrap_or(0) != 0,
                })
            })
            .collect();
        debug!(
            "found {} subtitle streams in {}",
            tracks.len(),
            video_path.display()
        );
        Ok(tracks)
    }

    async fn extract_track(
        &self,
        video_path: &Path,
        index: usize,
        out_path: &Path,
        target_codec: CodecHint,
    ) -> crate::Result<()> {
        let mut command = Command::new("ffmpeg");
        command
            .arg("-y")
            .arg("-v")
            .arg("error")
            .arg("-i")
            .arg(video_path)
            .arg("-map")
            .arg(format!("0:{}", index))
            .arg("-c:s")
            .arg(encoder_for_codec(target_codec))
            .arg(out_path);

        self.run_with_deadline("ffmpeg", &mut command).await?;
        if !out_path.exists() {
            return Err(BisubError::container(format!(
                "ffmpeg reported success but {} was not created",
                out_path.display()
            )));
        }
        Ok(())
    }
}
