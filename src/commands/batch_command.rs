//! Batch merge over a directory of videos.
//!
//! Each video becomes one independent job: sidecar subtitle files with a
//! language token in their name are preferred, embedded tracks fill the
//! gaps. Jobs run on the bounded worker pool and the command prints one
//! summary line per input.

use crate::Result;
use crate::cli::BatchArgs;
use crate::cli::ui::{create_progress_bar, print_error, print_success, print_warning};
use crate::commands::parse_language;
use crate::config::{Config, ConfigService};
use crate::core::language::LanguageTag;
use crate::core::parallel::{Task, TaskResult, TaskScheduler};
use crate::core::pipeline::{JobContext, JobSpec, SourceSpec, execute_job};
use crate::error::BisubError;
use crate::services::container::{ContainerProvider, FfmpegContainerProvider};
use crate::services::ocr::{NullOcrProvider, OcrProvider};
use crate::services::translator::{HttpTranslator, Translator};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "mov", "webm"];
const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "ass", "ssa", "vtt"];

/// One whole merge job on the worker pool.
struct MergeJobTask {
    spec: JobSpec,
    config: Config,
    container: Arc<dyn ContainerProvider>,
    ocr: Arc<dyn OcrProvider>,
    translator: Option<Arc<dyn Translator>>,
    cancellation: CancellationToken,
}

#[async_trait]
impl Task for MergeJobTask {
    async fn execute(&self) -> TaskResult {
        let mut ctx = JobContext::new(self.config.clone());
        ctx.container = Some(Arc::clone(&self.container));
        ctx.ocr = Some(Arc::clone(&self.ocr));
        ctx.translator = self.translator.clone();
        ctx.cancellation = self.cancellation.clone();

        match execute_job(&ctx, &self.spec).await {
            Ok(outcome) if outcome.warnings.is_empty() => {
                TaskResult::Success(outcome.output_path.display().to_string())
            }
            Ok(outcome) => TaskResult::Warning(
                outcome.output_path.display().to_string(),
                outcome.warnings,
            ),
            Err(BisubError::Cancelled) => TaskResult::Cancelled,
            Err(e) => TaskResult::Failed(format!("{}: {}", self.description(), e)),
        }
    }

    fn task_id(&self) -> String {
        format!("merge-{}", uuid::Uuid::new_v4().simple())
    }

    fn description(&self) -> String {
        self.spec
            .video
            .as_ref()
            .map(|v| v.display().to_string())
            .unwrap_or_else(|| "job".to_string())
    }
}

/// Execute batch processing over a directory.
pub async fn execute(args: BatchArgs, config_service: &dyn ConfigService) -> Result<()> {
    let mut config = config_service.get_config()?;
    if let Some(format) = &args.format {
        config.formats.default_output = format.clone();
    }
    if args.use_translation {
        config.alignment.use_translation = true;
    }
    if args.allow_large_offset {
        config.alignment.allow_large_offset = true;
    }
    if let Some(workers) = args.workers {
        config.parallel.max_workers = workers;
    }
    crate::config::validator::validate_config(&config)?;

    let primary_language = parse_language(&config.merge.primary_language)?;
    let secondary_language = LanguageTag::En;

    let videos = discover_videos(&args.input, args.recursive)?;
    if videos.is_empty() {
        return Err(BisubError::CommandExecution(format!(
            "no video files found under {}",
            args.input.display()
        )));
    }

    let container: Arc<dyn ContainerProvider> = Arc::new(FfmpegContainerProvider::new());
    let ocr: Arc<dyn OcrProvider> = Arc::new(NullOcrProvider);
    let translator: Option<Arc<dyn Translator>> = if config.alignment.use_translation {
        Some(Arc::new(HttpTranslator::new(
            config.translator.endpoint.clone(),
            config.translator.api_key.clone(),
            Duration::from_secs(config.translator.timeout_seconds),
        )?))
    } else {
        None
    };

    let scheduler = TaskScheduler::new(config.parallel.effective_workers());
    let cancellation = scheduler.cancellation();

    let tasks: Vec<Box<dyn Task>> = videos
        .iter()
        .map(|video| {
            let spec = JobSpec {
                video: Some(video.clone()),
                primary_source: sidecar_source(video, primary_language),
                secondary_source: sidecar_source(video, secondary_language),
                primary_language,
                secondary_language,
                output: None,
            };
            Box::new(MergeJobTask {
                spec,
                config: config.clone(),
                container: Arc::clone(&container),
                ocr: Arc::clone(&ocr),
                translator: translator.clone(),
                cancellation: cancellation.clone(),
            }) as Box<dyn Task>
        })
        .collect();

    let progress = create_progress_bar(tasks.len() as u64);
    let results = scheduler.run_all(tasks).await;
    progress.finish_and_clear();

    let mut succeeded = 0usize;
    for (video, result) in videos.iter().zip(&results) {
        match result {
            TaskResult::Success(path) => {
                succeeded += 1;
                print_success(&format!("{} -> {}", video.display(), path));
            }
            TaskResult::Warning(path, warnings) => {
                succeeded += 1;
                print_warning(&format!(
                    "{} -> {} ({})",
                    video.display(),
                    path,
                    warnings.join("; ")
                ));
            }
            TaskResult::Failed(reason) => print_error(reason),
            TaskResult::Cancelled => print_warning(&format!("{}: cancelled", video.display())),
        }
    }
    println!("{}/{} inputs merged", succeeded, results.len());

    if succeeded == 0 {
        return Err(BisubError::CommandExecution(
            "every batch job failed".to_string(),
        ));
    }
    Ok(())
}

/// Collect video files, sorted for stable summaries.
fn discover_videos(root: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut videos = Vec::new();
    for entry in WalkDir::new(root).max_depth(max_depth) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_video = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| VIDEO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false);
        if is_video {
            videos.push(entry.into_path());
        }
    }
    videos.sort();
    Ok(videos)
}

/// Look for `<stem>.<token>.<ext>` sidecars matching the language; fall
/// back to embedded tracks when none exists.
fn sidecar_source(video: &Path, language: LanguageTag) -> SourceSpec {
    let Some(stem) = video.file_stem().and_then(|s| s.to_str()) else {
        return SourceSpec::FromVideo {
            track_override: None,
        };
    };
    let Some(dir) = video.parent() else {
        return SourceSpec::FromVideo {
            track_override: None,
        };
    };

    let tokens: &[&str] = match language {
        LanguageTag::ZhHans => &["zh", "chs", "chi", "sc", "zh-hans", "cn"],
        LanguageTag::ZhHant => &["cht", "tc", "zh-hant", "tw"],
        LanguageTag::En => &["en", "eng"],
        LanguageTag::Ja => &["ja", "jpn", "jp"],
        LanguageTag::Ko => &["ko", "kor"],
    };

    let Ok(entries) = std::fs::read_dir(dir) else {
        return SourceSpec::FromVideo {
            track_override: None,
        };
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !SUBTITLE_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
            continue;
        }
        if !name.starts_with(stem) {
            continue;
        }
        let middle = name[stem.len()..].to_lowercase();
        if tokens.iter().any(|t| middle.contains(&format!(".{}.", t))) {
            return SourceSpec::File(path);
        }
    }
    SourceSpec::FromVideo {
        track_override: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discover_videos_flat_and_recursive() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a.mkv"), b"").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), b"").unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();
        std::fs::write(tmp.path().join("sub/b.mp4"), b"").unwrap();

        let flat = discover_videos(tmp.path(), false).unwrap();
        assert_eq!(flat.len(), 1);
        let deep = discover_videos(tmp.path(), true).unwrap();
        assert_eq!(deep.len(), 2);
    }

    #[test]
    fn test_sidecar_detection() {
        let tmp = TempDir::new().unwrap();
        let video = tmp.path().join("Movie.2023.mkv");
        std::fs::write(&video, b"").unwrap();
        std::fs::write(tmp.path().join("Movie.2023.zh.srt"), b"").unwrap();
        std::fs::write(tmp.path().join("Movie.2023.eng.ass"), b"").unwrap();

        match sidecar_source(&video, LanguageTag::ZhHans) {
            SourceSpec::File(path) => {
                assert!(path.to_string_lossy().ends_with("Movie.2023.zh.srt"))
            }
            other => panic!("expected sidecar, got {:?}", other),
        }
        match sidecar_source(&video, LanguageTag::En) {
            SourceSpec::File(path) => {
                assert!(path.to_string_lossy().ends_with("Movie.2023.eng.ass"))
            }
            other => panic!("expected sidecar, got {:?}", other),
        }
        // No Korean sidecar: fall back to embedded tracks
        assert!(matches!(
            sidecar_source(&video, LanguageTag::Ko),
            SourceSpec::FromVideo { .. }
        ));
    }
}
