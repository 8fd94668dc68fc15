//! Per-job orchestration: resolve two tracks, align, merge, write.
//!
//! One job produces one bilingual output from a (primary-language source,
//! secondary-language source, output spec) triple. Control flow is
//! strictly sequential; batch processing runs N independent jobs on the
//! worker pool. Jobs share no mutable state, and the caller may cancel at
//! any phase boundary.

use crate::config::Config;
use crate::core::align::{
    Aligner, AlignerConfig, AnchorConfig, AnchorFinder, SharedSelector, SyncStrategy,
};
use crate::core::formats::OutputFormat;
use crate::core::formats::manager::FormatManager;
use crate::core::language::{LanguageClassifier, LanguageTag};
use crate::core::merge::{MergeOptions, merge_bilingual_ass, merge_bilingual_srt};
use crate::core::model::{CodecHint, SourceKind, Track};
use crate::core::scorer::{TrackCandidate, TrackScorer};
use crate::error::{AlignmentFailure, BisubError};
use crate::services::container::{ContainerProvider, SubtitleTrackInfo};
use crate::services::ocr::OcrProvider;
use crate::services::translator::{JobTranslator, Translator};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Where one language's track comes from.
#[derive(Debug, Clone)]
pub enum SourceSpec {
    /// Explicit subtitle file.
    File(PathBuf),
    /// Pick a track from the job's video container (optionally a specific
    /// stream index).
    FromVideo {
        /// Explicit stream index override, if the user chose one.
        track_override: Option<usize>,
    },
}

/// One merge job.
#[derive(Debug, Clone)]
pub struct JobSpec {
    /// The video container, when any side resolves from it (also names
    /// the default output).
    pub video: Option<PathBuf>,
    /// Source of the primary-language track.
    pub primary_source: SourceSpec,
    /// Source of the secondary-language track.
    pub secondary_source: SourceSpec,
    /// Primary (first-in-text) language, typically Chinese.
    pub primary_language: LanguageTag,
    /// Secondary language, typically English.
    pub secondary_language: LanguageTag,
    /// Explicit output path; `None` derives `<base>.<pri>-<sec>.<ext>`.
    pub output: Option<PathBuf>,
}

impl JobSpec {
    /// Derive the output path per the `<base>.<primary>-<secondary>.<ext>`
    /// convention, rooted at the video (or the primary subtitle file when
    /// there is no video).
    pub fn resolve_output_path(&self, format: OutputFormat) -> crate::Result<PathBuf> {
        if let Some(path) = &self.output {
            return Ok(path.clone());
        }
        let base = match (&self.video, &self.primary_source, &self.secondary_source) {
            (Some(video), _, _) => video.clone(),
            (None, SourceSpec::File(path), _) => path.clone(),
            (None, _, SourceSpec::File(path)) => path.clone(),
            _ => {
                return Err(BisubError::config(
                    "cannot derive output path without a video or subtitle file",
                ));
            }
        };
        let stem = base
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("bilingual");
        let name = format!(
            "{}.{}-{}.{}",
            stem,
            self.primary_language.short_code(),
            self.secondary_language.short_code(),
            format.extension()
        );
        Ok(base.with_file_name(name))
    }
}

/// Collaborators and per-job state handed to the orchestrator.
///
/// Nothing here is shared mutably between jobs; the translator wrapper and
/// its cache are constructed per job.
pub struct JobContext {
    /// Effective configuration for this job.
    pub config: Config,
    /// Container-extraction collaborator, when available.
    pub container: Option<Arc<dyn ContainerProvider>>,
    /// OCR collaborator for PGS-only containers.
    pub ocr: Option<Arc<dyn OcrProvider>>,
    /// Translation collaborator (pre-budget; the job wraps it).
    pub translator: Option<Arc<dyn Translator>>,
    /// Selector callback for manual anchor choices.
    pub selector: Option<SharedSelector>,
    /// Cooperative cancellation signal.
    pub cancellation: CancellationToken,
}

impl JobContext {
    /// Context with no collaborators (file-only jobs).
    pub fn new(config: Config) -> Self {
        Self {
            config,
            container: None,
            ocr: None,
            translator: None,
            selector: None,
            cancellation: CancellationToken::new(),
        }
    }
}

/// Result summary for a completed job.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    /// Where the merged track was written.
    pub output_path: PathBuf,
    /// Applied global shift in milliseconds.
    pub shift_ms: i64,
    /// Confidence of the adopted anchor.
    pub anchor_confidence: f32,
    /// Non-fatal findings the caller must surface (degraded alignment,
    /// suspicious track shapes).
    pub warnings: Vec<String>,
}

/// A resolved track plus how it was obtained.
struct ResolvedTrack {
    track: Track,
    language: LanguageTag,
}

/// Execute one merge job end to end.
pub async fn execute_job(ctx: &JobContext, spec: &JobSpec) -> crate::Result<JobOutcome> {
    let manager = FormatManager::new();
    let mut warnings = Vec::new();

    let output_format = OutputFormat::from_name(&ctx.config.formats.default_output)
        .unwrap_or(OutputFormat::Srt);
    let output_path = spec.resolve_output_path(output_format)?;

    check_cancelled(ctx)?;
    let primary = resolve_track(ctx, spec, &manager, spec.primary_language, &spec.primary_source)
        .await?;
    check_cancelled(ctx)?;
    let secondary = resolve_track(
        ctx,
        spec,
        &manager,
        spec.secondary_language,
        &spec.secondary_source,
    )
    .await?;

    if let Some(w) = lopsided_track_warning(&primary.track, &secondary.track) {
        warn!("{}", w);
        warnings.push(w);
    }

    // Reference designation: embedded beats external; same kind, the
    // earlier track wins; config override trumps both.
    let primary_is_reference = designate_reference(
        &primary.track,
        &secondary.track,
        &ctx.config.merge.reference_preference,
    );
    let (reference, shifted) = if primary_is_reference {
        (&primary, &secondary)
    } else {
        (&secondary, &primary)
    };
    debug!(
        "reference track: {} ({:?})",
        reference.language, reference.track.source_kind
    );

    check_cancelled(ctx)?;
    let alignment = run_alignment_ladder(ctx, reference, shifted, &mut warnings).await?;

    check_cancelled(ctx)?;
    let (primary_track, secondary_track): (&Track, &Track) = if primary_is_reference {
        (&reference.track, &alignment.shifted)
    } else {
        (&alignment.shifted, &reference.track)
    };
    let merged = match output_format {
        OutputFormat::Srt | OutputFormat::Vtt => merge_bilingual_srt(
            primary_track,
            secondary_track,
            &MergeOptions {
                time_threshold_ms: ctx.config.alignment.time_threshold_ms,
            },
        ),
        OutputFormat::Ass => merge_bilingual_ass(primary_track, secondary_track),
    };

    // Serialization and write are one atomic, uncancellable phase.
    backup_existing(&output_path, ctx.config.general.backup_enabled)?;
    manager.save_track(&merged, &output_path)?;
    info!(
        "wrote {} ({} events, shift {} ms)",
        output_path.display(),
        merged.len(),
        alignment.shift_ms
    );

    Ok(JobOutcome {
        output_path,
        shift_ms: alignment.shift_ms,
        anchor_confidence: alignment.anchor.confidence,
        warnings,
    })
}

fn check_cancelled(ctx: &JobContext) -> crate::Result<()> {
    if ctx.cancellation.is_cancelled() {
        Err(BisubError::Cancelled)
    } else {
        Ok(())
    }
}

fn lopsided_track_warning(a: &Track, b: &Track) -> Option<String> {
    let (small, large) = if a.len() < b.len() { (a, b) } else { (b, a) };
    if large.len() > 0 && small.len() * 2 < large.len() {
        Some(format!(
            "track event counts are lopsided ({} vs {}); the smaller one may be a forced/signs track",
            small.len(),
            large.len()
        ))
    } else {
        None
    }
}

fn designate_reference(primary: &Track, secondary: &Track, preference: &str) -> bool {
    let primary_embedded = primary.source_kind == Some(SourceKind::Embedded);
    let secondary_embedded = secondary.source_kind == Some(SourceKind::Embedded);
    match preference {
        "embedded" => {
            if primary_embedded != secondary_embedded {
                return primary_embedded;
            }
        }
        "external" => {
            if primary_embedded != secondary_embedded {
                return !primary_embedded;
            }
        }
        _ => {}
    }
    if primary_embedded != secondary_embedded {
        return primary_embedded;
    }
    // Same source kind: the track that starts earlier keeps its clock.
    primary.first_start_ms().unwrap_or(u32::MAX) <= secondary.first_start_ms().unwrap_or(u32::MAX)
}

/// Alignment with the retry ladder: configured strategy first, then
/// translation-assisted once, then plain scan, then `ManualRequired`.
async fn run_alignment_ladder(
    ctx: &JobContext,
    reference: &ResolvedTrack,
    shifted: &ResolvedTrack,
    warnings: &mut Vec<String>,
) -> crate::Result<crate::core::model::AlignmentResult> {
    let base_strategy = SyncStrategy::from_name(&ctx.config.alignment.sync_strategy)
        .unwrap_or(SyncStrategy::Auto);

    let mixed = ctx.config.alignment.enable_mixed_realignment
        && reference.track.source_kind == Some(SourceKind::Embedded)
        && shifted.track.source_kind != Some(SourceKind::Embedded);
    let aligner_config = AlignerConfig {
        min_confidence: ctx.config.alignment.threshold,
        semantic_min_confidence: ctx.config.alignment.semantic_threshold,
        allow_large_offset: ctx.config.alignment.allow_large_offset || mixed,
        enable_pre_anchor_trim: mixed,
        strategy: base_strategy,
        time_threshold_ms: ctx.config.alignment.time_threshold_ms,
    };

    let job_translator = ctx.translator.as_ref().map(|t| {
        JobTranslator::new(
            Arc::clone(t),
            ctx.config.translator.max_calls_per_alignment,
        )
    });
    let translation_active = ctx.config.alignment.use_translation && job_translator.is_some();

    let finder = AnchorFinder::new(AnchorConfig::default());

    // Attempt ladder; each entry is (strategy, use_translation).
    let mut attempts: Vec<(SyncStrategy, bool)> = vec![(base_strategy, translation_active)];
    if !translation_active && job_translator.is_some() {
        attempts.push((base_strategy, true));
    }
    // A user who forced manual selection never gets an auto-adopting
    // scan fallback.
    if base_strategy != SyncStrategy::Scan && base_strategy != SyncStrategy::Manual {
        attempts.push((SyncStrategy::Scan, translation_active));
    }

    let mut last_failure: Option<AlignmentFailure> = None;
    for (attempt_no, (strategy, use_translation)) in attempts.iter().enumerate() {
        check_cancelled(ctx)?;
        let translator_ref: Option<&dyn Translator> = if *use_translation {
            job_translator.as_ref().map(|t| t as &dyn Translator)
        } else {
            None
        };

        let mut config = aligner_config.clone();
        config.strategy = *strategy;
        let mut aligner = Aligner::new(config);
        if let Some(selector) = &ctx.selector {
            let inner = Arc::clone(selector);
            aligner = aligner.with_selector(Box::new(move |candidates| inner(candidates)));
        }

        match aligner
            .align(
                &reference.track,
                &shifted.track,
                &finder,
                translator_ref,
                Some(reference.language),
                Some(shifted.language),
            )
            .await
        {
            Ok(result) => {
                if attempt_no > 0 {
                    let note = format!(
                        "alignment succeeded on retry {} (strategy {}, translation {})",
                        attempt_no, strategy, use_translation
                    );
                    warnings.push(note);
                }
                return Ok(result);
            }
            Err(BisubError::Alignment(failure)) => {
                debug!(
                    "alignment attempt {} failed: {} (strategy {})",
                    attempt_no, failure, strategy
                );
                if !failure.is_recoverable() {
                    return Err(BisubError::Alignment(failure));
                }
                last_failure = Some(failure);
            }
            Err(other) => return Err(other),
        }
    }

    match last_failure {
        Some(AlignmentFailure::NoAnchorCandidates) => {
            Err(BisubError::Alignment(AlignmentFailure::NoAnchorCandidates))
        }
        Some(AlignmentFailure::LargeOffsetRequiresConfirmation { offset_ms }) => Err(
            BisubError::Alignment(AlignmentFailure::LargeOffsetRequiresConfirmation { offset_ms }),
        ),
        _ => Err(BisubError::Alignment(AlignmentFailure::ManualRequired)),
    }
}

/// Resolve one language's track from its source spec.
async fn resolve_track(
    ctx: &JobContext,
    spec: &JobSpec,
    manager: &FormatManager,
    target: LanguageTag,
    source: &SourceSpec,
) -> crate::Result<ResolvedTrack> {
    match source {
        SourceSpec::File(path) => {
            let mut track = manager.load_track(path)?;
            track.source_kind = Some(SourceKind::External);
            let language = classify_track(&track, path).unwrap_or(target);
            Ok(ResolvedTrack { track, language })
        }
        SourceSpec::FromVideo { track_override } => {
            let video = spec.video.as_ref().ok_or_else(|| {
                BisubError::config("a video path is required to pick embedded tracks")
            })?;
            let container = ctx.container.as_ref().ok_or_else(|| {
                BisubError::container("no container-extraction collaborator configured")
            })?;
            resolve_embedded(ctx, manager, container.as_ref(), video, target, *track_override)
                .await
        }
    }
}

async fn resolve_embedded(
    ctx: &JobContext,
    manager: &FormatManager,
    container: &dyn ContainerProvider,
    video: &Path,
    target: LanguageTag,
    track_override: Option<usize>,
) -> crate::Result<ResolvedTrack> {
    let infos = container.list_subtitle_tracks(video).await?;
    if infos.is_empty() {
        return Err(BisubError::NoSubtitleTracks(video.to_path_buf()));
    }

    let text_tracks: Vec<&SubtitleTrackInfo> =
        infos.iter().filter(|t| t.codec.is_text_based()).collect();

    if let Some(index) = track_override {
        let info = infos
            .iter()
            .find(|t| t.index == index)
            .ok_or_else(|| BisubError::config(format!("no subtitle stream {} in video", index)))?;
        if !info.codec.is_text_based() {
            return Err(BisubError::config(format!(
                "stream {} is image-based ({}); track overrides must name a text stream",
                index, info.codec
            )));
        }
        let track = extract_text_track(ctx, manager, container, video, info, target).await?;
        let language = track.language.unwrap_or(target);
        return Ok(ResolvedTrack { track, language });
    }

    if !text_tracks.is_empty() {
        let mut candidates = Vec::new();
        for info in &text_tracks {
            match extract_text_track(ctx, manager, container, video, info, target).await {
                Ok(track) => {
                    let mut candidate = TrackCandidate::new(track, info.index);
                    candidate.forced_flag = info.forced_flag;
                    candidate.default_flag = info.default_flag;
                    candidate.language_override = info
                        .language_tag
                        .as_deref()
                        .and_then(LanguageTag::from_container_tag);
                    candidates.push(candidate);
                }
                Err(e) => warn!("skipping unextractable stream {}: {}", info.index, e),
            }
        }
        let scorer = TrackScorer::new();
        let chosen = scorer.select(&candidates, target)?;
        let mut candidate = candidates.swap_remove(chosen.candidate_index);
        candidate.track.role_hint = chosen.role_hint;
        let language = chosen.top_language.unwrap_or(target);
        return Ok(ResolvedTrack {
            track: candidate.track,
            language,
        });
    }

    // Image-based streams only: go through the OCR collaborator.
    let ocr = ctx
        .ocr
        .as_ref()
        .ok_or_else(|| BisubError::ocr("container has only image subtitles and no OCR provider is configured"))?;
    let pgs = infos
        .iter()
        .filter(|t| t.codec == CodecHint::Pgs)
        .max_by_key(|t| {
            // Prefer a language-tagged match, then default streams.
            let lang_match = t
                .language_tag
                .as_deref()
                .and_then(LanguageTag::from_container_tag)
                .is_some_and(|tag| tag.same_language(&target));
            (lang_match, t.default_flag)
        })
        .ok_or_else(|| BisubError::NoSubtitleTracks(video.to_path_buf()))?;

    let out = scratch_path(video, pgs.index, "sup");
    container
        .extract_track(video, pgs.index, &out, CodecHint::Pgs)
        .await?;
    let pgs_bytes = std::fs::read(&out)?;
    let _ = std::fs::remove_file(&out);

    let srt_bytes = ocr.convert_pgs(&pgs_bytes, target.into()).await?;
    let mut track = manager.parse_bytes(&srt_bytes, None)?;
    track.source_kind = Some(SourceKind::Ocr);
    track.language = Some(target);
    Ok(ResolvedTrack {
        track,
        language: target,
    })
}

async fn extract_text_track(
    _ctx: &JobContext,
    manager: &FormatManager,
    container: &dyn ContainerProvider,
    video: &Path,
    info: &SubtitleTrackInfo,
    target: LanguageTag,
) -> crate::Result<Track> {
    let codec = match info.codec {
        CodecHint::Ssa => CodecHint::Ass,
        other => other,
    };
    let out = scratch_path(video, info.index, codec.as_str());
    container
        .extract_track(video, info.index, &out, codec)
        .await?;
    let load_result = manager.load_track(&out);
    let _ = std::fs::remove_file(&out);
    let mut track = load_result?;
    track.source_kind = Some(SourceKind::Embedded);
    track.title = info.title.clone().unwrap_or_default();
    track.codec_hint = Some(info.codec);
    track.language = info
        .language_tag
        .as_deref()
        .and_then(LanguageTag::from_container_tag)
        .or_else(|| classify_track(&track, video))
        .or(Some(target));
    Ok(track)
}

fn classify_track(track: &Track, path: &Path) -> Option<LanguageTag> {
    let classifier = LanguageClassifier::new();
    let sample = track.sample_text(50, 4096);
    classifier.top_language(&sample, path.file_name().and_then(|n| n.to_str()))
}

fn scratch_path(video: &Path, index: usize, ext: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "bisub-{}-{}-{}.{}",
        video
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("video"),
        index,
        uuid::Uuid::new_v4().simple(),
        ext
    ))
}

fn backup_existing(path: &Path, backup_enabled: bool) -> crate::Result<()> {
    if backup_enabled && path.exists() {
        let backup = path.with_extension(format!(
            "{}.bak",
            path.extension().and_then(|e| e.to_str()).unwrap_or("out")
        ));
        std::fs::rename(path, &backup)?;
        info!("backed up existing output to {}", backup.display());
    }
    Ok(())
}
