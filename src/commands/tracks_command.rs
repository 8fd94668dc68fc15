//! Track inspection command: show every subtitle stream with classifier
//! and scorer verdicts so users can pick explicit track overrides.

use crate::Result;
use crate::cli::TracksArgs;
use crate::cli::table::{TrackDisplayRow, create_tracks_table};
use crate::cli::ui::print_warning;
use crate::commands::parse_language;
use crate::config::ConfigService;
use crate::core::formats::manager::FormatManager;
use crate::core::model::{CodecHint, RoleHint, SourceKind};
use crate::core::scorer::{TrackCandidate, TrackScorer};
use crate::services::container::{ContainerProvider, FfmpegContainerProvider};
use std::path::PathBuf;

/// Execute the track listing.
pub async fn execute(args: TracksArgs, _config_service: &dyn ConfigService) -> Result<()> {
    let target = parse_language(&args.for_language)?;
    let container = FfmpegContainerProvider::new();
    let manager = FormatManager::new();

    let infos = container.list_subtitle_tracks(&args.video).await?;
    if infos.is_empty() {
        return Err(crate::error::BisubError::NoSubtitleTracks(
            args.video.clone(),
        ));
    }

    let mut rows = Vec::new();
    let mut candidates = Vec::new();
    let mut candidate_rows = Vec::new();

    for info in &infos {
        if !info.codec.is_text_based() {
            rows.push(TrackDisplayRow {
                index: info.index,
                codec: info.codec.to_string(),
                language_tag: info.language_tag.clone().unwrap_or_else(|| "-".into()),
                title: info.title.clone().unwrap_or_default(),
                events: "-".into(),
                detected: "image".into(),
                score: "-".into(),
                role: "needs OCR".into(),
            });
            continue;
        }

        let codec = match info.codec {
            CodecHint::Ssa => CodecHint::Ass,
            other => other,
        };
        let out = scratch_path(&args.video, info.index, codec.as_str());
        let extracted = container
            .extract_track(&args.video, info.index, &out, codec)
            .await;
        let loaded = match extracted {
            Ok(()) => {
                let result = manager.load_track(&out);
                let _ = std::fs::remove_file(&out);
                result
            }
            Err(e) => Err(e),
        };

        match loaded {
            Ok(mut track) => {
                track.source_kind = Some(SourceKind::Embedded);
                track.title = info.title.clone().unwrap_or_default();
                let mut candidate = TrackCandidate::new(track, info.index);
                candidate.forced_flag = info.forced_flag;
                candidate.default_flag = info.default_flag;
                candidates.push(candidate);
                candidate_rows.push(rows.len());
                rows.push(TrackDisplayRow {
                    index: info.index,
                    codec: info.codec.to_string(),
                    language_tag: info.language_tag.clone().unwrap_or_else(|| "-".into()),
                    title: info.title.clone().unwrap_or_default(),
                    events: "0".into(),
                    detected: "-".into(),
                    score: "-".into(),
                    role: "-".into(),
                });
            }
            Err(e) => {
                print_warning(&format!("stream {}: {}", info.index, e));
            }
        }
    }

    let scorer = TrackScorer::new();
    let ranked = scorer.rank(&candidates, target);
    for scored in &ranked {
        let row = &mut rows[candidate_rows[scored.candidate_index]];
        let candidate = &candidates[scored.candidate_index];
        row.events = candidate.track.len().to_string();
        row.detected = scored
            .top_language
            .map(|l| l.to_string())
            .unwrap_or_else(|| "?".into());
        row.score = format!("{:.1}", scored.score);
        row.role = role_label(scored.role_hint).to_string();
    }

    println!("{}", create_tracks_table(rows));
    if let Ok(best) = scorer.select(&candidates, target) {
        println!(
            "best {} candidate: stream {}",
            target,
            candidates[best.candidate_index].source_index
        );
    } else {
        print_warning(&format!("no acceptable {} candidate", target));
    }
    Ok(())
}

fn role_label(role: RoleHint) -> &'static str {
    match role {
        RoleHint::Main => "main",
        RoleHint::ForcedOrSigns => "forced/signs",
        RoleHint::Commentary => "commentary",
        RoleHint::Unknown => "unknown",
    }
}

fn scratch_path(video: &std::path::Path, index: usize, ext: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "bisub-tracks-{}-{}-{}.{}",
        video
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("video"),
        index,
        uuid::Uuid::new_v4().simple(),
        ext
    ))
}
