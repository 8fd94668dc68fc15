//! Combines two aligned tracks into one bilingual event sequence.
//!
//! Two modes: interleaved bilingual SRT blocks built from the union of
//! both tracks' time boundaries (with anti-flicker welding), and dual-style
//! bilingual ASS where each source track keeps its own timing and gets its
//! own style. VTT output reuses the SRT algorithm; only serialization
//! differs.

use crate::core::model::{AssStyle, CodecHint, Event, Track};
use log::debug;
use std::collections::BTreeSet;

/// Style name given to the primary (caller-designated, typically
/// non-English) language in ASS output.
pub const PRIMARY_STYLE: &str = "Primary";
/// Style name given to the secondary language in ASS output.
pub const SECONDARY_STYLE: &str = "Secondary";

/// Options for the segment-union merge.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Anti-flicker fuse distance in milliseconds.
    pub time_threshold_ms: u32,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            time_threshold_ms: 100,
        }
    }
}

/// Merge two aligned tracks into interleaved bilingual blocks.
///
/// The primary track's text appears first in each merged block. Every
/// distinct time boundary of either track starts a new segment, so
/// reference timing is reproduced in the output; segments where both
/// languages are silent are dropped, and consecutive identical blocks
/// closer than `time_threshold_ms` are welded into one.
pub fn merge_bilingual_srt(primary: &Track, secondary: &Track, options: &MergeOptions) -> Track {
    let mut boundaries = BTreeSet::new();
    for event in primary.events.iter().chain(secondary.events.iter()) {
        boundaries.insert(event.start_ms);
        boundaries.insert(event.end_ms);
    }
    let points: Vec<u32> = boundaries.into_iter().collect();

    let mut segments: Vec<Event> = Vec::new();
    for window in points.windows(2) {
        let (seg_start, seg_end) = (window[0], window[1]);
        if seg_end <= seg_start {
            continue;
        }

        let primary_text = active_text(primary, seg_start);
        let secondary_text = active_text(secondary, seg_start);
        let text = match (primary_text.is_empty(), secondary_text.is_empty()) {
            (true, true) => continue,
            (false, true) => primary_text,
            (true, false) => secondary_text,
            (false, false) => format!("{}\n{}", primary_text, secondary_text),
        };

        segments.push(Event::new(segments.len() + 1, seg_start, seg_end, text));
    }

    let welded = weld_flicker(segments, options.time_threshold_ms);
    debug!("merged into {} bilingual blocks", welded.len());

    let mut track = Track::new(CodecHint::Srt);
    track.events = welded;
    track.normalize();
    track
}

/// Merge two aligned tracks into dual-style ASS.
///
/// No time merging happens here: each source event is copied with its own
/// timing and assigned the `Primary` (top) or `Secondary` (bottom) style.
/// The script info union prefers the primary track on key conflicts.
pub fn merge_bilingual_ass(primary: &Track, secondary: &Track) -> Track {
    let mut track = Track::new(CodecHint::Ass);

    for (key, value) in primary.script_info.iter().chain(secondary.script_info.iter()) {
        if key.eq_ignore_ascii_case("scripttype") {
            continue;
        }
        if !track.script_info.iter().any(|(k, _)| k == key) {
            track.script_info.push((key.clone(), value.clone()));
        }
    }
    track
        .script_info
        .push(("ScriptType".to_string(), "v4.00+".to_string()));

    track.styles = vec![
        synthesize_style(PRIMARY_STYLE, primary, 24, "&H0000FFFF", 8),
        synthesize_style(SECONDARY_STYLE, secondary, 20, "&H00FFFFFF", 2),
    ];

    // (start, language bucket, original index) gives the stable output
    // ordering; primary sorts before secondary on exact ties.
    let mut keyed: Vec<(u32, u8, usize, Event)> = Vec::new();
    for event in &primary.events {
        keyed.push((event.start_ms, 0, event.index, styled_copy(event, PRIMARY_STYLE)));
    }
    for event in &secondary.events {
        keyed.push((event.start_ms, 1, event.index, styled_copy(event, SECONDARY_STYLE)));
    }
    keyed.sort_by_key(|(start, bucket, index, _)| (*start, *bucket, *index));

    track.events = keyed.into_iter().map(|(_, _, _, event)| event).collect();
    track.normalize();
    track
}

/// Concatenated texts of the events active at `t_ms`, in original order.
fn active_text(track: &Track, t_ms: u32) -> String {
    let texts: Vec<&str> = track
        .events
        .iter()
        .filter(|e| e.is_active_at(t_ms))
        .map(|e| e.text.as_str())
        .collect();
    texts.join("\n")
}

/// Fuse consecutive events with identical merged text and a gap below the
/// threshold; an immediate continuation (gap 0) always fuses.
fn weld_flicker(segments: Vec<Event>, threshold_ms: u32) -> Vec<Event> {
    let mut out: Vec<Event> = Vec::with_capacity(segments.len());
    for event in segments {
        if let Some(last) = out.last_mut() {
            let gap = event.start_ms.saturating_sub(last.end_ms);
            if last.text == event.text && gap < threshold_ms {
                last.end_ms = event.end_ms;
                continue;
            }
        }
        out.push(event);
    }
    for (i, event) in out.iter_mut().enumerate() {
        event.index = i + 1;
    }
    out
}

fn styled_copy(event: &Event, style: &str) -> Event {
    let mut copy = Event::new(event.index, event.start_ms, event.end_ms, event.text.clone());
    copy.style_ref = Some(style.to_string());
    copy
}

/// Build one of the two output styles, inheriting font family and size
/// from the source track's first style when present.
fn synthesize_style(
    name: &str,
    source: &Track,
    default_size: u32,
    color: &str,
    alignment: u8,
) -> AssStyle {
    let font = source
        .styles
        .first()
        .and_then(|s| s.font_name.clone())
        .unwrap_or_else(|| "Arial".to_string());
    let size = source
        .styles
        .first()
        .and_then(|s| s.font_size)
        .unwrap_or(default_size);
    let raw = format!(
        "Style: {},{},{},{},&H000000FF,&H00000000,&H00000000,0,0,0,0,100,100,0,0,1,2,0,{},10,10,10,1",
        name, font, size, color, alignment
    );
    AssStyle {
        name: name.to_string(),
        raw,
        font_name: Some(font),
        font_size: Some(size),
    }
}
