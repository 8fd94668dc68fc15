//! In-memory subtitle data model shared by every engine component.
//!
//! Events carry millisecond timestamps and logical text; everything a
//! specific file format needs beyond that travels in a per-format
//! passthrough channel so that untouched events can be re-serialized
//! verbatim.

use crate::core::language::LanguageTag;

/// Upper bound for event timestamps (24 hours in milliseconds).
pub const MAX_TIMESTAMP_MS: u32 = 24 * 3600 * 1000;

/// Where a track came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Demuxed from a video container.
    Embedded,
    /// Standalone subtitle file next to the video.
    External,
    /// Produced by OCR over an image-based stream.
    Ocr,
}

/// The scorer's verdict about a track's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleHint {
    /// Main dialogue track.
    Main,
    /// Sparse forced/signs-and-songs track.
    ForcedOrSigns,
    /// Commentary track.
    Commentary,
    /// Not yet classified.
    #[default]
    Unknown,
}

/// Codec of the underlying stream or file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecHint {
    /// SubRip text
    Srt,
    /// Advanced SubStation Alpha
    Ass,
    /// SubStation Alpha (legacy)
    Ssa,
    /// WebVTT
    Vtt,
    /// Presentation Graphic Stream (image-based, needs OCR)
    Pgs,
}

impl CodecHint {
    /// Lowercase name, matching the usual file extension.
    pub fn as_str(&self) -> &'static str {
        match self {
            CodecHint::Srt => "srt",
            CodecHint::Ass => "ass",
            CodecHint::Ssa => "ssa",
            CodecHint::Vtt => "vtt",
            CodecHint::Pgs => "pgs",
        }
    }

    /// Whether the codec carries text (as opposed to images).
    pub fn is_text_based(&self) -> bool {
        !matches!(self, CodecHint::Pgs)
    }
}

impl std::fmt::Display for CodecHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Strategy that produced an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorMethod {
    /// Pair the first events of both tracks.
    FirstLine,
    /// Similarity scan over the first K events of each track.
    Scan,
    /// Scan after machine-translating the shifted track's openers.
    Translation,
    /// Human-selected pair.
    Manual,
    /// Wide scan for offsets beyond the 5 s guardrail.
    Semantic,
}

impl std::fmt::Display for AnchorMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AnchorMethod::FirstLine => "first_line",
            AnchorMethod::Scan => "scan",
            AnchorMethod::Translation => "translation",
            AnchorMethod::Manual => "manual",
            AnchorMethod::Semantic => "semantic",
        };
        write!(f, "{}", name)
    }
}

/// Format-specific passthrough attributes attached to an event.
///
/// The alignment and merge engine never interprets these; adapters use
/// them to reproduce position tags, cue settings, and ASS override tags
/// when an event is copied verbatim into the output.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FormatAttrs {
    /// No passthrough payload (typical for SRT).
    #[default]
    None,
    /// ASS dialogue fields other than times, style, and stripped text.
    Ass(AssEventAttrs),
    /// VTT cue identifier and settings.
    Vtt(VttCueAttrs),
}

/// Non-time ASS dialogue fields, kept as written for verbatim re-emit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssEventAttrs {
    /// Layer field
    pub layer: String,
    /// Name/Actor field
    pub name: String,
    /// MarginL field
    pub margin_l: String,
    /// MarginR field
    pub margin_r: String,
    /// MarginV field
    pub margin_v: String,
    /// Effect field
    pub effect: String,
    /// Original text field including `{\...}` override tags and `\N`.
    pub raw_text: String,
}

/// VTT cue attributes preserved across a round-trip.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VttCueAttrs {
    /// Optional cue identifier line preceding the time line.
    pub identifier: Option<String>,
    /// Everything after the arrow time range on the time line.
    pub settings: String,
}

/// One timed subtitle.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Ordinal, 1-based, contiguous within a track after normalization.
    pub index: usize,
    /// Start timestamp in milliseconds.
    pub start_ms: u32,
    /// End timestamp in milliseconds, `end_ms >= start_ms`.
    pub end_ms: u32,
    /// Logical text; line breaks are `\n`, styling markup stripped.
    pub text: String,
    /// Optional tag naming a style in the owning track.
    pub style_ref: Option<String>,
    /// Format-specific passthrough.
    pub attrs: FormatAttrs,
}

impl Event {
    /// Create a plain event without style or passthrough payload.
    pub fn new(index: usize, start_ms: u32, end_ms: u32, text: impl Into<String>) -> Self {
        Self {
            index,
            start_ms,
            end_ms,
            text: text.into(),
            style_ref: None,
            attrs: FormatAttrs::None,
        }
    }

    /// Whether this event is on screen at instant `t_ms`.
    pub fn is_active_at(&self, t_ms: u32) -> bool {
        self.start_ms <= t_ms && t_ms < self.end_ms
    }

    /// Return a copy shifted by `delta_ms`, clamping at zero.
    ///
    /// Returns `None` when the shifted event ends at or before zero and
    /// therefore cannot be displayed at all.
    pub fn shifted(&self, delta_ms: i64) -> Option<Event> {
        let end = i64::from(self.end_ms) + delta_ms;
        if end <= 0 {
            return None;
        }
        let start = (i64::from(self.start_ms) + delta_ms).max(0);
        let mut event = self.clone();
        event.start_ms = start.min(i64::from(MAX_TIMESTAMP_MS)) as u32;
        event.end_ms = end.min(i64::from(MAX_TIMESTAMP_MS)) as u32;
        Some(event)
    }
}

/// A named ASS style: the raw `Style:` line for verbatim re-emit plus the
/// few fields the merger inherits when synthesizing output styles.
#[derive(Debug, Clone, PartialEq)]
pub struct AssStyle {
    /// Style name as referenced by dialogue lines.
    pub name: String,
    /// The full `Style: ...` line as read.
    pub raw: String,
    /// Parsed font family, if the line was well-formed.
    pub font_name: Option<String>,
    /// Parsed font size, if the line was well-formed.
    pub font_size: Option<u32>,
}

/// Ordered sequence of events plus track metadata.
#[derive(Debug, Clone, Default)]
pub struct Track {
    /// The events, sorted by `start_ms` with stable ties.
    pub events: Vec<Event>,
    /// Where the track came from.
    pub source_kind: Option<SourceKind>,
    /// BCP-47-like language tag; `None` when unknown.
    pub language: Option<LanguageTag>,
    /// Free-text title (container metadata or empty).
    pub title: String,
    /// Codec of the source.
    pub codec_hint: Option<CodecHint>,
    /// Role assigned by the track scorer.
    pub role_hint: RoleHint,
    /// ASS styles in declaration order (empty for SRT/VTT).
    pub styles: Vec<AssStyle>,
    /// ASS `[Script Info]` key/value pairs in declaration order.
    pub script_info: Vec<(String, String)>,
    /// ASS `Comment:` lines, keyed by the event position they precede.
    pub comments: Vec<(usize, String)>,
    /// VTT NOTE/STYLE/REGION blocks preserved for round-trip.
    pub vtt_headers: Vec<String>,
}

impl Track {
    /// Create an empty track with the given codec hint.
    pub fn new(codec_hint: CodecHint) -> Self {
        Self {
            codec_hint: Some(codec_hint),
            ..Default::default()
        }
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the track has no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Start of the earliest event, if any.
    pub fn first_start_ms(&self) -> Option<u32> {
        self.events.first().map(|e| e.start_ms)
    }

    /// Re-establish the track invariants after load or transformation.
    ///
    /// Sorts by `start_ms` (stable, so original order breaks ties), clamps
    /// end timestamps to the 24 h ceiling, repairs inverted ranges, strips
    /// stray control characters, and renumbers indices 1..N.
    pub fn normalize(&mut self) {
        self.events.sort_by_key(|e| e.start_ms);
        for (pos, event) in self.events.iter_mut().enumerate() {
            event.index = pos + 1;
            if event.end_ms > MAX_TIMESTAMP_MS {
                log::warn!(
                    "event {} ends beyond 24h ({} ms), clamping",
                    event.index,
                    event.end_ms
                );
                event.end_ms = MAX_TIMESTAMP_MS;
            }
            if event.end_ms < event.start_ms {
                log::warn!("event {} has end before start, repairing", event.index);
                event.end_ms = event.start_ms;
            }
            if event.text.chars().any(is_stray_control) {
                event.text = sanitize_text(&event.text);
            }
        }
    }

    /// Whether events are sorted by start time.
    pub fn is_sorted_by_start(&self) -> bool {
        self.events.windows(2).all(|w| w[0].start_ms <= w[1].start_ms)
    }

    /// Concatenated texts of up to the first `max_events` events,
    /// truncated to `max_bytes`, for language classification.
    pub fn sample_text(&self, max_events: usize, max_bytes: usize) -> String {
        let mut sample = String::new();
        for event in self.events.iter().take(max_events) {
            if sample.len() + event.text.len() + 1 > max_bytes {
                let remaining = max_bytes.saturating_sub(sample.len());
                let mut cut = remaining;
                while cut > 0 && !event.text.is_char_boundary(cut) {
                    cut -= 1;
                }
                sample.push_str(&event.text[..cut]);
                break;
            }
            sample.push_str(&event.text);
            sample.push('\n');
        }
        sample
    }

    /// Ratio of events whose text ends with sentence-terminating
    /// punctuation, used by the track scorer's content-shape signal.
    pub fn sentence_punctuation_ratio(&self) -> f32 {
        if self.events.is_empty() {
            return 0.0;
        }
        let terminated = self
            .events
            .iter()
            .filter(|e| {
                e.text
                    .trim_end()
                    .chars()
                    .next_back()
                    .is_some_and(|c| ".!?。！？…".contains(c))
            })
            .count();
        terminated as f32 / self.events.len() as f32
    }
}

/// A candidate pairing between a reference-track event and a
/// shifted-track event, with the implied global offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    /// 1-based index into the reference track.
    pub i: usize,
    /// 1-based index into the shifted track.
    pub j: usize,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
    /// `reference[i].start_ms - shifted[j].start_ms`.
    pub offset_ms: i64,
    /// Strategy that produced this candidate.
    pub method: AnchorMethod,
}

/// Outcome of a successful alignment.
#[derive(Debug, Clone)]
pub struct AlignmentResult {
    /// The adopted anchor.
    pub anchor: Anchor,
    /// The shifted track after global shift and pre-anchor trim; the
    /// reference track is never mutated.
    pub shifted: Track,
    /// The applied global shift in milliseconds.
    pub shift_ms: i64,
    /// True when reference timing survived into the trial merge.
    pub reference_preserved: bool,
}

/// Whether `c` is a control character that must not appear in event text.
fn is_stray_control(c: char) -> bool {
    c.is_control() && c != '\n'
}

/// Strip control characters other than `\n` from `text`.
///
/// `\r\n` pairs collapse to `\n` rather than being deleted outright.
pub fn sanitize_text(text: &str) -> String {
    text.replace("\r\n", "\n")
        .chars()
        .filter(|&c| !is_stray_control(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_shift_clamps_at_zero() {
        let event = Event::new(1, 500, 2000, "hi");
        let shifted = event.shifted(-1000).unwrap();
        assert_eq!(shifted.start_ms, 0);
        assert_eq!(shifted.end_ms, 1000);
    }

    #[test]
    fn test_event_shift_drops_fully_negative() {
        let event = Event::new(1, 500, 900, "hi");
        assert!(event.shifted(-900).is_none());
        assert!(event.shifted(-1500).is_none());
    }

    #[test]
    fn test_normalize_sorts_and_renumbers() {
        let mut track = Track::new(CodecHint::Srt);
        track.events = vec![
            Event::new(7, 5000, 6000, "second"),
            Event::new(3, 1000, 2000, "first"),
        ];
        track.normalize();
        assert_eq!(track.events[0].text, "first");
        assert_eq!(track.events[0].index, 1);
        assert_eq!(track.events[1].index, 2);
    }

    #[test]
    fn test_normalize_stable_on_ties() {
        let mut track = Track::new(CodecHint::Srt);
        track.events = vec![
            Event::new(1, 1000, 2000, "a"),
            Event::new(2, 1000, 2000, "b"),
        ];
        track.normalize();
        assert_eq!(track.events[0].text, "a");
        assert_eq!(track.events[1].text, "b");
    }

    #[test]
    fn test_normalize_clamps_day_overflow() {
        let mut track = Track::new(CodecHint::Srt);
        track.events = vec![Event::new(1, 1000, MAX_TIMESTAMP_MS + 5000, "late")];
        track.normalize();
        assert_eq!(track.events[0].end_ms, MAX_TIMESTAMP_MS);
    }

    #[test]
    fn test_sanitize_text() {
        assert_eq!(sanitize_text("a\r\nb"), "a\nb");
        assert_eq!(sanitize_text("a\u{0}b\tc"), "abc");
        assert_eq!(sanitize_text("多行\n字幕"), "多行\n字幕");
    }

    #[test]
    fn test_sample_text_truncation() {
        let mut track = Track::new(CodecHint::Srt);
        for i in 0..100 {
            track
                .events
                .push(Event::new(i + 1, i as u32 * 1000, i as u32 * 1000 + 500, "x".repeat(100)));
        }
        let sample = track.sample_text(50, 4096);
        assert!(sample.len() <= 4096);
    }

    #[test]
    fn test_sentence_punctuation_ratio() {
        let mut track = Track::new(CodecHint::Srt);
        track.events = vec![
            Event::new(1, 0, 1, "Hello."),
            Event::new(2, 1, 2, "再見。"),
            Event::new(3, 2, 3, "no terminator"),
            Event::new(4, 3, 4, "what?"),
        ];
        assert!((track.sentence_punctuation_ratio() - 0.75).abs() < f32::EPSILON);
    }
}
