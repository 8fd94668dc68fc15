//! Candidate-track scoring and main-dialogue selection.
//!
//! Given the subtitle tracks found for a video (embedded streams, external
//! files, OCR output) and a target language, the scorer ranks them with a
//! weighted sum over language match, event-count credibility, title hints,
//! and content shape, then either picks a primary track or reports that no
//! candidate is acceptable so the caller can fall back or abort.

use crate::core::language::{LanguageClassifier, LanguageTag};
use crate::core::model::{RoleHint, Track};
use crate::error::BisubError;
use log::debug;

/// Sample window handed to the language classifier.
const SAMPLE_EVENTS: usize = 50;
const SAMPLE_BYTES: usize = 4096;

/// Below this total score a candidate is never auto-selected.
const MIN_ACCEPTABLE_SCORE: f32 = 25.0;

/// Title substrings that mark non-dialogue tracks.
const NEGATIVE_TITLE_KEYWORDS: &[&str] =
    &["forced", "signs", "songs", "foreign parts", "commentary"];

/// Title substrings that mark full dialogue tracks.
const POSITIVE_TITLE_KEYWORDS: &[&str] = &["full", "dialogue", "main"];

/// A candidate track plus the container metadata the scorer consumes.
#[derive(Debug, Clone)]
pub struct TrackCandidate {
    /// The loaded track.
    pub track: Track,
    /// Track index in the source ordering (container stream order or
    /// discovery order for external files).
    pub source_index: usize,
    /// The container's forced-flag for this stream.
    pub forced_flag: bool,
    /// The container's default-flag for this stream.
    pub default_flag: bool,
    /// User remap rule: treat this candidate as the given language
    /// regardless of classifier output.
    pub language_override: Option<LanguageTag>,
}

impl TrackCandidate {
    /// Wrap a loaded track with neutral metadata.
    pub fn new(track: Track, source_index: usize) -> Self {
        Self {
            track,
            source_index,
            forced_flag: false,
            default_flag: false,
            language_override: None,
        }
    }
}

/// Per-signal breakdown of a candidate's score.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreBreakdown {
    /// Language match contribution (0..=40)
    pub language: f32,
    /// Event-count credibility contribution (0..=25)
    pub event_count: f32,
    /// Title hint contribution (-20..=10)
    pub title: f32,
    /// Sentence-punctuation shape contribution (0..=15)
    pub content_shape: f32,
}

impl ScoreBreakdown {
    fn total(&self) -> f32 {
        (self.language + self.event_count + self.title + self.content_shape).clamp(0.0, 100.0)
    }
}

/// Scoring verdict for one candidate.
#[derive(Debug, Clone)]
pub struct ScoredTrack {
    /// Index into the candidate slice passed to [`TrackScorer::rank`].
    pub candidate_index: usize,
    /// Total score in `[0, 100]`.
    pub score: f32,
    /// Per-signal contributions.
    pub breakdown: ScoreBreakdown,
    /// Role the scorer assigns to this track.
    pub role_hint: RoleHint,
    /// The classifier's top language for the track sample.
    pub top_language: Option<LanguageTag>,
}

/// Ranks candidate tracks for a target language.
#[derive(Debug, Default)]
pub struct TrackScorer {
    classifier: LanguageClassifier,
}

impl TrackScorer {
    /// Create a scorer.
    pub fn new() -> Self {
        Self {
            classifier: LanguageClassifier::new(),
        }
    }

    /// Score every candidate and return them ranked best-first.
    ///
    /// Ties break on higher event count, then non-forced flag, then lower
    /// source index.
    pub fn rank(&self, candidates: &[TrackCandidate], target: LanguageTag) -> Vec<ScoredTrack> {
        let mut scored: Vec<ScoredTrack> = candidates
            .iter()
            .enumerate()
            .map(|(idx, candidate)| self.score_one(idx, candidate, target))
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap()
                .then_with(|| {
                    let count_a = candidates[a.candidate_index].track.len();
                    let count_b = candidates[b.candidate_index].track.len();
                    count_b.cmp(&count_a)
                })
                .then_with(|| {
                    let forced_a = candidates[a.candidate_index].forced_flag;
                    let forced_b = candidates[b.candidate_index].forced_flag;
                    forced_a.cmp(&forced_b)
                })
                .then_with(|| {
                    candidates[a.candidate_index]
                        .source_index
                        .cmp(&candidates[b.candidate_index].source_index)
                })
        });
        scored
    }

    /// Pick the primary track for `target`, or report that nothing is
    /// acceptable.
    ///
    /// # Errors
    ///
    /// Returns [`BisubError::NoAcceptableCandidate`] when the best score is
    /// below the acceptance floor; the caller may then fall back (OCR) or
    /// abort with a user-visible reason.
    pub fn select(
        &self,
        candidates: &[TrackCandidate],
        target: LanguageTag,
    ) -> crate::Result<ScoredTrack> {
        let ranked = self.rank(candidates, target);
        match ranked.into_iter().next() {
            Some(best) if best.score >= MIN_ACCEPTABLE_SCORE => Ok(best),
            _ => Err(BisubError::NoAcceptableCandidate {
                language: target.to_string(),
                candidates: candidates.len(),
            }),
        }
    }

    fn score_one(
        &self,
        candidate_index: usize,
        candidate: &TrackCandidate,
        target: LanguageTag,
    ) -> ScoredTrack {
        let track = &candidate.track;
        let sample = track.sample_text(SAMPLE_EVENTS, SAMPLE_BYTES);
        let ranked_languages = self.classifier.classify(&sample, None);

        let top_language = candidate.language_override.or_else(|| {
            ranked_languages
                .first()
                .filter(|s| s.score > 0.0)
                .map(|s| s.tag)
        });

        let language = if let Some(forced) = candidate.language_override {
            // Remap rules override classifier output entirely.
            if forced.same_language(&target) { 40.0 } else { 0.0 }
        } else if ranked_languages
            .first()
            .is_some_and(|s| s.score > 0.0 && s.tag.same_language(&target))
        {
            40.0
        } else if ranked_languages
            .get(1)
            .is_some_and(|s| s.score > 0.0 && s.tag.same_language(&target))
        {
            15.0
        } else {
            0.0
        };

        let count = track.len();
        let event_count = if count < 20 {
            0.0
        } else {
            (((count - 20) as f32) / 280.0 * 25.0).min(25.0)
        };

        let title_lower = track.title.to_lowercase();
        let negative_title = candidate.forced_flag
            || NEGATIVE_TITLE_KEYWORDS
                .iter()
                .any(|kw| title_lower.contains(kw));
        let title = if negative_title {
            -20.0
        } else if POSITIVE_TITLE_KEYWORDS
            .iter()
            .any(|kw| title_lower.contains(kw))
        {
            10.0
        } else {
            0.0
        };

        let content_shape = track.sentence_punctuation_ratio() * 15.0;

        let breakdown = ScoreBreakdown {
            language,
            event_count,
            title,
            content_shape,
        };

        let role_hint = if title_lower.contains("commentary") {
            RoleHint::Commentary
        } else if negative_title || count < 20 {
            RoleHint::ForcedOrSigns
        } else {
            RoleHint::Main
        };

        debug!(
            "candidate {} ({:?}): lang {:.0} + count {:.0} + title {:.0} + shape {:.1} = {:.1}",
            candidate.source_index,
            role_hint,
            language,
            event_count,
            title,
            content_shape,
            breakdown.total()
        );

        ScoredTrack {
            candidate_index,
            score: breakdown.total(),
            breakdown,
            role_hint,
            top_language,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{CodecHint, Event};

    fn english_track(event_count: usize, title: &str) -> Track {
        let mut track = Track::new(CodecHint::Srt);
        track.title = title.to_string();
        for i in 0..event_count {
            let start = i as u32 * 2000;
            track.events.push(Event::new(
                i + 1,
                start,
                start + 1500,
                format!("This is spoken line number {}.", i),
            ));
        }
        track
    }

    fn chinese_track(event_count: usize) -> Track {
        let mut track = Track::new(CodecHint::Srt);
        for i in 0..event_count {
            let start = i as u32 * 2000;
            track
                .events
                .push(Event::new(i + 1, start, start + 1500, "这是一句对白。"));
        }
        track
    }

    #[test]
    fn test_forced_track_rejected_in_favor_of_full_track() {
        let scorer = TrackScorer::new();
        let mut forced = TrackCandidate::new(english_track(25, "English (Forced)"), 0);
        forced.forced_flag = true;
        let full = TrackCandidate::new(english_track(1200, "English"), 1);

        let candidates = vec![forced, full];
        let ranked = scorer.rank(&candidates, LanguageTag::En);

        assert_eq!(ranked[0].candidate_index, 1);
        assert_eq!(ranked[0].role_hint, RoleHint::Main);
        assert_eq!(ranked[1].role_hint, RoleHint::ForcedOrSigns);

        let chosen = scorer.select(&candidates, LanguageTag::En).unwrap();
        assert_eq!(chosen.candidate_index, 1);
    }

    #[test]
    fn test_language_mismatch_scores_low() {
        let scorer = TrackScorer::new();
        let candidates = vec![TrackCandidate::new(chinese_track(500), 0)];
        let ranked = scorer.rank(&candidates, LanguageTag::En);
        assert_eq!(ranked[0].breakdown.language, 0.0);
    }

    #[test]
    fn test_no_acceptable_candidate() {
        let scorer = TrackScorer::new();
        // Five sparse events, no target-language text: below the floor.
        let candidates = vec![TrackCandidate::new(chinese_track(5), 0)];
        let err = scorer.select(&candidates, LanguageTag::En);
        assert!(matches!(
            err,
            Err(BisubError::NoAcceptableCandidate { .. })
        ));
    }

    #[test]
    fn test_language_override_beats_classifier() {
        let scorer = TrackScorer::new();
        let mut candidate = TrackCandidate::new(chinese_track(400), 0);
        candidate.language_override = Some(LanguageTag::En);
        let ranked = scorer.rank(&[candidate], LanguageTag::En);
        assert_eq!(ranked[0].breakdown.language, 40.0);
    }

    #[test]
    fn test_event_count_ramp() {
        let scorer = TrackScorer::new();
        let sparse = TrackCandidate::new(english_track(19, ""), 0);
        let mid = TrackCandidate::new(english_track(160, ""), 1);
        let dense = TrackCandidate::new(english_track(300, ""), 2);
        let ranked = scorer.rank(&[sparse, mid, dense], LanguageTag::En);
        let by_idx = |i: usize| ranked.iter().find(|s| s.candidate_index == i).unwrap();
        assert_eq!(by_idx(0).breakdown.event_count, 0.0);
        assert!(by_idx(1).breakdown.event_count > 10.0);
        assert!(by_idx(1).breakdown.event_count < 14.0);
        assert_eq!(by_idx(2).breakdown.event_count, 25.0);
    }

    #[test]
    fn test_tie_break_prefers_lower_source_index() {
        let scorer = TrackScorer::new();
        let a = TrackCandidate::new(english_track(300, ""), 3);
        let b = TrackCandidate::new(english_track(300, ""), 1);
        let ranked = scorer.rank(&[a, b], LanguageTag::En);
        assert_eq!(ranked[0].candidate_index, 1);
    }

    #[test]
    fn test_positive_title_hint() {
        let scorer = TrackScorer::new();
        let plain = TrackCandidate::new(english_track(300, ""), 0);
        let dialogue = TrackCandidate::new(english_track(300, "English [Full Dialogue]"), 1);
        let ranked = scorer.rank(&[plain, dialogue], LanguageTag::En);
        assert_eq!(ranked[0].candidate_index, 1);
        assert_eq!(ranked[0].breakdown.title, 10.0);
    }
}
