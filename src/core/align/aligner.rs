//! Anchor adoption, global time shift, and reference-preservation
//! validation.
//!
//! An alignment attempt walks `init → finding_anchor → (anchor_ok |
//! anchor_failed) → shifting → validating → (done | rejected)`. The
//! reference track is never mutated; the shifted track is rebuilt from a
//! copy. Every rejection carries a discriminated
//! [`AlignmentFailure`](crate::error::AlignmentFailure) reason.

use crate::core::align::anchor::AnchorFinder;
use crate::core::align::{Selector, SelectorChoice, SyncStrategy};
use crate::core::language::LanguageTag;
use crate::core::merge::{MergeOptions, merge_bilingual_srt};
use crate::core::model::{AlignmentResult, Anchor, AnchorMethod, Track};
use crate::error::AlignmentFailure;
use crate::services::translator::Translator;
use log::{debug, info};

/// Shifts beyond this need `allow_large_offset` (or a confirming caller).
const LARGE_OFFSET_GUARD_MS: i64 = 5000;

/// Pre-anchor trim slack.
const PRE_ANCHOR_EPSILON_MS: u32 = 100;

/// Boundary reproduction tolerance for validation.
const VALIDATION_TOLERANCE_MS: u32 = 100;

/// Minimum fraction of reference boundaries that must survive the merge.
const VALIDATION_MIN_RATIO: f32 = 0.7;

/// Aligner configuration.
#[derive(Debug, Clone)]
pub struct AlignerConfig {
    /// Minimum anchor confidence for automatic adoption.
    pub min_confidence: f32,
    /// Relaxed floor applied to semantic (large-offset) anchors.
    pub semantic_min_confidence: f32,
    /// Permit |shift| > 5 s without selector confirmation.
    pub allow_large_offset: bool,
    /// Drop shifted events that end before the reference track begins.
    pub enable_pre_anchor_trim: bool,
    /// Anchor strategy; `Auto` tries the ladder in order.
    pub strategy: SyncStrategy,
    /// Weld distance used for the validation trial merge.
    pub time_threshold_ms: u32,
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.8,
            semantic_min_confidence: 0.15,
            allow_large_offset: false,
            enable_pre_anchor_trim: false,
            strategy: SyncStrategy::Auto,
            time_threshold_ms: 100,
        }
    }
}

/// Chooses an anchor, shifts the non-reference track, and validates that
/// reference timing is preserved.
pub struct Aligner {
    config: AlignerConfig,
    selector: Option<Selector>,
}

impl Aligner {
    /// Create an aligner that adopts anchors automatically.
    pub fn new(config: AlignerConfig) -> Self {
        Self {
            config,
            selector: None,
        }
    }

    /// Attach a selector callback for manual or low-confidence choices.
    pub fn with_selector(mut self, selector: Selector) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Run the full alignment: find anchors, adopt one, shift, validate.
    pub async fn align(
        &self,
        reference: &Track,
        shifted: &Track,
        finder: &AnchorFinder,
        translator: Option<&dyn Translator>,
        reference_lang: Option<LanguageTag>,
        shifted_lang: Option<LanguageTag>,
    ) -> crate::Result<AlignmentResult> {
        debug!("alignment: finding_anchor ({})", self.config.strategy);
        let candidates = finder
            .find(
                reference,
                shifted,
                self.config.strategy,
                translator,
                reference_lang,
                shifted_lang,
            )
            .await?;
        Ok(self.align_with_candidates(reference, shifted, finder, &candidates)?)
    }

    /// Alignment with externally supplied anchor candidates.
    ///
    /// Pure apart from the selector callback; this is the entry point the
    /// tests drive directly.
    pub fn align_with_candidates(
        &self,
        reference: &Track,
        shifted: &Track,
        finder: &AnchorFinder,
        candidates: &[Anchor],
    ) -> Result<AlignmentResult, AlignmentFailure> {
        let anchor = self.adopt_anchor(finder, candidates)?;
        debug!(
            "alignment: anchor_ok ({}, {}) via {} at confidence {:.2}",
            anchor.i, anchor.j, anchor.method, anchor.confidence
        );

        let shift_ms = anchor.offset_ms;
        if shift_ms.abs() > LARGE_OFFSET_GUARD_MS && !self.config.allow_large_offset {
            return Err(AlignmentFailure::LargeOffsetRequiresConfirmation {
                offset_ms: shift_ms,
            });
        }

        debug!("alignment: shifting by {} ms", shift_ms);
        let mut result_track = shifted.clone();
        result_track.events = shifted
            .events
            .iter()
            .filter_map(|e| e.shifted(shift_ms))
            .collect();

        if self.config.enable_pre_anchor_trim {
            if let Some(reference_start) = reference.first_start_ms() {
                let cutoff = reference_start.saturating_sub(PRE_ANCHOR_EPSILON_MS);
                let before = result_track.events.len();
                result_track.events.retain(|e| e.end_ms >= cutoff);
                let dropped = before - result_track.events.len();
                if dropped > 0 {
                    info!("pre-anchor trim dropped {} events", dropped);
                }
            }
        }
        result_track.normalize();

        debug!("alignment: validating");
        let trial = merge_bilingual_srt(
            reference,
            &result_track,
            &MergeOptions {
                time_threshold_ms: self.config.time_threshold_ms,
            },
        );
        let ratio = boundary_preservation_ratio(reference, &trial, VALIDATION_TOLERANCE_MS);
        if ratio < VALIDATION_MIN_RATIO {
            return Err(AlignmentFailure::ValidationFailed {
                preserved_ratio: ratio * 100.0,
            });
        }

        debug!("alignment: done (preserved {:.0}%)", ratio * 100.0);
        Ok(AlignmentResult {
            anchor,
            shifted: result_track,
            shift_ms,
            reference_preserved: true,
        })
    }

    fn adopt_anchor(
        &self,
        finder: &AnchorFinder,
        candidates: &[Anchor],
    ) -> Result<Anchor, AlignmentFailure> {
        if candidates.is_empty() {
            return Err(AlignmentFailure::NoAnchorCandidates);
        }
        let best = &candidates[0];
        let required = match best.method {
            AnchorMethod::Semantic => self.config.semantic_min_confidence,
            _ => self.config.min_confidence,
        };

        let auto_ok =
            self.config.strategy != SyncStrategy::Manual && best.confidence >= required;
        if auto_ok {
            return Ok(best.clone());
        }

        let Some(selector) = &self.selector else {
            return Err(AlignmentFailure::ConfidenceTooLow {
                best: best.confidence,
                required,
            });
        };

        let presented = finder.manual_candidates(candidates);
        match selector(&presented) {
            SelectorChoice::Choose(idx) => presented
                .get(idx)
                .cloned()
                .ok_or(AlignmentFailure::ManualRequired),
            SelectorChoice::Reject => Err(AlignmentFailure::ManualRequired),
            SelectorChoice::Cancel => Err(AlignmentFailure::SelectionCancelled),
        }
    }
}

/// Fraction of reference events whose start and end boundaries are both
/// reproduced (independently) within `tolerance_ms` in the merged output.
pub fn boundary_preservation_ratio(reference: &Track, merged: &Track, tolerance_ms: u32) -> f32 {
    if reference.is_empty() {
        return 1.0;
    }
    let preserved = reference
        .events
        .iter()
        .filter(|e| {
            let start_ok = merged
                .events
                .iter()
                .any(|o| o.start_ms.abs_diff(e.start_ms) <= tolerance_ms);
            let end_ok = merged
                .events
                .iter()
                .any(|o| o.end_ms.abs_diff(e.end_ms) <= tolerance_ms);
            start_ok && end_ok
        })
        .count();
    preserved as f32 / reference.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{CodecHint, Event};

    fn track(events: &[(u32, u32, &str)]) -> Track {
        let mut t = Track::new(CodecHint::Srt);
        for (idx, (start, end, text)) in events.iter().enumerate() {
            t.events.push(Event::new(idx + 1, *start, *end, *text));
        }
        t
    }

    fn anchor(i: usize, j: usize, confidence: f32, offset_ms: i64) -> Anchor {
        Anchor {
            i,
            j,
            confidence,
            offset_ms,
            method: AnchorMethod::Scan,
        }
    }

    #[tokio::test]
    async fn test_uniform_offset_alignment() {
        let a = track(&[(1000, 3000, "Hello")]);
        let b = track(&[(3500, 5500, "你好")]);
        let aligner = Aligner::new(AlignerConfig {
            strategy: SyncStrategy::FirstLine,
            min_confidence: 0.4,
            ..Default::default()
        });
        let result = aligner
            .align(&a, &b, &AnchorFinder::default(), None, None, None)
            .await
            .unwrap();
        assert_eq!(result.shift_ms, -2500);
        assert_eq!(result.shifted.events[0].start_ms, 1000);
        assert_eq!(result.shifted.events[0].end_ms, 3000);
        assert!(result.reference_preserved);
    }

    #[tokio::test]
    async fn test_reference_never_mutated() {
        let a = track(&[(1000, 3000, "Hello"), (5000, 7000, "Again")]);
        let b = track(&[(1400, 3400, "你好"), (5400, 7400, "再次")]);
        let a_before = a.clone();
        let aligner = Aligner::new(AlignerConfig {
            min_confidence: 0.2,
            ..Default::default()
        });
        let _ = aligner
            .align(&a, &b, &AnchorFinder::default(), None, None, None)
            .await
            .unwrap();
        assert_eq!(a.events, a_before.events);
    }

    #[test]
    fn test_no_candidates_rejected() {
        let a = track(&[(0, 1000, "x")]);
        let b = track(&[(0, 1000, "y")]);
        let aligner = Aligner::new(AlignerConfig::default());
        let err = aligner
            .align_with_candidates(&a, &b, &AnchorFinder::default(), &[])
            .unwrap_err();
        assert_eq!(err, AlignmentFailure::NoAnchorCandidates);
    }

    #[test]
    fn test_low_confidence_without_selector() {
        let a = track(&[(0, 1000, "x")]);
        let b = track(&[(0, 1000, "y")]);
        let aligner = Aligner::new(AlignerConfig::default());
        let err = aligner
            .align_with_candidates(
                &a,
                &b,
                &AnchorFinder::default(),
                &[anchor(1, 1, 0.4, 0)],
            )
            .unwrap_err();
        assert!(matches!(err, AlignmentFailure::ConfidenceTooLow { .. }));
    }

    #[test]
    fn test_large_offset_guardrail() {
        let a = track(&[(60000, 62000, "late start")]);
        let b = track(&[(1000, 3000, "late start")]);
        let aligner = Aligner::new(AlignerConfig::default());
        let err = aligner
            .align_with_candidates(
                &a,
                &b,
                &AnchorFinder::default(),
                &[anchor(1, 1, 0.95, 59000)],
            )
            .unwrap_err();
        assert_eq!(
            err,
            AlignmentFailure::LargeOffsetRequiresConfirmation { offset_ms: 59000 }
        );
    }

    #[test]
    fn test_large_offset_allowed_when_configured() {
        let a = track(&[(60000, 62000, "late start")]);
        let b = track(&[(1000, 3000, "late start")]);
        let aligner = Aligner::new(AlignerConfig {
            allow_large_offset: true,
            ..Default::default()
        });
        let result = aligner
            .align_with_candidates(
                &a,
                &b,
                &AnchorFinder::default(),
                &[anchor(1, 1, 0.95, 59000)],
            )
            .unwrap();
        assert_eq!(result.shifted.events[0].start_ms, 60000);
    }

    #[test]
    fn test_pre_anchor_trim_drops_early_events() {
        let a = track(&[(10000, 12000, "ref starts here")]);
        let b = track(&[
            (2000, 3000, "stale recap"),
            (5000, 6000, "more recap"),
            (10000, 12000, "ref starts here"),
        ]);
        let aligner = Aligner::new(AlignerConfig {
            enable_pre_anchor_trim: true,
            ..Default::default()
        });
        let result = aligner
            .align_with_candidates(
                &a,
                &b,
                &AnchorFinder::default(),
                &[anchor(1, 3, 0.95, 0)],
            )
            .unwrap();
        assert_eq!(result.shifted.events.len(), 1);
        assert_eq!(result.shifted.events[0].text, "ref starts here");
    }

    #[test]
    fn test_manual_strategy_uses_selector() {
        let a = track(&[(1000, 3000, "Hello")]);
        let b = track(&[(1000, 3000, "你好")]);
        let aligner = Aligner::new(AlignerConfig {
            strategy: SyncStrategy::Manual,
            ..Default::default()
        })
        .with_selector(Box::new(|candidates| {
            assert!(!candidates.is_empty());
            SelectorChoice::Choose(0)
        }));
        let result = aligner
            .align_with_candidates(
                &a,
                &b,
                &AnchorFinder::default(),
                &[anchor(1, 1, 0.95, 0)],
            )
            .unwrap();
        assert_eq!(result.anchor.i, 1);
    }

    #[test]
    fn test_selector_cancel_is_terminal() {
        let a = track(&[(1000, 3000, "Hello")]);
        let b = track(&[(1000, 3000, "你好")]);
        let aligner = Aligner::new(AlignerConfig {
            strategy: SyncStrategy::Manual,
            ..Default::default()
        })
        .with_selector(Box::new(|_| SelectorChoice::Cancel));
        let err = aligner
            .align_with_candidates(
                &a,
                &b,
                &AnchorFinder::default(),
                &[anchor(1, 1, 0.95, 0)],
            )
            .unwrap_err();
        assert_eq!(err, AlignmentFailure::SelectionCancelled);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_semantic_anchor_uses_relaxed_floor() {
        let a = track(&[(11730, 14000, "This compass does not point north")]);
        let b = track(&[(68497, 71000, "在這個羅盤上")]);
        let aligner = Aligner::new(AlignerConfig {
            allow_large_offset: true,
            enable_pre_anchor_trim: true,
            ..Default::default()
        });
        let semantic = Anchor {
            i: 1,
            j: 1,
            confidence: 0.3,
            offset_ms: 11730 - 68497,
            method: AnchorMethod::Semantic,
        };
        let result = aligner
            .align_with_candidates(&a, &b, &AnchorFinder::default(), &[semantic])
            .unwrap();
        assert_eq!(result.shift_ms, -56767);
        assert_eq!(result.shifted.events[0].start_ms, 11730);
    }

    #[tokio::test]
    async fn test_shift_idempotence() {
        let a = track(&[
            (1000, 3000, "line one here"),
            (4000, 6000, "line two here"),
            (8000, 9500, "line three here"),
        ]);
        let b = track(&[
            (3500, 5500, "line one here"),
            (6500, 8500, "line two here"),
            (10500, 12000, "line three here"),
        ]);
        let aligner = Aligner::new(AlignerConfig {
            min_confidence: 0.5,
            ..Default::default()
        });
        let finder = AnchorFinder::default();
        let first = aligner
            .align(&a, &b, &finder, None, None, None)
            .await
            .unwrap();
        assert_eq!(first.shift_ms, -2500);
        let second = aligner
            .align(&a, &first.shifted, &finder, None, None, None)
            .await
            .unwrap();
        assert!(second.shift_ms.abs() <= 1);
    }
}
