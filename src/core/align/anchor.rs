//! Anchor candidate generation between two subtitle tracks.
//!
//! Produces `(i, j)` index pairs with a confidence score and the implied
//! global time offset, using event times, textual similarity, and (when a
//! translator is available) machine translation of the shifted track's
//! opening lines.

use crate::core::align::SyncStrategy;
use crate::core::align::similarity::similarity;
use crate::core::language::LanguageTag;
use crate::core::model::{Anchor, AnchorMethod, Track};
use crate::services::translator::Translator;
use log::debug;

/// First-line anchors are discarded beyond this offset.
const FIRST_LINE_MAX_OFFSET_MS: i64 = 2000;

/// Offset estimates beyond this require the wide (semantic) scan.
const LARGE_OFFSET_MS: i64 = 5000;

/// Tuning knobs for anchor candidate generation.
#[derive(Debug, Clone)]
pub struct AnchorConfig {
    /// Events considered per track in the normal scan (K).
    pub scan_window: usize,
    /// Events considered per track in large-offset mode.
    pub semantic_window: usize,
    /// Maximum texts sent to the translator per alignment.
    pub max_translation_texts: usize,
    /// Candidates presented to a manual selector.
    pub max_manual_candidates: usize,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            scan_window: 10,
            semantic_window: 40,
            max_translation_texts: 10,
            max_manual_candidates: 5,
        }
    }
}

/// Finds candidate anchor points between a reference track and the track
/// that will be shifted.
#[derive(Debug, Default)]
pub struct AnchorFinder {
    config: AnchorConfig,
}

impl AnchorFinder {
    /// Create a finder with the given configuration.
    pub fn new(config: AnchorConfig) -> Self {
        Self { config }
    }

    /// Run the configured strategy (or the auto ladder) and return
    /// candidates sorted by confidence descending. An empty list signals
    /// failure.
    pub async fn find(
        &self,
        reference: &Track,
        shifted: &Track,
        strategy: SyncStrategy,
        translator: Option<&dyn Translator>,
        reference_lang: Option<LanguageTag>,
        shifted_lang: Option<LanguageTag>,
    ) -> crate::Result<Vec<Anchor>> {
        if reference.is_empty() || shifted.is_empty() {
            return Ok(Vec::new());
        }

        let mut candidates = match strategy {
            SyncStrategy::FirstLine => self.first_line(reference, shifted).into_iter().collect(),
            SyncStrategy::Scan => self.scan(reference, shifted, self.config.scan_window),
            SyncStrategy::Translation => {
                self.translation_scan(reference, shifted, translator, reference_lang, shifted_lang)
                    .await?
            }
            SyncStrategy::Auto | SyncStrategy::Manual => {
                let mut all: Vec<Anchor> = Vec::new();
                // In the auto ladder a first-line anchor is only trusted
                // for near-identical clocks; forcing the strategy skips
                // this filter.
                all.extend(
                    self.first_line(reference, shifted)
                        .filter(|a| a.offset_ms.abs() <= FIRST_LINE_MAX_OFFSET_MS),
                );
                all.extend(self.scan(reference, shifted, self.config.scan_window));
                if translator.is_some() {
                    all.extend(
                        self.translation_scan(
                            reference,
                            shifted,
                            translator,
                            reference_lang,
                            shifted_lang,
                        )
                        .await?,
                    );
                }
                // Large-offset mode: when the preliminary estimate exceeds
                // the guardrail (or nothing matched at all), the wide scan
                // replaces the narrow one, whose window it subsumes.
                let estimate = preliminary_offset_estimate(&all, reference, shifted);
                if estimate.abs() > LARGE_OFFSET_MS || all.is_empty() {
                    all.retain(|c| c.method != AnchorMethod::Scan);
                    all.extend(self.semantic(reference, shifted));
                }
                all
            }
        };

        dedupe_pairs(&mut candidates);
        candidates.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap());
        debug!(
            "anchor finder produced {} candidates (strategy {})",
            candidates.len(),
            strategy
        );
        Ok(candidates)
    }

    /// Strategy 1: pair the first events of both tracks.
    ///
    /// Confidence is 0.9 when the clocks nearly agree and the texts match,
    /// 0.5 otherwise. The auto ladder additionally discards first-line
    /// anchors whose offset exceeds 2 s.
    pub fn first_line(&self, reference: &Track, shifted: &Track) -> Option<Anchor> {
        let a = reference.events.first()?;
        let b = shifted.events.first()?;
        let offset_ms = i64::from(a.start_ms) - i64::from(b.start_ms);
        let sim = similarity(&a.text, &b.text);
        let confidence = if offset_ms.abs() <= FIRST_LINE_MAX_OFFSET_MS && sim >= 0.5 {
            0.9
        } else {
            0.5
        };
        Some(Anchor {
            i: 1,
            j: 1,
            confidence,
            offset_ms,
            method: AnchorMethod::FirstLine,
        })
    }

    /// Strategy 2: similarity scan over the first `window` events of each
    /// track.
    pub fn scan(&self, reference: &Track, shifted: &Track, window: usize) -> Vec<Anchor> {
        let shifted_texts: Vec<(usize, u32, String)> = shifted
            .events
            .iter()
            .take(window)
            .map(|e| (e.index, e.start_ms, e.text.clone()))
            .collect();
        let method = if window > self.config.scan_window {
            AnchorMethod::Semantic
        } else {
            AnchorMethod::Scan
        };
        self.scan_against(reference, &shifted_texts, window, method, false)
    }

    /// Strategy 3: translate the shifted track's openers into the
    /// reference language, then rerun the scan on translated text.
    pub async fn translation_scan(
        &self,
        reference: &Track,
        shifted: &Track,
        translator: Option<&dyn Translator>,
        reference_lang: Option<LanguageTag>,
        shifted_lang: Option<LanguageTag>,
    ) -> crate::Result<Vec<Anchor>> {
        let Some(translator) = translator else {
            return Ok(Vec::new());
        };
        let (Some(source), Some(target)) = (shifted_lang, reference_lang) else {
            return Ok(Vec::new());
        };
        if source.same_language(&target) {
            // Same language on both sides: the plain scan already compares
            // the raw texts.
            return Ok(Vec::new());
        }

        let take = self
            .config
            .scan_window
            .min(self.config.max_translation_texts);
        let originals: Vec<&crate::core::model::Event> =
            shifted.events.iter().take(take).collect();
        let texts: Vec<String> = originals.iter().map(|e| e.text.clone()).collect();
        let translated = translator.translate(&texts, source, target).await?;

        let shifted_texts: Vec<(usize, u32, String)> = originals
            .iter()
            .zip(translated)
            .map(|(e, text)| (e.index, e.start_ms, text))
            .collect();
        Ok(self.scan_against(
            reference,
            &shifted_texts,
            self.config.scan_window,
            AnchorMethod::Translation,
            true,
        ))
    }

    /// Strategy 4: wide scan for offsets beyond the 5 s guardrail.
    pub fn semantic(&self, reference: &Track, shifted: &Track) -> Vec<Anchor> {
        self.scan(reference, shifted, self.config.semantic_window)
    }

    /// Trim a candidate list for presentation to a manual selector.
    pub fn manual_candidates(&self, candidates: &[Anchor]) -> Vec<Anchor> {
        candidates
            .iter()
            .take(self.config.max_manual_candidates)
            .cloned()
            .collect()
    }

    /// Score reference events against prepared shifted-side texts.
    ///
    /// `composite = 0.6 * sim + 0.4 * (1 - min(|offset - median|, 10 s) / 10 s)`
    /// where the median offset comes from the top-K pairs by similarity.
    fn scan_against(
        &self,
        reference: &Track,
        shifted_texts: &[(usize, u32, String)],
        window: usize,
        method: AnchorMethod,
        translation_used: bool,
    ) -> Vec<Anchor> {
        struct Pair {
            i: usize,
            j: usize,
            offset_ms: i64,
            sim: f32,
        }

        let mut pairs = Vec::new();
        for a in reference.events.iter().take(window) {
            for (j, b_start, b_text) in shifted_texts {
                let sim = similarity(&a.text, b_text);
                pairs.push(Pair {
                    i: a.index,
                    j: *j,
                    offset_ms: i64::from(a.start_ms) - i64::from(*b_start),
                    sim,
                });
            }
        }
        if pairs.is_empty() {
            return Vec::new();
        }

        // Median offset among the top-K pairs by similarity.
        let mut by_sim: Vec<&Pair> = pairs.iter().collect();
        by_sim.sort_by(|a, b| b.sim.partial_cmp(&a.sim).unwrap());
        let mut top_offsets: Vec<i64> = by_sim.iter().take(window).map(|p| p.offset_ms).collect();
        top_offsets.sort_unstable();
        let median_offset = top_offsets[top_offsets.len() / 2];

        let mut scored: Vec<(f32, &Pair)> = pairs
            .iter()
            .map(|p| {
                let drift_s = ((p.offset_ms - median_offset).abs() as f32 / 1000.0).min(10.0);
                let composite = 0.6 * p.sim + 0.4 * (1.0 - drift_s / 10.0);
                (composite, p)
            })
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());

        scored
            .into_iter()
            .take(5)
            .map(|(_, p)| Anchor {
                i: p.i,
                j: p.j,
                confidence: rescale_confidence(p.sim, p.offset_ms, median_offset, translation_used),
                offset_ms: p.offset_ms,
                method,
            })
            .collect()
    }
}

/// Confidence in `[0, 1]`:
/// `0.5·sim + 0.3·(1 − |offset − median|/10 s clamped) + 0.2·(translated ? 1 : 0.7)`.
fn rescale_confidence(sim: f32, offset_ms: i64, median_ms: i64, translation_used: bool) -> f32 {
    let drift = (((offset_ms - median_ms).abs() as f32) / 10_000.0).clamp(0.0, 1.0);
    let translation_term = if translation_used { 1.0 } else { 0.7 };
    (0.5 * sim + 0.3 * (1.0 - drift) + 0.2 * translation_term).clamp(0.0, 1.0)
}

/// Best offset guess before committing to a strategy: the median offset of
/// the candidates found so far, or the raw first-event delta when nothing
/// matched yet.
fn preliminary_offset_estimate(candidates: &[Anchor], reference: &Track, shifted: &Track) -> i64 {
    if candidates.is_empty() {
        let a = reference.first_start_ms().unwrap_or(0);
        let b = shifted.first_start_ms().unwrap_or(0);
        return i64::from(a) - i64::from(b);
    }
    let mut offsets: Vec<i64> = candidates.iter().map(|c| c.offset_ms).collect();
    offsets.sort_unstable();
    offsets[offsets.len() / 2]
}

/// Keep only the best-confidence candidate per `(i, j)` pair.
fn dedupe_pairs(candidates: &mut Vec<Anchor>) {
    candidates.sort_by(|a, b| {
        (a.i, a.j)
            .cmp(&(b.i, b.j))
            .then(b.confidence.partial_cmp(&a.confidence).unwrap())
    });
    candidates.dedup_by_key(|c| (c.i, c.j));
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

    #[test]
    fn test_first_line_zero_offset_same_text() {
        let finder = AnchorFinder::default();
        let a = track(&[(1000, 3000, "Hello")]);
        let b = track(&[(1000, 3000, "Hello")]);
        let anchor = finder.first_line(&a, &b).unwrap();
        assert_eq!(anchor.offset_ms, 0);
        assert_eq!(anchor.confidence, 0.9);
        assert_eq!(anchor.method, AnchorMethod::FirstLine);
    }

    #[test]
    fn test_first_line_cross_language_low_confidence() {
        let finder = AnchorFinder::default();
        let a = track(&[(1000, 3000, "Hello")]);
        let b = track(&[(1500, 3500, "你好")]);
        let anchor = finder.first_line(&a, &b).unwrap();
        assert_eq!(anchor.offset_ms, -500);
        assert_eq!(anchor.confidence, 0.5);
    }

    #[test]
    fn test_first_line_beyond_two_seconds_keeps_low_confidence() {
        let finder = AnchorFinder::default();
        let a = track(&[(1000, 3000, "Hello")]);
        let b = track(&[(4000, 6000, "Hello")]);
        // A forced first-line strategy still anchors (1, 1)...
        let anchor = finder.first_line(&a, &b).unwrap();
        assert_eq!(anchor.offset_ms, -3000);
        assert_eq!(anchor.confidence, 0.5);
    }

    #[tokio::test]
    async fn test_auto_ladder_drops_distant_first_line_anchor() {
        let finder = AnchorFinder::default();
        let a = track(&[(1000, 3000, "Hello")]);
        let b = track(&[(4000, 6000, "Hello")]);
        // ...but the auto ladder does not trust it.
        let candidates = finder
            .find(&a, &b, SyncStrategy::Auto, None, None, None)
            .await
            .unwrap();
        assert!(
            candidates
                .iter()
                .all(|c| c.method != AnchorMethod::FirstLine)
        );
    }

    #[test]
    fn test_scan_finds_matching_pair_with_offset() {
        let finder = AnchorFinder::default();
        let a = track(&[
            (1000, 3000, "This compass does not point north"),
            (4000, 6000, "Where does it point then"),
            (8000, 9000, "To the thing you want most"),
        ]);
        // Same text, uniformly 2.5 s later
        let b = track(&[
            (3500, 5500, "This compass does not point north"),
            (6500, 8500, "Where does it point then"),
            (10500, 11500, "To the thing you want most"),
        ]);
        let candidates = finder.scan(&a, &b, 10);
        assert!(!candidates.is_empty());
        let best = &candidates[0];
        assert_eq!(best.offset_ms, -2500);
        assert_eq!(best.i, best.j);
        assert!(best.confidence > 0.7);
    }

    #[test]
    fn test_scan_empty_tracks() {
        let finder = AnchorFinder::default();
        let empty = Track::new(CodecHint::Srt);
        let b = track(&[(0, 1000, "x")]);
        assert!(finder.scan(&empty, &b, 10).is_empty());
    }

    #[tokio::test]
    async fn test_auto_includes_semantic_for_large_offsets() {
        let finder = AnchorFinder::default();
        // Reference starts at 11.7 s; shifted copy starts at 68.5 s: the
        // first-line strategy is discarded and the estimate exceeds 5 s.
        let a = track(&[
            (11730, 14000, "This compass does not point north"),
            (15000, 17000, "Where does it point"),
        ]);
        let b = track(&[
            (68497, 71000, "This compass does not point north"),
            (71700, 73000, "Where does it point"),
        ]);
        let candidates = finder
            .find(&a, &b, SyncStrategy::Auto, None, None, None)
            .await
            .unwrap();
        assert!(!candidates.is_empty());
        assert!(candidates.iter().any(|c| c.method == AnchorMethod::Semantic));
        let best = &candidates[0];
        assert_eq!(best.offset_ms, 11730 - 68497);
    }

    #[tokio::test]
    async fn test_forced_first_line_strategy_only() {
        let finder = AnchorFinder::default();
        let a = track(&[(1000, 3000, "Hello")]);
        let b = track(&[(1000, 3000, "你好")]);
        let candidates = finder
            .find(&a, &b, SyncStrategy::FirstLine, None, None, None)
            .await
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].method, AnchorMethod::FirstLine);
    }

    #[test]
    fn test_manual_candidates_capped_at_five() {
        let finder = AnchorFinder::default();
        let many: Vec<Anchor> = (0..8)
            .map(|k| Anchor {
                i: k + 1,
                j: k + 1,
                confidence: 0.5,
                offset_ms: 0,
                method: AnchorMethod::Scan,
            })
            .collect();
        assert_eq!(finder.manual_candidates(&many).len(), 5);
    }
}
