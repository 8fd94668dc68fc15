//! End-to-end alignment and merge scenarios driven through the aligner,
//! anchor finder, and merger.

mod common;

use bisub_cli::core::align::aligner::boundary_preservation_ratio;
use bisub_cli::core::align::{Aligner, AlignerConfig, AnchorFinder, SyncStrategy};
use bisub_cli::core::language::LanguageTag;
use bisub_cli::core::merge::{MergeOptions, merge_bilingual_srt};
use common::{TableTranslator, track_from};

#[tokio::test]
async fn identical_clock_pair_merges_to_single_event() {
    let english = track_from(&[(1000, 3000, "Hello")]);
    let chinese = track_from(&[(1000, 3000, "你好")]);

    let aligner = Aligner::new(AlignerConfig {
        min_confidence: 0.4,
        ..Default::default()
    });
    let result = aligner
        .align(
            &english,
            &chinese,
            &AnchorFinder::default(),
            None,
            Some(LanguageTag::En),
            Some(LanguageTag::ZhHans),
        )
        .await
        .unwrap();
    assert_eq!(result.shift_ms, 0);

    let merged = merge_bilingual_srt(&result.shifted, &english, &MergeOptions::default());
    assert_eq!(merged.events.len(), 1);
    assert_eq!(merged.events[0].start_ms, 1000);
    assert_eq!(merged.events[0].end_ms, 3000);
    assert_eq!(merged.events[0].text, "你好\nHello");
}

#[tokio::test]
async fn uniform_offset_is_removed_by_first_line_strategy() {
    let english = track_from(&[(1000, 3000, "Hello")]);
    let chinese = track_from(&[(3500, 5500, "你好")]);

    let aligner = Aligner::new(AlignerConfig {
        min_confidence: 0.4,
        strategy: SyncStrategy::FirstLine,
        ..Default::default()
    });
    let result = aligner
        .align(
            &english,
            &chinese,
            &AnchorFinder::default(),
            None,
            Some(LanguageTag::En),
            Some(LanguageTag::ZhHans),
        )
        .await
        .unwrap();

    assert_eq!(result.shift_ms, -2500);
    assert_eq!(result.shifted.events[0].start_ms, 1000);
    assert_eq!(result.shifted.events[0].end_ms, 3000);
    assert!(result.reference_preserved);

    let merged = merge_bilingual_srt(&result.shifted, &english, &MergeOptions::default());
    assert_eq!(merged.events.len(), 1);
    assert_eq!(merged.events[0].text, "你好\nHello");
}

#[tokio::test]
async fn large_offset_with_translation_assisted_anchor() {
    // The reference track opens with non-dialogue lines; the compass line
    // is its fourth event. The shifted track carries a 56.767 s lead-in
    // with two stale recap lines before its matching third event.
    let reference = track_from(&[
        (5000, 6000, "Subtitles by the lantern crew"),
        (7000, 8000, "Episode One"),
        (9000, 10000, "(wind howling)"),
        (11730, 14000, "This compass does not point north"),
        (15000, 17000, "Where does it point then"),
    ]);
    let shifted = track_from(&[
        (58000, 59500, "前情提要"),
        (64000, 66000, "上一集"),
        (68497, 71000, "在這個羅盤上"),
        (71767, 73767, "那它指向哪裡"),
    ]);

    let translator = TableTranslator::new(&[
        ("前情提要", "Previously on"),
        ("上一集", "Last episode"),
        ("在這個羅盤上", "This compass does not point north"),
        ("那它指向哪裡", "Where does it point then"),
    ]);

    let aligner = Aligner::new(AlignerConfig {
        min_confidence: 0.3,
        allow_large_offset: true,
        enable_pre_anchor_trim: true,
        ..Default::default()
    });
    let result = aligner
        .align(
            &reference,
            &shifted,
            &AnchorFinder::default(),
            Some(&translator),
            Some(LanguageTag::En),
            Some(LanguageTag::ZhHant),
        )
        .await
        .unwrap();

    assert_eq!(result.anchor.i, 4);
    assert_eq!(result.anchor.j, 3);
    assert_eq!(result.shift_ms, 11730 - 68497);

    // The recap line ending before the reference opening is trimmed; the
    // matching line lands exactly on the reference clock.
    assert_eq!(result.shifted.events.len(), 3);
    assert!(result.shifted.events.iter().all(|e| e.end_ms >= 4900));
    assert!(result.shifted.events.iter().any(|e| e.start_ms == 11730));

    let merged = merge_bilingual_srt(&result.shifted, &reference, &MergeOptions::default());
    assert!(merged.events.iter().any(|e| e.start_ms == 11730));
    assert!(
        boundary_preservation_ratio(&reference, &merged, 100) >= 0.7,
        "reference timing must survive the merge"
    );
}

#[tokio::test]
async fn reference_preservation_holds_for_every_event() {
    let reference = track_from(&[
        (1000, 3000, "one"),
        (4000, 6000, "two"),
        (8000, 9500, "three"),
        (12000, 14000, "four"),
    ]);
    let shifted = track_from(&[
        (2500, 4500, "一"),
        (5500, 7500, "二"),
        (9500, 11000, "三"),
        (13500, 15500, "四"),
    ]);

    let aligner = Aligner::new(AlignerConfig {
        min_confidence: 0.3,
        ..Default::default()
    });
    let result = aligner
        .align(
            &reference,
            &shifted,
            &AnchorFinder::default(),
            None,
            Some(LanguageTag::En),
            Some(LanguageTag::ZhHans),
        )
        .await
        .unwrap();
    let merged = merge_bilingual_srt(&result.shifted, &reference, &MergeOptions::default());

    for event in &reference.events {
        assert!(
            merged
                .events
                .iter()
                .any(|o| o.start_ms.abs_diff(event.start_ms) <= 100),
            "no merged start near {}",
            event.start_ms
        );
        assert!(
            merged
                .events
                .iter()
                .any(|o| o.end_ms.abs_diff(event.end_ms) <= 100),
            "no merged end near {}",
            event.end_ms
        );
    }

    // The reference track itself is untouched.
    assert_eq!(reference.events[0].start_ms, 1000);
    assert_eq!(reference.events.len(), 4);
}

#[tokio::test]
async fn merged_output_has_no_flicker_and_positive_durations() {
    let reference = track_from(&[
        (1000, 2000, "same text"),
        (2050, 3000, "same text"),
        (5000, 7000, "other"),
    ]);
    let shifted = track_from(&[(1000, 3000, "同文"), (5000, 7000, "另")]);

    let merged = merge_bilingual_srt(&shifted, &reference, &MergeOptions::default());
    for window in merged.events.windows(2) {
        let gap = window[1].start_ms - window[0].end_ms;
        assert!(
            window[0].text != window[1].text || gap >= 100,
            "flicker between {:?} and {:?}",
            window[0],
            window[1]
        );
    }
    assert!(merged.events.iter().all(|e| e.end_ms > e.start_ms));
}
