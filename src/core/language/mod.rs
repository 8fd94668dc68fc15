//! Language classification from subtitle text samples.
//!
//! Scores a block of text for membership in the languages the merger cares
//! about (simplified/traditional Chinese, English, Japanese, Korean) using
//! Unicode-block ratios, a curated character table to split the two Chinese
//! scripts, and filename token hints.
//!
//! The output is advisory: the track scorer and anchor finder stay robust
//! when classification is wrong.
//!
//! # Examples
//!
//! ```rust
//! use bisub_cli::core::language::{LanguageClassifier, LanguageTag};
//!
//! let classifier = LanguageClassifier::new();
//! let ranked = classifier.classify("你好，世界。这是一个测试。", None);
//! assert_eq!(ranked[0].tag, LanguageTag::ZhHans);
//! ```

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Languages the engine distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageTag {
    /// Simplified Chinese
    ZhHans,
    /// Traditional Chinese
    ZhHant,
    /// English
    En,
    /// Japanese
    Ja,
    /// Korean
    Ko,
}

impl LanguageTag {
    /// BCP-47-like tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageTag::ZhHans => "zh-Hans",
            LanguageTag::ZhHant => "zh-Hant",
            LanguageTag::En => "en",
            LanguageTag::Ja => "ja",
            LanguageTag::Ko => "ko",
        }
    }

    /// Two-letter primary subtag used in output file naming.
    pub fn short_code(&self) -> &'static str {
        match self {
            LanguageTag::ZhHans | LanguageTag::ZhHant => "zh",
            LanguageTag::En => "en",
            LanguageTag::Ja => "ja",
            LanguageTag::Ko => "ko",
        }
    }

    /// Whether two tags denote the same language ignoring script.
    pub fn same_language(&self, other: &LanguageTag) -> bool {
        self.short_code() == other.short_code()
    }

    /// Parse container-style tags ("chi", "zho", "eng", "zh-TW", ...).
    pub fn from_container_tag(tag: &str) -> Option<Self> {
        let lower = tag.to_lowercase();
        match lower.as_str() {
            "zh" | "chi" | "zho" | "chs" | "zh-cn" | "zh-hans" => Some(LanguageTag::ZhHans),
            "cht" | "zh-tw" | "zh-hk" | "zh-hant" => Some(LanguageTag::ZhHant),
            "en" | "eng" => Some(LanguageTag::En),
            "ja" | "jpn" => Some(LanguageTag::Ja),
            "ko" | "kor" => Some(LanguageTag::Ko),
            _ => None,
        }
    }
}

impl std::fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A ranked classification result.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageScore {
    /// The language.
    pub tag: LanguageTag,
    /// Score in `[0, 1]`.
    pub score: f32,
}

// Characters whose simplified form differs from the traditional one.
// Hit rates over these two tables decide the zh-Hans/zh-Hant split.
static SIMPLIFIED_ONLY: Lazy<HashSet<char>> = Lazy::new(|| {
    "国东车长门问们这来会发见话说边让还没钱样为乐业爱买马鸟风书对时点过现实开关间听写读学习师语请谢谁带帮电脑视红给妈动员队义产党历岁万与专丝两严个临单卖难观觉计认讲记论识诉词译试该"
        .chars()
        .collect()
});

static TRADITIONAL_ONLY: Lazy<HashSet<char>> = Lazy::new(|| {
    "國東車長門問們這來會發見話說邊讓還沒錢樣為樂業愛買馬鳥風書對時點過現實開關間聽寫讀學習師語請謝誰帶幫電腦視紅給媽動員隊義產黨歷歲萬與專絲兩嚴個臨單賣難觀覺計認講記論識訴詞譯試該"
        .chars()
        .collect()
});

/// Filename tokens that hint at a language.
const FILENAME_HINTS: &[(&str, LanguageTag)] = &[
    (".chs", LanguageTag::ZhHans),
    (".cht", LanguageTag::ZhHant),
    (".chi", LanguageTag::ZhHans),
    (".zh", LanguageTag::ZhHans),
    (".eng", LanguageTag::En),
    (".en", LanguageTag::En),
    (".jpn", LanguageTag::Ja),
    (".ja", LanguageTag::Ja),
    (".kor", LanguageTag::Ko),
    (".ko", LanguageTag::Ko),
];

/// Boost applied when the filename carries a matching token.
const FILENAME_BOOST: f32 = 0.2;

/// Per-block character counts over a text sample.
#[derive(Debug, Default)]
struct BlockCounts {
    cjk: usize,
    hiragana: usize,
    katakana: usize,
    hangul: usize,
    latin: usize,
    total: usize,
}

impl BlockCounts {
    fn ratio(&self, count: usize) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            count as f32 / self.total as f32
        }
    }

    fn kana_ratio(&self) -> f32 {
        self.ratio(self.hiragana + self.katakana)
    }
}

/// Classifier for subtitle text samples.
#[derive(Debug, Default)]
pub struct LanguageClassifier;

impl LanguageClassifier {
    /// Create a classifier.
    pub fn new() -> Self {
        Self
    }

    /// Rank languages for `sample`, optionally boosted by `filename` tokens.
    ///
    /// The returned list is sorted by score descending and always contains
    /// every known language (scores may be zero).
    pub fn classify(&self, sample: &str, filename: Option<&str>) -> Vec<LanguageScore> {
        let counts = count_blocks(sample);

        let cjk = counts.ratio(counts.cjk);
        let kana = counts.kana_ratio();
        let hangul = counts.ratio(counts.hangul);
        let latin = counts.ratio(counts.latin);

        // Ratio rules; unsatisfied languages keep a small residual score so
        // ranking stays meaningful on borderline samples.
        let ja_score = if kana > 0.02 {
            0.6 + 0.4 * (kana * 5.0).min(1.0)
        } else {
            kana * 10.0
        };
        let ko_score = if hangul > 0.05 {
            0.6 + 0.4 * (hangul * 4.0).min(1.0)
        } else {
            hangul * 5.0
        };
        let zh_score = if cjk > 0.15 && kana + hangul < 0.02 {
            0.6 + 0.4 * cjk.min(1.0)
        } else {
            (cjk * 0.5).min(0.4)
        };
        let en_score = if latin > 0.8 && cjk < 0.02 {
            0.6 + 0.4 * latin
        } else {
            (latin * 0.3).min(0.4)
        };

        let (hans_score, hant_score) = split_chinese_script(sample, zh_score);

        let mut scores = vec![
            LanguageScore {
                tag: LanguageTag::ZhHans,
                score: hans_score,
            },
            LanguageScore {
                tag: LanguageTag::ZhHant,
                score: hant_score,
            },
            LanguageScore {
                tag: LanguageTag::En,
                score: en_score,
            },
            LanguageScore {
                tag: LanguageTag::Ja,
                score: ja_score,
            },
            LanguageScore {
                tag: LanguageTag::Ko,
                score: ko_score,
            },
        ];

        if let Some(name) = filename {
            apply_filename_boost(&mut scores, name);
        }

        for entry in &mut scores {
            entry.score = entry.score.clamp(0.0, 1.0);
        }
        scores.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        scores
    }

    /// The single best language, or `None` when nothing scored above zero.
    pub fn top_language(&self, sample: &str, filename: Option<&str>) -> Option<LanguageTag> {
        self.classify(sample, filename)
            .into_iter()
            .find(|s| s.score > 0.0)
            .map(|s| s.tag)
    }
}

fn count_blocks(sample: &str) -> BlockCounts {
    let mut counts = BlockCounts::default();
    for c in sample.chars() {
        if !c.is_alphabetic() {
            continue;
        }
        counts.total += 1;
        match c as u32 {
            // CJK Unified Ideographs + Extension A
            0x4E00..=0x9FFF | 0x3400..=0x4DBF => counts.cjk += 1,
            0x3040..=0x309F => counts.hiragana += 1,
            0x30A0..=0x30FF => counts.katakana += 1,
            // Hangul syllables + jamo
            0xAC00..=0xD7AF | 0x1100..=0x11FF => counts.hangul += 1,
            // Latin basic + supplement letters
            0x0041..=0x007A | 0x00C0..=0x00FF => counts.latin += 1,
            _ => {}
        }
    }
    counts
}

/// Split a Chinese score into (simplified, traditional) by hit rate over
/// the curated distinct-character tables; ties go to simplified.
fn split_chinese_script(sample: &str, zh_score: f32) -> (f32, f32) {
    let mut simp_hits = 0usize;
    let mut trad_hits = 0usize;
    for c in sample.chars() {
        if SIMPLIFIED_ONLY.contains(&c) {
            simp_hits += 1;
        } else if TRADITIONAL_ONLY.contains(&c) {
            trad_hits += 1;
        }
    }
    if trad_hits > simp_hits {
        ((zh_score - 0.1).max(0.0), zh_score)
    } else {
        (zh_score, (zh_score - 0.1).max(0.0))
    }
}

fn apply_filename_boost(scores: &mut [LanguageScore], filename: &str) {
    let lower = filename.to_lowercase();
    for (token, tag) in FILENAME_HINTS {
        // Longer tokens first in the table, so ".chs" wins over ".ch"-like
        // prefixes; a token matches as ".tok." or at the extension boundary.
        let matched = lower.contains(&format!("{}.", token)) || lower.ends_with(token);
        if matched {
            if let Some(entry) = scores.iter_mut().find(|s| s.tag == *tag) {
                entry.score = (entry.score + FILENAME_BOOST).min(1.0);
            }
            break;
        }
    }
}
