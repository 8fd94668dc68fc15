//! Text similarity measures used for anchor scoring.
//!
//! `similarity` is the maximum of three measures over punctuation- and
//! whitespace-normalized text: character trigram Jaccard, normalized
//! Levenshtein, and cosine over token-frequency vectors. Taking the max
//! keeps the score robust across scripts: trigrams work well for long
//! Latin lines, per-character tokens carry CJK, and Levenshtein catches
//! near-identical short lines.

use std::collections::HashMap;

/// Lowercase and strip punctuation/whitespace-adjacent noise.
///
/// Whitespace runs collapse to a single space so token boundaries survive
/// for the cosine measure; the n-gram and Levenshtein measures ignore
/// spaces on their own.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = true;
    for c in text.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            last_was_space = false;
        } else if c.is_whitespace() && !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
        // Punctuation and symbols are dropped entirely.
    }
    out.trim_end().to_string()
}

/// Jaccard index over character n-grams (n = 3).
///
/// Strings shorter than `n` fall back to single-character grams.
pub fn trigram_jaccard(a: &str, b: &str) -> f32 {
    let grams_a = char_ngrams(a, 3);
    let grams_b = char_ngrams(b, 3);
    if grams_a.is_empty() && grams_b.is_empty() {
        return 0.0;
    }
    let intersection: usize = grams_a
        .iter()
        .map(|(gram, count_a)| grams_b.get(gram).map_or(0, |count_b| (*count_a).min(*count_b)))
        .sum();
    let total_a: usize = grams_a.values().sum();
    let total_b: usize = grams_b.values().sum();
    let union = total_a + total_b - intersection;
    if union == 0 {
        0.0
    } else {
        intersection as f32 / union as f32
    }
}

/// Levenshtein distance normalized to `[0, 1]` where 1 means identical.
pub fn normalized_levenshtein(a: &str, b: &str) -> f32 {
    let chars_a: Vec<char> = a.chars().collect();
    let chars_b: Vec<char> = b.chars().collect();
    let max_len = chars_a.len().max(chars_b.len());
    if max_len == 0 {
        return 0.0;
    }
    let distance = levenshtein(&chars_a, &chars_b);
    1.0 - distance as f32 / max_len as f32
}

/// Cosine similarity over token-frequency vectors.
///
/// Latin words tokenize on whitespace; CJK characters each count as one
/// token, so Chinese lines compare meaningfully without a segmenter.
pub fn token_cosine(a: &str, b: &str) -> f32 {
    let freq_a = token_frequencies(a);
    let freq_b = token_frequencies(b);
    if freq_a.is_empty() || freq_b.is_empty() {
        return 0.0;
    }
    let dot: f32 = freq_a
        .iter()
        .map(|(token, count_a)| {
            freq_b
                .get(token)
                .map_or(0.0, |count_b| (*count_a as f32) * (*count_b as f32))
        })
        .sum();
    let norm_a: f32 = freq_a.values().map(|c| (*c as f32).powi(2)).sum::<f32>().sqrt();
    let norm_b: f32 = freq_b.values().map(|c| (*c as f32).powi(2)).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Combined similarity in `[0, 1]`: the maximum of the three measures over
/// normalized text.
pub fn similarity(a: &str, b: &str) -> f32 {
    let norm_a = normalize(a);
    let norm_b = normalize(b);
    if norm_a.is_empty() || norm_b.is_empty() {
        return 0.0;
    }
    trigram_jaccard(&norm_a, &norm_b)
        .max(normalized_levenshtein(&norm_a, &norm_b))
        .max(token_cosine(&norm_a, &norm_b))
        .clamp(0.0, 1.0)
}

fn char_ngrams(text: &str, n: usize) -> HashMap<String, usize> {
    let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    let mut grams = HashMap::new();
    if chars.is_empty() {
        return grams;
    }
    if chars.len() < n {
        for c in &chars {
            *grams.entry(c.to_string()).or_insert(0) += 1;
        }
        return grams;
    }
    for window in chars.windows(n) {
        *grams.entry(window.iter().collect::<String>()).or_insert(0) += 1;
    }
    grams
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

fn token_frequencies(text: &str) -> HashMap<String, usize> {
    let mut freq = HashMap::new();
    for word in text.split_whitespace() {
        let mut latin_run = String::new();
        for c in word.chars() {
            if is_cjk(c) {
                if !latin_run.is_empty() {
                    *freq.entry(std::mem::take(&mut latin_run)).or_insert(0) += 1;
                }
                *freq.entry(c.to_string()).or_insert(0) += 1;
            } else {
                latin_run.push(c);
            }
        }
        if !latin_run.is_empty() {
            *freq.entry(latin_run).or_insert(0) += 1;
        }
    }
    freq
}

fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x3040..=0x30FF | 0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xAC00..=0xD7AF)
}
