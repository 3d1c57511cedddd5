//! Fuzzy fallback matching
//!
//! Used when the trie has no prefix match. Strategies run from cheapest to
//! most expensive and the first hit wins:
//!
//! 1. case-insensitive substring
//! 2. word-boundary prefix (words split on `_`, `-`, whitespace)
//! 3. loose subsequence, allowing a few skipped characters
//! 4. bounded Levenshtein distance against similarly sized words
//!
//! The thresholds are deliberately generous; they favor recall.

use crate::utils::tokenizer::{fold_case, match_words};
use serde::{Deserialize, Serialize};

/// Which strategy produced a fuzzy match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FuzzyStrategy {
    Substring,
    WordPrefix,
    Subsequence,
    EditDistance,
}

/// Tunable thresholds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzyConfig {
    /// Shorter queries only use substring matching
    pub min_query_len: usize,
    /// Subsequence matching allows `max(1, len(query) - skip_slack)` skipped characters
    pub skip_slack: usize,
    /// Edit distance threshold is `max(1, len(query) / distance_divisor)`
    pub distance_divisor: usize,
    /// Hard cap on the edit distance threshold
    pub max_distance_cap: usize,
    /// Only words whose length is within this window of the query are compared
    pub length_window: usize,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            min_query_len: 2,
            skip_slack: 2,
            distance_divisor: 4,
            max_distance_cap: 2,
            length_window: 2,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FuzzyMatcher {
    config: FuzzyConfig,
}

impl FuzzyMatcher {
    pub fn new(config: FuzzyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FuzzyConfig {
        &self.config
    }

    pub fn matches(&self, text: &str, query: &str) -> bool {
        self.match_strategy(text, query).is_some()
    }

    /// The first strategy that matches `query` against `text`
    pub fn match_strategy(&self, text: &str, query: &str) -> Option<FuzzyStrategy> {
        if query.is_empty() || text.is_empty() {
            return None;
        }

        let text = fold_case(text);
        let query = fold_case(query);

        if text.contains(&query) {
            return Some(FuzzyStrategy::Substring);
        }

        let query_chars: Vec<char> = query.chars().collect();
        if query_chars.len() < self.config.min_query_len {
            return None;
        }

        if word_prefix_match(&text, &query) {
            return Some(FuzzyStrategy::WordPrefix);
        }

        let text_chars: Vec<char> = text.chars().collect();
        let max_skips = query_chars.len().saturating_sub(self.config.skip_slack).max(1);
        if subsequence_within(&text_chars, &query_chars, max_skips) {
            return Some(FuzzyStrategy::Subsequence);
        }

        let threshold = (query_chars.len() / self.config.distance_divisor.max(1))
            .max(1)
            .min(self.config.max_distance_cap);
        for word in match_words(&text) {
            let word_chars: Vec<char> = word.chars().collect();
            if word_chars.len().abs_diff(query_chars.len()) > self.config.length_window {
                continue;
            }
            if bounded_levenshtein(&word_chars, &query_chars, threshold).is_some() {
                return Some(FuzzyStrategy::EditDistance);
            }
        }

        None
    }
}

/// Whether consecutive words of `text` start with the parts of `query`.
/// A query without separators matches any word it prefixes.
fn word_prefix_match(text: &str, query: &str) -> bool {
    let parts: Vec<&str> = match_words(query).collect();
    if parts.is_empty() {
        return false;
    }
    let words: Vec<&str> = match_words(text).collect();
    words
        .windows(parts.len())
        .any(|window| window.iter().zip(&parts).all(|(w, p)| w.starts_with(p)))
}

/// Whether `needle` occurs in order inside `haystack` with at most
/// `max_skips` unmatched characters between its first and last matched char.
fn subsequence_within(haystack: &[char], needle: &[char], max_skips: usize) -> bool {
    let Some(&first) = needle.first() else {
        return true;
    };
    if needle.len() > haystack.len() {
        return false;
    }

    for start in haystack
        .iter()
        .enumerate()
        .filter(|(_, c)| **c == first)
        .map(|(i, _)| i)
    {
        let mut pos = start + 1;
        let mut skips = 0;
        let mut matched = true;

        for &want in &needle[1..] {
            loop {
                match haystack.get(pos) {
                    Some(&c) if c == want => {
                        pos += 1;
                        break;
                    }
                    Some(_) => {
                        skips += 1;
                        pos += 1;
                        if skips > max_skips {
                            matched = false;
                            break;
                        }
                    }
                    None => {
                        matched = false;
                        break;
                    }
                }
            }
            if !matched {
                break;
            }
        }

        if matched {
            return true;
        }
    }
    false
}

/// Levenshtein distance between `a` and `b` if it is at most `max`.
///
/// Keeps a single row sized to the shorter input and gives up as soon as
/// every cell of a row exceeds `max`.
pub fn bounded_levenshtein(a: &[char], b: &[char], max: usize) -> Option<usize> {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };

    if long.len() - short.len() > max {
        return None;
    }
    if short.is_empty() {
        return Some(long.len());
    }

    let mut row: Vec<usize> = (0..=short.len()).collect();

    for (i, &lc) in long.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        let mut row_min = row[0];

        for (j, &sc) in short.iter().enumerate() {
            let above = row[j + 1];
            let cost = usize::from(lc != sc);
            let value = (diagonal + cost).min(above + 1).min(row[j] + 1);
            diagonal = above;
            row[j + 1] = value;
            row_min = row_min.min(value);
        }

        if row_min > max {
            return None;
        }
    }

    let distance = row[short.len()];
    (distance <= max).then_some(distance)
}
