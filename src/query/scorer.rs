//! Relevance scoring for search results
//!
//! Relevance depends only on how an item matched, so the ordering within a
//! result set is: exact name word, name prefix, other-field prefix, column
//! aggregate, then the fuzzy strategies. Equal scores keep discovery order.

use crate::query::fuzzy::FuzzyStrategy;
use crate::query::results::{MatchKind, SearchResult};
use crate::utils::tokenizer::field_tokens;
use serde::{Deserialize, Serialize};

/// Configurable weights for each way of matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub exact: f32,
    /// Prefix hit on a word of the item's own name
    pub name_prefix: f32,
    /// Prefix hit only on schema, owning table or remarks
    pub field_prefix: f32,
    pub column_aggregate: f32,
    pub fuzzy_substring: f32,
    pub fuzzy_word_prefix: f32,
    pub fuzzy_subsequence: f32,
    pub fuzzy_edit_distance: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            exact: 2.0,
            name_prefix: 1.0,
            field_prefix: 0.8,
            column_aggregate: 0.6,
            fuzzy_substring: 0.5,
            fuzzy_word_prefix: 0.45,
            fuzzy_subsequence: 0.4,
            fuzzy_edit_distance: 0.3,
        }
    }
}

/// Scorer assigns match kinds and relevance to candidates
#[derive(Debug, Clone, Default)]
pub struct Scorer {
    weights: ScoringWeights,
}

impl Scorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn with_defaults() -> Self {
        Self::new(ScoringWeights::default())
    }

    /// Classify a trie hit by comparing the query words against the item's name
    pub fn score_trie_hit(&self, name: &str, words: &[String]) -> (MatchKind, f32) {
        let mut best = (MatchKind::Prefix, self.weights.field_prefix);

        for token in field_tokens(name) {
            let token = token.to_lowercase();
            for word in words {
                if token == *word {
                    return (MatchKind::Exact, self.weights.exact);
                }
                if token.starts_with(word.as_str()) {
                    best = (MatchKind::Prefix, self.weights.name_prefix);
                }
            }
        }

        best
    }

    pub fn score_fuzzy(&self, strategy: FuzzyStrategy) -> f32 {
        match strategy {
            FuzzyStrategy::Substring => self.weights.fuzzy_substring,
            FuzzyStrategy::WordPrefix => self.weights.fuzzy_word_prefix,
            FuzzyStrategy::Subsequence => self.weights.fuzzy_subsequence,
            FuzzyStrategy::EditDistance => self.weights.fuzzy_edit_distance,
        }
    }

    pub fn score_column_aggregate(&self) -> f32 {
        self.weights.column_aggregate
    }

    /// Order by relevance, highest first. The sort is stable, so ties keep
    /// the order in which results were discovered.
    pub fn sort_results(results: &mut [SearchResult]) {
        results.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}
