use crate::catalog::store::Catalog;
use crate::catalog::types::{ColumnId, Generation, SearchMode, TableId};
use crate::error::SearchError;
use crate::index::catalog_index::CatalogIndex;
use crate::index::trie::MultiWordPolicy;
use crate::query::fuzzy::{FuzzyConfig, FuzzyMatcher, FuzzyStrategy};
use crate::query::results::{ItemRef, MatchKind, ResultSet, SearchResult};
use crate::query::scorer::{Scorer, ScoringWeights};
use crate::utils::tokenizer::{field_tokens, normalize_query, query_words};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Catalogs at least this large are fuzzy-scanned in parallel
const PARALLEL_SCAN_THRESHOLD: usize = 2048;

/// Search behavior knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub multi_word_policy: MultiWordPolicy,
    pub result_limit: usize,
    pub fuzzy: FuzzyConfig,
    pub weights: ScoringWeights,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            multi_word_policy: MultiWordPolicy::Union,
            result_limit: 500,
            fuzzy: FuzzyConfig::default(),
            weights: ScoringWeights::default(),
        }
    }
}

/// Runs one query against the catalog and its index.
///
/// Pure and synchronous: no I/O, no caching. Trie prefix hits come first;
/// when the trie has nothing for the query the fuzzy matcher scans names.
pub struct SearchEngine {
    matcher: FuzzyMatcher,
    scorer: Scorer,
    policy: MultiWordPolicy,
    result_limit: usize,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new(SearchOptions::default())
    }
}

impl SearchEngine {
    pub fn new(options: SearchOptions) -> Self {
        Self {
            matcher: FuzzyMatcher::new(options.fuzzy),
            scorer: Scorer::new(options.weights),
            policy: options.multi_word_policy,
            result_limit: options.result_limit.max(1),
        }
    }

    pub fn search(
        &self,
        catalog: &Catalog,
        index: &CatalogIndex,
        generation: Generation,
        mode: SearchMode,
        query: &str,
    ) -> Result<ResultSet, SearchError> {
        let normalized = normalize_query(query);
        let words = query_words(query);
        let mut set = ResultSet::empty(mode, normalized, generation);
        if words.is_empty() {
            return Ok(set);
        }

        index.verify(catalog)?;

        let mut results = match mode {
            SearchMode::Tables => self.search_tables(catalog, index, &words)?,
            SearchMode::Columns => self.search_columns(catalog, index, &words)?,
        };

        Scorer::sort_results(&mut results);
        if results.len() > self.result_limit {
            results.truncate(self.result_limit);
            set.truncated = true;
        }
        set.results = results;
        Ok(set)
    }

    fn search_tables(
        &self,
        catalog: &Catalog,
        index: &CatalogIndex,
        words: &[String],
    ) -> Result<Vec<SearchResult>, SearchError> {
        let mut ids: Vec<TableId> = index.tables().search_words(words, self.policy).into_iter().collect();
        ids.sort_unstable();

        let mut results = Vec::with_capacity(ids.len());
        for id in &ids {
            let table = catalog.table(*id).ok_or_else(|| dangling("table", *id))?;
            let (match_kind, relevance) = self.scorer.score_trie_hit(table.name(), words);
            let key = table.key();
            results.push(SearchResult {
                table_key: key.clone(),
                item_key: key,
                match_kind,
                relevance,
                item: ItemRef::Table(*id),
                matching_columns: 0,
            });
        }

        // Tables whose columns match by name but that did not match themselves
        let mut aggregates: FxHashMap<TableId, usize> = FxHashMap::default();
        let mut order: Vec<TableId> = Vec::new();
        let mut column_ids: Vec<ColumnId> =
            index.columns().search_words(words, self.policy).into_iter().collect();
        column_ids.sort_unstable();
        for id in column_ids {
            let column = catalog.column(id).ok_or_else(|| dangling("column", id))?;
            let Some(table_id) = column.table_id() else { continue };
            if !name_has_prefix(column.name(), words) {
                continue;
            }
            let count = aggregates.entry(table_id).or_insert_with(|| {
                order.push(table_id);
                0
            });
            *count += 1;
        }

        for table_id in order {
            if results.iter().any(|r| r.item == ItemRef::Table(table_id)) {
                continue;
            }
            let Some(table) = catalog.table(table_id) else { continue };
            let key = table.key();
            results.push(SearchResult {
                table_key: key.clone(),
                item_key: key,
                match_kind: MatchKind::ColumnAggregate,
                relevance: self.scorer.score_column_aggregate(),
                item: ItemRef::Table(table_id),
                matching_columns: aggregates[&table_id],
            });
        }

        if results.is_empty() {
            results = self.fuzzy_tables(catalog, words);
        }
        Ok(results)
    }

    fn search_columns(
        &self,
        catalog: &Catalog,
        index: &CatalogIndex,
        words: &[String],
    ) -> Result<Vec<SearchResult>, SearchError> {
        let mut ids: Vec<ColumnId> = index.columns().search_words(words, self.policy).into_iter().collect();
        ids.sort_unstable();

        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            let column = catalog.column(id).ok_or_else(|| dangling("column", id))?;
            let (match_kind, relevance) = self.scorer.score_trie_hit(column.name(), words);
            results.push(SearchResult {
                item_key: column.key(),
                table_key: column.table_key(),
                match_kind,
                relevance,
                item: ItemRef::Column(id),
                matching_columns: 0,
            });
        }

        if results.is_empty() {
            results = self.fuzzy_columns(catalog, words);
        }
        Ok(results)
    }

    /// Best fuzzy strategy of `name` (full matcher) and `remarks` (substring only)
    fn fuzzy_score(&self, name: &str, remarks: &str, words: &[String]) -> Option<f32> {
        let mut per_word = words.iter().map(|word| {
            self.matcher
                .match_strategy(name, word)
                .or_else(|| {
                    remarks
                        .to_lowercase()
                        .contains(word.as_str())
                        .then_some(FuzzyStrategy::Substring)
                })
                .map(|s| self.scorer.score_fuzzy(s))
        });

        match self.policy {
            MultiWordPolicy::Union => per_word.flatten().reduce(f32::max),
            MultiWordPolicy::Intersection => {
                let mut best: Option<f32> = None;
                for score in per_word.by_ref() {
                    let score = score?;
                    best = Some(best.map_or(score, |b| b.min(score)));
                }
                best
            }
        }
    }

    fn fuzzy_tables(&self, catalog: &Catalog, words: &[String]) -> Vec<SearchResult> {
        let scan = |id: TableId| {
            let table = catalog.table(id)?;
            let relevance = self.fuzzy_score(table.name(), table.remarks(), words)?;
            let key = table.key();
            Some(SearchResult {
                table_key: key.clone(),
                item_key: key,
                match_kind: MatchKind::Fuzzy,
                relevance,
                item: ItemRef::Table(id),
                matching_columns: 0,
            })
        };

        let count = catalog.table_count() as TableId;
        if catalog.table_count() >= PARALLEL_SCAN_THRESHOLD {
            (0..count).into_par_iter().filter_map(scan).collect()
        } else {
            (0..count).filter_map(scan).collect()
        }
    }

    fn fuzzy_columns(&self, catalog: &Catalog, words: &[String]) -> Vec<SearchResult> {
        let scan = |id: ColumnId| {
            let column = catalog.column(id)?;
            let relevance = self.fuzzy_score(column.name(), column.remarks(), words)?;
            Some(SearchResult {
                item_key: column.key(),
                table_key: column.table_key(),
                match_kind: MatchKind::Fuzzy,
                relevance,
                item: ItemRef::Column(id),
                matching_columns: 0,
            })
        };

        let count = catalog.column_count() as ColumnId;
        if catalog.column_count() >= PARALLEL_SCAN_THRESHOLD {
            (0..count).into_par_iter().filter_map(scan).collect()
        } else {
            (0..count).filter_map(scan).collect()
        }
    }
}

fn name_has_prefix(name: &str, words: &[String]) -> bool {
    field_tokens(name).any(|token| {
        let token = token.to_lowercase();
        words.iter().any(|w| token.starts_with(w.as_str()))
    })
}

fn dangling(kind: &str, id: u32) -> SearchError {
    SearchError::IndexCorruption {
        reason: format!("index references missing {} #{}", kind, id),
    }
}
