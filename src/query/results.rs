//! Search result types

use crate::catalog::types::{ColumnId, Generation, SearchMode, TableId};

/// How an item matched the query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    /// A name word equals a query word
    Exact,
    /// A token starts with a query word
    Prefix,
    /// Found by the fuzzy fallback
    Fuzzy,
    /// Table surfaced because some of its columns matched
    ColumnAggregate,
}

/// Catalog entity behind a result, valid for the result set's generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemRef {
    Table(TableId),
    Column(ColumnId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub item_key: String,
    pub match_kind: MatchKind,
    pub relevance: f32,
    pub table_key: String,
    pub item: ItemRef,
    /// Number of matching columns behind a `ColumnAggregate` hit
    pub matching_columns: usize,
}

/// Ordered results for one (mode, query) against one catalog generation
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub mode: SearchMode,
    /// Normalized query text
    pub query: String,
    pub generation: Generation,
    pub results: Vec<SearchResult>,
    /// More results existed than the configured limit
    pub truncated: bool,
}

impl ResultSet {
    pub fn empty(mode: SearchMode, query: impl Into<String>, generation: Generation) -> Self {
        Self {
            mode,
            query: query.into(),
            generation,
            results: Vec::new(),
            truncated: false,
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.results.iter().map(|r| r.item_key.as_str())
    }
}
