//! Error types for catalog loading and search

use thiserror::Error;

/// Failure while fetching a page from the catalog backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Catalog backend unavailable")]
    Unavailable,

    #[error("Catalog fetch failed: {reason}")]
    Backend { reason: String },

    #[error("Could not decode catalog page: {reason}")]
    Decode { reason: String },
}

/// Errors surfaced by the search engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    /// The trie referenced an entity the catalog does not hold.
    #[error("Index corruption: {reason}")]
    IndexCorruption { reason: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),
}
