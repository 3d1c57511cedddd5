//! Token indexes over the loaded catalog
//!
//! - [`trie`] - generic prefix trie with union/intersection multi-word lookup
//! - [`catalog_index`] - per-mode tries kept in step with the catalog

pub mod catalog_index;
pub mod trie;

pub use catalog_index::CatalogIndex;
pub use trie::{MultiWordPolicy, TrieIndex, TrieStats};
