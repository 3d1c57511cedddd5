//! Query result cache stamped with the catalog generation

use crate::catalog::types::{Generation, SearchMode};
use crate::query::results::ResultSet;
use crate::utils::tokenizer::normalize_query;
use ahash::AHashMap;
use std::sync::Arc;

/// Entries past this count trigger a sweep of stale generations
const DEFAULT_MAX_ENTRIES: usize = 512;

/// A cached value and the catalog generation it was computed against
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub generation: Generation,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V, generation: Generation) -> Self {
        Self { value, generation }
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.generation == generation
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub stale: u64,
}

/// Maps `(mode, normalized query)` to the last result set.
///
/// Entries carry the generation they were built against. A lookup under a
/// different generation is a miss, so a generation bump invalidates
/// everything without sweeping the map.
pub struct ResultCache {
    entries: AHashMap<(SearchMode, String), CacheEntry<Arc<ResultSet>>>,
    generation: Generation,
    max_entries: usize,
    stats: CacheStats,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultCache {
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: AHashMap::new(),
            generation: Generation::default(),
            max_entries: max_entries.max(1),
            stats: CacheStats::default(),
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Move to a new catalog generation. Older entries become misses.
    pub fn set_generation(&mut self, generation: Generation) {
        self.generation = generation;
    }

    pub fn get(&mut self, mode: SearchMode, query: &str) -> Option<Arc<ResultSet>> {
        let key = (mode, normalize_query(query));
        match self.entries.get(&key) {
            Some(entry) if entry.is_current(self.generation) => {
                self.stats.hits += 1;
                Some(Arc::clone(&entry.value))
            }
            Some(_) => {
                self.stats.stale += 1;
                self.stats.misses += 1;
                None
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Store a result set. Sets computed against another generation are ignored.
    pub fn put(&mut self, mode: SearchMode, query: &str, results: Arc<ResultSet>) -> bool {
        if results.generation != self.generation {
            return false;
        }
        if self.entries.len() >= self.max_entries {
            self.sweep();
        }
        let key = (mode, normalize_query(query));
        self.entries
            .insert(key, CacheEntry::new(results, self.generation));
        true
    }

    pub fn invalidate_all(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Drop stale entries; if every entry is current, drop them all
    fn sweep(&mut self) {
        let generation = self.generation;
        self.entries.retain(|_, entry| entry.is_current(generation));
        if self.entries.len() >= self.max_entries {
            self.entries.clear();
        }
    }
}
