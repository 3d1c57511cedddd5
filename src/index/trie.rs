//! Prefix trie over lowercased tokens
//!
//! Every node on a token's path records the keys of the items that produced
//! the token, so a prefix lookup is a single descent with no subtree walk.

use crate::utils::tokenizer::fold_case;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// How multi-word queries combine per-word matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiWordPolicy {
    /// Items matching any word (favors recall)
    #[default]
    Union,
    /// Items matching every word
    Intersection,
}

#[derive(Debug)]
struct TrieNode<K> {
    children: FxHashMap<char, TrieNode<K>>,
    is_terminal: bool,
    item_keys: FxHashSet<K>,
}

impl<K> Default for TrieNode<K> {
    fn default() -> Self {
        Self {
            children: FxHashMap::default(),
            is_terminal: false,
            item_keys: FxHashSet::default(),
        }
    }
}

/// Size counters for status output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrieStats {
    pub nodes: usize,
    pub tokens: usize,
    pub insertions: usize,
}

#[derive(Debug)]
pub struct TrieIndex<K> {
    root: TrieNode<K>,
    stats: TrieStats,
}

impl<K> Default for TrieIndex<K> {
    fn default() -> Self {
        Self {
            root: TrieNode::default(),
            stats: TrieStats::default(),
        }
    }
}

impl<K: Clone + Eq + Hash> TrieIndex<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `token` under `key`. Empty tokens are ignored.
    pub fn insert(&mut self, token: &str, key: K) {
        if token.is_empty() {
            return;
        }

        let mut created = 0;
        let mut new_token = false;
        let mut node = &mut self.root;
        for ch in fold_case(token).chars() {
            node = node.children.entry(ch).or_insert_with(|| {
                created += 1;
                TrieNode::default()
            });
            node.item_keys.insert(key.clone());
        }
        if !node.is_terminal {
            node.is_terminal = true;
            new_token = true;
        }

        self.stats.nodes += created;
        self.stats.tokens += usize::from(new_token);
        self.stats.insertions += 1;
    }

    /// Keys of every token starting with `prefix` (case-insensitive).
    /// Unknown and empty prefixes yield nothing.
    pub fn lookup_prefix(&self, prefix: &str) -> Option<&FxHashSet<K>> {
        if prefix.is_empty() {
            return None;
        }
        let mut node = &self.root;
        for ch in fold_case(prefix).chars() {
            node = node.children.get(&ch)?;
        }
        Some(&node.item_keys)
    }

    pub fn search_prefix(&self, prefix: &str) -> FxHashSet<K> {
        self.lookup_prefix(prefix).cloned().unwrap_or_default()
    }

    /// Whether `token` was inserted as a whole word
    pub fn contains_token(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }
        let mut node = &self.root;
        for ch in fold_case(token).chars() {
            match node.children.get(&ch) {
                Some(next) => node = next,
                None => return false,
            }
        }
        node.is_terminal
    }

    /// Combine per-word prefix matches according to `policy`
    pub fn search_words<S: AsRef<str>>(&self, words: &[S], policy: MultiWordPolicy) -> FxHashSet<K> {
        match policy {
            MultiWordPolicy::Union => {
                let mut out = FxHashSet::default();
                for word in words {
                    if let Some(keys) = self.lookup_prefix(word.as_ref()) {
                        out.extend(keys.iter().cloned());
                    }
                }
                out
            }
            MultiWordPolicy::Intersection => {
                let mut sets: Vec<&FxHashSet<K>> = Vec::with_capacity(words.len());
                for word in words {
                    match self.lookup_prefix(word.as_ref()) {
                        Some(keys) => sets.push(keys),
                        None => return FxHashSet::default(),
                    }
                }
                // Smallest set first for cheap intersection
                sets.sort_by_key(|s| s.len());
                let Some((first, rest)) = sets.split_first() else {
                    return FxHashSet::default();
                };
                first
                    .iter()
                    .filter(|k| rest.iter().all(|s| s.contains(*k)))
                    .cloned()
                    .collect()
            }
        }
    }

    pub fn clear(&mut self) {
        self.root = TrieNode::default();
        self.stats = TrieStats::default();
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    pub fn stats(&self) -> TrieStats {
        self.stats
    }
}
