#![no_main]

use libfuzzer_sys::fuzz_target;
use schemafind::index::TrieIndex;
use schemafind::utils::{field_tokens, normalize_query, query_words};

fuzz_target!(|data: &str| {
    // Every token inserted into a trie must be found again by its own prefix
    let mut trie = TrieIndex::new();
    for token in field_tokens(data) {
        trie.insert(token, 0u32);
        assert!(trie.search_prefix(token).contains(&0));
    }
    let _ = query_words(data);
    let _ = normalize_query(data);
});
