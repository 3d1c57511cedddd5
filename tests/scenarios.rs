//! End-to-end behavior of the loader, index, engine and caches

mod common;

use common::{numbered_tables, test_source};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use schemafind::cache::ResultCache;
use schemafind::catalog::{
    Generation, IncrementalLoader, LoadOutcome, LoaderState, MemorySource, SearchMode,
};
use schemafind::index::{CatalogIndex, MultiWordPolicy, TrieIndex};
use schemafind::query::{FuzzyConfig, FuzzyMatcher, MatchKind, SearchEngine};
use std::sync::Arc;

fn loaded(page_size: usize) -> (IncrementalLoader, CatalogIndex) {
    let mut loader = IncrementalLoader::new(Arc::new(test_source()), None);
    loader.load_initial(page_size);
    while loader.load_more(page_size).loaded() {}
    let mut index = CatalogIndex::new();
    index.rebuild(loader.catalog(), loader.generation());
    (loader, index)
}

#[test]
fn prefix_query_finds_single_table() {
    let (loader, index) = loaded(10);
    let set = SearchEngine::default()
        .search(loader.catalog(), &index, loader.generation(), SearchMode::Tables, "ord")
        .unwrap();

    assert_eq!(set.keys().collect::<Vec<_>>(), vec!["TEST.ORDERS"]);
    assert_eq!(set.results[0].match_kind, MatchKind::Prefix);
    assert_eq!(set.results[0].relevance, 1.0);
}

#[test]
fn misspelled_query_falls_back_to_fuzzy() {
    let (loader, index) = loaded(10);
    let set = SearchEngine::default()
        .search(loader.catalog(), &index, loader.generation(), SearchMode::Tables, "usr")
        .unwrap();

    assert_eq!(set.keys().collect::<Vec<_>>(), vec!["TEST.USERS"]);
    assert_eq!(set.results[0].match_kind, MatchKind::Fuzzy);
}

#[test]
fn results_are_ordered_by_relevance() {
    let tables = vec![
        schemafind::catalog::TableEntity::new("APP", "CUSTOMER_ORDERS"),
        schemafind::catalog::TableEntity::new("APP", "ORDERS"),
        schemafind::catalog::TableEntity::new("ORDERS_ARCHIVE", "HISTORY"),
        schemafind::catalog::TableEntity::new("APP", "ORDERSLIP"),
    ];
    let mut loader = IncrementalLoader::new(Arc::new(MemorySource::new(tables, Vec::new())), None);
    loader.load_initial(10);
    let mut index = CatalogIndex::new();
    index.rebuild(loader.catalog(), loader.generation());

    let set = SearchEngine::default()
        .search(loader.catalog(), &index, loader.generation(), SearchMode::Tables, "orders")
        .unwrap();

    assert_eq!(set.len(), 4);
    assert!(set.results.windows(2).all(|w| w[0].relevance >= w[1].relevance));
    // exact word matches keep their catalog order
    assert_eq!(
        set.keys().collect::<Vec<_>>(),
        vec![
            "APP.CUSTOMER_ORDERS",
            "APP.ORDERS",
            "APP.ORDERSLIP",
            "ORDERS_ARCHIVE.HISTORY"
        ]
    );
}

#[test]
fn loader_pages_until_exhausted() {
    let mut loader = IncrementalLoader::new(Arc::new(test_source()), None);

    let first = loader.load_initial(2);
    assert_eq!(first.tables_loaded(), 2);
    assert_ne!(loader.state(), LoaderState::Exhausted);

    let second = loader.load_more(2);
    assert_eq!(second.tables_loaded(), 1);
    assert_eq!(loader.state(), LoaderState::Exhausted);

    let generation = loader.generation();
    assert_eq!(loader.load_more(2), LoadOutcome::NoMoreData);
    assert!(!loader.load_more(2).loaded());
    assert_eq!(loader.generation(), generation);
}

#[test]
fn generation_bump_invalidates_cached_results() {
    let mut loader = IncrementalLoader::new(
        Arc::new(MemorySource::new(numbered_tables("S", "T", 4), Vec::new())),
        None,
    );
    loader.load_initial(2);
    let mut index = CatalogIndex::new();
    index.rebuild(loader.catalog(), loader.generation());

    let engine = SearchEngine::default();
    let mut cache = ResultCache::new();
    cache.set_generation(loader.generation());
    for query in ["t", "t_1", "s"] {
        let set = engine
            .search(loader.catalog(), &index, loader.generation(), SearchMode::Tables, query)
            .unwrap();
        assert!(cache.put(SearchMode::Tables, query, Arc::new(set)));
    }

    let outcome = loader.load_more(2);
    assert!(outcome.loaded());
    cache.set_generation(loader.generation());

    for query in ["t", "t_1", "s"] {
        assert!(cache.get(SearchMode::Tables, query).is_none());
    }
}

#[test]
fn incremental_index_matches_full_rebuild() {
    let source = Arc::new(MemorySource::new(numbered_tables("S", "ITEM", 7), Vec::new()));
    let mut loader = IncrementalLoader::new(source, None);
    let mut incremental = CatalogIndex::new();

    let mut outcome = loader.load_initial(3);
    loop {
        match outcome {
            LoadOutcome::Loaded {
                appended,
                generation,
                ..
            } => incremental.index_appended(loader.catalog(), &appended, generation),
            _ => break,
        }
        outcome = loader.load_more(3);
    }

    let mut full = CatalogIndex::new();
    full.rebuild(loader.catalog(), loader.generation());

    for prefix in ["i", "item", "s", "6"] {
        assert_eq!(
            incremental.tables().search_prefix(prefix),
            full.tables().search_prefix(prefix),
            "prefix {prefix}"
        );
    }
    assert!(incremental.verify(loader.catalog()).is_ok());
}

#[test]
fn union_is_default_policy() {
    let (loader, index) = loaded(10);
    let set = SearchEngine::default()
        .search(loader.catalog(), &index, loader.generation(), SearchMode::Tables, "users products")
        .unwrap();
    assert_eq!(set.len(), 2);
    assert_eq!(MultiWordPolicy::default(), MultiWordPolicy::Union);
}

#[test]
fn reset_discards_catalog() {
    let mut loader = IncrementalLoader::new(Arc::new(test_source()), None);
    loader.load_initial(10);
    let before = loader.generation();

    loader.reset(Some("NOPE".to_string()));
    assert!(loader.catalog().is_empty());
    assert!(loader.generation() > before);

    let outcome = loader.load_initial(10);
    assert_eq!(outcome.tables_loaded(), 0);
    assert_eq!(loader.state(), LoaderState::Exhausted);
    assert_eq!(loader.generation(), Generation(before.0 + 2));
}

fn token() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9]{0,11}"
}

proptest! {
    #[test]
    fn every_prefix_finds_the_key(tokens in prop::collection::vec(token(), 1..8)) {
        let mut trie = TrieIndex::new();
        for (key, t) in tokens.iter().enumerate() {
            trie.insert(t, key);
        }

        for (key, t) in tokens.iter().enumerate() {
            let lower = t.to_lowercase();
            for end in 1..=lower.len() {
                let upper_prefix = t[..end].to_uppercase();
                prop_assert!(trie.search_prefix(&upper_prefix).contains(&key));
            }
        }
    }

    #[test]
    fn two_word_query_is_union(
        tokens in prop::collection::vec(token(), 1..8),
        a in "[a-z]{1,3}",
        b in "[a-z]{1,3}",
    ) {
        let mut trie = TrieIndex::new();
        for (key, t) in tokens.iter().enumerate() {
            trie.insert(t, key);
        }

        let union = trie.search_words(&[a.clone(), b.clone()], MultiWordPolicy::Union);
        let mut expected = trie.search_prefix(&a);
        expected.extend(trie.search_prefix(&b));
        prop_assert_eq!(union, expected);
    }

    #[test]
    fn fuzzy_match_ignores_case(text in "[a-zA-Z_]{1,16}", query in "[a-zA-Z]{1,6}") {
        let matcher = FuzzyMatcher::new(FuzzyConfig::default());
        let expected = matcher.matches(&text, &query);
        prop_assert_eq!(matcher.matches(&text.to_uppercase(), &query), expected);
        prop_assert_eq!(matcher.matches(&text, &query.to_lowercase()), expected);
        prop_assert_eq!(matcher.matches(&text.to_lowercase(), &query.to_uppercase()), expected);
    }
}
