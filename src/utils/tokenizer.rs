/// Maximum token length to store in the index.
/// Longer words are usually generated identifiers or pasted DDL, not search targets.
const MAX_TOKEN_LENGTH: usize = 128;

fn is_field_separator(ch: char) -> bool {
    ch == '_' || ch.is_whitespace()
}

fn is_word_separator(ch: char) -> bool {
    ch == '_' || ch == '-' || ch.is_whitespace()
}

/// Case folding shared by indexing and querying.
///
/// Whole-string lowercasing, so context-sensitive letters (final sigma)
/// fold the same way on both sides.
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Split an indexed field (name, schema, remarks) into words.
///
/// Splits on underscores and whitespace; words keep their original case.
/// `ORDER_ITEMS` yields `ORDER`, `ITEMS`.
pub fn field_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(is_field_separator)
        .filter(|w| !w.is_empty() && w.len() <= MAX_TOKEN_LENGTH)
}

/// Words used by the fuzzy matcher's word-boundary checks.
/// Also splits on `-`.
pub fn match_words(text: &str) -> impl Iterator<Item = &str> {
    text.split(is_word_separator).filter(|w| !w.is_empty())
}

/// Lowercased, de-duplicated query words in input order
pub fn query_words(query: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for word in query.split_whitespace() {
        let lower = fold_case(word);
        if !words.contains(&lower) {
            words.push(lower);
        }
    }
    words
}

/// Canonical form of a query for cache keys: lowercased, single-spaced
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(fold_case)
        .collect::<Vec<_>>()
        .join(" ")
}
