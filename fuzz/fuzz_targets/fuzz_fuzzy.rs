#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use schemafind::query::{FuzzyConfig, FuzzyMatcher};

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    text: &'a str,
    query: &'a str,
}

fuzz_target!(|input: Input| {
    // Matching must not panic on arbitrary unicode and must ignore case
    let matcher = FuzzyMatcher::new(FuzzyConfig::default());
    let matched = matcher.matches(input.text, input.query);
    if input.query.is_ascii() && input.text.is_ascii() {
        assert_eq!(matched, matcher.matches(&input.text.to_uppercase(), input.query));
    }
});
