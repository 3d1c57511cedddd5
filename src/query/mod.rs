pub mod executor;
pub mod fuzzy;
pub mod results;
pub mod scorer;

pub use executor::{SearchEngine, SearchOptions};
pub use fuzzy::{FuzzyConfig, FuzzyMatcher, FuzzyStrategy};
pub use results::{ItemRef, MatchKind, ResultSet, SearchResult};
pub use scorer::{Scorer, ScoringWeights};
