//! # schemafind - Incremental Schema Search
//!
//! schemafind searches a lazily loaded catalog of database tables and
//! columns while the catalog is still streaming in from a slow backend.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`catalog`] - Entities, the interned catalog store, backends and the paging loader
//! - [`index`] - Prefix tries over tokenized names and remarks
//! - [`query`] - Fuzzy matching, scoring and the search engine
//! - [`cache`] - Generation-stamped result cache and LRU render cache
//! - [`coordinator`] - Debounce, cancellation and streaming re-search
//! - [`output`] - Terminal formatting of rendered rows
//! - [`utils`] - Configuration and tokenization
//!
//! ## Quick Start
//!
//! ```no_run
//! use schemafind::catalog::{IncrementalLoader, MemorySource, LoaderState};
//! use schemafind::coordinator::{CoordinatorConfig, SearchCoordinator, SearchListener};
//! use schemafind::query::ResultSet;
//! use std::path::Path;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! struct Print;
//!
//! impl SearchListener for Print {
//!     fn results_published(&mut self, results: &ResultSet) {
//!         for key in results.keys() {
//!             println!("{}", key);
//!         }
//!     }
//!
//!     fn status_changed(&mut self, _state: LoaderState, message: &str) {
//!         eprintln!("{}", message);
//!     }
//! }
//!
//! let source = MemorySource::from_json_file(Path::new("catalog.json")).unwrap();
//! let loader = IncrementalLoader::new(Arc::new(source), None);
//! let mut coordinator = SearchCoordinator::new(loader, CoordinatorConfig::default(), Print);
//!
//! coordinator.start();
//! coordinator.on_query_changed("orders");
//! coordinator.run_until_idle(Duration::from_secs(5));
//! ```
//!
//! ## Consistency
//!
//! Every successful page load bumps the catalog [`Generation`](catalog::Generation).
//! Cached results carry the generation they were computed against and are
//! ignored once it moves on, and results for a superseded query are never
//! published.

pub mod cache;
pub mod catalog;
pub mod coordinator;
pub mod error;
pub mod index;
pub mod output;
pub mod query;
pub mod utils;
