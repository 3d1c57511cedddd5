//! Shared utilities.
//!
//! ## Modules
//!
//! - [`app_data`] - Configuration and the application data directory
//! - [`tokenizer`] - Splitting names into index tokens and query words
//!
//! ```
//! use schemafind::utils::{field_tokens, query_words};
//!
//! let tokens: Vec<_> = field_tokens("ORDER_ITEMS").collect();
//! assert_eq!(tokens, vec!["ORDER", "ITEMS"]);
//!
//! assert_eq!(query_words("Order  order items"), vec!["order", "items"]);
//! ```

pub mod app_data;
pub mod tokenizer;

pub use app_data::*;
pub use tokenizer::*;
