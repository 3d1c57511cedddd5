//! In-memory caches layered over the search engine
//!
//! - [`result_cache`] - result sets keyed by (mode, query), generation-stamped
//! - [`render_cache`] - formatted rows, bounded LRU with batch eviction

pub mod render_cache;
pub mod result_cache;

pub use render_cache::{render, RenderCache, RenderedRow, RenderedView, RowKind};
pub use result_cache::{CacheEntry, CacheStats, ResultCache};
