//! Catalog entities, backends and the incremental loader

pub mod arena;
pub mod disk_cache;
pub mod loader;
pub mod source;
pub mod store;
pub mod types;

pub use disk_cache::{cache_key, CachedSource, DiskSchemaCache};
pub use loader::{
    FetchedPage, IncrementalLoader, LoadOutcome, LoaderState, LoaderStats, PageRequest,
};
pub use source::{CatalogSource, MemorySource, Page};
pub use store::{Appended, Catalog, ColumnRef, TableRef};
pub use types::{
    BumpKind, ColumnEntity, ColumnId, Generation, SearchMode, TableEntity, TableId,
};
