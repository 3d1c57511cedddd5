//! On-disk schema page cache
//!
//! Sits in front of a slow [`CatalogSource`] and keeps raw pages for a fixed
//! freshness window. It knows nothing about generations; the in-memory caches
//! are invalidated separately when the loader applies a page.

use crate::catalog::source::{CatalogSource, Page};
use crate::error::FetchError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Default freshness window
pub const DEFAULT_TTL_SECS: u64 = 3600;

const ALL_SCHEMAS: &str = "ALL_SCHEMAS";

/// Build the cache key for a fetch.
///
/// `SALES` / `ALL_SCHEMAS`, suffixed with `_LIMIT{n}_OFFSET{m}` when paginated.
pub fn cache_key(filter: Option<&str>, pagination: Option<(usize, usize)>) -> String {
    let mut key = match filter {
        Some(f) if !f.is_empty() => f.to_uppercase(),
        _ => ALL_SCHEMAS.to_string(),
    };
    if let Some((limit, offset)) = pagination {
        key.push_str(&format!("_LIMIT{}_OFFSET{}", limit, offset));
    }
    key
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedPage {
    key: String,
    cached_at: u64,
    page: Page,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Directory of JSON page files, one per cache key
#[derive(Debug, Clone)]
pub struct DiskSchemaCache {
    dir: PathBuf,
    ttl: Duration,
}

impl DiskSchemaCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_ttl(dir, Duration::from_secs(DEFAULT_TTL_SECS))
    }

    pub fn with_ttl(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for a key: readable prefix plus a hash of the full key
    fn path_for(&self, key: &str) -> PathBuf {
        let sanitized: String = key
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
            .take(48)
            .collect();

        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);

        self.dir
            .join(format!("{}-{:016x}.json", sanitized, hasher.finish()))
    }

    /// Fresh page for `key`, if any
    pub fn get(&self, key: &str) -> Option<Page> {
        self.get_at(key, now_secs())
    }

    /// Lookup as of `now` (unix seconds)
    pub fn get_at(&self, key: &str, now: u64) -> Option<Page> {
        let entry = self.read_entry(&self.path_for(key))?;
        if entry.key != key || self.is_expired(entry.cached_at, now) {
            return None;
        }
        Some(entry.page)
    }

    pub fn put(&self, key: &str, page: &Page) -> Result<()> {
        self.put_at(key, page, now_secs())
    }

    pub fn put_at(&self, key: &str, page: &Page, now: u64) -> Result<()> {
        fs::create_dir_all(&self.dir).context("Failed to create schema cache directory")?;
        let entry = CachedPage {
            key: key.to_string(),
            cached_at: now,
            page: page.clone(),
        };
        let content = serde_json::to_string(&entry).context("Failed to serialize cached page")?;
        fs::write(self.path_for(key), content).context("Failed to write cached page")?;
        Ok(())
    }

    /// Remove every cached page
    pub fn clear(&self) -> Result<()> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir).context("Failed to remove schema cache directory")?;
        }
        Ok(())
    }

    /// Delete stale or unreadable entries, returning how many were removed
    pub fn purge_expired(&self) -> Result<usize> {
        self.purge_expired_at(now_secs())
    }

    pub fn purge_expired_at(&self, now: u64) -> Result<usize> {
        if !self.dir.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let stale = match self.read_entry(&path) {
                Some(cached) => self.is_expired(cached.cached_at, now),
                None => true,
            };
            if stale {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn is_expired(&self, cached_at: u64, now: u64) -> bool {
        now.saturating_sub(cached_at) > self.ttl.as_secs()
    }

    fn read_entry(&self, path: &Path) -> Option<CachedPage> {
        let content = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable schema cache entry");
                None
            }
        }
    }
}

/// Read-through wrapper: consult the disk cache before the backend
pub struct CachedSource<S> {
    inner: S,
    cache: DiskSchemaCache,
}

impl<S: CatalogSource> CachedSource<S> {
    pub fn new(inner: S, cache: DiskSchemaCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &DiskSchemaCache {
        &self.cache
    }
}

impl<S: CatalogSource> CatalogSource for CachedSource<S> {
    fn fetch(&self, filter: Option<&str>, limit: usize, offset: usize) -> Result<Page, FetchError> {
        let key = cache_key(filter, Some((limit, offset)));
        if let Some(page) = self.cache.get(&key) {
            tracing::debug!(%key, "schema cache hit");
            return Ok(page);
        }

        let page = self.inner.fetch(filter, limit, offset)?;
        if let Err(e) = self.cache.put(&key, &page) {
            tracing::warn!(%key, error = %e, "failed to store schema cache entry");
        }
        Ok(page)
    }

    fn count_estimate(&self, filter: Option<&str>) -> Option<usize> {
        self.inner.count_estimate(filter)
    }
}
