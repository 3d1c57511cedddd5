//! Shared fakes for integration tests
#![allow(dead_code)]

use schemafind::catalog::{
    CatalogSource, ColumnEntity, LoaderState, MemorySource, Page, TableEntity,
};
use schemafind::coordinator::SearchListener;
use schemafind::error::FetchError;
use schemafind::query::ResultSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// The three-table catalog used by most scenarios
pub fn test_tables() -> Vec<TableEntity> {
    vec![
        TableEntity::new("TEST", "USERS").with_remarks("registered users"),
        TableEntity::new("TEST", "ORDERS"),
        TableEntity::new("TEST", "PRODUCTS"),
    ]
}

pub fn test_columns() -> Vec<ColumnEntity> {
    vec![
        ColumnEntity::new("TEST", "USERS", "ID", "INTEGER"),
        ColumnEntity::new("TEST", "USERS", "EMAIL", "VARCHAR"),
        ColumnEntity::new("TEST", "ORDERS", "ORDER_ID", "INTEGER"),
        ColumnEntity::new("TEST", "ORDERS", "USER_ID", "INTEGER"),
        ColumnEntity::new("TEST", "PRODUCTS", "PRICE", "DECIMAL"),
    ]
}

pub fn test_source() -> MemorySource {
    MemorySource::new(test_tables(), test_columns())
}

/// `count` tables named `{prefix}_{i}` in one schema
pub fn numbered_tables(schema: &str, prefix: &str, count: usize) -> Vec<TableEntity> {
    (0..count)
        .map(|i| TableEntity::new(schema, format!("{}_{}", prefix, i)))
        .collect()
}

/// Wraps a source and sleeps before every fetch
pub struct SlowSource {
    inner: MemorySource,
    latency: Duration,
    pub fetches: AtomicUsize,
}

impl SlowSource {
    pub fn new(inner: MemorySource, latency: Duration) -> Self {
        Self {
            inner,
            latency,
            fetches: AtomicUsize::new(0),
        }
    }
}

impl CatalogSource for SlowSource {
    fn fetch(&self, filter: Option<&str>, limit: usize, offset: usize) -> Result<Page, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.latency);
        self.inner.fetch(filter, limit, offset)
    }

    fn count_estimate(&self, filter: Option<&str>) -> Option<usize> {
        self.inner.count_estimate(filter)
    }
}

/// Fetches are immediate; count estimates take `latency`
pub struct SlowEstimateSource {
    inner: MemorySource,
    latency: Duration,
}

impl SlowEstimateSource {
    pub fn new(inner: MemorySource, latency: Duration) -> Self {
        Self { inner, latency }
    }
}

impl CatalogSource for SlowEstimateSource {
    fn fetch(&self, filter: Option<&str>, limit: usize, offset: usize) -> Result<Page, FetchError> {
        self.inner.fetch(filter, limit, offset)
    }

    fn count_estimate(&self, filter: Option<&str>) -> Option<usize> {
        thread::sleep(self.latency);
        self.inner.count_estimate(filter)
    }
}

/// Serves `ok_pages` pages, then fails every fetch
pub struct FailingSource {
    inner: MemorySource,
    ok_pages: usize,
    served: AtomicUsize,
}

impl FailingSource {
    pub fn new(inner: MemorySource, ok_pages: usize) -> Self {
        Self {
            inner,
            ok_pages,
            served: AtomicUsize::new(0),
        }
    }
}

impl CatalogSource for FailingSource {
    fn fetch(&self, filter: Option<&str>, limit: usize, offset: usize) -> Result<Page, FetchError> {
        if self.served.fetch_add(1, Ordering::SeqCst) >= self.ok_pages {
            return Err(FetchError::Backend {
                reason: "connection reset".to_string(),
            });
        }
        self.inner.fetch(filter, limit, offset)
    }
}

/// Everything a coordinator published, in order
#[derive(Debug, Default)]
pub struct RecordingListener {
    pub published: Vec<ResultSet>,
    pub statuses: Vec<(LoaderState, String)>,
}

impl RecordingListener {
    pub fn last_status(&self) -> Option<&(LoaderState, String)> {
        self.statuses.last()
    }

    pub fn queries(&self) -> Vec<&str> {
        self.published.iter().map(|r| r.query.as_str()).collect()
    }
}

impl SearchListener for RecordingListener {
    fn results_published(&mut self, results: &ResultSet) {
        self.published.push(results.clone());
    }

    fn status_changed(&mut self, state: LoaderState, message: &str) {
        self.statuses.push((state, message.to_string()));
    }
}
