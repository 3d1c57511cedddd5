//! Catalog backends
//!
//! The loader only talks to a [`CatalogSource`]. Real deployments put a
//! database driver behind it; [`MemorySource`] serves a JSON catalog dump.

use crate::catalog::types::{ColumnEntity, TableEntity};
use crate::error::FetchError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// One page of catalog rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub tables: Vec<TableEntity>,
    #[serde(default)]
    pub columns: Vec<ColumnEntity>,
}

impl Page {
    pub fn new(tables: Vec<TableEntity>, columns: Vec<ColumnEntity>) -> Self {
        Self { tables, columns }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.columns.is_empty()
    }
}

/// Paged access to a database catalog.
///
/// `limit`/`offset` paginate tables; a page carries the columns of its tables.
pub trait CatalogSource: Send + Sync {
    fn fetch(&self, filter: Option<&str>, limit: usize, offset: usize) -> Result<Page, FetchError>;

    /// Best-effort total table count. `None` when the backend cannot tell cheaply.
    fn count_estimate(&self, _filter: Option<&str>) -> Option<usize> {
        None
    }
}

/// Catalog held entirely in memory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemorySource {
    tables: Vec<TableEntity>,
    #[serde(default)]
    columns: Vec<ColumnEntity>,
}

impl MemorySource {
    pub fn new(tables: Vec<TableEntity>, columns: Vec<ColumnEntity>) -> Self {
        Self { tables, columns }
    }

    /// Load a dump of the form `{"tables": [...], "columns": [...]}`
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog dump {}", path.display()))?;
        let source: MemorySource =
            serde_json::from_str(&content).context("Failed to parse catalog dump")?;
        Ok(source)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    fn matches_filter(schema: &str, filter: Option<&str>) -> bool {
        match filter {
            Some(f) if !f.is_empty() => schema.eq_ignore_ascii_case(f),
            _ => true,
        }
    }
}

impl CatalogSource for MemorySource {
    fn fetch(&self, filter: Option<&str>, limit: usize, offset: usize) -> Result<Page, FetchError> {
        let tables: Vec<TableEntity> = self
            .tables
            .iter()
            .filter(|t| Self::matches_filter(&t.schema, filter))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        let keys: HashSet<String> = tables.iter().map(TableEntity::key).collect();
        let columns = self
            .columns
            .iter()
            .filter(|c| keys.contains(&c.table_key()))
            .cloned()
            .collect();

        Ok(Page { tables, columns })
    }

    fn count_estimate(&self, filter: Option<&str>) -> Option<usize> {
        Some(
            self.tables
                .iter()
                .filter(|t| Self::matches_filter(&t.schema, filter))
                .count(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> MemorySource {
        MemorySource::new(
            vec![
                TableEntity::new("TEST", "USERS"),
                TableEntity::new("TEST", "ORDERS"),
                TableEntity::new("SALES", "INVOICES"),
            ],
            vec![
                ColumnEntity::new("TEST", "USERS", "ID", "INTEGER"),
                ColumnEntity::new("SALES", "INVOICES", "TOTAL", "DECIMAL"),
            ],
        )
    }

    #[test]
    fn test_fetch_paginates() {
        let src = source();
        let first = src.fetch(None, 2, 0).unwrap();
        let second = src.fetch(None, 2, 2).unwrap();

        assert_eq!(first.tables.len(), 2);
        assert_eq!(first.columns.len(), 1);
        assert_eq!(second.tables.len(), 1);
        assert_eq!(second.columns[0].name, "TOTAL");
        assert!(src.fetch(None, 2, 4).unwrap().is_empty());
    }

    #[test]
    fn test_fetch_filters_schema_case_insensitively() {
        let src = source();
        let page = src.fetch(Some("sales"), 10, 0).unwrap();
        assert_eq!(page.tables.len(), 1);
        assert_eq!(src.count_estimate(Some("test")), Some(2));
        assert_eq!(src.count_estimate(Some("")), Some(3));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(
            &path,
            r#"{"tables":[{"schema":"A","name":"B"}],"columns":[]}"#,
        )
        .unwrap();

        let src = MemorySource::from_json_file(&path).unwrap();
        assert_eq!(src.table_count(), 1);
        assert!(MemorySource::from_json_file(&dir.path().join("missing.json")).is_err());
    }
}
