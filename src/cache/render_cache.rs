//! Formatted display rows, cached per (mode, query, generation)

use crate::catalog::store::Catalog;
use crate::catalog::types::{Generation, SearchMode};
use crate::query::results::{ItemRef, MatchKind, ResultSet};
use lru::LruCache;
use std::sync::Arc;

pub const DEFAULT_RENDER_CAPACITY: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Table,
    /// Table heading above its matching columns
    GroupHeader,
    Column,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRow {
    pub kind: RowKind,
    pub item_key: String,
    pub label: String,
    pub detail: String,
}

/// Display rows for one result set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedView {
    pub mode: SearchMode,
    pub query: String,
    pub generation: Generation,
    pub rows: Vec<RenderedRow>,
    pub summary: String,
}

type RenderKey = (SearchMode, String, Generation);

/// Bounded LRU over rendered views.
///
/// When full, the least recently used third is evicted in one go.
pub struct RenderCache {
    views: LruCache<RenderKey, Arc<RenderedView>>,
    capacity: usize,
    evictions: u64,
}

impl Default for RenderCache {
    fn default() -> Self {
        Self::new(DEFAULT_RENDER_CAPACITY)
    }
}

impl RenderCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            views: LruCache::unbounded(),
            capacity: capacity.max(1),
            evictions: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    pub fn get(&mut self, mode: SearchMode, query: &str, generation: Generation) -> Option<Arc<RenderedView>> {
        self.views
            .get(&(mode, query.to_string(), generation))
            .cloned()
    }

    pub fn put(&mut self, view: Arc<RenderedView>) {
        let key = (view.mode, view.query.clone(), view.generation);
        if !self.views.contains(&key) && self.views.len() >= self.capacity {
            self.evict_batch();
        }
        self.views.put(key, view);
    }

    /// Cached view for `set`, rendering it on a miss
    pub fn get_or_render(&mut self, catalog: &Catalog, set: &ResultSet) -> Arc<RenderedView> {
        if let Some(view) = self.get(set.mode, &set.query, set.generation) {
            return view;
        }
        let view = Arc::new(render(catalog, set));
        self.put(Arc::clone(&view));
        view
    }

    pub fn clear(&mut self) {
        self.views.clear();
    }

    fn evict_batch(&mut self) {
        let batch = self.capacity.div_ceil(3);
        for _ in 0..batch {
            if self.views.pop_lru().is_none() {
                break;
            }
            self.evictions += 1;
        }
    }
}

/// Format a result set into display rows.
///
/// Table mode lists one row per table; tables that surfaced through their
/// columns show "N matching columns". Column mode groups columns under a
/// header row per table, in first-appearance order.
pub fn render(catalog: &Catalog, set: &ResultSet) -> RenderedView {
    let rows = match set.mode {
        SearchMode::Tables => render_tables(catalog, set),
        SearchMode::Columns => render_columns(catalog, set),
    };

    let summary = match set.mode {
        SearchMode::Tables => format!("{} {}", set.len(), plural(set.len(), "table", "tables")),
        SearchMode::Columns => {
            let groups = rows.iter().filter(|r| r.kind == RowKind::GroupHeader).count();
            format!(
                "{} {} in {} {}",
                set.len(),
                plural(set.len(), "column", "columns"),
                groups,
                plural(groups, "table", "tables")
            )
        }
    };
    let summary = if set.truncated {
        format!("{} (truncated)", summary)
    } else {
        summary
    };

    RenderedView {
        mode: set.mode,
        query: set.query.clone(),
        generation: set.generation,
        rows,
        summary,
    }
}

fn render_tables(catalog: &Catalog, set: &ResultSet) -> Vec<RenderedRow> {
    let mut rows = Vec::with_capacity(set.len());
    for result in &set.results {
        let ItemRef::Table(id) = result.item else { continue };
        let Some(table) = catalog.table(id) else { continue };

        let detail = if result.match_kind == MatchKind::ColumnAggregate {
            matching_columns(result.matching_columns)
        } else {
            table.remarks().to_string()
        };
        rows.push(RenderedRow {
            kind: RowKind::Table,
            item_key: result.item_key.clone(),
            label: result.item_key.clone(),
            detail,
        });
    }
    rows
}

fn render_columns(catalog: &Catalog, set: &ResultSet) -> Vec<RenderedRow> {
    // Group in first-appearance order, keeping relevance order within a group
    let mut groups: Vec<(&str, Vec<usize>)> = Vec::new();
    for (i, result) in set.results.iter().enumerate() {
        match groups.iter_mut().find(|(key, _)| *key == result.table_key) {
            Some((_, members)) => members.push(i),
            None => groups.push((result.table_key.as_str(), vec![i])),
        }
    }

    let mut rows = Vec::with_capacity(set.len() + groups.len());
    for (table_key, members) in groups {
        rows.push(RenderedRow {
            kind: RowKind::GroupHeader,
            item_key: table_key.to_string(),
            label: table_key.to_string(),
            detail: matching_columns(members.len()),
        });

        for i in members {
            let result = &set.results[i];
            let ItemRef::Column(id) = result.item else { continue };
            let Some(column) = catalog.column(id) else { continue };

            let mut detail = column.type_display();
            if !column.nullable() {
                detail.push_str(" NOT NULL");
            }
            if !column.remarks().is_empty() {
                detail.push_str("  ");
                detail.push_str(column.remarks());
            }
            rows.push(RenderedRow {
                kind: RowKind::Column,
                item_key: result.item_key.clone(),
                label: column.name().to_string(),
                detail,
            });
        }
    }
    rows
}

fn matching_columns(n: usize) -> String {
    format!("{} matching {}", n, plural(n, "column", "columns"))
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 { one } else { many }
}
