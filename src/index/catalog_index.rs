use crate::catalog::store::{Appended, Catalog};
use crate::catalog::types::{ColumnId, Generation, TableId};
use crate::error::SearchError;
use crate::index::trie::{TrieIndex, TrieStats};
use crate::utils::tokenizer::field_tokens;

/// Token tries for both search modes, kept in step with a [`Catalog`].
///
/// Tables are indexed by name, schema and remarks; columns by name, owning
/// table and remarks. Indexing is additive: new pages are appended without
/// touching existing entries, and a reset requires [`CatalogIndex::rebuild`].
#[derive(Debug, Default)]
pub struct CatalogIndex {
    tables: TrieIndex<TableId>,
    columns: TrieIndex<ColumnId>,
    indexed_tables: usize,
    indexed_columns: usize,
    generation: Generation,
}

impl CatalogIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tables(&self) -> &TrieIndex<TableId> {
        &self.tables
    }

    pub fn columns(&self) -> &TrieIndex<ColumnId> {
        &self.columns
    }

    /// Generation of the catalog this index was last brought up to date with
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn indexed_tables(&self) -> usize {
        self.indexed_tables
    }

    pub fn indexed_columns(&self) -> usize {
        self.indexed_columns
    }

    /// Index the entities of one appended page
    pub fn index_appended(&mut self, catalog: &Catalog, appended: &Appended, generation: Generation) {
        for id in appended.tables.clone() {
            let Some(table) = catalog.table(id) else { continue };
            for field in [table.name(), table.schema(), table.remarks()] {
                for token in field_tokens(field) {
                    self.tables.insert(token, id);
                }
            }
            self.indexed_tables += 1;
        }

        for id in appended.columns.clone() {
            let Some(column) = catalog.column(id) else { continue };
            for field in [column.name(), column.table(), column.remarks()] {
                for token in field_tokens(field) {
                    self.columns.insert(token, id);
                }
            }
            self.indexed_columns += 1;
        }

        self.generation = generation;
    }

    /// Throw everything away and index the whole catalog
    pub fn rebuild(&mut self, catalog: &Catalog, generation: Generation) {
        self.clear();
        let all = Appended {
            tables: 0..catalog.table_count() as TableId,
            columns: 0..catalog.column_count() as ColumnId,
        };
        self.index_appended(catalog, &all, generation);
        tracing::debug!(
            %generation,
            tables = self.indexed_tables,
            columns = self.indexed_columns,
            "index rebuilt"
        );
    }

    pub fn clear(&mut self) {
        self.tables.clear();
        self.columns.clear();
        self.indexed_tables = 0;
        self.indexed_columns = 0;
    }

    /// Check that the index covers exactly the catalog's entities
    pub fn verify(&self, catalog: &Catalog) -> Result<(), SearchError> {
        if self.indexed_tables != catalog.table_count() {
            return Err(SearchError::IndexCorruption {
                reason: format!(
                    "{} tables indexed, catalog holds {}",
                    self.indexed_tables,
                    catalog.table_count()
                ),
            });
        }
        if self.indexed_columns != catalog.column_count() {
            return Err(SearchError::IndexCorruption {
                reason: format!(
                    "{} columns indexed, catalog holds {}",
                    self.indexed_columns,
                    catalog.column_count()
                ),
            });
        }
        Ok(())
    }

    pub fn stats(&self) -> (TrieStats, TrieStats) {
        (self.tables.stats(), self.columns.stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::{ColumnEntity, TableEntity};

    fn catalog() -> (Catalog, Appended) {
        let mut catalog = Catalog::new();
        let appended = catalog.append(
            vec![
                TableEntity::new("TEST", "ORDER_ITEMS").with_remarks("line items per order"),
                TableEntity::new("TEST", "USERS"),
            ],
            vec![ColumnEntity::new("TEST", "USERS", "EMAIL_ADDRESS", "VARCHAR")],
        );
        (catalog, appended)
    }

    #[test]
    fn test_indexes_every_field_word() {
        let (catalog, appended) = catalog();
        let mut index = CatalogIndex::new();
        index.index_appended(&catalog, &appended, Generation(1));

        assert!(index.tables().search_prefix("item").contains(&0));
        assert!(index.tables().search_prefix("line").contains(&0));
        assert_eq!(index.tables().search_prefix("test").len(), 2);
        assert!(index.columns().search_prefix("addr").contains(&0));
        assert!(index.columns().search_prefix("users").contains(&0));
        assert_eq!(index.generation(), Generation(1));
    }

    #[test]
    fn test_incremental_append_is_additive() {
        let (mut catalog, appended) = catalog();
        let mut index = CatalogIndex::new();
        index.index_appended(&catalog, &appended, Generation(1));

        let more = catalog.append(vec![TableEntity::new("TEST", "ORDERS")], vec![]);
        index.index_appended(&catalog, &more, Generation(2));

        assert_eq!(index.tables().search_prefix("order").len(), 2);
        assert!(index.verify(&catalog).is_ok());
    }

    #[test]
    fn test_verify_detects_gap_and_rebuild_fixes_it() {
        let (mut catalog, appended) = catalog();
        let mut index = CatalogIndex::new();
        index.index_appended(&catalog, &appended, Generation(1));

        catalog.append(vec![TableEntity::new("TEST", "ORDERS")], vec![]);
        assert!(matches!(
            index.verify(&catalog),
            Err(SearchError::IndexCorruption { .. })
        ));

        index.rebuild(&catalog, Generation(2));
        assert!(index.verify(&catalog).is_ok());
        assert!(index.tables().search_prefix("orders").contains(&2));
    }
}
