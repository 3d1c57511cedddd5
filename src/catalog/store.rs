use crate::catalog::arena::{StringArena, Sym};
use crate::catalog::types::{column_key, table_key, ColumnEntity, ColumnId, TableEntity, TableId};
use rustc_hash::FxHashMap;
use std::ops::Range;

#[derive(Debug, Clone)]
struct TableRecord {
    schema: Sym,
    name: Sym,
    remarks: Sym,
    columns: Vec<ColumnId>,
}

#[derive(Debug, Clone)]
struct ColumnRecord {
    schema: Sym,
    table: Sym,
    name: Sym,
    type_name: Sym,
    length: Option<i64>,
    scale: Option<i64>,
    nullable: bool,
    remarks: Sym,
    /// Owning table, if it has been loaded
    table_id: Option<TableId>,
}

/// Ids assigned by one [`Catalog::append`] call
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Appended {
    pub tables: Range<TableId>,
    pub columns: Range<ColumnId>,
}

impl Appended {
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// Loaded tables and columns, in fetch order.
///
/// All strings live in the catalog's own arena; records only hold handles.
#[derive(Debug, Default)]
pub struct Catalog {
    arena: StringArena,
    tables: Vec<TableRecord>,
    columns: Vec<ColumnRecord>,
    table_lookup: FxHashMap<String, TableId>,
    /// Columns seen before their table arrived, by table key
    orphans: FxHashMap<String, Vec<ColumnId>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.columns.is_empty()
    }

    /// Append a fetched page. Tables already present (same identity key) are skipped.
    pub fn append(&mut self, tables: Vec<TableEntity>, columns: Vec<ColumnEntity>) -> Appended {
        let first_table = self.tables.len() as TableId;
        let first_column = self.columns.len() as ColumnId;

        for table in tables {
            let key = table.key();
            if self.table_lookup.contains_key(&key) {
                continue;
            }
            let id = self.tables.len() as TableId;
            let record = TableRecord {
                schema: self.arena.intern(&table.schema),
                name: self.arena.intern(&table.name),
                remarks: self.arena.intern(&table.remarks),
                columns: self.orphans.remove(&key).unwrap_or_default(),
            };
            for &column in &record.columns {
                self.columns[column as usize].table_id = Some(id);
            }
            self.tables.push(record);
            self.table_lookup.insert(key, id);
        }

        for column in columns {
            let id = self.columns.len() as ColumnId;
            let owner = column.table_key();
            let table_id = self.table_lookup.get(&owner).copied();
            let record = ColumnRecord {
                schema: self.arena.intern(&column.schema),
                table: self.arena.intern(&column.table),
                name: self.arena.intern(&column.name),
                type_name: self.arena.intern(&column.type_name),
                length: column.length,
                scale: column.scale,
                nullable: column.nullable,
                remarks: self.arena.intern(&column.remarks),
                table_id,
            };
            self.columns.push(record);
            match table_id {
                Some(table_id) => self.tables[table_id as usize].columns.push(id),
                None => self.orphans.entry(owner).or_default().push(id),
            }
        }

        Appended {
            tables: first_table..self.tables.len() as TableId,
            columns: first_column..self.columns.len() as ColumnId,
        }
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.tables.clear();
        self.columns.clear();
        self.table_lookup.clear();
        self.orphans.clear();
    }

    pub fn table(&self, id: TableId) -> Option<TableRef<'_>> {
        ((id as usize) < self.tables.len()).then_some(TableRef { catalog: self, id })
    }

    pub fn column(&self, id: ColumnId) -> Option<ColumnRef<'_>> {
        ((id as usize) < self.columns.len()).then_some(ColumnRef { catalog: self, id })
    }

    pub fn table_id(&self, key: &str) -> Option<TableId> {
        self.table_lookup.get(key).copied()
    }

    pub fn tables(&self) -> impl Iterator<Item = TableRef<'_>> + '_ {
        (0..self.tables.len() as TableId).map(move |id| TableRef { catalog: self, id })
    }

    pub fn columns(&self) -> impl Iterator<Item = ColumnRef<'_>> + '_ {
        (0..self.columns.len() as ColumnId).map(move |id| ColumnRef { catalog: self, id })
    }

    /// Distinct strings held by the arena
    pub fn interned_strings(&self) -> usize {
        self.arena.len()
    }
}

/// Borrowed view of one table
#[derive(Clone, Copy)]
pub struct TableRef<'a> {
    catalog: &'a Catalog,
    id: TableId,
}

impl<'a> TableRef<'a> {
    fn record(&self) -> &'a TableRecord {
        &self.catalog.tables[self.id as usize]
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn schema(&self) -> &'a str {
        self.catalog.arena.resolve(self.record().schema)
    }

    pub fn name(&self) -> &'a str {
        self.catalog.arena.resolve(self.record().name)
    }

    pub fn remarks(&self) -> &'a str {
        self.catalog.arena.resolve(self.record().remarks)
    }

    pub fn key(&self) -> String {
        table_key(self.schema(), self.name())
    }

    pub fn columns(&self) -> impl Iterator<Item = ColumnRef<'a>> + 'a {
        let catalog = self.catalog;
        self.record()
            .columns
            .iter()
            .map(move |&id| ColumnRef { catalog, id })
    }

    pub fn column_count(&self) -> usize {
        self.record().columns.len()
    }

    pub fn to_entity(&self) -> TableEntity {
        TableEntity::new(self.schema(), self.name()).with_remarks(self.remarks())
    }
}

/// Borrowed view of one column
#[derive(Clone, Copy)]
pub struct ColumnRef<'a> {
    catalog: &'a Catalog,
    id: ColumnId,
}

impl<'a> ColumnRef<'a> {
    fn record(&self) -> &'a ColumnRecord {
        &self.catalog.columns[self.id as usize]
    }

    fn resolve(&self, sym: Sym) -> &'a str {
        self.catalog.arena.resolve(sym)
    }

    pub fn id(&self) -> ColumnId {
        self.id
    }

    pub fn schema(&self) -> &'a str {
        self.resolve(self.record().schema)
    }

    pub fn table(&self) -> &'a str {
        self.resolve(self.record().table)
    }

    pub fn name(&self) -> &'a str {
        self.resolve(self.record().name)
    }

    pub fn type_name(&self) -> &'a str {
        self.resolve(self.record().type_name)
    }

    pub fn remarks(&self) -> &'a str {
        self.resolve(self.record().remarks)
    }

    pub fn length(&self) -> Option<i64> {
        self.record().length
    }

    pub fn scale(&self) -> Option<i64> {
        self.record().scale
    }

    pub fn nullable(&self) -> bool {
        self.record().nullable
    }

    pub fn table_id(&self) -> Option<TableId> {
        self.record().table_id
    }

    pub fn key(&self) -> String {
        column_key(self.schema(), self.table(), self.name())
    }

    pub fn table_key(&self) -> String {
        table_key(self.schema(), self.table())
    }

    /// `VARCHAR(64)`, `DECIMAL(10,2)` or the bare type name
    pub fn type_display(&self) -> String {
        match (self.length(), self.scale()) {
            (Some(len), Some(scale)) if scale > 0 => {
                format!("{}({},{})", self.type_name(), len, scale)
            }
            (Some(len), _) => format!("{}({})", self.type_name(), len),
            _ => self.type_name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Vec<TableEntity>, Vec<ColumnEntity>) {
        let tables = vec![
            TableEntity::new("TEST", "USERS").with_remarks("registered users"),
            TableEntity::new("TEST", "ORDERS"),
        ];
        let mut amount = ColumnEntity::new("TEST", "ORDERS", "AMOUNT", "DECIMAL");
        amount.length = Some(10);
        amount.scale = Some(2);
        let columns = vec![
            ColumnEntity::new("TEST", "USERS", "ID", "INTEGER"),
            ColumnEntity::new("TEST", "ORDERS", "ID", "INTEGER"),
            amount,
        ];
        (tables, columns)
    }

    #[test]
    fn test_append_assigns_sequential_ids() {
        let mut catalog = Catalog::new();
        let (tables, columns) = sample();
        let appended = catalog.append(tables, columns);

        assert_eq!(appended.tables, 0..2);
        assert_eq!(appended.columns, 0..3);
        assert_eq!(catalog.table(0).unwrap().key(), "TEST.USERS");
        assert_eq!(catalog.table(1).unwrap().column_count(), 2);
        assert_eq!(catalog.table(0).unwrap().remarks(), "registered users");
    }

    #[test]
    fn test_append_skips_duplicate_tables() {
        let mut catalog = Catalog::new();
        catalog.append(vec![TableEntity::new("TEST", "USERS")], vec![]);
        let appended = catalog.append(vec![TableEntity::new("TEST", "USERS")], vec![]);

        assert_eq!(appended.table_count(), 0);
        assert_eq!(catalog.table_count(), 1);
    }

    #[test]
    fn test_orphan_columns_attach_later() {
        let mut catalog = Catalog::new();
        catalog.append(vec![], vec![ColumnEntity::new("S", "LATE", "X", "INT")]);
        assert_eq!(catalog.column(0).unwrap().table_id(), None);

        catalog.append(vec![TableEntity::new("S", "LATE")], vec![]);
        let table = catalog.table(0).unwrap();
        assert_eq!(table.column_count(), 1);
        assert_eq!(catalog.column(0).unwrap().table_id(), Some(0));
    }

    #[test]
    fn test_type_display() {
        let mut catalog = Catalog::new();
        let (tables, columns) = sample();
        catalog.append(tables, columns);

        assert_eq!(catalog.column(0).unwrap().type_display(), "INTEGER");
        assert_eq!(catalog.column(2).unwrap().type_display(), "DECIMAL(10,2)");
    }

    #[test]
    fn test_strings_are_interned() {
        let mut catalog = Catalog::new();
        let (tables, columns) = sample();
        catalog.append(tables, columns);

        // TEST, USERS, "registered users", ORDERS, "", ID, INTEGER, AMOUNT, DECIMAL
        assert_eq!(catalog.interned_strings(), 9);
        assert!(catalog.column(5).is_none());
    }
}
