use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a table in the catalog's load order
pub type TableId = u32;

/// Position of a column in the catalog's flat column list
pub type ColumnId = u32;

/// A table as returned by the catalog backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntity {
    pub schema: String,
    pub name: String,
    #[serde(default)]
    pub remarks: String,
}

impl TableEntity {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            remarks: String::new(),
        }
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = remarks.into();
        self
    }

    /// `SCHEMA.NAME`
    pub fn key(&self) -> String {
        table_key(&self.schema, &self.name)
    }
}

/// A column as returned by the catalog backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnEntity {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub type_name: String,
    #[serde(default)]
    pub length: Option<i64>,
    #[serde(default)]
    pub scale: Option<i64>,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub remarks: String,
}

fn default_nullable() -> bool {
    true
}

impl ColumnEntity {
    pub fn new(
        schema: impl Into<String>,
        table: impl Into<String>,
        name: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            name: name.into(),
            type_name: type_name.into(),
            length: None,
            scale: None,
            nullable: true,
            remarks: String::new(),
        }
    }

    /// `SCHEMA.TABLE.NAME`
    pub fn key(&self) -> String {
        column_key(&self.schema, &self.table, &self.name)
    }

    /// Key of the owning table
    pub fn table_key(&self) -> String {
        table_key(&self.schema, &self.table)
    }
}

pub fn table_key(schema: &str, name: &str) -> String {
    format!("{}.{}", schema, name)
}

pub fn column_key(schema: &str, table: &str, name: &str) -> String {
    format!("{}.{}.{}", schema, table, name)
}

/// What the user is searching for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Tables,
    Columns,
}

impl SearchMode {
    pub fn toggled(self) -> Self {
        match self {
            SearchMode::Tables => SearchMode::Columns,
            SearchMode::Columns => SearchMode::Tables,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SearchMode::Tables => "tables",
            SearchMode::Columns => "columns",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Version of the catalog contents.
///
/// Bumped exactly once per successful load batch. Anything computed against
/// an older generation must not be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// How a generation bump changed the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpKind {
    /// New entities were appended; existing ones stay valid
    Additive,
    /// The catalog was discarded (filter changed)
    Reset,
}
