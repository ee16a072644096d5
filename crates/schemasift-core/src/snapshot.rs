use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constraints::ForeignKeyDef;
use crate::types::ColumnType;

/// Top-level schema snapshot for a database, as produced by offline capture.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DatabaseSchema {
    /// Contract version for this snapshot format.
    pub schema_version: String,
    /// Database engine identifier (e.g. `postgres`).
    pub engine: String,
    /// Database name when available.
    #[serde(default)]
    pub database: Option<String>,
    /// Schemas captured from the database.
    pub schemas: Vec<SchemaDef>,
}

/// A namespace containing tables.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SchemaDef {
    /// Namespace name; `None` for engines without schemas.
    #[serde(default)]
    pub name: Option<String>,
    pub tables: Vec<TableDef>,
}

/// A table-like object and the foreign keys it declares.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TableDef {
    pub name: String,
    #[serde(default)]
    pub kind: TableKind,
    #[serde(default)]
    pub remarks: Option<String>,
    pub columns: Vec<ColumnDef>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyDef>,
}

/// Kind of table represented in the catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    #[default]
    Table,
    PartitionedTable,
    View,
    MaterializedView,
    ForeignTable,
    Other(String),
}

/// Column metadata for a table-like object.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    #[serde(default = "default_nullable")]
    pub is_nullable: bool,
    #[serde(default)]
    pub remarks: Option<String>,
}

fn default_nullable() -> bool {
    true
}
