//! Core contracts for schemasift.
//!
//! This crate defines the mutable schema graph, the table filters and the
//! reduction pass that trims a catalog to a selected subset of tables while
//! keeping every remaining foreign key resolvable.

pub mod catalog;
pub mod constraints;
pub mod error;
pub mod filter;
pub mod foreign_key;
pub mod named;
pub mod options;
pub mod reducer;
pub mod snapshot;
pub mod table;
pub mod types;

pub use catalog::Catalog;
pub use constraints::{FkAction, ForeignKeyDef};
pub use error::{Error, Result};
pub use filter::{ChainedTableFilter, InclusionRule, TableFilter, TableGrepFilter, TableNameFilter};
pub use foreign_key::{ColumnHandle, ColumnRef, ColumnReference, ForeignKey};
pub use named::{Named, NamedObjectList};
pub use options::{ReductionConfig, ReductionOptions};
pub use reducer::{DroppedForeignKey, ReductionReport, TablesReducer, include_related_tables};
pub use snapshot::{ColumnDef, DatabaseSchema, SchemaDef, TableDef, TableKind};
pub use table::{
    Column, PlaceholderColumn, PlaceholderTable, RelationshipType, Table, TableEntry, TableRef,
};
pub use types::ColumnType;

/// Current contract version for schema snapshot files.
pub const SCHEMA_VERSION: &str = "0.1";
