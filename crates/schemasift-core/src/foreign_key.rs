use serde::Serialize;

use crate::constraints::FkAction;
use crate::named::Named;
use crate::table::TableRef;

/// Name-based handle to a column: owning table plus column name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ColumnRef {
    pub table: TableRef,
    pub name: String,
}

impl ColumnRef {
    pub fn new(table: TableRef, name: impl Into<String>) -> Self {
        Self {
            table,
            name: name.into(),
        }
    }

    /// Fully qualified column name, `<table full name>.<column>`.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.table.full_name(), self.name)
    }
}

/// Endpoint of a column reference, tagged by whether its table is still a full
/// member of the catalog or only survives as a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "column", rename_all = "snake_case")]
pub enum ColumnHandle {
    Full(ColumnRef),
    Placeholder(ColumnRef),
}

impl ColumnHandle {
    pub fn column(&self) -> &ColumnRef {
        match self {
            ColumnHandle::Full(column) | ColumnHandle::Placeholder(column) => column,
        }
    }

    pub fn table(&self) -> &TableRef {
        &self.column().table
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, ColumnHandle::Placeholder(_))
    }

    /// Turn this endpoint into a placeholder, keeping its identity.
    pub(crate) fn demote(&mut self) {
        if let ColumnHandle::Full(column) = self {
            *self = ColumnHandle::Placeholder(column.clone());
        }
    }
}

/// One `(foreign key column, referenced column)` pair of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnReference {
    pub key_sequence: usize,
    pub foreign_key_column: ColumnHandle,
    pub primary_key_column: ColumnHandle,
}

/// Foreign key with ordered column references.
///
/// The qualified name is `<referencing table full name>.<name>` and is unique
/// within a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKey {
    name: String,
    full_name: String,
    column_references: Vec<ColumnReference>,
    pub on_update: FkAction,
    pub on_delete: FkAction,
    pub is_deferrable: bool,
    pub initially_deferred: bool,
}

impl ForeignKey {
    /// Create an empty foreign key declared on `referencing_table`.
    pub fn new(name: impl Into<String>, referencing_table: &TableRef) -> Self {
        let name = name.into();
        let full_name = format!("{}.{}", referencing_table.full_name(), name);
        Self {
            name,
            full_name,
            column_references: Vec::new(),
            on_update: FkAction::NoAction,
            on_delete: FkAction::NoAction,
            is_deferrable: false,
            initially_deferred: false,
        }
    }

    pub fn with_rules(mut self, on_update: FkAction, on_delete: FkAction) -> Self {
        self.on_update = on_update;
        self.on_delete = on_delete;
        self
    }

    /// Append a column pair; key sequence numbers start at 1.
    pub fn add_column_reference(
        &mut self,
        foreign_key_column: ColumnRef,
        primary_key_column: ColumnRef,
    ) {
        let key_sequence = self.column_references.len() + 1;
        self.column_references.push(ColumnReference {
            key_sequence,
            foreign_key_column: ColumnHandle::Full(foreign_key_column),
            primary_key_column: ColumnHandle::Full(primary_key_column),
        });
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn column_references(&self) -> &[ColumnReference] {
        &self.column_references
    }

    pub(crate) fn column_references_mut(&mut self) -> &mut [ColumnReference] {
        &mut self.column_references
    }

    /// Table holding the foreign key columns.
    pub fn referencing_table(&self) -> Option<&TableRef> {
        self.column_references
            .first()
            .map(|reference| reference.foreign_key_column.table())
    }

    /// Table holding the referenced key columns.
    pub fn referenced_table(&self) -> Option<&TableRef> {
        self.column_references
            .first()
            .map(|reference| reference.primary_key_column.table())
    }

    /// True when this key references `table` (the table is on the parent side).
    pub fn is_exported_from(&self, table: &TableRef) -> bool {
        self.column_references
            .iter()
            .any(|reference| reference.primary_key_column.table() == table)
    }

    /// True when `table` holds this key's columns (the table is on the child side).
    pub fn is_imported_into(&self, table: &TableRef) -> bool {
        self.column_references
            .iter()
            .any(|reference| reference.foreign_key_column.table() == table)
    }

    /// True when any endpoint has been replaced by a placeholder.
    pub fn has_placeholder_endpoint(&self) -> bool {
        self.column_references.iter().any(|reference| {
            reference.foreign_key_column.is_placeholder()
                || reference.primary_key_column.is_placeholder()
        })
    }
}

impl Named for ForeignKey {
    fn lookup_key(&self) -> &str {
        &self.full_name
    }
}
