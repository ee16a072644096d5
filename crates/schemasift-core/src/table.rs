use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::foreign_key::{ColumnHandle, ForeignKey};
use crate::named::{Named, NamedObjectList};
use crate::snapshot::TableKind;
use crate::types::ColumnType;

/// Weak, name-only reference to a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TableRef {
    schema: Option<String>,
    name: String,
    #[serde(skip)]
    full_name: String,
}

impl TableRef {
    pub fn new<S: Into<String>>(schema: Option<S>, name: impl Into<String>) -> Self {
        let schema = schema.map(Into::into);
        let name = name.into();
        let full_name = match &schema {
            Some(schema) => format!("{schema}.{name}"),
            None => name.clone(),
        };
        Self {
            schema,
            name,
            full_name,
        }
    }

    /// Reference to a table outside any schema.
    pub fn unqualified(name: impl Into<String>) -> Self {
        Self::new(None::<String>, name)
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `schema.name`, or just `name` when there is no schema.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

/// Direction of a foreign-key hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    /// Tables whose foreign keys reference this table.
    Child,
    /// Tables referenced by this table's foreign keys.
    Parent,
}

/// Column of a full table.
#[derive(Debug, Clone, Serialize)]
pub struct Column {
    pub name: String,
    pub ordinal_position: usize,
    pub column_type: ColumnType,
    pub is_nullable: bool,
    pub remarks: Option<String>,
    /// Owning table.
    pub parent: TableRef,
}

impl Column {
    pub fn new(parent: TableRef, name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            ordinal_position: 0,
            column_type,
            is_nullable: true,
            remarks: None,
            parent,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}.{}", self.parent.full_name(), self.name)
    }
}

impl Named for Column {
    fn lookup_key(&self) -> &str {
        &self.name
    }
}

/// A fully populated table owned by the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct Table {
    #[serde(rename = "table")]
    table_ref: TableRef,
    full_name: String,
    pub kind: TableKind,
    pub remarks: Option<String>,
    columns: NamedObjectList<Column>,
    foreign_keys: NamedObjectList<ForeignKey>,
}

impl Table {
    pub fn new(table_ref: TableRef) -> Self {
        Self {
            full_name: table_ref.full_name().to_string(),
            table_ref,
            kind: TableKind::Table,
            remarks: None,
            columns: NamedObjectList::new(),
            foreign_keys: NamedObjectList::new(),
        }
    }

    pub fn table_ref(&self) -> &TableRef {
        &self.table_ref
    }

    pub fn name(&self) -> &str {
        self.table_ref.name()
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn columns(&self) -> &NamedObjectList<Column> {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Add a column; ordinal positions follow insertion order.
    ///
    /// Returns `false` when a column with the same name already exists.
    pub fn add_column(&mut self, mut column: Column) -> bool {
        if self.columns.contains(&column.name) {
            return false;
        }
        column.ordinal_position = self.columns.len() + 1;
        column.parent = self.table_ref.clone();
        self.columns.add(column);
        true
    }

    /// All foreign keys this table takes part in, on either side.
    pub fn foreign_keys(&self) -> &NamedObjectList<ForeignKey> {
        &self.foreign_keys
    }

    pub fn foreign_key(&self, full_name: &str) -> Option<&ForeignKey> {
        self.foreign_keys.get(full_name)
    }

    /// Keys where this table holds the referenced (parent) side.
    pub fn exported_foreign_keys(&self) -> impl Iterator<Item = &ForeignKey> + '_ {
        self.foreign_keys
            .iter()
            .filter(|fk| fk.is_exported_from(&self.table_ref))
    }

    /// Keys where this table holds the referencing (child) side.
    pub fn imported_foreign_keys(&self) -> impl Iterator<Item = &ForeignKey> + '_ {
        self.foreign_keys
            .iter()
            .filter(|fk| fk.is_imported_into(&self.table_ref))
    }

    /// Full tables one foreign-key hop away in the given direction.
    ///
    /// Placeholder endpoints are not relationships to follow.
    pub fn related_tables(&self, relationship: RelationshipType) -> BTreeSet<TableRef> {
        let mut related = BTreeSet::new();
        match relationship {
            RelationshipType::Child => {
                for fk in self.exported_foreign_keys() {
                    for reference in fk.column_references() {
                        if let ColumnHandle::Full(column) = &reference.foreign_key_column {
                            related.insert(column.table.clone());
                        }
                    }
                }
            }
            RelationshipType::Parent => {
                for fk in self.imported_foreign_keys() {
                    for reference in fk.column_references() {
                        if let ColumnHandle::Full(column) = &reference.primary_key_column {
                            related.insert(column.table.clone());
                        }
                    }
                }
            }
        }
        related
    }

    pub(crate) fn add_foreign_key(&mut self, fk: ForeignKey) {
        self.foreign_keys.add(fk);
    }

    pub(crate) fn foreign_keys_mut(&mut self) -> &mut NamedObjectList<ForeignKey> {
        &mut self.foreign_keys
    }

    /// Remove a foreign key from this table by qualified name.
    pub fn remove_foreign_key(&mut self, full_name: &str) -> Option<ForeignKey> {
        self.foreign_keys.remove(full_name)
    }
}

impl Named for Table {
    fn lookup_key(&self) -> &str {
        &self.full_name
    }
}

/// Identity-only stand-in for a column of a table outside the reduced set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceholderColumn {
    pub name: String,
    pub parent: TableRef,
}

impl PlaceholderColumn {
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.parent.full_name(), self.name)
    }
}

impl Named for PlaceholderColumn {
    fn lookup_key(&self) -> &str {
        &self.name
    }
}

/// Identity-only stand-in for a table outside the reduced set, kept so that
/// surviving foreign keys can still name it.
#[derive(Debug, Clone, Serialize)]
pub struct PlaceholderTable {
    #[serde(rename = "table")]
    table_ref: TableRef,
    full_name: String,
    columns: NamedObjectList<PlaceholderColumn>,
    foreign_keys: NamedObjectList<ForeignKey>,
}

impl PlaceholderTable {
    pub fn new(table_ref: TableRef) -> Self {
        Self {
            full_name: table_ref.full_name().to_string(),
            table_ref,
            columns: NamedObjectList::new(),
            foreign_keys: NamedObjectList::new(),
        }
    }

    pub fn table_ref(&self) -> &TableRef {
        &self.table_ref
    }

    pub fn name(&self) -> &str {
        self.table_ref.name()
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn columns(&self) -> &NamedObjectList<PlaceholderColumn> {
        &self.columns
    }

    pub fn foreign_keys(&self) -> &NamedObjectList<ForeignKey> {
        &self.foreign_keys
    }

    pub(crate) fn add_column(&mut self, name: &str) {
        if !self.columns.contains(name) {
            self.columns.add(PlaceholderColumn {
                name: name.to_string(),
                parent: self.table_ref.clone(),
            });
        }
    }

    pub(crate) fn add_foreign_key(&mut self, fk: ForeignKey) {
        self.foreign_keys.add(fk);
    }
}

impl Named for PlaceholderTable {
    fn lookup_key(&self) -> &str {
        &self.full_name
    }
}

/// Borrowed view over either kind of table in a catalog.
#[derive(Debug, Clone, Copy)]
pub enum TableEntry<'a> {
    Full(&'a Table),
    Placeholder(&'a PlaceholderTable),
}

impl<'a> TableEntry<'a> {
    pub fn full_name(&self) -> &'a str {
        match *self {
            TableEntry::Full(table) => table.full_name(),
            TableEntry::Placeholder(table) => table.full_name(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, TableEntry::Placeholder(_))
    }

    pub fn foreign_keys(&self) -> &'a NamedObjectList<ForeignKey> {
        match *self {
            TableEntry::Full(table) => table.foreign_keys(),
            TableEntry::Placeholder(table) => table.foreign_keys(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foreign_key::ColumnRef;

    fn table(name: &str, columns: &[&str]) -> Table {
        let mut table = Table::new(TableRef::new(Some("public"), name));
        for column in columns {
            table.add_column(Column::new(
                table.table_ref().clone(),
                *column,
                ColumnType::named("int4"),
            ));
        }
        table
    }

    #[test]
    fn columns_get_ordinals_and_reject_duplicates() {
        let mut users = table("users", &["id", "email"]);
        assert!(!users.add_column(Column::new(
            users.table_ref().clone(),
            "id",
            ColumnType::named("int4"),
        )));

        let email = users.column("email").expect("email column");
        assert_eq!(email.ordinal_position, 2);
        assert_eq!(email.full_name(), "public.users.email");
    }

    #[test]
    fn related_tables_follow_direction() {
        let mut users = table("users", &["id"]);
        let orders = table("orders", &["id", "user_id"]);

        let mut fk = ForeignKey::new("fk_orders_user", orders.table_ref());
        fk.add_column_reference(
            ColumnRef::new(orders.table_ref().clone(), "user_id"),
            ColumnRef::new(users.table_ref().clone(), "id"),
        );
        users.add_foreign_key(fk);

        let children = users.related_tables(RelationshipType::Child);
        assert_eq!(children.len(), 1);
        assert!(children.contains(orders.table_ref()));
        assert!(users.related_tables(RelationshipType::Parent).is_empty());
        assert_eq!(users.exported_foreign_keys().count(), 1);
        assert_eq!(users.imported_foreign_keys().count(), 0);
    }
}
