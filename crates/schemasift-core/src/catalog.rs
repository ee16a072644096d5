use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::foreign_key::{ColumnHandle, ColumnRef, ForeignKey};
use crate::named::NamedObjectList;
use crate::snapshot::DatabaseSchema;
use crate::table::{Column, PlaceholderTable, Table, TableEntry, TableRef};
use crate::SCHEMA_VERSION;

/// Mutable schema graph: full tables plus any placeholder tables introduced by
/// foreign-key repair.
///
/// Foreign keys are stored by value on each endpoint table and point at their
/// columns through name-based [`ColumnRef`] handles, so endpoints are resolved
/// through this registry rather than followed as live pointers.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub engine: String,
    pub database: Option<String>,
    tables: NamedObjectList<Table>,
    placeholder_tables: NamedObjectList<PlaceholderTable>,
    #[serde(skip)]
    reduced: bool,
}

impl Catalog {
    pub fn new(engine: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            database: None,
            tables: NamedObjectList::new(),
            placeholder_tables: NamedObjectList::new(),
            reduced: false,
        }
    }

    /// Build the schema graph from a captured snapshot.
    ///
    /// This checks:
    /// - duplicate schemas/tables/columns
    /// - foreign key column counts
    /// - foreign key columns and referenced targets exist
    /// - duplicate foreign key qualified names
    pub fn from_schema(schema: &DatabaseSchema) -> Result<Self> {
        if schema.schema_version != SCHEMA_VERSION {
            tracing::warn!(
                event = "snapshot_version_mismatch",
                found = %schema.schema_version,
                expected = SCHEMA_VERSION
            );
        }

        let mut schema_names = BTreeSet::new();
        for db_schema in &schema.schemas {
            if !schema_names.insert(db_schema.name.as_deref()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate schema name: {}",
                    db_schema.name.as_deref().unwrap_or("<none>")
                )));
            }
        }

        let mut catalog = Catalog::new(schema.engine.clone());
        catalog.database = schema.database.clone();

        for db_schema in &schema.schemas {
            for table_def in &db_schema.tables {
                let table_ref = TableRef::new(db_schema.name.as_deref(), table_def.name.as_str());
                let mut table = Table::new(table_ref.clone());
                table.kind = table_def.kind.clone();
                table.remarks = table_def.remarks.clone();

                for column_def in &table_def.columns {
                    let mut column = Column::new(
                        table_ref.clone(),
                        column_def.name.as_str(),
                        column_def.column_type.clone(),
                    );
                    column.is_nullable = column_def.is_nullable;
                    column.remarks = column_def.remarks.clone();
                    if !table.add_column(column) {
                        return Err(Error::InvalidSchema(format!(
                            "duplicate column name: {}.{}",
                            table_ref, column_def.name
                        )));
                    }
                }

                catalog.add_table(table)?;
            }
        }

        for db_schema in &schema.schemas {
            for table_def in &db_schema.tables {
                let table_ref = TableRef::new(db_schema.name.as_deref(), table_def.name.as_str());
                for fk_def in &table_def.foreign_keys {
                    if fk_def.columns.is_empty()
                        || fk_def.columns.len() != fk_def.referenced_columns.len()
                    {
                        return Err(Error::InvalidSchema(format!(
                            "foreign key {}.{} has {} column(s) but {} referenced column(s)",
                            table_ref,
                            fk_def.name,
                            fk_def.columns.len(),
                            fk_def.referenced_columns.len()
                        )));
                    }

                    let referenced_schema = fk_def
                        .referenced_schema
                        .as_deref()
                        .or(db_schema.name.as_deref());
                    let referenced_ref =
                        TableRef::new(referenced_schema, fk_def.referenced_table.as_str());

                    let mut fk = ForeignKey::new(fk_def.name.as_str(), &table_ref)
                        .with_rules(fk_def.on_update, fk_def.on_delete);
                    fk.is_deferrable = fk_def.is_deferrable;
                    fk.initially_deferred = fk_def.initially_deferred;
                    for (column, referenced_column) in
                        fk_def.columns.iter().zip(&fk_def.referenced_columns)
                    {
                        fk.add_column_reference(
                            ColumnRef::new(table_ref.clone(), column.as_str()),
                            ColumnRef::new(referenced_ref.clone(), referenced_column.as_str()),
                        );
                    }

                    catalog.add_foreign_key(fk)?;
                }
            }
        }

        Ok(catalog)
    }

    /// Add a full table; table full names are unique.
    pub fn add_table(&mut self, table: Table) -> Result<()> {
        if self.tables.contains(table.full_name()) {
            return Err(Error::InvalidSchema(format!(
                "duplicate table name: {}",
                table.full_name()
            )));
        }
        self.tables.add(table);
        Ok(())
    }

    /// Attach a foreign key to both of its endpoint tables.
    ///
    /// Every column reference must connect the same two full tables through
    /// existing columns, and the key's qualified name must be new.
    pub fn add_foreign_key(&mut self, fk: ForeignKey) -> Result<()> {
        let (referencing, referenced) = match (fk.referencing_table(), fk.referenced_table()) {
            (Some(referencing), Some(referenced)) => (referencing.clone(), referenced.clone()),
            _ => {
                return Err(Error::InvalidSchema(format!(
                    "foreign key {} has no column references",
                    fk.full_name()
                )));
            }
        };

        if self
            .tables
            .iter()
            .any(|table| table.foreign_key(fk.full_name()).is_some())
        {
            return Err(Error::InvalidSchema(format!(
                "duplicate foreign key name: {}",
                fk.full_name()
            )));
        }

        for reference in fk.column_references() {
            for (handle, expected) in [
                (&reference.foreign_key_column, &referencing),
                (&reference.primary_key_column, &referenced),
            ] {
                let column = match handle {
                    ColumnHandle::Full(column) => column,
                    ColumnHandle::Placeholder(column) => {
                        return Err(Error::InvalidSchema(format!(
                            "foreign key {} cannot be added with placeholder column {}",
                            fk.full_name(),
                            column.full_name()
                        )));
                    }
                };
                if &column.table != expected {
                    return Err(Error::InvalidSchema(format!(
                        "foreign key {} spans more than two tables at {}",
                        fk.full_name(),
                        column.full_name()
                    )));
                }
                self.resolve_column(column).ok_or_else(|| {
                    if self.tables.contains(column.table.full_name()) {
                        Error::InvalidSchema(format!(
                            "foreign key column not found: {}",
                            column.full_name()
                        ))
                    } else {
                        Error::InvalidSchema(format!(
                            "referenced table not found: {}",
                            column.table
                        ))
                    }
                })?;
            }
        }

        if referencing != referenced {
            if let Some(table) = self.tables.get_mut(referenced.full_name()) {
                table.add_foreign_key(fk.clone());
            }
        }
        if let Some(table) = self.tables.get_mut(referencing.full_name()) {
            table.add_foreign_key(fk);
        }
        Ok(())
    }

    /// Look up a column of a full table through its handle.
    pub fn resolve_column(&self, column: &ColumnRef) -> Option<&Column> {
        self.tables
            .get(column.table.full_name())
            .and_then(|table| table.column(&column.name))
    }

    pub fn tables(&self) -> &NamedObjectList<Table> {
        &self.tables
    }

    pub fn table(&self, full_name: &str) -> Option<&Table> {
        self.tables.get(full_name)
    }

    pub fn table_mut(&mut self, full_name: &str) -> Option<&mut Table> {
        self.tables.get_mut(full_name)
    }

    pub fn contains_table(&self, full_name: &str) -> bool {
        self.tables.contains(full_name)
    }

    /// Remove a full table. Foreign keys pointing at it from other tables are
    /// left for the repair pass.
    pub fn remove_table(&mut self, full_name: &str) -> Option<Table> {
        self.tables.remove(full_name)
    }

    pub fn placeholder_tables(&self) -> &NamedObjectList<PlaceholderTable> {
        &self.placeholder_tables
    }

    pub fn placeholder_table(&self, full_name: &str) -> Option<&PlaceholderTable> {
        self.placeholder_tables.get(full_name)
    }

    /// Full tables followed by placeholder tables, each in insertion order.
    pub fn all_tables(&self) -> Vec<TableEntry<'_>> {
        self.tables
            .iter()
            .map(TableEntry::Full)
            .chain(self.placeholder_tables.iter().map(TableEntry::Placeholder))
            .collect()
    }

    /// Number of distinct foreign keys across full tables.
    pub fn foreign_key_count(&self) -> usize {
        let mut names = BTreeSet::new();
        for table in &self.tables {
            for fk in table.foreign_keys() {
                names.insert(fk.full_name());
            }
        }
        names.len()
    }

    pub fn is_reduced(&self) -> bool {
        self.reduced
    }

    pub(crate) fn mark_reduced(&mut self) {
        self.reduced = true;
    }

    pub(crate) fn parts_mut(
        &mut self,
    ) -> (
        &mut NamedObjectList<Table>,
        &mut NamedObjectList<PlaceholderTable>,
    ) {
        (&mut self.tables, &mut self.placeholder_tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ForeignKeyDef;
    use crate::snapshot::{ColumnDef, SchemaDef, TableDef, TableKind};
    use crate::types::ColumnType;

    fn column(name: &str) -> ColumnDef {
        ColumnDef {
            name: name.to_string(),
            column_type: ColumnType::named("int4"),
            is_nullable: false,
            remarks: None,
        }
    }

    fn fk(name: &str, column: &str, table: &str) -> ForeignKeyDef {
        ForeignKeyDef {
            name: name.to_string(),
            columns: vec![column.to_string()],
            referenced_schema: None,
            referenced_table: table.to_string(),
            referenced_columns: vec!["id".to_string()],
            on_update: Default::default(),
            on_delete: Default::default(),
            is_deferrable: false,
            initially_deferred: false,
        }
    }

    fn snapshot(tables: Vec<TableDef>) -> DatabaseSchema {
        DatabaseSchema {
            schema_version: "0.1".to_string(),
            engine: "postgres".to_string(),
            database: Some("db".to_string()),
            schemas: vec![SchemaDef {
                name: Some("public".to_string()),
                tables,
            }],
        }
    }

    fn table(name: &str, columns: Vec<ColumnDef>, foreign_keys: Vec<ForeignKeyDef>) -> TableDef {
        TableDef {
            name: name.to_string(),
            kind: TableKind::Table,
            remarks: None,
            columns,
            foreign_keys,
        }
    }

    #[test]
    fn attaches_foreign_keys_to_both_endpoints() {
        let schema = snapshot(vec![
            table(
                "orders",
                vec![column("id"), column("user_id")],
                vec![fk("fk_orders_user", "user_id", "users")],
            ),
            table("users", vec![column("id")], Vec::new()),
        ]);

        let catalog = Catalog::from_schema(&schema).expect("build catalog");
        let users = catalog.table("public.users").expect("users");
        let orders = catalog.table("public.orders").expect("orders");

        assert_eq!(users.exported_foreign_keys().count(), 1);
        assert_eq!(orders.imported_foreign_keys().count(), 1);
        assert_eq!(catalog.foreign_key_count(), 1);
    }

    #[test]
    fn self_reference_is_attached_once() {
        let schema = snapshot(vec![table(
            "employees",
            vec![column("id"), column("manager_id")],
            vec![fk("fk_manager", "manager_id", "employees")],
        )]);

        let catalog = Catalog::from_schema(&schema).expect("build catalog");
        let employees = catalog.table("public.employees").expect("employees");
        assert_eq!(employees.foreign_keys().len(), 1);
        assert_eq!(employees.exported_foreign_keys().count(), 1);
        assert_eq!(employees.imported_foreign_keys().count(), 1);
    }

    #[test]
    fn rejects_unknown_referenced_table() {
        let schema = snapshot(vec![table(
            "orders",
            vec![column("id"), column("user_id")],
            vec![fk("fk_orders_user", "user_id", "users")],
        )]);

        let err = Catalog::from_schema(&schema).unwrap_err();
        assert!(matches!(err, Error::InvalidSchema(message) if message.contains("public.users")));
    }

    #[test]
    fn rejects_duplicate_tables_and_columns() {
        let duplicate_tables = snapshot(vec![
            table("users", vec![column("id")], Vec::new()),
            table("users", vec![column("id")], Vec::new()),
        ]);
        assert!(Catalog::from_schema(&duplicate_tables).is_err());

        let duplicate_columns = snapshot(vec![table(
            "users",
            vec![column("id"), column("id")],
            Vec::new(),
        )]);
        assert!(Catalog::from_schema(&duplicate_columns).is_err());

        let mut duplicate_schemas = snapshot(vec![table("a", vec![column("id")], Vec::new())]);
        duplicate_schemas.schemas.push(SchemaDef {
            name: Some("public".to_string()),
            tables: vec![table("b", vec![column("id")], Vec::new())],
        });
        let Err(Error::InvalidSchema(message)) = Catalog::from_schema(&duplicate_schemas) else {
            panic!("expected an invalid schema error");
        };
        assert_eq!(message, "duplicate schema name: public");
    }

    fn orders_catalog() -> Catalog {
        let schema = snapshot(vec![
            table(
                "orders",
                vec![column("id"), column("user_id"), column("warehouse_id")],
                Vec::new(),
            ),
            table("users", vec![column("id")], Vec::new()),
            table("warehouses", vec![column("id")], Vec::new()),
        ]);
        Catalog::from_schema(&schema).expect("build catalog")
    }

    fn orders_user_key() -> ForeignKey {
        let orders = TableRef::new(Some("public"), "orders");
        let mut fk = ForeignKey::new("fk_orders_user", &orders);
        fk.add_column_reference(
            ColumnRef::new(orders, "user_id"),
            ColumnRef::new(TableRef::new(Some("public"), "users"), "id"),
        );
        fk
    }

    #[test]
    fn rejects_duplicate_foreign_key_names() {
        let mut catalog = orders_catalog();
        catalog.add_foreign_key(orders_user_key()).expect("first key");

        let err = catalog.add_foreign_key(orders_user_key()).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidSchema(message)
                if message == "duplicate foreign key name: public.orders.fk_orders_user"
        ));
        assert_eq!(catalog.foreign_key_count(), 1);
        let users = catalog.table("public.users").expect("users");
        assert_eq!(users.foreign_keys().len(), 1);
    }

    #[test]
    fn rejects_foreign_key_spanning_three_tables() {
        let mut catalog = orders_catalog();
        let orders = TableRef::new(Some("public"), "orders");
        let mut fk = orders_user_key();
        fk.add_column_reference(
            ColumnRef::new(orders, "warehouse_id"),
            ColumnRef::new(TableRef::new(Some("public"), "warehouses"), "id"),
        );

        let Err(Error::InvalidSchema(message)) = catalog.add_foreign_key(fk) else {
            panic!("expected an invalid schema error");
        };
        assert!(message.contains("spans more than two tables"));
        assert_eq!(catalog.foreign_key_count(), 0);
    }

    #[test]
    fn rejects_foreign_key_with_placeholder_endpoint() {
        let mut catalog = orders_catalog();
        let mut fk = orders_user_key();
        fk.column_references_mut()[0].primary_key_column.demote();

        let Err(Error::InvalidSchema(message)) = catalog.add_foreign_key(fk) else {
            panic!("expected an invalid schema error");
        };
        assert!(message.contains("placeholder column public.users.id"));
    }

    #[test]
    fn rejects_mismatched_column_counts() {
        let mut bad = fk("fk_orders_user", "user_id", "users");
        bad.referenced_columns.push("email".to_string());
        let schema = snapshot(vec![
            table("orders", vec![column("id"), column("user_id")], vec![bad]),
            table("users", vec![column("id"), column("email")], Vec::new()),
        ]);

        assert!(Catalog::from_schema(&schema).is_err());
    }
}
