use std::io::Write;

use schemasift_core::{Catalog, ColumnHandle, ForeignKey, Table, TableEntry, TableKind};

use super::{CommandResult, Renderer};

/// How much of each table the text renderer prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailLevel {
    List,
    Schema,
    Details,
}

/// Plain-text rendering of a reduced catalog.
#[derive(Debug, Clone)]
pub struct SchemaTextRenderer {
    level: DetailLevel,
}

impl SchemaTextRenderer {
    pub fn new(level: DetailLevel) -> Self {
        Self { level }
    }

    fn render_entry(&self, entry: TableEntry<'_>, out: &mut dyn Write) -> CommandResult<()> {
        let label = match entry {
            TableEntry::Full(table) => kind_label(&table.kind),
            TableEntry::Placeholder(_) => "not shown",
        };
        writeln!(out, "{} [{label}]", entry.full_name())?;
        if self.level == DetailLevel::List {
            return Ok(());
        }

        match entry {
            TableEntry::Full(table) => self.render_columns(table, out)?,
            TableEntry::Placeholder(table) => {
                for column in table.columns() {
                    writeln!(out, "  {}", column.name)?;
                }
            }
        }

        let foreign_keys = entry.foreign_keys();
        if !foreign_keys.is_empty() {
            writeln!(out, "  foreign keys:")?;
            for fk in foreign_keys {
                self.render_foreign_key(fk, out)?;
            }
        }
        writeln!(out)?;
        Ok(())
    }

    fn render_columns(&self, table: &Table, out: &mut dyn Write) -> CommandResult<()> {
        if self.level == DetailLevel::Details {
            if let Some(remarks) = &table.remarks {
                writeln!(out, "  -- {remarks}")?;
            }
        }

        for column in table.columns() {
            match self.level {
                DetailLevel::Details => {
                    let nullable = if column.is_nullable { "" } else { " not null" };
                    write!(
                        out,
                        "  {:>3}  {}  {}{}",
                        column.ordinal_position,
                        column.name,
                        column.column_type.data_type,
                        nullable
                    )?;
                    match &column.remarks {
                        Some(remarks) => writeln!(out, "  -- {remarks}")?,
                        None => writeln!(out)?,
                    }
                }
                _ => writeln!(out, "  {}  {}", column.name, column.column_type.data_type)?,
            }
        }
        Ok(())
    }

    fn render_foreign_key(&self, fk: &ForeignKey, out: &mut dyn Write) -> CommandResult<()> {
        writeln!(out, "    {}", fk.name())?;
        for reference in fk.column_references() {
            writeln!(
                out,
                "      {} --> {}",
                endpoint(&reference.foreign_key_column),
                endpoint(&reference.primary_key_column)
            )?;
        }
        if self.level == DetailLevel::Details {
            writeln!(
                out,
                "      on update {}, on delete {}",
                fk.on_update.as_sql(),
                fk.on_delete.as_sql()
            )?;
        }
        Ok(())
    }
}

fn endpoint(handle: &ColumnHandle) -> String {
    match handle {
        ColumnHandle::Full(column) => column.full_name(),
        ColumnHandle::Placeholder(column) => format!("{} (not shown)", column.full_name()),
    }
}

fn kind_label(kind: &TableKind) -> &str {
    match kind {
        TableKind::Table => "table",
        TableKind::PartitionedTable => "partitioned table",
        TableKind::View => "view",
        TableKind::MaterializedView => "materialized view",
        TableKind::ForeignTable => "foreign table",
        TableKind::Other(other) => other.as_str(),
    }
}

impl Renderer for SchemaTextRenderer {
    fn extension(&self) -> &'static str {
        "txt"
    }

    fn render(&self, catalog: &Catalog, out: &mut dyn Write) -> CommandResult<()> {
        if let Some(database) = &catalog.database {
            writeln!(out, "database: {database} ({})", catalog.engine)?;
            writeln!(out)?;
        }
        for entry in catalog.all_tables() {
            self.render_entry(entry, out)?;
        }
        Ok(())
    }
}
