use std::collections::BTreeSet;

use serde::Serialize;

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::filter::TableFilter;
use crate::foreign_key::{ColumnHandle, ForeignKey};
use crate::named::NamedObjectList;
use crate::options::ReductionOptions;
use crate::table::{PlaceholderTable, RelationshipType, Table, TableRef};

/// Outcome of a reduction pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReductionReport {
    /// Tables matched directly by the filter chain.
    pub seed_tables: Vec<String>,
    /// Tables kept after relationship expansion.
    pub retained_tables: Vec<String>,
    pub removed_tables: Vec<String>,
    /// Foreign keys dropped in strict mode, as `(table, foreign key)`.
    pub dropped_foreign_keys: Vec<DroppedForeignKey>,
    pub placeholder_tables: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedForeignKey {
    pub table: String,
    pub foreign_key: String,
}

/// Reduces a catalog to the tables selected by [`ReductionOptions`] and
/// repairs foreign keys left dangling by the removal.
#[derive(Debug, Clone)]
pub struct TablesReducer {
    options: ReductionOptions,
}

impl TablesReducer {
    pub fn new(options: ReductionOptions) -> Self {
        Self { options }
    }

    /// Run the pass in place: seeding, closure, removal, repair.
    pub fn reduce(&self, catalog: &mut Catalog) -> Result<ReductionReport> {
        if catalog.is_reduced() {
            return Err(Error::AlreadyReduced);
        }
        catalog.mark_reduced();

        tracing::info!(
            event = "reduction_started",
            tables = catalog.tables().len(),
            child_depth = self.options.child_table_filter_depth,
            parent_depth = self.options.parent_table_filter_depth,
            strict = self.options.grep_only_matching
        );

        let seeds = self.select_seeds(catalog);
        tracing::debug!(event = "seed_selected", seeds = seeds.len());

        let retained = self.final_table_set(catalog, &seeds);
        tracing::debug!(event = "closure_expanded", retained = retained.len());

        let removed: BTreeSet<String> = catalog
            .tables()
            .keys()
            .into_iter()
            .filter(|name| !retained.contains(name))
            .collect();
        for name in &removed {
            catalog.remove_table(name);
        }
        tracing::debug!(event = "tables_removed", removed = removed.len());

        let mut report = ReductionReport {
            seed_tables: seeds.into_iter().collect(),
            retained_tables: catalog.tables().keys(),
            removed_tables: removed.iter().cloned().collect(),
            ..Default::default()
        };

        let (tables, placeholders) = catalog.parts_mut();
        let repairer = ForeignKeyRepairer {
            strict: self.options.grep_only_matching,
            removed: &removed,
        };
        repairer.repair(tables, placeholders, &mut report)?;

        tracing::info!(
            event = "reduction_finished",
            retained = report.retained_tables.len(),
            removed = report.removed_tables.len(),
            dropped_foreign_keys = report.dropped_foreign_keys.len(),
            placeholder_tables = report.placeholder_tables.len()
        );

        Ok(report)
    }

    /// Tables that pass the filter chain, by full name.
    pub fn select_seeds(&self, catalog: &Catalog) -> BTreeSet<String> {
        let filter = self.options.table_filter();
        catalog
            .tables()
            .iter()
            .filter(|table| filter.include(table))
            .map(|table| table.full_name().to_string())
            .collect()
    }

    /// Seeds united with their child and parent closures.
    pub fn final_table_set(&self, catalog: &Catalog, seeds: &BTreeSet<String>) -> BTreeSet<String> {
        let mut tables = seeds.clone();
        tables.extend(include_related_tables(
            catalog,
            seeds,
            RelationshipType::Child,
            self.options.child_table_filter_depth,
        ));
        tables.extend(include_related_tables(
            catalog,
            seeds,
            RelationshipType::Parent,
            self.options.parent_table_filter_depth,
        ));
        tables
    }
}

/// Tables reachable from `seeds` within `depth` foreign-key hops in one
/// direction, including the seeds themselves.
///
/// Each round only scans tables first reached in the previous round; since the
/// working set only grows, this gives the same set as rescanning all of it.
pub fn include_related_tables(
    catalog: &Catalog,
    seeds: &BTreeSet<String>,
    relationship: RelationshipType,
    depth: usize,
) -> BTreeSet<String> {
    let mut included = seeds.clone();
    let mut frontier: Vec<String> = seeds.iter().cloned().collect();

    for _ in 0..depth {
        if frontier.is_empty() {
            break;
        }
        let mut next = Vec::new();
        for name in &frontier {
            let Some(table) = catalog.table(name) else {
                continue;
            };
            for related in table.related_tables(relationship) {
                let related = related.full_name();
                if catalog.contains_table(related) && included.insert(related.to_string()) {
                    next.push(related.to_string());
                }
            }
        }
        frontier = next;
    }

    included
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Exported,
    Imported,
}

struct ForeignKeyRepairer<'a> {
    strict: bool,
    removed: &'a BTreeSet<String>,
}

impl ForeignKeyRepairer<'_> {
    fn repair(
        &self,
        tables: &mut NamedObjectList<Table>,
        placeholders: &mut NamedObjectList<PlaceholderTable>,
        report: &mut ReductionReport,
    ) -> Result<()> {
        let surviving: BTreeSet<String> = tables.keys().into_iter().collect();

        for table in tables.iter_mut() {
            for side in [Side::Exported, Side::Imported] {
                self.repair_side(table, side, &surviving, placeholders, report)?;
            }
        }

        Ok(())
    }

    fn repair_side(
        &self,
        table: &mut Table,
        side: Side,
        surviving: &BTreeSet<String>,
        placeholders: &mut NamedObjectList<PlaceholderTable>,
        report: &mut ReductionReport,
    ) -> Result<()> {
        let owner = table.table_ref().clone();
        let keys: Vec<String> = match side {
            Side::Exported => table
                .exported_foreign_keys()
                .map(|fk| fk.full_name().to_string())
                .collect(),
            Side::Imported => table
                .imported_foreign_keys()
                .map(|fk| fk.full_name().to_string())
                .collect(),
        };

        for key in keys {
            let Some(fk) = table.foreign_keys_mut().get_mut(&key) else {
                continue;
            };

            let mut dangling = Vec::new();
            for (position, reference) in fk.column_references().iter().enumerate() {
                let handle = match side {
                    Side::Exported => &reference.foreign_key_column,
                    Side::Imported => &reference.primary_key_column,
                };
                let ColumnHandle::Full(column) = handle else {
                    continue;
                };
                let endpoint = column.table.full_name();
                if surviving.contains(endpoint) {
                    continue;
                }
                if !self.removed.contains(endpoint) {
                    return Err(Error::UnresolvedReference {
                        foreign_key: fk.full_name().to_string(),
                        table: owner.full_name().to_string(),
                        column: column.full_name(),
                    });
                }
                dangling.push(position);
            }

            if dangling.is_empty() {
                continue;
            }

            if self.strict {
                table.remove_foreign_key(&key);
                tracing::debug!(event = "foreign_key_dropped", table = %owner, foreign_key = %key);
                report.dropped_foreign_keys.push(DroppedForeignKey {
                    table: owner.full_name().to_string(),
                    foreign_key: key,
                });
                continue;
            }

            let mut out_of_scope: Vec<(TableRef, String)> = Vec::new();
            for position in dangling {
                let reference = &mut fk.column_references_mut()[position];
                let handle = match side {
                    Side::Exported => &mut reference.foreign_key_column,
                    Side::Imported => &mut reference.primary_key_column,
                };
                let column = handle.column().clone();
                handle.demote();
                out_of_scope.push((column.table, column.name));
            }

            let repaired = fk.clone();
            for (table_ref, column) in out_of_scope {
                register_placeholder(placeholders, &table_ref, &column, repaired.clone(), report);
            }
        }

        Ok(())
    }
}

fn register_placeholder(
    placeholders: &mut NamedObjectList<PlaceholderTable>,
    table_ref: &TableRef,
    column: &str,
    fk: ForeignKey,
    report: &mut ReductionReport,
) {
    if !placeholders.contains(table_ref.full_name()) {
        tracing::debug!(event = "placeholder_created", table = %table_ref);
        placeholders.add(PlaceholderTable::new(table_ref.clone()));
        report.placeholder_tables.push(table_ref.full_name().to_string());
    }
    if let Some(placeholder) = placeholders.get_mut(table_ref.full_name()) {
        placeholder.add_column(column);
        placeholder.add_foreign_key(fk);
    }
}
