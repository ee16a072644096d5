use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use schemasift_core::{
    Catalog, ColumnHandle, DatabaseSchema, ReductionConfig, TablesReducer,
};

fn load_catalog() -> Catalog {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/shop.schema.json");
    let contents = fs::read_to_string(&path)
        .unwrap_or_else(|_| panic!("missing fixture at {}", path.display()));
    let schema: DatabaseSchema = serde_json::from_str(&contents).expect("parse fixture");
    Catalog::from_schema(&schema).expect("build catalog")
}

fn names(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn retained(config: ReductionConfig) -> BTreeSet<String> {
    let mut catalog = load_catalog();
    let reducer = TablesReducer::new(config.validate().expect("valid config"));
    reducer.reduce(&mut catalog).expect("reduce");
    catalog.tables().keys().into_iter().collect()
}

fn shipments(child: i64, parent: i64) -> ReductionConfig {
    ReductionConfig {
        table_inclusion: Some("sales\\.shipments".to_string()),
        child_table_filter_depth: child,
        parent_table_filter_depth: parent,
        ..Default::default()
    }
}

/// Every column handle on a surviving key resolves to a full table in the
/// catalog or, for placeholders, to a registered placeholder table.
fn assert_referentially_consistent(catalog: &Catalog) {
    for table in catalog.tables() {
        for fk in table.foreign_keys() {
            for reference in fk.column_references() {
                for handle in [&reference.foreign_key_column, &reference.primary_key_column] {
                    match handle {
                        ColumnHandle::Full(column) => assert!(
                            catalog.resolve_column(column).is_some(),
                            "{} on {} points at missing {}",
                            fk.full_name(),
                            table.full_name(),
                            column.full_name()
                        ),
                        ColumnHandle::Placeholder(column) => {
                            let placeholder = catalog
                                .placeholder_table(column.table.full_name())
                                .unwrap_or_else(|| panic!("no placeholder for {}", column.table));
                            assert!(placeholder.columns().contains(&column.name));
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn zero_depth_keeps_exactly_the_seeds() {
    let config = ReductionConfig {
        table_inclusion: Some("sales\\..*".to_string()),
        table_exclusion: Some(".*lines".to_string()),
        ..Default::default()
    };
    assert_eq!(
        retained(config),
        names(&["sales.customers", "sales.orders", "sales.shipments"])
    );
}

#[test]
fn parent_closure_is_bounded_by_depth() {
    assert_eq!(
        retained(shipments(0, 1)),
        names(&["sales.shipments", "sales.order_lines"])
    );
    assert_eq!(
        retained(shipments(0, 2)),
        names(&[
            "sales.shipments",
            "sales.order_lines",
            "sales.orders",
            "inventory.products",
        ])
    );
    assert_eq!(
        retained(shipments(0, 3)),
        names(&[
            "sales.shipments",
            "sales.order_lines",
            "sales.orders",
            "inventory.products",
            "sales.customers",
            "inventory.warehouses",
            "inventory.suppliers",
        ])
    );
}

#[test]
fn child_closure_follows_referencing_tables() {
    let config = ReductionConfig {
        table_inclusion: Some("inventory\\.suppliers".to_string()),
        child_table_filter_depth: 2,
        ..Default::default()
    };
    assert_eq!(
        retained(config),
        names(&["inventory.suppliers", "inventory.products", "sales.order_lines"])
    );
}

#[test]
fn increasing_depth_never_shrinks_the_result() {
    let mut previous = BTreeSet::new();
    for depth in 0..5 {
        let current = retained(shipments(depth, depth));
        assert!(
            previous.is_subset(&current),
            "depth {depth} dropped tables: {:?}",
            previous.difference(&current).collect::<Vec<_>>()
        );
        previous = current;
    }
}

#[test]
fn lenient_repair_is_consistent_and_counts_distinct_tables() {
    let mut catalog = load_catalog();
    let options = shipments(0, 1).validate().expect("options");
    let reducer = TablesReducer::new(options);
    reducer.reduce(&mut catalog).expect("reduce");

    assert_referentially_consistent(&catalog);

    let mut out_of_scope = BTreeSet::new();
    for table in catalog.tables() {
        for fk in table.foreign_keys() {
            for reference in fk.column_references() {
                for handle in [&reference.foreign_key_column, &reference.primary_key_column] {
                    if !catalog.contains_table(handle.table().full_name()) {
                        out_of_scope.insert(handle.table().full_name().to_string());
                    }
                }
            }
        }
    }

    // order_lines references orders and products; products uses two columns
    // but yields a single placeholder.
    assert_eq!(out_of_scope, names(&["sales.orders", "inventory.products"]));
    assert_eq!(catalog.placeholder_tables().len(), out_of_scope.len());
    let products = catalog
        .placeholder_table("inventory.products")
        .expect("products placeholder");
    assert_eq!(products.columns().keys(), vec!["sku".to_string(), "supplier_id".to_string()]);
}

#[test]
fn strict_repair_keeps_only_fully_resolved_keys() {
    let config = ReductionConfig {
        grep_only_matching: true,
        ..shipments(0, 2)
    };
    let options = config.validate().expect("options");
    let reducer = TablesReducer::new(options);

    let mut catalog = load_catalog();
    let final_set = reducer.final_table_set(&catalog, &reducer.select_seeds(&catalog));

    let mut expected = Vec::new();
    for table in catalog.tables() {
        if !final_set.contains(table.full_name()) {
            continue;
        }
        let resolved = table
            .foreign_keys()
            .iter()
            .filter(|fk| {
                fk.column_references().iter().all(|reference| {
                    final_set.contains(reference.foreign_key_column.table().full_name())
                        && final_set.contains(reference.primary_key_column.table().full_name())
                })
            })
            .count();
        expected.push((table.full_name().to_string(), resolved));
    }

    reducer.reduce(&mut catalog).expect("reduce");
    assert_referentially_consistent(&catalog);
    assert!(catalog.placeholder_tables().is_empty());

    let actual: Vec<(String, usize)> = catalog
        .tables()
        .iter()
        .map(|table| (table.full_name().to_string(), table.foreign_keys().len()))
        .collect();
    assert_eq!(actual, expected);
}

#[test]
fn grep_selects_tables_by_column_and_remarks() {
    let by_column = ReductionConfig {
        grep_columns: Some(".*\\.email".to_string()),
        ..Default::default()
    };
    assert_eq!(retained(by_column), names(&["sales.customers"]));

    let by_remarks = ReductionConfig {
        grep_definitions: Some(".*invite.*".to_string()),
        ..Default::default()
    };
    assert_eq!(retained(by_remarks), names(&["sales.customers"]));

    let inverted = ReductionConfig {
        table_inclusion: Some("inventory\\..*".to_string()),
        grep_columns: Some(".*\\.sku".to_string()),
        grep_invert_match: true,
        ..Default::default()
    };
    assert_eq!(
        retained(inverted),
        names(&["inventory.suppliers", "inventory.warehouses"])
    );
}

#[test]
fn self_reference_survives_untouched() {
    let mut catalog = load_catalog();
    let options = ReductionConfig {
        table_inclusion: Some("sales\\.customers".to_string()),
        grep_only_matching: true,
        ..Default::default()
    }
    .validate()
    .expect("options");
    TablesReducer::new(options).reduce(&mut catalog).expect("reduce");

    let customers = catalog.table("sales.customers").expect("customers");
    // The self reference stays; the key from orders is dropped.
    let keys = customers.foreign_keys().keys();
    assert_eq!(keys, vec!["sales.customers.fk_customers_referrer".to_string()]);
}
