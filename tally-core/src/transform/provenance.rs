//! Provenance tagging and merging of per-product tables.

use serde_json::Value;

use crate::{ProductType, ProvenancePolicy, Table};

/// Column the provenance label will be written to for these tables.
///
/// Under `PreserveUpstream` a column already present in any table is left
/// untouched and the label goes to the first free name among
/// `<column>_source`, `<column>_source_2`, `<column>_source_3` and so on.
#[must_use]
pub fn target_column<'a>(
    tables: impl IntoIterator<Item = &'a Table>,
    column: &str,
    policy: ProvenancePolicy,
) -> String {
    if policy == ProvenancePolicy::Overwrite {
        return column.to_string();
    }
    let tables: Vec<&Table> = tables.into_iter().collect();
    let taken = |name: &str| tables.iter().any(|t| t.has_column(name));
    if !taken(column) {
        return column.to_string();
    }
    let base = format!("{column}_source");
    let mut candidate = base.clone();
    let mut n = 2;
    while taken(&candidate) {
        candidate = format!("{base}_{n}");
        n += 1;
    }
    candidate
}

/// Write `label` into `target` on every row.
pub fn tag(table: &mut Table, label: &str, target: &str) {
    for row in &mut table.rows {
        row.insert(target.to_string(), Value::String(label.to_string()));
    }
    if !table.has_column(target) {
        table.columns.push(target.to_string());
    }
}

/// Tag each table with its product and concatenate them in order.
///
/// Columns are the first-seen union of all inputs with the provenance column
/// moved last.
#[must_use]
pub fn merge_tagged(
    parts: Vec<(ProductType, Table)>,
    column: &str,
    policy: ProvenancePolicy,
) -> Table {
    let target = target_column(parts.iter().map(|(_, t)| t), column, policy);
    let mut merged = Table::default();
    for (product, mut table) in parts {
        tag(&mut table, product.as_str(), &target);
        for c in table.columns {
            if c != target && !merged.has_column(&c) {
                merged.columns.push(c);
            }
        }
        merged.rows.extend(table.rows);
    }
    merged.columns.push(target);
    merged
}
