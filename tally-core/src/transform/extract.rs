//! Schema-tolerant field resolution.
//!
//! Upstream payloads name the same logical field differently depending on the
//! report template and encoding. A field is resolved once per table by trying
//! a prioritized list of strategies against the table's columns; the first
//! strategy that resolves decides the path used for every row.

use serde_json::Value;

use crate::{Row, Table};

/// Column names that may carry the client identifier, in priority order.
pub const CLIENT_ID_CANDIDATES: &[&str] = &[
    "Client ID",
    "client_id",
    "clientId",
    "client id",
    "client",
    "client_code",
    "clientCode",
    "user_id",
    "userId",
];

/// Column names that may carry the billed metric, in priority order.
pub const METRIC_CANDIDATES: &[&str] = &[
    "Metric value",
    "metric value",
    "metric_value",
    "metricValue",
    "Metric Value",
];

/// Strategies for locating the client identifier.
pub const CLIENT_ID_STRATEGIES: &[FieldStrategy] = &[
    FieldStrategy::Exact(CLIENT_ID_CANDIDATES),
    FieldStrategy::CaseInsensitive(CLIENT_ID_CANDIDATES),
    FieldStrategy::Nested {
        parent: "client",
        children: &["id", "code"],
    },
];

/// Strategies for locating the metric column.
pub const METRIC_STRATEGIES: &[FieldStrategy] = &[
    FieldStrategy::Exact(METRIC_CANDIDATES),
    FieldStrategy::CaseInsensitive(METRIC_CANDIDATES),
];

/// One way of locating a logical field in a table schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStrategy {
    /// First candidate present verbatim as a scalar column.
    Exact(&'static [&'static str]),
    /// First candidate matching a scalar column ignoring ASCII case.
    CaseInsensitive(&'static [&'static str]),
    /// A child key of an object-valued column.
    Nested {
        /// Object-valued column, matched ignoring ASCII case.
        parent: &'static str,
        /// Child keys in priority order.
        children: &'static [&'static str],
    },
}

/// Where a resolved field lives in each row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    /// Top-level column.
    pub column: String,
    /// Child key when the column holds objects.
    pub child: Option<String>,
}

impl FieldPath {
    /// Value of the field in `row`, if present.
    #[must_use]
    pub fn lookup<'a>(&self, row: &'a Row) -> Option<&'a Value> {
        let top = row.get(&self.column)?;
        match &self.child {
            None => Some(top),
            Some(child) => top.as_object()?.get(child),
        }
    }
}

fn first_non_null<'a>(table: &'a Table, column: &str) -> Option<&'a Value> {
    table
        .rows
        .iter()
        .filter_map(|r| r.get(column))
        .find(|v| !v.is_null())
}

fn holds_scalars(table: &Table, column: &str) -> bool {
    !matches!(
        first_non_null(table, column),
        Some(Value::Object(_) | Value::Array(_))
    )
}

impl FieldStrategy {
    /// Resolve this strategy against `table`'s schema.
    #[must_use]
    pub fn resolve(&self, table: &Table) -> Option<FieldPath> {
        match self {
            Self::Exact(names) => names
                .iter()
                .find(|n| table.has_column(n) && holds_scalars(table, n))
                .map(|n| FieldPath {
                    column: (*n).to_string(),
                    child: None,
                }),
            Self::CaseInsensitive(names) => names.iter().find_map(|n| {
                table
                    .columns
                    .iter()
                    .find(|c| c.trim().eq_ignore_ascii_case(n) && holds_scalars(table, c))
                    .map(|c| FieldPath {
                        column: c.clone(),
                        child: None,
                    })
            }),
            Self::Nested { parent, children } => {
                let column = table
                    .columns
                    .iter()
                    .find(|c| c.trim().eq_ignore_ascii_case(parent))?;
                let sample = table
                    .rows
                    .iter()
                    .find_map(|r| r.get(column).and_then(Value::as_object))?;
                children
                    .iter()
                    .find(|k| sample.contains_key(**k))
                    .map(|k| FieldPath {
                        column: column.clone(),
                        child: Some((*k).to_string()),
                    })
            }
        }
    }
}

/// Resolve the first strategy in `strategies` that matches `table`.
#[must_use]
pub fn resolve_field(strategies: &[FieldStrategy], table: &Table) -> Option<FieldPath> {
    strategies.iter().find_map(|s| s.resolve(table))
}

/// Comparable text of a scalar value.
///
/// Strings are trimmed. Integral numbers render without a fractional part, so
/// `829449`, `829449.0` and `"829449"` all compare equal.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                let f = n.as_f64()?;
                if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 {
                    Some((f as i64).to_string())
                } else {
                    Some(n.to_string())
                }
            }
        }
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Numeric reading of a value.
///
/// Numbers are taken as-is; strings are parsed after trimming and removing
/// thousands separators. Non-finite results count as non-numeric.
#[must_use]
pub fn numeric_value(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}
