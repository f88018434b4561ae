//! Null and empty-value pruning for the JSON output shape.

use serde_json::Value;

use super::extract::numeric_value;
use crate::Row;

fn is_empty(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Recursively strip nulls, empty strings, empty arrays and empty objects.
///
/// Containers emptied by the strip are removed too.
#[must_use]
pub fn prune_value(value: Value) -> Option<Value> {
    let pruned = match value {
        Value::Object(map) => Value::Object(prune_row(map)),
        Value::Array(items) => Value::Array(items.into_iter().filter_map(prune_value).collect()),
        other => other,
    };
    (!is_empty(&pruned)).then_some(pruned)
}

/// Prune every field of a row. See [`prune_value`].
#[must_use]
pub fn prune_row(row: Row) -> Row {
    row.into_iter()
        .filter_map(|(k, v)| prune_value(v).map(|v| (k, v)))
        .collect()
}

fn is_zero(v: &Value) -> bool {
    matches!(v, Value::Number(_) | Value::String(_)) && numeric_value(v) == Some(0.0)
}

/// Remove fields holding a numeric zero (`0`, `0.0`, `"0"`), recursively.
#[must_use]
pub fn drop_zero_fields(row: Row) -> Row {
    row.into_iter()
        .filter_map(|(k, v)| drop_zero_value(v).map(|v| (k, v)))
        .collect()
}

fn drop_zero_value(value: Value) -> Option<Value> {
    match value {
        Value::Object(map) => {
            let map = drop_zero_fields(map);
            (!map.is_empty()).then_some(Value::Object(map))
        }
        Value::Array(items) => {
            let items: Vec<Value> = items.into_iter().filter_map(drop_zero_value).collect();
            (!items.is_empty()).then_some(Value::Array(items))
        }
        other if is_zero(&other) => None,
        other => Some(other),
    }
}
