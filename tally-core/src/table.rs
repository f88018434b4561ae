use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{RawPayload, Row, TallyError};

/// A normalized report payload: column order plus rows.
///
/// `columns` is the CSV header order, the explicit `headers` list of a
/// tabular JSON document, or the first-seen key order of JSON rows. Rows may
/// omit columns; rows never carry keys missing from `columns`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    /// Column names in output order.
    pub columns: Vec<String>,
    /// Rows in upstream order.
    pub rows: Vec<Row>,
}

impl Table {
    /// Build a table from rows, deriving columns from first-seen key order.
    #[must_use]
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut table = Self {
            columns: Vec::new(),
            rows: Vec::new(),
        };
        for row in rows {
            table.push(row);
        }
        table
    }

    /// Append a row, extending `columns` with any new keys.
    pub fn push(&mut self, row: Row) {
        for key in row.keys() {
            if !self.columns.iter().any(|c| c == key) {
                self.columns.push(key.clone());
            }
        }
        self.rows.push(row);
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True if `name` is one of the columns.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Keep only rows matching `keep`, preserving the column set.
    #[must_use]
    pub fn retain_rows(mut self, mut keep: impl FnMut(&Row) -> bool) -> Self {
        self.rows.retain(|r| keep(r));
        self
    }

    /// Normalize a downloaded payload.
    ///
    /// Delimited text is parsed when the content type says so; otherwise the
    /// body is read as JSON in one of these shapes:
    /// - an array of objects
    /// - `{"data": [objects]}`
    /// - `{"headers": [names], "rows": [[values] | object]}`
    /// - an object whose array members hold objects (flattened in order)
    ///
    /// A body that contradicts its label is sniffed: a CSV-labelled body that
    /// parses as JSON is read as JSON and an unlabelled non-JSON body is read as
    /// delimited text. An empty body is an empty table.
    ///
    /// # Errors
    /// Returns `Transform` when the body is in none of the shapes above.
    pub fn from_payload(payload: &RawPayload) -> Result<Self, TallyError> {
        let body = strip_bom(&payload.bytes);
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let json = serde_json::from_slice::<Value>(body);
        if payload.is_csv() {
            return match json {
                Ok(v @ (Value::Array(_) | Value::Object(_))) => Self::from_json(v),
                _ => Self::from_csv(body),
            };
        }
        match json {
            Ok(v) => Self::from_json(v),
            Err(json_err) => Self::from_csv(body).map_err(|_| {
                TallyError::transform(format!("payload is neither JSON nor CSV: {json_err}"))
            }),
        }
    }

    /// Parse delimited text with a header line. All cells are strings.
    ///
    /// # Errors
    /// Returns `Transform` if the text cannot be read as CSV.
    pub fn from_csv(bytes: &[u8]) -> Result<Self, TallyError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(strip_bom(bytes));
        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| TallyError::transform(format!("unreadable CSV header: {e}")))?
            .iter()
            .map(str::to_string)
            .collect();
        if columns.is_empty() || columns.iter().all(String::is_empty) {
            return Err(TallyError::transform("CSV payload has no header"));
        }
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| TallyError::transform(format!("bad CSV row: {e}")))?;
            let mut row = Map::new();
            for (idx, name) in columns.iter().enumerate() {
                let cell = record.get(idx).unwrap_or_default();
                row.insert(name.clone(), Value::String(cell.to_string()));
            }
            rows.push(row);
        }
        Ok(Self { columns, rows })
    }

    /// Normalize a parsed JSON document.
    ///
    /// # Errors
    /// Returns `Transform` when the document is not tabular.
    pub fn from_json(doc: Value) -> Result<Self, TallyError> {
        match doc {
            Value::Array(items) => rows_from_objects(items)
                .map(Self::from_rows)
                .ok_or_else(|| TallyError::transform("JSON array holds non-object items")),
            Value::Object(mut obj) => {
                let data_is_rows = matches!(
                    obj.get("data"),
                    Some(Value::Array(items)) if items.iter().all(Value::is_object)
                );
                if data_is_rows {
                    if let Some(Value::Array(items)) = obj.remove("data") {
                        return Ok(Self::from_rows(rows_from_objects(items).unwrap_or_default()));
                    }
                }
                let headers = header_names(&obj);
                if let Some(headers) = &headers {
                    if matches!(obj.get("rows"), Some(Value::Array(_))) {
                        let raw_rows = match obj.remove("rows") {
                            Some(Value::Array(raw_rows)) => raw_rows,
                            _ => Vec::new(),
                        };
                        return Ok(Self::from_header_rows(headers.clone(), raw_rows));
                    }
                }
                Self::flatten(obj, headers.as_deref())
            }
            other => Err(TallyError::transform(format!(
                "expected a JSON array or object, got {}",
                json_kind(&other)
            ))),
        }
    }

    fn from_header_rows(headers: Vec<String>, raw_rows: Vec<Value>) -> Self {
        let mut table = Self {
            columns: headers,
            rows: Vec::with_capacity(raw_rows.len()),
        };
        for raw in raw_rows {
            match raw {
                Value::Array(cells) => {
                    let row = zip_cells(&table.columns, cells);
                    table.rows.push(row);
                }
                Value::Object(row) => table.push(row),
                _ => {}
            }
        }
        table
    }

    fn flatten(obj: Map<String, Value>, headers: Option<&[String]>) -> Result<Self, TallyError> {
        let mut table = Self::default();
        let mut saw_list = false;
        for (key, value) in obj {
            let Value::Array(items) = value else { continue };
            if key == "headers" {
                continue;
            }
            if items.iter().all(Value::is_object) {
                saw_list = true;
                for item in items {
                    if let Value::Object(row) = item {
                        table.push(row);
                    }
                }
            } else if let Some(headers) = headers {
                saw_list = true;
                for item in items {
                    if let Value::Array(cells) = item {
                        table.push(zip_cells(headers, cells));
                    }
                }
            }
        }
        if saw_list {
            Ok(table)
        } else {
            Err(TallyError::transform(
                "JSON object has no tabular member (data, headers/rows, or arrays of objects)",
            ))
        }
    }
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
}

fn rows_from_objects(items: Vec<Value>) -> Option<Vec<Row>> {
    items
        .into_iter()
        .map(|v| match v {
            Value::Object(row) => Some(row),
            _ => None,
        })
        .collect()
}

fn header_names(obj: &Map<String, Value>) -> Option<Vec<String>> {
    match obj.get("headers") {
        Some(Value::Array(hs)) => Some(
            hs.iter()
                .map(|h| match h {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ),
        _ => None,
    }
}

fn zip_cells(headers: &[String], cells: Vec<Value>) -> Row {
    headers.iter().cloned().zip(cells).collect()
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn push_tracks_first_seen_columns() {
        let mut t = Table::default();
        t.push(json!({"a": 1, "b": 2}).as_object().cloned().unwrap());
        t.push(json!({"c": 3, "a": 4}).as_object().cloned().unwrap());
        assert_eq!(t.columns, vec!["a", "b", "c"]);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn scalar_document_is_rejected() {
        assert!(matches!(
            Table::from_json(json!(42)),
            Err(TallyError::Transform(_))
        ));
    }
}
