//! Encoders for the three output shapes.

use serde_json::Value;

use super::prune::{drop_zero_fields, prune_row};
use super::xlsx::write_workbook;
use crate::{
    CSV_MEDIA_TYPE, RenderedReport, Row, SpreadsheetPolicy, Table, TallyError, XLSX_MEDIA_TYPE,
};

/// Text of a cell in delimited output. Null and missing cells are empty.
#[must_use]
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested @ (Value::Array(_) | Value::Object(_)) => nested.to_string(),
    }
}

/// Delimited text with the table's columns as header, verbatim and in order.
///
/// Every row has one cell per column, so empty cells are kept.
///
/// # Errors
/// Returns `Transform` if the writer fails.
pub fn to_csv(table: &Table) -> Result<String, TallyError> {
    if table.columns.is_empty() {
        return Ok(String::new());
    }
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(&table.columns)
        .map_err(|e| TallyError::transform(format!("CSV header: {e}")))?;
    for row in &table.rows {
        let record = table
            .columns
            .iter()
            .map(|c| row.get(c).map(cell_text).unwrap_or_default());
        wtr.write_record(record)
            .map_err(|e| TallyError::transform(format!("CSV row: {e}")))?;
    }
    let data = wtr
        .into_inner()
        .map_err(|e| TallyError::transform(format!("failed to flush CSV writer: {e}")))?;
    String::from_utf8(data)
        .map_err(|e| TallyError::transform(format!("CSV output is not valid UTF-8: {e}")))
}

/// Rows for the JSON shape, pruned of empty values and optionally of zeros.
#[must_use]
pub fn to_json_rows(table: Table, drop_zeros: bool) -> Vec<Row> {
    table
        .rows
        .into_iter()
        .map(prune_row)
        .map(|r| if drop_zeros { drop_zero_fields(r) } else { r })
        .collect()
}

/// Spreadsheet shape under `policy`.
///
/// # Errors
/// Returns `Transform` if encoding fails.
pub fn to_spreadsheet(
    table: &Table,
    policy: SpreadsheetPolicy,
) -> Result<RenderedReport, TallyError> {
    match policy {
        SpreadsheetPolicy::Xlsx => Ok(RenderedReport::Spreadsheet {
            bytes: write_workbook(table)?,
            media_type: XLSX_MEDIA_TYPE.to_string(),
        }),
        SpreadsheetPolicy::DelimitedText => Ok(RenderedReport::Spreadsheet {
            bytes: to_csv(table)?.into_bytes(),
            media_type: CSV_MEDIA_TYPE.to_string(),
        }),
    }
}
