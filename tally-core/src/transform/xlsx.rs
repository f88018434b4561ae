//! Single-sheet workbook encoder.

use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use serde_json::Value;

use super::encode::cell_text;
use crate::{Table, TallyError};

/// Name of the only sheet in an encoded workbook.
pub const SHEET_NAME: &str = "Report";

fn xlsx_err(context: &str) -> impl FnOnce(XlsxError) -> TallyError + '_ {
    move |e| TallyError::transform(format!("xlsx {context}: {e}"))
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, value: &Value) -> Result<(), XlsxError> {
    match value {
        Value::Null => {}
        Value::String(s) if s.is_empty() => {}
        Value::Number(n) => match n.as_f64() {
            Some(f) => {
                sheet.write_number(row, col, f)?;
            }
            None => {
                sheet.write_string(row, col, n.to_string())?;
            }
        },
        Value::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        other => {
            sheet.write_string(row, col, cell_text(other))?;
        }
    }
    Ok(())
}

/// Encode `table` as a workbook: header row, then one row per table row.
///
/// JSON numbers and booleans keep their cell types; everything else, numeric
/// CSV text included, is written as a string. Null and empty cells stay blank.
///
/// # Errors
/// Returns `Transform` when the grid exceeds the sheet limits or the workbook
/// cannot be assembled.
pub(crate) fn write_workbook(table: &Table) -> Result<Vec<u8>, TallyError> {
    let width = u16::try_from(table.columns.len())
        .map_err(|_| TallyError::transform("xlsx: too many columns"))?;
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME).map_err(xlsx_err("sheet name"))?;

    for (col, name) in (0..width).zip(&table.columns) {
        sheet
            .write_string(0, col, name.as_str())
            .map_err(xlsx_err("header"))?;
    }
    for (idx, row) in table.rows.iter().enumerate() {
        let line = u32::try_from(idx + 1)
            .map_err(|_| TallyError::transform("xlsx: too many rows"))?;
        for (col, name) in (0..width).zip(&table.columns) {
            if let Some(value) = row.get(name) {
                write_cell(sheet, line, col, value).map_err(xlsx_err("cell"))?;
            }
        }
    }
    workbook.save_to_buffer().map_err(xlsx_err("workbook"))
}
