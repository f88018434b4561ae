//! The report transform: filter rows for one client, drop zero-metric rows,
//! clean, and encode.
//!
//! Behavior and trade-offs:
//! - Fields are resolved against the table schema once, not per row.
//! - Pruning applies to the JSON shape only; delimited and spreadsheet output
//!   keep the full column set, empty cells included.
//! - The transform is pure; it never performs I/O.

pub mod encode;
pub mod extract;
pub mod filter;
pub mod provenance;
pub mod prune;
mod xlsx;

use crate::{OutputFormat, RenderedReport, SpreadsheetPolicy, Table, TallyConfig, TallyError};

/// Encoding knobs shared by every rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransformOptions {
    /// How the spreadsheet shape is produced.
    pub spreadsheet: SpreadsheetPolicy,
    /// Also strip numeric zero fields from JSON rows.
    pub drop_zero_fields: bool,
}

impl From<&TallyConfig> for TransformOptions {
    fn from(cfg: &TallyConfig) -> Self {
        Self {
            spreadsheet: cfg.spreadsheet,
            drop_zero_fields: cfg.drop_zero_fields,
        }
    }
}

/// Whether JSON rows are cleaned before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cleaning {
    /// Strip empty values (and zeros if configured).
    Prune,
    /// Emit rows exactly as normalized.
    Raw,
}

/// Encode `table` in `format`.
///
/// # Errors
/// Returns `Transform` if an encoder fails.
pub fn render(
    table: Table,
    format: OutputFormat,
    options: &TransformOptions,
    cleaning: Cleaning,
) -> Result<RenderedReport, TallyError> {
    match format {
        OutputFormat::Json => Ok(RenderedReport::Json(match cleaning {
            Cleaning::Prune => encode::to_json_rows(table, options.drop_zero_fields),
            Cleaning::Raw => table.rows,
        })),
        OutputFormat::Csv => encode::to_csv(&table).map(RenderedReport::Csv),
        OutputFormat::Spreadsheet => encode::to_spreadsheet(&table, options.spreadsheet),
    }
}

/// Transform bound to one client identifier.
#[derive(Debug, Clone)]
pub struct ReportTransform {
    client_id: String,
    options: TransformOptions,
}

impl ReportTransform {
    /// Transform keeping rows of `client_id`.
    pub fn new(client_id: impl Into<String>, options: TransformOptions) -> Self {
        Self {
            client_id: client_id.into(),
            options,
        }
    }

    /// Client identifier rows are filtered to.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Encoding options.
    #[must_use]
    pub const fn options(&self) -> &TransformOptions {
        &self.options
    }

    /// Row filter then metric filter.
    ///
    /// # Errors
    /// `Configuration` when a table with columns lacks a client identifier or a
    /// metric field.
    pub fn filter(&self, table: Table) -> Result<Table, TallyError> {
        filter::filter_rows(table, &self.client_id)
    }

    /// Filter, clean and encode. Returns the surviving row count and the encoding.
    ///
    /// # Errors
    /// See [`ReportTransform::filter`] and [`render`].
    pub fn apply(
        &self,
        table: Table,
        format: OutputFormat,
    ) -> Result<(usize, RenderedReport), TallyError> {
        let kept = self.filter(table)?;
        let count = kept.len();
        Ok((count, render(kept, format, &self.options, Cleaning::Prune)?))
    }
}
