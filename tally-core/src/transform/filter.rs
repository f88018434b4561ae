//! Row and metric filters.

use super::extract::{
    CLIENT_ID_CANDIDATES, CLIENT_ID_STRATEGIES, METRIC_CANDIDATES, METRIC_STRATEGIES,
    numeric_value, resolve_field, scalar_text,
};
use crate::{Table, TallyError};

/// Keep rows whose client identifier equals `client_id`.
///
/// A table without columns passes through unchanged. A header-only table is
/// still checked against its schema.
///
/// # Errors
/// Returns `Configuration` when no client identifier field can be located.
pub fn filter_by_client(table: Table, client_id: &str) -> Result<Table, TallyError> {
    if table.columns.is_empty() {
        return Ok(table);
    }
    let target = client_id.trim();
    let path = resolve_field(CLIENT_ID_STRATEGIES, &table).ok_or_else(|| {
        TallyError::Configuration(format!(
            "no client identifier column in payload (looked for {}; columns: {})",
            CLIENT_ID_CANDIDATES.join(", "),
            table.columns.join(", ")
        ))
    })?;
    Ok(table.retain_rows(|row| {
        path.lookup(row)
            .and_then(scalar_text)
            .is_some_and(|v| v == target)
    }))
}

/// Drop rows whose metric is absent, null, non-numeric or zero.
///
/// # Errors
/// Returns `Configuration` when the schema has no metric column.
pub fn filter_nonzero_metric(table: Table) -> Result<Table, TallyError> {
    if table.columns.is_empty() {
        return Ok(table);
    }
    let path = resolve_field(METRIC_STRATEGIES, &table).ok_or_else(|| {
        TallyError::Configuration(format!(
            "no metric column in payload (looked for {}; columns: {})",
            METRIC_CANDIDATES.join(", "),
            table.columns.join(", ")
        ))
    })?;
    Ok(table.retain_rows(|row| {
        path.lookup(row)
            .and_then(numeric_value)
            .is_some_and(|v| v != 0.0)
    }))
}

/// Apply the client filter, then the metric filter.
///
/// # Errors
/// See [`filter_by_client`] and [`filter_nonzero_metric`].
pub fn filter_rows(table: Table, client_id: &str) -> Result<Table, TallyError> {
    let total = table.len();
    let by_client = filter_by_client(table, client_id)?;
    let matched = by_client.len();
    let kept = filter_nonzero_metric(by_client)?;
    #[cfg(feature = "tracing")]
    tracing::debug!(
        total,
        matched_client = matched,
        kept = kept.len(),
        dropped_zero = matched - kept.len(),
        "filtered report rows"
    );
    #[cfg(not(feature = "tracing"))]
    let _ = (total, matched);
    Ok(kept)
}
