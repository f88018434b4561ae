use serde_json::Value;

use crate::{JobState, JobStatus, TallyError};

const READY: &[&str] = &[
    "ready",
    "finished",
    "done",
    "success",
    "succeeded",
    "available",
    "completed",
    "complete",
];
const FAILED: &[&str] = &["failed", "error", "errored", "cancelled", "canceled"];
const RUNNING: &[&str] = &[
    "running",
    "processing",
    "in_progress",
    "in progress",
    "generating",
    "started",
];

/// Reduce an upstream state tag to the poll loop's vocabulary.
///
/// Matching is case-insensitive. Unrecognized tags are `Pending`, so a new
/// intermediate state upstream only delays readiness until the timeout guard.
#[must_use]
pub fn classify_state(tag: &str) -> JobState {
    let tag = tag.trim().to_ascii_lowercase();
    if READY.contains(&tag.as_str()) {
        JobState::Ready
    } else if FAILED.contains(&tag.as_str()) {
        JobState::Failed
    } else if RUNNING.contains(&tag.as_str()) {
        JobState::Running
    } else {
        JobState::Pending
    }
}

fn first_string(doc: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match doc.get(*k) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    })
}

/// Parse an upstream status document.
///
/// The state tag is read from `status`, then `state`. The download reference
/// comes from `download_url`, `url`, `file_url` or `link`; the message from
/// `message`, `error` or `detail`.
///
/// # Errors
/// Returns `Protocol` when the document has no non-empty state tag.
pub fn parse_status_document(endpoint: &str, doc: Value) -> Result<JobStatus, TallyError> {
    let raw_state = first_string(&doc, &["status", "state"])
        .ok_or_else(|| TallyError::protocol(endpoint, "status document has no state tag"))?
        .to_ascii_lowercase();
    Ok(JobStatus {
        state: classify_state(&raw_state),
        raw_state,
        download_ref: first_string(&doc, &["download_url", "url", "file_url", "link"]),
        message: first_string(&doc, &["message", "error", "detail"]),
        raw: doc,
    })
}
