use std::sync::Arc;

use tally::Tally;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Orchestrator over the upstream; its credential cache is process-wide.
    pub tally: Arc<Tally>,
}

impl AppState {
    /// Wrap an orchestrator.
    #[must_use]
    pub fn new(tally: Tally) -> Self {
        Self {
            tally: Arc::new(tally),
        }
    }
}
