use std::sync::Arc;

use tracing::debug;

use super::{RunOutcome, Snapshot, Tracker};
use crate::credentials::SessionContext;
use crate::gateway::Gateway;
use crate::models::history::HistoryEntry;

/// Keeps the caller's prediction history, replaced wholesale on each run.
///
/// Failures are logged and swallowed: the view shows whatever it had, or
/// "no history".
pub struct HistoryRefresher<G> {
    gateway: Arc<G>,
    session: SessionContext,
    tracker: Tracker<Vec<HistoryEntry>>,
}

impl<G: Gateway> HistoryRefresher<G> {
    pub fn new(gateway: Arc<G>, session: SessionContext) -> Self {
        Self {
            gateway,
            session,
            tracker: Tracker::new("history"),
        }
    }

    pub async fn run(&self) -> RunOutcome {
        let run = self.tracker.begin();
        let result = self.gateway.list_my_history().await;
        if let Ok(entries) = &result {
            debug!(count = entries.len(), "fetched history");
        }
        run.finish(result, &self.session)
    }

    pub fn snapshot(&self) -> Snapshot<Vec<HistoryEntry>> {
        self.tracker.snapshot()
    }

    /// Entries to display, in server order. Empty when nothing was fetched.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.snapshot().data.value().cloned().unwrap_or_default()
    }

    /// Whether the view should show its "no history" state.
    pub fn is_empty(&self) -> bool {
        self.snapshot().data.value().is_none_or(Vec::is_empty)
    }
}
