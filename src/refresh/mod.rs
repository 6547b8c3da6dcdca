//! Data refresh controllers for the protected views.
//!
//! Each controller owns one slot of displayed data plus a loading flag and
//! exposes `run()`. Runs are numbered; a response is applied only if no
//! newer run has started since, so a slow early response can never
//! overwrite a fresher one. Failures never clear displayed data: it is kept
//! and marked [`Freshness::Stale`]. An expired session is the one fatal
//! failure; it clears the credential and is reported as
//! [`RunOutcome::SessionExpired`].

mod history;
mod pending;
mod prediction;

use std::sync::{Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::credentials::SessionContext;
use crate::TradexError;

pub use history::HistoryRefresher;
pub use pending::PendingUserRefresher;
pub use prediction::{
    DEFAULT_INTERVAL, DEFAULT_PERIOD, DEFAULT_SYMBOL, PredictionRequest, PredictionRunner,
};

/// Displayed data together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Freshness<T> {
    /// Nothing has been fetched yet.
    Absent,
    /// Result of the most recent successful run.
    Fresh(T),
    /// Last good value, kept after a later run failed.
    Stale(T),
}

impl<T> Default for Freshness<T> {
    fn default() -> Self {
        Freshness::Absent
    }
}

impl<T> Freshness<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Freshness::Absent => None,
            Freshness::Fresh(value) | Freshness::Stale(value) => Some(value),
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Freshness::Fresh(_))
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Freshness::Stale(_))
    }

    /// Downgrades fresh data to stale; absent stays absent.
    fn mark_stale(&mut self) {
        *self = match std::mem::replace(self, Freshness::Absent) {
            Freshness::Fresh(value) => Freshness::Stale(value),
            other => other,
        };
    }
}

/// What happened to one `run()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The response replaced the displayed data.
    Applied,
    /// A newer run started before this one finished; its response was dropped.
    Superseded,
    /// The fetch failed; displayed data was kept.
    Failed(String),
    /// The session is gone. The credential has been cleared.
    SessionExpired,
}

/// Read-only copy of a controller's state.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub data: Freshness<T>,
    pub loading: bool,
    /// Non-blocking failure indicator from the last completed run.
    pub last_error: Option<String>,
}

struct Slot<T> {
    data: Freshness<T>,
    loading: bool,
    last_error: Option<String>,
    latest: u64,
}

/// Sequenced data slot shared by all controllers.
pub(crate) struct Tracker<T> {
    name: &'static str,
    slot: Mutex<Slot<T>>,
}

impl<T: Clone> Tracker<T> {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            slot: Mutex::new(Slot {
                data: Freshness::Absent,
                loading: false,
                last_error: None,
                latest: 0,
            }),
        }
    }

    /// Starts a run and returns its sequence number.
    pub(crate) fn begin(&self) -> Run<'_, T> {
        let mut slot = self.lock();
        slot.latest += 1;
        slot.loading = true;
        Run {
            tracker: self,
            seq: slot.latest,
        }
    }

    /// Records a failure that happened outside a run, such as a rejected
    /// action, so the next snapshot carries it.
    pub(crate) fn record_error(&self, err: &TradexError) {
        self.lock().last_error = Some(err.to_string());
    }

    pub(crate) fn snapshot(&self) -> Snapshot<T> {
        let slot = self.lock();
        Snapshot {
            data: slot.data.clone(),
            loading: slot.loading,
            last_error: slot.last_error.clone(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// One in-flight run. Dropping it unfinished (cancellation) still clears
/// the loading flag if it is the newest run.
pub(crate) struct Run<'a, T: Clone> {
    tracker: &'a Tracker<T>,
    seq: u64,
}

impl<T: Clone> Run<'_, T> {
    /// Applies the fetch result, unless a newer run has started.
    ///
    /// An expired session is acted on even when the response is superseded.
    pub(crate) fn finish(self, result: crate::Result<T>, session: &SessionContext) -> RunOutcome {
        let name = self.tracker.name;
        let mut slot = self.tracker.lock();
        if slot.latest != self.seq {
            debug!(controller = name, seq = self.seq, latest = slot.latest, "dropping superseded response");
            return match result {
                Err(e) if e.is_session_fatal() => {
                    drop(slot);
                    fail(name, e, session)
                }
                _ => RunOutcome::Superseded,
            };
        }

        slot.loading = false;
        match result {
            Ok(value) => {
                slot.data = Freshness::Fresh(value);
                slot.last_error = None;
                RunOutcome::Applied
            }
            Err(e) => {
                slot.data.mark_stale();
                slot.last_error = Some(e.to_string());
                drop(slot);
                fail(name, e, session)
            }
        }
    }
}

impl<T: Clone> Drop for Run<'_, T> {
    fn drop(&mut self) {
        let mut slot = self.tracker.lock();
        if slot.latest == self.seq {
            slot.loading = false;
        }
    }
}

pub(crate) fn fail(controller: &'static str, err: TradexError, session: &SessionContext) -> RunOutcome {
    if err.is_session_fatal() {
        warn!(controller, "session expired during refresh");
        if let Err(e) = session.clear() {
            warn!(error = %e, "failed to clear credential");
        }
        return RunOutcome::SessionExpired;
    }
    warn!(controller, error = %err, "refresh failed, keeping previous data");
    RunOutcome::Failed(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_stale_keeps_value() {
        let mut data = Freshness::Fresh(7);
        data.mark_stale();
        assert_eq!(data, Freshness::Stale(7));
        assert_eq!(data.value(), Some(&7));

        let mut absent: Freshness<i32> = Freshness::Absent;
        absent.mark_stale();
        assert_eq!(absent, Freshness::Absent);
    }

    #[test]
    fn newer_run_supersedes_older() {
        let session = SessionContext::in_memory();
        let tracker = Tracker::new("test");

        let first = tracker.begin();
        let second = tracker.begin();

        assert_eq!(second.finish(Ok(2), &session), RunOutcome::Applied);
        assert_eq!(first.finish(Ok(1), &session), RunOutcome::Superseded);

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.data, Freshness::Fresh(2));
        assert!(!snapshot.loading);
    }

    #[test]
    fn dropped_run_clears_loading() {
        let tracker: Tracker<u8> = Tracker::new("test");
        let run = tracker.begin();
        assert!(tracker.snapshot().loading);
        drop(run);
        assert!(!tracker.snapshot().loading);
    }

    #[test]
    fn stale_run_drop_leaves_newer_loading() {
        let tracker: Tracker<u8> = Tracker::new("test");
        let older = tracker.begin();
        let _newer = tracker.begin();
        drop(older);
        assert!(tracker.snapshot().loading);
    }

    #[test]
    fn superseded_unauthorized_still_clears_session() {
        let session = SessionContext::in_memory();
        session.set("expired").unwrap();
        let tracker = Tracker::new("test");

        let older = tracker.begin();
        let newer = tracker.begin();
        assert_eq!(older.finish(Err(TradexError::Unauthorized), &session), RunOutcome::SessionExpired);
        assert!(!session.is_present());

        assert_eq!(newer.finish(Ok(5), &session), RunOutcome::Applied);
        assert_eq!(tracker.snapshot().data, Freshness::Fresh(5));
    }

    #[test]
    fn superseded_failure_is_not_recorded() {
        let session = SessionContext::in_memory();
        let tracker: Tracker<u8> = Tracker::new("test");

        let older = tracker.begin();
        let _newer = tracker.begin();
        let outcome = older.finish(Err(TradexError::Network("down".into())), &session);
        assert_eq!(outcome, RunOutcome::Superseded);
        assert!(tracker.snapshot().last_error.is_none());
    }

    #[test]
    fn record_error_surfaces_in_snapshot() {
        let tracker: Tracker<u8> = Tracker::new("test");
        tracker.record_error(&TradexError::Forbidden { detail: None });
        assert!(tracker.snapshot().last_error.is_some());
    }

    #[test]
    fn unauthorized_clears_session() {
        let session = SessionContext::in_memory();
        session.set("expired").unwrap();
        let tracker: Tracker<u8> = Tracker::new("test");

        let outcome = tracker.begin().finish(Err(TradexError::Unauthorized), &session);
        assert_eq!(outcome, RunOutcome::SessionExpired);
        assert!(!session.is_present());
    }
}
