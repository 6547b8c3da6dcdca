use std::sync::Arc;

use tracing::{debug, info};

use super::{RunOutcome, Snapshot, Tracker, fail};
use crate::TradexError;
use crate::credentials::SessionContext;
use crate::gateway::Gateway;
use crate::models::user::{PendingUser, UserId};

/// Admin view of accounts awaiting approval.
pub struct PendingUserRefresher<G> {
    gateway: Arc<G>,
    session: SessionContext,
    tracker: Tracker<Vec<PendingUser>>,
}

impl<G: Gateway> PendingUserRefresher<G> {
    pub fn new(gateway: Arc<G>, session: SessionContext) -> Self {
        Self {
            gateway,
            session,
            tracker: Tracker::new("pending_users"),
        }
    }

    pub async fn run(&self) -> RunOutcome {
        let run = self.tracker.begin();
        let result = self.gateway.list_pending_users().await;
        run.finish(result, &self.session)
    }

    /// Approves `id`, then reloads the list so the entry disappears.
    ///
    /// An id the service no longer knows was already approved; the list is
    /// reloaded all the same.
    pub async fn approve(&self, id: UserId) -> RunOutcome {
        match self.gateway.approve_user(id).await {
            Ok(()) => info!(user_id = id, "user approved"),
            Err(TradexError::NotFound { .. }) => {
                debug!(user_id = id, "user already approved or unknown");
            }
            Err(e) => {
                self.tracker.record_error(&e);
                return fail("pending_users", e, &self.session);
            }
        }
        self.run().await
    }

    pub fn snapshot(&self) -> Snapshot<Vec<PendingUser>> {
        self.tracker.snapshot()
    }

    /// Pending accounts in server order. Empty when nothing was fetched.
    pub fn users(&self) -> Vec<PendingUser> {
        self.snapshot().data.value().cloned().unwrap_or_default()
    }
}
