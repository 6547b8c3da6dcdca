//! Session guard for protected areas.
//!
//! [`check_access`] is the pure asynchronous check: it asks the gateway who
//! the caller is and decides allow or deny. Denial always erases the stored
//! credential. [`RouteGuard`] wraps the check in the
//! `Checking -> {Authorized, Denied}` state machine a protected view mounts,
//! keyed by the capability it requires.

use tracing::{debug, info, warn};

use crate::credentials::SessionContext;
use crate::gateway::Gateway;
use crate::models::user::CurrentUser;

/// Public entry point; denied visitors are sent here.
pub const ENTRY_ROUTE: &str = "/";

/// Landing page after a successful login.
pub const DASHBOARD_ROUTE: &str = "/dashboard";

/// Administrator area.
pub const ADMIN_ROUTE: &str = "/admin";

/// Minimum privilege a protected area demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Authenticated,
    Admin,
}

impl Capability {
    /// Returns `true` if `user` satisfies this requirement.
    pub fn permits(self, user: &CurrentUser) -> bool {
        match self {
            Capability::Authenticated => true,
            Capability::Admin => user.is_admin(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Authenticated => "authenticated",
            Capability::Admin => "admin",
        }
    }
}

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Access refused; the caller should navigate to `redirect`.
    Deny { redirect: &'static str },
}

/// Checks whether the current session satisfies `requirement`.
///
/// Any failure of the current-user lookup (missing token, expired token,
/// unreachable service) denies, exactly like an insufficient role. On
/// denial the credential is cleared before returning.
pub async fn check_access<G: Gateway>(
    requirement: Capability,
    gateway: &G,
    session: &SessionContext,
) -> Decision {
    match authorize(requirement, gateway, session).await {
        Some(_) => Decision::Allow,
        None => Decision::Deny {
            redirect: ENTRY_ROUTE,
        },
    }
}

/// Same check as [`check_access`], returning the admitted account so the
/// caller does not need a second lookup. `None` means denied, with the
/// credential already cleared.
pub async fn authorize<G: Gateway>(
    requirement: Capability,
    gateway: &G,
    session: &SessionContext,
) -> Option<CurrentUser> {
    match gateway.who_am_i().await {
        Ok(user) if requirement.permits(&user) => {
            debug!(requirement = requirement.as_str(), "access granted");
            return Some(user);
        }
        Ok(_) => {
            info!(requirement = requirement.as_str(), "access denied: missing capability");
        }
        Err(e) => {
            info!(requirement = requirement.as_str(), error = %e, "access denied: session check failed");
        }
    }

    if let Err(e) = session.clear() {
        warn!(error = %e, "failed to clear credential after denial");
    }
    None
}

/// Guard state for a mounted protected view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Checking,
    Authorized,
    Denied,
}

/// What a protected view shows. Always exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// Neutral placeholder while the check is outstanding.
    Loading,
    Redirect(&'static str),
    Protected,
}

/// Permission to apply one check result to a [`RouteGuard`].
#[derive(Debug)]
#[must_use = "a ticket must be resolved with the check result"]
pub struct CheckTicket {
    epoch: u64,
    requirement: Capability,
}

impl CheckTicket {
    pub fn requirement(&self) -> Capability {
        self.requirement
    }
}

/// Per-view guard state machine.
///
/// Entering with a new requirement restarts the check; entering again with
/// the same requirement is a plain re-render and does not. Results for a
/// superseded requirement, or arriving after [`leave`](Self::leave), are
/// dropped.
#[derive(Debug)]
pub struct RouteGuard {
    requirement: Option<Capability>,
    state: GuardState,
    redirect: &'static str,
    epoch: u64,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteGuard {
    pub fn new() -> Self {
        Self {
            requirement: None,
            state: GuardState::Checking,
            redirect: ENTRY_ROUTE,
            epoch: 0,
        }
    }

    /// Mounts (or re-renders) the view with `requirement`.
    ///
    /// Returns a ticket when a check must run, `None` when the requirement
    /// is unchanged.
    pub fn enter(&mut self, requirement: Capability) -> Option<CheckTicket> {
        if self.requirement == Some(requirement) {
            return None;
        }
        self.epoch += 1;
        self.requirement = Some(requirement);
        self.state = GuardState::Checking;
        Some(CheckTicket {
            epoch: self.epoch,
            requirement,
        })
    }

    /// Applies a check result. Returns `false` if the ticket is stale and
    /// the result was discarded.
    pub fn resolve(&mut self, ticket: CheckTicket, decision: Decision) -> bool {
        if ticket.epoch != self.epoch || self.requirement != Some(ticket.requirement) {
            debug!(requirement = ticket.requirement.as_str(), "discarding stale guard result");
            return false;
        }
        self.state = match decision {
            Decision::Allow => GuardState::Authorized,
            Decision::Deny { redirect } => {
                self.redirect = redirect;
                GuardState::Denied
            }
        };
        true
    }

    /// Unmounts the view. Outstanding tickets become stale.
    pub fn leave(&mut self) {
        self.epoch += 1;
        self.requirement = None;
        self.state = GuardState::Checking;
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    pub fn view(&self) -> View {
        match self.state {
            GuardState::Checking => View::Loading,
            GuardState::Authorized => View::Protected,
            GuardState::Denied => View::Redirect(self.redirect),
        }
    }

    /// Enters with `requirement`, runs the check if one is due, and returns
    /// the resulting view.
    pub async fn guard<G: Gateway>(
        &mut self,
        requirement: Capability,
        gateway: &G,
        session: &SessionContext,
    ) -> View {
        if let Some(ticket) = self.enter(requirement) {
            let decision = check_access(ticket.requirement(), gateway, session).await;
            self.resolve(ticket, decision);
        }
        self.view()
    }
}
