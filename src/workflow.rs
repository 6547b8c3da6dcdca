//! Login / registration form controller.
//!
//! [`AuthForm`] has two mutually exclusive modes. Only one submission runs
//! at a time; a submit while another is in flight is ignored. Failures are
//! reported as a single inline message and never navigate.

use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};

use crate::gateway::Gateway;
use crate::guard::DASHBOARD_ROUTE;

/// Confirmation shown after a successful registration.
pub const REGISTERED_NOTICE: &str = "Registration successful! Please wait for admin approval.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

/// Result of one call to [`AuthForm::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Another submission was already in flight.
    Ignored,
    /// Logged in; the caller should navigate to `redirect`.
    LoggedIn { redirect: &'static str },
    /// Registered; the form has switched back to login mode.
    Registered,
    /// Rejected; the message is also available from [`AuthForm::error`].
    Failed(String),
}

#[derive(Debug)]
struct FormState {
    mode: AuthMode,
    in_flight: bool,
    error: Option<String>,
    notice: Option<String>,
}

/// Two-mode auth form.
#[derive(Debug)]
pub struct AuthForm {
    state: Mutex<FormState>,
}

impl Default for AuthForm {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthForm {
    /// A form in login mode with no message.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FormState {
                mode: AuthMode::Login,
                in_flight: false,
                error: None,
                notice: None,
            }),
        }
    }

    pub fn mode(&self) -> AuthMode {
        self.lock().mode
    }

    /// Switches between login and registration.
    pub fn toggle_mode(&self) {
        let mut state = self.lock();
        state.mode = match state.mode {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        };
    }

    /// Whether the submit control should be disabled.
    pub fn is_submitting(&self) -> bool {
        self.lock().in_flight
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn notice(&self) -> Option<String> {
        self.lock().notice.clone()
    }

    /// Submits the form in its current mode.
    pub async fn submit<G: Gateway>(
        &self,
        gateway: &G,
        email: &str,
        password: &str,
    ) -> SubmitOutcome {
        let mode = {
            let mut state = self.lock();
            if state.in_flight {
                debug!("submit ignored: already in flight");
                return SubmitOutcome::Ignored;
            }
            state.in_flight = true;
            state.error = None;
            state.mode
        };
        let _release = InFlight(self);

        let result = match mode {
            AuthMode::Login => gateway.login(email, password).await.map(drop),
            AuthMode::Register => gateway.register(email, password).await,
        };

        let mut state = self.lock();
        match (mode, result) {
            (AuthMode::Login, Ok(())) => {
                state.notice = None;
                info!("login succeeded");
                SubmitOutcome::LoggedIn {
                    redirect: DASHBOARD_ROUTE,
                }
            }
            (AuthMode::Register, Ok(())) => {
                state.notice = Some(REGISTERED_NOTICE.to_string());
                state.mode = AuthMode::Login;
                SubmitOutcome::Registered
            }
            (_, Err(e)) => {
                let message = e.user_message();
                debug!(error = %e, "auth form submission rejected");
                state.error = Some(message.clone());
                SubmitOutcome::Failed(message)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, FormState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Releases the in-flight flag when the submission ends or is dropped.
struct InFlight<'a>(&'a AuthForm);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.lock().in_flight = false;
    }
}
