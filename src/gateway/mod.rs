//! Authenticated gateway to the tradex prediction service.
//!
//! [`GatewayClient`] is the single chokepoint for network calls: every
//! request it builds carries `Authorization: Bearer <token>` when the
//! [`SessionContext`] holds one, and goes out unauthenticated otherwise.
//!
//! This module is organized by domain:
//! - [`auth`] - login, registration, current user
//! - [`predict`] - prediction runs and history
//! - [`admin`] - pending-user listing and approval
//! - [`http`] - response decoding and failure classification

mod admin;
mod auth;
pub mod http;
mod predict;

use std::future::Future;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, Url};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::config::ApiConfig;
use crate::credentials::SessionContext;
use crate::models::history::HistoryEntry;
use crate::models::prediction::PredictionResult;
use crate::models::user::{CurrentUser, PendingUser, UserId};
use crate::{Result, TradexError};

pub use http::Operation;

/// Request timeout applied to every call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Typed operations of the remote service.
///
/// The session guard, auth form, and refresh controllers are generic over
/// this trait; [`GatewayClient`] is the HTTP implementation.
pub trait Gateway: Send + Sync {
    /// Exchanges credentials for a bearer token and stores it.
    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Zeroizing<String>>> + Send;

    /// Registers a new account. The account stays pending until approved;
    /// no token is issued.
    fn register(&self, email: &str, password: &str) -> impl Future<Output = Result<()>> + Send;

    /// Returns the account behind the current token.
    fn who_am_i(&self) -> impl Future<Output = Result<CurrentUser>> + Send;

    fn run_prediction(
        &self,
        symbol: &str,
        interval: &str,
        period: &str,
    ) -> impl Future<Output = Result<PredictionResult>> + Send;

    /// Returns the caller's past predictions, in server order.
    fn list_my_history(&self) -> impl Future<Output = Result<Vec<HistoryEntry>>> + Send;

    /// Lists accounts awaiting approval. Admin only.
    fn list_pending_users(&self) -> impl Future<Output = Result<Vec<PendingUser>>> + Send;

    /// Approves a pending account. Admin only.
    fn approve_user(&self, id: UserId) -> impl Future<Output = Result<()>> + Send;
}

/// HTTP client for the prediction service.
#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: Url,
    session: SessionContext,
}

impl GatewayClient {
    /// Builds a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`TradexError::Tls`] if the configured CA bundle cannot be
    /// loaded, or [`TradexError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig, session: SessionContext) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("tradex/", env!("CARGO_PKG_VERSION")));

        if let Some(bundle) = &config.ca_bundle {
            builder = builder.use_preconfigured_tls(crate::tls::build_tls_config(bundle)?);
        }

        let http = builder
            .build()
            .map_err(|e| TradexError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            session,
        })
    }

    /// The credential context this client reads on every request.
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Drops the local credential. There is no server-side session to end.
    pub fn logout(&self) -> Result<()> {
        self.session.clear()?;
        info!("logged out");
        Ok(())
    }

    /// Resolves `segments` below the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TradexError::Config(format!("base URL {} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Starts a request with the current credential attached, if any.
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match self.session.get() {
            Some(token) => builder.bearer_auth(token.as_str()),
            None => builder,
        }
    }

    async fn send(&self, op: Operation, builder: RequestBuilder) -> Result<Response> {
        debug!(operation = op.as_str(), "sending request");
        Ok(builder.send().await?)
    }
}

impl Gateway for GatewayClient {
    async fn login(&self, email: &str, password: &str) -> Result<Zeroizing<String>> {
        auth::login(self, email, password).await
    }

    async fn register(&self, email: &str, password: &str) -> Result<()> {
        auth::register(self, email, password).await
    }

    async fn who_am_i(&self) -> Result<CurrentUser> {
        auth::who_am_i(self).await
    }

    async fn run_prediction(
        &self,
        symbol: &str,
        interval: &str,
        period: &str,
    ) -> Result<PredictionResult> {
        predict::run_prediction(self, symbol, interval, period).await
    }

    async fn list_my_history(&self) -> Result<Vec<HistoryEntry>> {
        predict::list_my_history(self).await
    }

    async fn list_pending_users(&self) -> Result<Vec<PendingUser>> {
        admin::list_pending_users(self).await
    }

    async fn approve_user(&self, id: UserId) -> Result<()> {
        admin::approve_user(self, id).await
    }
}
