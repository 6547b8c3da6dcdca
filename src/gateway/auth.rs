//! Token exchange, self-registration, and current-user lookup.

use reqwest::Method;
use tracing::{info, warn};
use zeroize::Zeroizing;

use super::http::{self, Operation};
use super::GatewayClient;
use crate::models::auth::{LoginForm, RegisterRequest, TokenResponse};
use crate::models::user::CurrentUser;
use crate::{Result, TradexError};

/// Exchanges email and password for a bearer token and stores it in the
/// session context.
///
/// # Errors
///
/// Returns [`TradexError::Auth`] when the service rejects the credentials or
/// the account is still pending approval. A failed login leaves any
/// existing token in place.
pub(super) async fn login(
    client: &GatewayClient,
    email: &str,
    password: &str,
) -> Result<Zeroizing<String>> {
    let url = client.endpoint(&["users", "token"])?;
    let form = LoginForm {
        username: email,
        password,
    };
    let response = client
        .send(Operation::Login, client.request(Method::POST, url).form(&form))
        .await?;

    let body: TokenResponse = http::expect_json(Operation::Login, response).await?;
    if let Some(kind) = body.token_type.as_deref().filter(|t| !t.eq_ignore_ascii_case("bearer")) {
        warn!(token_type = kind, "unexpected token type, sending as bearer");
    }
    let token = Zeroizing::new(body.access_token);
    if token.is_empty() {
        return Err(TradexError::MalformedResponse(
            "missing access_token in login response".into(),
        ));
    }

    client.session().set(&token)?;
    info!("obtained access token");
    Ok(token)
}

/// Registers a new account. The account is created pending approval and
/// no token is issued.
///
/// # Errors
///
/// Returns [`TradexError::Validation`] on duplicate email or malformed input.
pub(super) async fn register(client: &GatewayClient, email: &str, password: &str) -> Result<()> {
    let url = client.endpoint(&["users", "register"])?;
    let body = RegisterRequest { email, password };
    let response = client
        .send(Operation::Register, client.request(Method::POST, url).json(&body))
        .await?;

    http::expect_empty(Operation::Register, response).await?;
    info!("registration submitted, awaiting approval");
    Ok(())
}

/// Fetches the account behind the current token.
///
/// # Errors
///
/// Returns [`TradexError::Unauthorized`] if the token is absent, invalid,
/// or expired.
pub(super) async fn who_am_i(client: &GatewayClient) -> Result<CurrentUser> {
    let url = client.endpoint(&["users", "me"])?;
    let response = client
        .send(Operation::WhoAmI, client.request(Method::GET, url))
        .await?;
    http::expect_json(Operation::WhoAmI, response).await
}
