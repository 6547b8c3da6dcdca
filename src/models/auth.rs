//! Login and registration payloads.

use serde::{Deserialize, Serialize};

/// Form body for the token-exchange endpoint.
#[derive(Serialize)]
pub struct LoginForm<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Successful token-exchange response.
#[derive(Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// JSON body for self-registration.
#[derive(Serialize)]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}
