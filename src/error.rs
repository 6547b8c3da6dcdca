//! Crate-level error types.
//!
//! [`TradexError`] unifies every failure the gateway can observe behind a
//! single enum. Remote failures are classified once, at the HTTP boundary,
//! so callers match on the variant instead of probing response bodies.

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TradexError>;

/// Message shown on the auth form when a failure carries no detail.
pub const GENERIC_AUTH_MESSAGE: &str = "Authentication failed. Please try again.";

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum TradexError {
    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The credential backend failed to read, write, or erase the token.
    #[error("credential store error: {0}")]
    Credential(String),

    /// The CA bundle could not be read or parsed.
    #[error("tls error: {0}")]
    Tls(String),

    /// Login was rejected: bad credentials or an account still pending approval.
    #[error("login rejected: {}", detail_or(.detail, "invalid credentials"))]
    Auth { detail: Option<String> },

    /// Registration input was rejected (duplicate email, malformed input).
    #[error("registration rejected: {}", detail_or(.detail, "invalid input"))]
    Validation { detail: Option<String> },

    /// The bearer token is missing, invalid, or expired.
    #[error("session is missing, invalid, or expired")]
    Unauthorized,

    /// Authenticated, but the account lacks the required capability.
    #[error("forbidden: {}", detail_or(.detail, "insufficient privileges"))]
    Forbidden { detail: Option<String> },

    /// The addressed resource does not exist.
    #[error("not found: {}", detail_or(.detail, "no such resource"))]
    NotFound { detail: Option<String> },

    /// The remote service answered with a failure status.
    #[error("service error ({status}): {}", detail_or(.detail, "request failed"))]
    Service { status: u16, detail: Option<String> },

    /// The remote service could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// A success response whose body could not be decoded.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TradexError {
    /// Returns `true` if the failure means the session is gone and the
    /// caller must take the guard's denied path.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Returns the server-provided detail, if the failure carried one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Auth { detail }
            | Self::Validation { detail }
            | Self::Forbidden { detail }
            | Self::NotFound { detail }
            | Self::Service { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Single human-readable line for inline form errors.
    pub fn user_message(&self) -> String {
        self.detail().unwrap_or(GENERIC_AUTH_MESSAGE).to_string()
    }
}

impl From<reqwest::Error> for TradexError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else if err.is_timeout() {
            Self::Network(format!("request timed out: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}

fn detail_or<'a>(detail: &'a Option<String>, fallback: &'a str) -> &'a str {
    detail.as_deref().unwrap_or(fallback)
}
