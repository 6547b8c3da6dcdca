//! Response handling shared by every gateway operation.
//!
//! Non-success statuses are turned into a typed [`TradexError`] here, once,
//! using the operation that produced them. Nothing above this module looks
//! at status codes or error bodies.

use reqwest::Response;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{Result, TradexError};

/// Maximum number of detail characters surfaced to callers.
const MAX_DETAIL_CHARS: usize = 200;

/// Remote operations exposed by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    Register,
    WhoAmI,
    RunPrediction,
    ListMyHistory,
    ListPendingUsers,
    ApproveUser,
}

impl Operation {
    /// Returns the name used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Login => "login",
            Operation::Register => "register",
            Operation::WhoAmI => "who_am_i",
            Operation::RunPrediction => "run_prediction",
            Operation::ListMyHistory => "list_my_history",
            Operation::ListPendingUsers => "list_pending_users",
            Operation::ApproveUser => "approve_user",
        }
    }
}

/// Decodes a success body as JSON, or classifies the failure.
pub(super) async fn expect_json<T: DeserializeOwned>(op: Operation, response: Response) -> Result<T> {
    let response = check_status(op, response).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| {
        TradexError::MalformedResponse(format!("{} response did not decode: {e}", op.as_str()))
    })
}

/// Discards a success body, or classifies the failure.
pub(super) async fn expect_empty(op: Operation, response: Response) -> Result<()> {
    check_status(op, response).await.map(drop)
}

async fn check_status(op: Operation, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let err = classify(op, status.as_u16(), extract_detail(&body));
    debug!(operation = op.as_str(), status = status.as_u16(), error = %err, "request failed");
    Err(err)
}

/// Maps a failure status to an error kind for the given operation.
///
/// Login and registration failures are user-facing form errors; a 401 from
/// anything else means the session is gone.
pub fn classify(op: Operation, status: u16, detail: Option<String>) -> TradexError {
    let client_error = (400..500).contains(&status);
    match (op, status) {
        (Operation::Login, _) if client_error => TradexError::Auth { detail },
        (Operation::Register, _) if client_error => TradexError::Validation { detail },
        (_, 401) => TradexError::Unauthorized,
        (_, 403) => TradexError::Forbidden { detail },
        (Operation::ApproveUser, 404) => TradexError::NotFound { detail },
        _ => TradexError::Service { status, detail },
    }
}

/// Pulls a human-readable message out of an error body.
///
/// Understands `{"detail": "message"}` and validation-error lists of the form
/// `{"detail": [{"msg": "..."}, ...]}`. Anything else yields `None`.
pub fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let detail = match value.get("detail")? {
        serde_json::Value::String(message) => message.trim().to_string(),
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|item| item.get("msg").and_then(serde_json::Value::as_str))
            .map(str::trim)
            .filter(|msg| !msg.is_empty())
            .collect::<Vec<_>>()
            .join("; "),
        _ => return None,
    };

    if detail.is_empty() {
        None
    } else {
        Some(detail.chars().take(MAX_DETAIL_CHARS).collect())
    }
}
