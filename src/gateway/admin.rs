//! Administrator endpoints for the pending-approval workflow.

use reqwest::Method;
use tracing::info;

use super::http::{self, Operation};
use super::GatewayClient;
use crate::Result;
use crate::models::user::{PendingUser, UserId};

pub(super) async fn list_pending_users(client: &GatewayClient) -> Result<Vec<PendingUser>> {
    let url = client.endpoint(&["admin", "pending-users"])?;
    let response = client
        .send(Operation::ListPendingUsers, client.request(Method::GET, url))
        .await?;
    http::expect_json(Operation::ListPendingUsers, response).await
}

/// Approves a pending account. Approving an unknown or already-approved
/// id yields [`TradexError::NotFound`](crate::TradexError::NotFound).
pub(super) async fn approve_user(client: &GatewayClient, id: UserId) -> Result<()> {
    let id_segment = id.to_string();
    let url = client.endpoint(&["admin", "approve", id_segment.as_str()])?;
    let response = client
        .send(Operation::ApproveUser, client.request(Method::POST, url))
        .await?;
    http::expect_empty(Operation::ApproveUser, response).await?;
    info!(user_id = id, "approved pending user");
    Ok(())
}
