//! Prediction runs and per-user history.

use reqwest::Method;

use super::http::{self, Operation};
use super::GatewayClient;
use crate::Result;
use crate::models::history::HistoryEntry;
use crate::models::prediction::PredictionResult;

/// Asks the service to analyse `symbol` over `period` at `interval`
/// granularity. The symbol is passed through as-is.
pub(super) async fn run_prediction(
    client: &GatewayClient,
    symbol: &str,
    interval: &str,
    period: &str,
) -> Result<PredictionResult> {
    let url = client.endpoint(&["predict", symbol])?;
    let request = client
        .request(Method::GET, url)
        .query(&[("interval", interval), ("period", period)]);
    let response = client.send(Operation::RunPrediction, request).await?;
    http::expect_json(Operation::RunPrediction, response).await
}

pub(super) async fn list_my_history(client: &GatewayClient) -> Result<Vec<HistoryEntry>> {
    let url = client.endpoint(&["predict", "history", "me"])?;
    let response = client
        .send(Operation::ListMyHistory, client.request(Method::GET, url))
        .await?;
    http::expect_json(Operation::ListMyHistory, response).await
}
