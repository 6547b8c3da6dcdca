use std::sync::Arc;

use tracing::{debug, info};

use super::{HistoryRefresher, RunOutcome, Snapshot, Tracker};
use crate::credentials::SessionContext;
use crate::gateway::Gateway;
use crate::models::prediction::PredictionResult;

pub const DEFAULT_SYMBOL: &str = "NIFTY";
pub const DEFAULT_INTERVAL: &str = "1h";
pub const DEFAULT_PERIOD: &str = "1mo";

/// Parameters of one prediction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionRequest {
    pub symbol: String,
    pub interval: String,
    pub period: String,
}

impl PredictionRequest {
    pub fn new(
        symbol: impl Into<String>,
        interval: impl Into<String>,
        period: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            interval: interval.into(),
            period: period.into(),
        }
    }
}

impl Default for PredictionRequest {
    fn default() -> Self {
        Self::new(DEFAULT_SYMBOL, DEFAULT_INTERVAL, DEFAULT_PERIOD)
    }
}

/// Runs predictions and keeps the latest result on display.
///
/// A successful run refreshes the history, since the new prediction is
/// recorded there. A failed run keeps the previous result as stale.
pub struct PredictionRunner<G> {
    gateway: Arc<G>,
    session: SessionContext,
    tracker: Tracker<PredictionResult>,
    history: Arc<HistoryRefresher<G>>,
}

impl<G: Gateway> PredictionRunner<G> {
    pub fn new(gateway: Arc<G>, session: SessionContext, history: Arc<HistoryRefresher<G>>) -> Self {
        Self {
            gateway,
            session,
            tracker: Tracker::new("prediction"),
            history,
        }
    }

    /// Runs one prediction.
    ///
    /// Every prediction the service accepted is recorded in history, so the
    /// history is refreshed whenever the call succeeded, even if a newer run
    /// superseded this one.
    pub async fn run(&self, request: &PredictionRequest) -> RunOutcome {
        let run = self.tracker.begin();
        let result = self
            .gateway
            .run_prediction(&request.symbol, &request.interval, &request.period)
            .await;

        let recorded = match &result {
            Ok(prediction) => {
                debug!(
                    symbol = %prediction.symbol,
                    direction = prediction.prediction.as_str(),
                    rsi_zone = ?prediction.rsi_zone(),
                    trend = ?prediction.trend(),
                    risk_percent = prediction.hft_risk.map(|risk| risk.risk_percent()),
                    "prediction received"
                );
                true
            }
            Err(_) => false,
        };

        let outcome = run.finish(result, &self.session);
        if outcome == RunOutcome::Applied {
            info!(symbol = %request.symbol, interval = %request.interval, "prediction updated");
        }
        if recorded {
            self.history.run().await;
        }
        outcome
    }

    pub fn snapshot(&self) -> Snapshot<PredictionResult> {
        self.tracker.snapshot()
    }

    pub fn history(&self) -> &HistoryRefresher<G> {
        &self.history
    }
}
