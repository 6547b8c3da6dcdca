//! Per-user prediction history.

use serde::{Deserialize, Serialize};

use super::Direction;

/// One past prediction, in the order the service returned it.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HistoryEntry {
    /// RFC3339 timestamp of the prediction.
    pub timestamp: String,
    pub symbol: String,
    pub predicted_direction: Direction,
    pub current_price: f64,
    pub suggested_strategy: String,
}
