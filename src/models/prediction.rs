//! Prediction service output.

use serde::{Deserialize, Serialize};

use super::Direction;

/// RSI above this level reads as overbought.
const RSI_OVERBOUGHT: f64 = 70.0;

/// RSI below this level reads as oversold.
const RSI_OVERSOLD: f64 = 30.0;

/// Full analysis for one symbol, produced by the remote prediction service.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PredictionResult {
    pub symbol: String,
    pub prediction: Direction,
    /// Model confidence in `[0, 1]`.
    pub confidence: f64,
    pub rsi: f64,
    pub macd: f64,
    pub current_price: f64,
    pub sma_50: f64,
    pub strategy: String,
    #[serde(default)]
    pub strike: Option<String>,
    #[serde(default)]
    pub option_type: Option<String>,
    #[serde(default)]
    pub payoff_graph: Vec<PayoffPoint>,
    #[serde(default)]
    pub hft_risk: Option<HftRisk>,
    /// Free-text rationale from the model.
    #[serde(default)]
    pub reasoning: Option<String>,
    /// Volume-profile point of control.
    #[serde(default)]
    pub poc: Option<f64>,
}

/// One point of the strategy payoff curve.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct PayoffPoint {
    pub spot: f64,
    pub profit: f64,
}

/// Position sizing suggested by the risk engine.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct HftRisk {
    /// Capital at risk, in basis points.
    pub risk_amount: f64,
    pub quantity: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl HftRisk {
    /// Capital at risk as a percentage.
    pub fn risk_percent(&self) -> f64 {
        self.risk_amount / 100.0
    }
}

/// Momentum reading derived from RSI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

/// Price position relative to the 50-period moving average.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    AboveSma,
    BelowSma,
}

impl PredictionResult {
    pub fn rsi_zone(&self) -> RsiZone {
        if self.rsi > RSI_OVERBOUGHT {
            RsiZone::Overbought
        } else if self.rsi < RSI_OVERSOLD {
            RsiZone::Oversold
        } else {
            RsiZone::Neutral
        }
    }

    /// Price above SMA-50 reads as up-trend; equal or below as down-trend.
    pub fn trend(&self) -> Trend {
        if self.current_price > self.sma_50 {
            Trend::AboveSma
        } else {
            Trend::BelowSma
        }
    }
}
