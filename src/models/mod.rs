//! Wire models for the tradex prediction service.
//!
//! Request bodies serialize to what the service expects; response types
//! deserialize leniently where the service omits optional fields.

pub mod auth;
pub mod history;
pub mod prediction;
pub mod user;

use serde::{Deserialize, Serialize};

/// Market direction called by the prediction service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

impl Direction {
    /// Returns the wire-format name used by the service.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Bullish => "BULLISH",
            Direction::Bearish => "BEARISH",
            Direction::Neutral => "NEUTRAL",
        }
    }
}
