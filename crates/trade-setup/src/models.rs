use analysis_core::SignalAction;
use serde::{Deserialize, Serialize};

use crate::timing::MarketTiming;

pub const INVALID_PRICE_MESSAGE: &str = "Invalid price data";
pub const HOLD_MESSAGE: &str = "No trade setup for HOLD signal";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryLevel {
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopLoss {
    pub price: f64,
    /// Signed distance from entry, percent (negative for longs)
    pub percentage: f64,
    pub atr_multiple: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitTarget {
    /// 1-based rung of the ladder
    pub level: u8,
    pub price: f64,
    pub percentage: f64,
    /// Estimated hit probability, percent
    pub probability: f64,
    /// Risk multiple (R) this target sits at
    pub multiplier: f64,
    pub exit_strategy: String,
}

/// Fully quantified setup for a directional signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSetup {
    pub entry: EntryLevel,
    pub stop_loss: StopLoss,
    pub targets: Vec<ProfitTarget>,
    /// "1:X" against the second target
    pub risk_reward: String,
    pub risk_reward_ratio: f64,
    pub timeframe: String,
    pub market_timing: MarketTiming,
}

/// Placeholder returned when no trade can be planned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InactiveSetup {
    pub action: SignalAction,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TradeSetup {
    Active(ActiveSetup),
    Inactive(InactiveSetup),
}

impl TradeSetup {
    pub fn inactive(message: &str) -> Self {
        TradeSetup::Inactive(InactiveSetup {
            action: SignalAction::Hold,
            message: message.to_string(),
        })
    }

    pub fn as_active(&self) -> Option<&ActiveSetup> {
        match self {
            TradeSetup::Active(setup) => Some(setup),
            TradeSetup::Inactive(_) => None,
        }
    }

    /// Stop distance in percent, 0 when there is no plan
    pub fn stop_percentage(&self) -> f64 {
        self.as_active().map(|s| s.stop_loss.percentage).unwrap_or(0.0)
    }

    /// Reward:risk ratio against the second target, 0 when there is no plan
    pub fn risk_reward_ratio(&self) -> f64 {
        self.as_active().map(|s| s.risk_reward_ratio).unwrap_or(0.0)
    }
}
