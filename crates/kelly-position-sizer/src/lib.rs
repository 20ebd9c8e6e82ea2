use analysis_core::Confidence;
use anyhow::{bail, Result};
use log::debug;
use serde::{Deserialize, Serialize};

/// Kelly Criterion position sizing calculator
///
/// The Kelly Criterion determines the optimal position size to maximize
/// long-term growth rate. Formula: f* = (bp - q) / b
/// where:
///   f* = optimal fraction of capital to wager
///   b = odds received (average win / average loss)
///   p = probability of winning
///   q = probability of losing (1 - p)
///
/// Win probability comes from the confidence tier and the average win from
/// the magnitude of the NISS score, so the estimate needs no trade history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KellyPositionSizer {
    /// Fractional Kelly multiplier (0.5 = half-Kelly)
    pub kelly_multiplier: f64,

    /// Minimum position size, percent of capital
    pub min_position_percent: f64,

    /// Maximum position size, percent of capital
    pub max_position_percent: f64,

    /// Expected win per unit of |NISS| / 100
    pub win_per_score: f64,

    /// Cap on the expected win fraction
    pub max_avg_win: f64,

    /// Expected loss fraction when the stop is hit
    pub avg_loss: f64,
}

/// Kelly estimate before and after constraints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KellyEstimate {
    pub win_probability: f64,
    pub avg_win: f64,
    pub avg_loss: f64,

    /// Full Kelly fraction before the multiplier and clamps
    pub raw_kelly_fraction: f64,

    /// Fractional Kelly, percent of capital, clamped to the configured range
    pub position_percent: f64,

    pub reasoning: String,
}

impl Default for KellyPositionSizer {
    fn default() -> Self {
        Self {
            kelly_multiplier: 0.5,    // Half-Kelly
            min_position_percent: 0.5,
            max_position_percent: 5.0,
            win_per_score: 0.08,
            max_avg_win: 0.12,
            avg_loss: 0.035,
        }
    }
}

/// Win probability assumed for each confidence tier
pub fn win_probability(confidence: Option<Confidence>) -> f64 {
    match confidence {
        Some(Confidence::High) => 0.65,
        Some(Confidence::Medium) => 0.55,
        Some(Confidence::Low) => 0.45,
        None => 0.5,
    }
}

impl KellyPositionSizer {
    pub fn new(
        kelly_multiplier: f64,
        min_position_percent: f64,
        max_position_percent: f64,
        avg_loss: f64,
    ) -> Result<Self> {
        if kelly_multiplier <= 0.0 || kelly_multiplier > 1.0 {
            bail!("kelly_multiplier must be between 0 and 1");
        }
        if min_position_percent < 0.0 || min_position_percent > max_position_percent {
            bail!("min_position_percent must be >= 0 and <= max_position_percent");
        }
        if max_position_percent <= 0.0 || max_position_percent > 100.0 {
            bail!("max_position_percent must be between 0 and 100");
        }
        if avg_loss < 0.0 {
            bail!("avg_loss must not be negative");
        }

        Ok(Self {
            kelly_multiplier,
            min_position_percent,
            max_position_percent,
            avg_loss,
            ..Self::default()
        })
    }

    /// Size a position from the signal's confidence tier and NISS score
    pub fn estimate(&self, confidence: Option<Confidence>, niss_score: f64) -> KellyEstimate {
        let p = win_probability(confidence);
        let q = 1.0 - p;
        let avg_win = (niss_score.abs() / 100.0 * self.win_per_score).min(self.max_avg_win);

        let raw_kelly = if self.avg_loss == 0.0 {
            // No downside estimate: treat as full edge
            1.0
        } else {
            let b = avg_win / self.avg_loss;
            if b > 0.0 {
                (p * b - q) / b
            } else {
                // Zero payoff: no edge
                0.0
            }
        };

        let position_percent = (raw_kelly * self.kelly_multiplier * 100.0)
            .max(self.min_position_percent)
            .min(self.max_position_percent);

        let reasoning = format!(
            "Kelly: {:.2}% (raw: {:.2}%, win_rate: {:.1}%, avg_win/loss: {:.2}%/{:.2}%)",
            position_percent,
            raw_kelly * 100.0,
            p * 100.0,
            avg_win * 100.0,
            self.avg_loss * 100.0
        );
        debug!("{}", reasoning);

        KellyEstimate {
            win_probability: p,
            avg_win,
            avg_loss: self.avg_loss,
            raw_kelly_fraction: raw_kelly,
            position_percent,
            reasoning,
        }
    }
}
