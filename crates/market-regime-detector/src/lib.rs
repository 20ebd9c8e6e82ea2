use analysis_core::MarketData;
use log::debug;
use serde::{Deserialize, Serialize};

/// SPY move (percent) beyond which the tape counts as trending
const TREND_THRESHOLD: f64 = 0.5;
const HIGH_VIX: f64 = 25.0;
const LOW_VIX: f64 = 15.0;
const ADVANCING_RATIO: f64 = 1.5;
const DECLINING_RATIO: f64 = 0.67;

/// Direction of the broad market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

/// VIX bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Volatility {
    High,
    Normal,
    Low,
}

/// Advance/decline bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Breadth {
    Advancing,
    Declining,
    Mixed,
}

/// Three-axis market regime used to gate and scale signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketRegime {
    pub trend: Trend,
    pub volatility: Volatility,
    pub breadth: Breadth,
}

impl Default for MarketRegime {
    fn default() -> Self {
        Self::neutral()
    }
}

impl MarketRegime {
    /// Regime assumed when no index data is available
    pub fn neutral() -> Self {
        Self {
            trend: Trend::Neutral,
            volatility: Volatility::Normal,
            breadth: Breadth::Mixed,
        }
    }

    /// Get human-readable summary
    pub fn describe(&self) -> String {
        let trend = match self.trend {
            Trend::Bullish => "bullish",
            Trend::Bearish => "bearish",
            Trend::Neutral => "neutral",
        };
        let volatility = match self.volatility {
            Volatility::High => "high",
            Volatility::Normal => "normal",
            Volatility::Low => "low",
        };
        let breadth = match self.breadth {
            Breadth::Advancing => "advancing",
            Breadth::Declining => "declining",
            Breadth::Mixed => "mixed",
        };
        format!("{} trend, {} volatility, {} breadth", trend, volatility, breadth)
    }
}

/// Classify market conditions from index-level data. Never fails.
pub fn assess_regime(market_data: Option<&MarketData>) -> MarketRegime {
    let Some(data) = market_data else {
        debug!("No market data, assuming neutral regime");
        return MarketRegime::neutral();
    };

    let spy_change = data.spy_change_or_default();
    let vix = data.vix_or_default();
    let advance_decline = data.advance_decline_or_default();

    let trend = if spy_change > TREND_THRESHOLD {
        Trend::Bullish
    } else if spy_change < -TREND_THRESHOLD {
        Trend::Bearish
    } else {
        Trend::Neutral
    };

    let volatility = if vix > HIGH_VIX {
        Volatility::High
    } else if vix < LOW_VIX {
        Volatility::Low
    } else {
        Volatility::Normal
    };

    let breadth = if advance_decline > ADVANCING_RATIO {
        Breadth::Advancing
    } else if advance_decline < DECLINING_RATIO {
        Breadth::Declining
    } else {
        Breadth::Mixed
    };

    let regime = MarketRegime {
        trend,
        volatility,
        breadth,
    };
    debug!(
        "Regime: {} (SPY: {:.2}%, VIX: {:.1}, A/D: {:.2})",
        regime.describe(),
        spy_change,
        vix,
        advance_decline
    );
    regime
}
