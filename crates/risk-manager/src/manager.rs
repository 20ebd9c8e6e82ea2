use analysis_core::{Confidence, NewsCategory, ResolvedSnapshot};
use chrono::{DateTime, Utc};
use kelly_position_sizer::KellyPositionSizer;
use market_regime_detector::{Breadth, MarketRegime, Trend, Volatility};
use signal_classifier::Signal;
use trade_setup::TradeSetup;

use crate::models::*;

pub struct RiskManager {
    params: RiskParameters,
    sizer: KellyPositionSizer,
}

impl Default for RiskManager {
    fn default() -> Self {
        Self::new(RiskParameters::default())
    }
}

impl RiskManager {
    pub fn new(params: RiskParameters) -> Self {
        Self {
            params,
            sizer: KellyPositionSizer::default(),
        }
    }

    /// Full risk view for one signal
    pub fn assess(
        &self,
        snapshot: &ResolvedSnapshot,
        signal: &Signal,
        setup: &TradeSetup,
        regime: &MarketRegime,
        now: DateTime<Utc>,
    ) -> RiskAssessment {
        let stop_percentage = setup.stop_percentage();
        let (percentage, sizing_notes) = self.position_size(snapshot, signal, regime);
        let max_dollar_risk =
            self.params.account_size * (percentage / 100.0) * (stop_percentage.abs() / 100.0);

        let score = risk_score(
            snapshot.confidence,
            snapshot.niss_score,
            regime,
            setup.risk_reward_ratio(),
        );
        let assessment = RiskAssessment {
            position_size: PositionSize {
                percentage,
                max_dollar_risk,
            },
            risk_level: RiskLevel::from_score(score),
            stop_loss_level: StopLossLevel::from_percentage(stop_percentage),
            portfolio_correlation: PortfolioCorrelation::default(),
            time_decay: time_decay(snapshot, now),
            sizing_notes,
        };

        tracing::debug!(
            "{}: size {:.2}% (${:.0} at risk), risk {:?} (score {}), stop {:?}",
            snapshot.symbol,
            percentage,
            max_dollar_risk,
            assessment.risk_level,
            score,
            assessment.stop_loss_level
        );
        assessment
    }

    /// Half-Kelly, capped by signal strength, scaled by regime
    pub fn position_size(
        &self,
        snapshot: &ResolvedSnapshot,
        signal: &Signal,
        regime: &MarketRegime,
    ) -> (f64, String) {
        let estimate = self.sizer.estimate(snapshot.confidence, snapshot.niss_score);
        let cap = if signal.action.is_strong() {
            self.params.strong_signal_cap_percent
        } else {
            self.params.moderate_signal_cap_percent
        };
        let multiplier = regime_multiplier(regime);

        let size = (estimate.position_percent.min(cap).max(self.params.min_position_percent)
            * multiplier)
            .max(self.params.min_position_percent)
            .min(self.params.max_position_percent);

        let notes = format!(
            "{} | cap {:.1}% | regime x{:.1} | final {:.2}%",
            estimate.reasoning, cap, multiplier, size
        );
        (size, notes)
    }
}

/// Scale exposure to market conditions
pub fn regime_multiplier(regime: &MarketRegime) -> f64 {
    if regime.volatility == Volatility::High {
        0.5
    } else if regime.trend == Trend::Bearish && regime.breadth == Breadth::Declining {
        0.6
    } else if regime.volatility == Volatility::Low && regime.trend == Trend::Bullish {
        1.2
    } else {
        1.0
    }
}

/// Additive penalty score behind `RiskLevel`
pub fn risk_score(
    confidence: Option<Confidence>,
    niss_score: f64,
    regime: &MarketRegime,
    risk_reward_ratio: f64,
) -> u32 {
    let mut score = 0;

    match confidence {
        Some(Confidence::Low) => score += 3,
        Some(Confidence::Medium) => score += 1,
        _ => {}
    }
    if niss_score.abs() < 60.0 {
        score += 2;
    }
    if regime.volatility == Volatility::High {
        score += 2;
    }
    if regime.trend == Trend::Bearish {
        score += 1;
    }
    if risk_reward_ratio < 2.0 {
        score += 3;
    } else if risk_reward_ratio < 2.5 {
        score += 1;
    }

    score
}

/// How quickly the catalyst loses its edge
pub fn time_decay(snapshot: &ResolvedSnapshot, now: DateTime<Utc>) -> TimeDecay {
    let Some(category) = snapshot.news_category() else {
        return TimeDecay {
            level: DecayLevel::Low,
            reasoning: "No recent catalyst".to_string(),
        };
    };
    let age_hours = snapshot
        .news_timestamp()
        .map(|published| (now - published).num_milliseconds() as f64 / 3_600_000.0)
        .unwrap_or(0.0);

    match category {
        NewsCategory::Earnings | NewsCategory::Fda if age_hours > 24.0 => TimeDecay {
            level: DecayLevel::High,
            reasoning: format!(
                "{:?} catalyst is {:.0}h old, binary-event edge fades after 24h",
                category, age_hours
            ),
        },
        NewsCategory::Analyst | NewsCategory::Partnership if age_hours > 48.0 => TimeDecay {
            level: DecayLevel::Medium,
            reasoning: format!(
                "{:?} catalyst is {:.0}h old, follow-through slows after 48h",
                category, age_hours
            ),
        },
        _ => TimeDecay {
            level: DecayLevel::Low,
            reasoning: format!("{:?} catalyst is {:.0}h old, still fresh", category, age_hours),
        },
    }
}
