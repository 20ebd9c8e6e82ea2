use analysis_core::{Confidence, ResolvedSnapshot, SignalAction};
use log::debug;
use market_regime_detector::{MarketRegime, Trend, Volatility};
use serde::{Deserialize, Serialize};

const STRONG_NISS: f64 = 75.0;
const MODERATE_NISS: f64 = 60.0;
const STRONG_VOLUME: f64 = 2.0;
const MODERATE_VOLUME: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Urgency {
    /// Act now, the catalyst is fresh and confirmed
    Immediate,

    /// Watch for confirmation before acting
    Monitor,

    /// No trade
    Wait,
}

/// Classified trade signal for one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub action: SignalAction,
    /// 1 = strong, 2 = moderate, 3 = no trade
    pub priority: u8,
    pub reasoning: String,
    /// Position size cap, percent of capital
    pub max_position_size: f64,
    pub urgency: Urgency,
}

impl Signal {
    fn new(action: SignalAction, reasoning: String) -> Self {
        let (priority, max_position_size, urgency) = match action {
            SignalAction::StrongBuy => (1, 2.5, Urgency::Immediate),
            SignalAction::Buy => (2, 1.5, Urgency::Monitor),
            SignalAction::StrongSell => (1, 2.0, Urgency::Immediate),
            SignalAction::Sell => (2, 1.0, Urgency::Monitor),
            SignalAction::Hold => (3, 0.0, Urgency::Wait),
        };
        Self {
            action,
            priority,
            reasoning,
            max_position_size,
            urgency,
        }
    }
}

/// Pick exactly one signal category. Branches are checked in priority order
/// and the first match wins.
pub fn classify(snapshot: &ResolvedSnapshot, regime: &MarketRegime) -> Signal {
    let action = if is_strong_buy(snapshot, regime) {
        SignalAction::StrongBuy
    } else if is_buy(snapshot, regime) {
        SignalAction::Buy
    } else if is_strong_sell(snapshot, regime) {
        SignalAction::StrongSell
    } else if is_sell(snapshot, regime) {
        SignalAction::Sell
    } else {
        SignalAction::Hold
    };

    let signal = Signal::new(action, reasoning(action, snapshot, regime));
    debug!(
        "{}: {} (priority {}, NISS {:.1})",
        snapshot.symbol,
        signal.action,
        signal.priority,
        snapshot.niss_score
    );
    signal
}

fn is_strong_buy(s: &ResolvedSnapshot, regime: &MarketRegime) -> bool {
    s.niss_score > STRONG_NISS
        && s.confidence == Some(Confidence::High)
        && s.relative_volume > STRONG_VOLUME
        && s.price_change > 0.0
        && s.above_sma20
        && regime.trend != Trend::Bearish
        && regime.volatility != Volatility::High
}

fn is_buy(s: &ResolvedSnapshot, regime: &MarketRegime) -> bool {
    s.niss_score >= MODERATE_NISS
        && s.confidence != Some(Confidence::Low)
        && s.relative_volume > MODERATE_VOLUME
        && s.momentum > 0.0
        && regime.trend != Trend::Bearish
}

fn is_strong_sell(s: &ResolvedSnapshot, regime: &MarketRegime) -> bool {
    s.niss_score < -STRONG_NISS
        && s.confidence == Some(Confidence::High)
        && s.relative_volume > STRONG_VOLUME
        && s.price_change < 0.0
        && s.below_sma20
        && regime.trend != Trend::Bullish
}

fn is_sell(s: &ResolvedSnapshot, regime: &MarketRegime) -> bool {
    s.niss_score <= -MODERATE_NISS
        && s.confidence != Some(Confidence::Low)
        && s.relative_volume > MODERATE_VOLUME
        && s.momentum < 0.0
        && regime.trend != Trend::Bullish
}

fn reasoning(action: SignalAction, s: &ResolvedSnapshot, regime: &MarketRegime) -> String {
    let confidence = s.confidence.map(|c| c.as_str()).unwrap_or("UNRATED");
    match action {
        SignalAction::StrongBuy | SignalAction::StrongSell => format!(
            "NISS {:.0} with {} confidence, {:.1}x relative volume and {:+.2}% price move confirm a strong {} catalyst ({})",
            s.niss_score,
            confidence,
            s.relative_volume,
            s.price_change,
            if action.is_bullish() { "bullish" } else { "bearish" },
            regime.describe()
        ),
        SignalAction::Buy | SignalAction::Sell => format!(
            "NISS {:.0} with {} confidence, {:.1}x relative volume and momentum {:+.2} support a {} setup ({})",
            s.niss_score,
            confidence,
            s.relative_volume,
            s.momentum,
            if action.is_bullish() { "bullish" } else { "bearish" },
            regime.describe()
        ),
        SignalAction::Hold => format!(
            "NISS {:.0} with {} confidence and {:.1}x relative volume does not meet entry criteria ({})",
            s.niss_score,
            confidence,
            s.relative_volume,
            regime.describe()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::{MarketData, PriceData, StockSnapshot, TechnicalData, VolumeData};
    use market_regime_detector::assess_regime;

    fn snapshot(niss: f64, confidence: Option<Confidence>, volume: f64) -> StockSnapshot {
        StockSnapshot {
            symbol: "TEST".to_string(),
            current_price: 50.0,
            niss_score: Some(niss),
            confidence,
            volume_data: Some(VolumeData {
                relative_volume: Some(volume),
            }),
            ..Default::default()
        }
    }

    fn run(snap: &StockSnapshot) -> Signal {
        let resolved = snap.resolve().unwrap();
        let regime = assess_regime(resolved.market_data.as_ref());
        classify(&resolved, &regime)
    }

    #[test]
    fn test_strong_buy() {
        let mut snap = snapshot(80.0, Some(Confidence::High), 2.5);
        snap.price_data = Some(PriceData { change: Some(1.2) });
        snap.technical_data = Some(TechnicalData {
            price_above_sma20: Some(true),
            ..Default::default()
        });
        snap.market_data = Some(MarketData {
            spy_change: Some(0.6),
            vix: Some(14.0),
            advance_decline: None,
        });

        let signal = run(&snap);
        assert_eq!(signal.action, SignalAction::StrongBuy);
        assert_eq!(signal.priority, 1);
        assert_eq!(signal.max_position_size, 2.5);
        assert_eq!(signal.urgency, Urgency::Immediate);
    }

    #[test]
    fn test_high_volatility_demotes_strong_buy() {
        let mut snap = snapshot(80.0, Some(Confidence::High), 2.5);
        snap.price_data = Some(PriceData { change: Some(1.2) });
        snap.technical_data = Some(TechnicalData {
            momentum: Some(0.4),
            ..Default::default()
        });
        snap.market_data = Some(MarketData {
            vix: Some(30.0),
            ..Default::default()
        });

        // Falls through to the moderate branch
        let signal = run(&snap);
        assert_eq!(signal.action, SignalAction::Buy);
        assert_eq!(signal.priority, 2);
        assert_eq!(signal.urgency, Urgency::Monitor);
    }

    #[test]
    fn test_explicit_below_sma_blocks_strong_buy() {
        let mut snap = snapshot(90.0, Some(Confidence::High), 3.0);
        snap.price_data = Some(PriceData { change: Some(2.0) });
        snap.technical_data = Some(TechnicalData {
            price_above_sma20: Some(false),
            ..Default::default()
        });

        // No momentum, so BUY does not match either
        assert_eq!(run(&snap).action, SignalAction::Hold);
    }

    #[test]
    fn test_buy_with_unrated_confidence() {
        let mut snap = snapshot(60.0, None, 1.6);
        snap.technical_data = Some(TechnicalData {
            momentum: Some(0.1),
            ..Default::default()
        });

        let signal = run(&snap);
        assert_eq!(signal.action, SignalAction::Buy);
        assert_eq!(signal.max_position_size, 1.5);
    }

    #[test]
    fn test_strong_sell() {
        let mut snap = snapshot(-80.0, Some(Confidence::High), 3.0);
        snap.price_data = Some(PriceData { change: Some(-1.0) });
        snap.technical_data = Some(TechnicalData {
            price_below_sma20: Some(true),
            ..Default::default()
        });
        snap.market_data = Some(MarketData {
            spy_change: Some(-0.8),
            ..Default::default()
        });

        let signal = run(&snap);
        assert_eq!(signal.action, SignalAction::StrongSell);
        assert_eq!(signal.priority, 1);
        assert_eq!(signal.max_position_size, 2.0);
    }

    #[test]
    fn test_sell_blocked_by_bullish_tape() {
        let mut snap = snapshot(-65.0, Some(Confidence::Medium), 2.0);
        snap.technical_data = Some(TechnicalData {
            momentum: Some(-0.3),
            ..Default::default()
        });
        assert_eq!(run(&snap).action, SignalAction::Sell);

        snap.market_data = Some(MarketData {
            spy_change: Some(1.0),
            ..Default::default()
        });
        assert_eq!(run(&snap).action, SignalAction::Hold);
    }

    #[test]
    fn test_low_confidence_holds() {
        let mut snap = snapshot(70.0, Some(Confidence::Low), 3.0);
        snap.technical_data = Some(TechnicalData {
            momentum: Some(1.0),
            ..Default::default()
        });

        let signal = run(&snap);
        assert_eq!(signal.action, SignalAction::Hold);
        assert_eq!(signal.priority, 3);
        assert_eq!(signal.max_position_size, 0.0);
        assert_eq!(signal.urgency, Urgency::Wait);
    }

    #[test]
    fn test_weak_score_holds() {
        let signal = run(&snapshot(10.0, Some(Confidence::Medium), 1.0));
        assert_eq!(signal.action, SignalAction::Hold);
        assert!(signal.reasoning.contains("does not meet entry criteria"));
    }

    #[test]
    fn test_signal_wire_shape() {
        let json = serde_json::to_value(run(&snapshot(0.0, None, 0.0))).unwrap();
        assert_eq!(json["action"], "HOLD");
        assert_eq!(json["urgency"], "WAIT");
        assert_eq!(json["maxPositionSize"], 0.0);
    }
}
