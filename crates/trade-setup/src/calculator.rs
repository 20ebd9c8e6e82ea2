use analysis_core::{Confidence, NewsCategory, ResolvedSnapshot};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use signal_classifier::Signal;

use crate::models::*;
use crate::timing::classify_market_timing;

const TARGET_PROBABILITIES: [f64; 3] = [70.0, 50.0, 30.0];
const EXIT_STRATEGIES: [&str; 3] = ["Exit 33%", "Exit 33%", "Trail stop"];

/// Stop distance in ATRs; tighter when the upstream score is more reliable
fn stop_atr_multiple(confidence: Option<Confidence>) -> f64 {
    match confidence {
        Some(Confidence::High) => 1.5,
        Some(Confidence::Medium) | None => 2.0,
        Some(Confidence::Low) => 2.5,
    }
}

/// Risk multiples for the three profit targets
fn target_ladder(confidence: Option<Confidence>) -> [f64; 3] {
    match confidence {
        Some(Confidence::High) => [2.0, 3.5, 5.0],
        Some(Confidence::Medium) | None => [2.5, 4.0, 6.0],
        Some(Confidence::Low) => [3.0, 5.0, 7.0],
    }
}

/// Expected holding period for the catalyst
fn timeframe(category: Option<NewsCategory>, confidence: Option<Confidence>) -> &'static str {
    match category {
        Some(NewsCategory::Earnings) => "1-2 days",
        Some(NewsCategory::Fda) => "1-3 days",
        Some(NewsCategory::Merger) => "1-5 days",
        Some(NewsCategory::Analyst) => "1-2 days",
        Some(NewsCategory::Partnership) => "1 day",
        Some(NewsCategory::Clinical) => "2-5 days",
        Some(NewsCategory::Executive) => "2-7 days",
        Some(NewsCategory::Other) | None => {
            if confidence == Some(Confidence::High) {
                "1-3 days"
            } else {
                "3-7 days"
            }
        }
    }
}

fn percent_from(entry: f64, price: f64) -> f64 {
    (price / entry - 1.0) * 100.0
}

/// Derive entry, stop and target ladder for a directional signal.
///
/// HOLD signals and non-positive prices produce an inactive record rather
/// than an error.
pub fn calculate_setup(
    snapshot: &ResolvedSnapshot,
    signal: &Signal,
    now: DateTime<Utc>,
) -> TradeSetup {
    if !signal.action.is_bullish() && !signal.action.is_bearish() {
        return TradeSetup::inactive(HOLD_MESSAGE);
    }

    let price = snapshot.current_price;
    if price <= 0.0 {
        warn!("{}: invalid price {:.4}, no setup", snapshot.symbol, price);
        return TradeSetup::inactive(INVALID_PRICE_MESSAGE);
    }

    let bullish = signal.action.is_bullish();
    let direction = if bullish { 1.0 } else { -1.0 };

    let entry = match (bullish, snapshot.support, snapshot.resistance) {
        (true, Some(support), _) => price.min(support * 1.01),
        (false, _, Some(resistance)) => price.max(resistance * 0.99),
        _ => price,
    };

    let atr_multiple = stop_atr_multiple(snapshot.confidence);
    let stop_price = entry - direction * snapshot.atr * atr_multiple;
    let stop_loss = StopLoss {
        price: stop_price,
        percentage: percent_from(entry, stop_price),
        atr_multiple,
    };

    let risk_per_share = (entry - stop_price).abs();
    let (targets, risk_reward_ratio) = if risk_per_share > 0.0 {
        let targets: Vec<ProfitTarget> = target_ladder(snapshot.confidence)
            .iter()
            .enumerate()
            .map(|(i, multiplier)| {
                let target_price = entry + direction * risk_per_share * multiplier;
                ProfitTarget {
                    level: i as u8 + 1,
                    price: target_price,
                    percentage: percent_from(entry, target_price),
                    probability: TARGET_PROBABILITIES[i],
                    multiplier: *multiplier,
                    exit_strategy: EXIT_STRATEGIES[i].to_string(),
                }
            })
            .collect();
        let reward_per_share = (targets[1].price - entry).abs();
        (targets, reward_per_share / risk_per_share)
    } else {
        debug!("{}: zero risk per share, degenerate target", snapshot.symbol);
        let degenerate = ProfitTarget {
            level: 1,
            price: entry,
            percentage: 0.0,
            probability: 0.0,
            multiplier: 0.0,
            exit_strategy: "Exit 100%".to_string(),
        };
        (vec![degenerate], 0.0)
    };

    let risk_reward = if risk_reward_ratio > 0.0 {
        format!("1:{:.1}", risk_reward_ratio)
    } else {
        "1:0".to_string()
    };

    TradeSetup::Active(ActiveSetup {
        entry: EntryLevel { price: entry },
        stop_loss,
        targets,
        risk_reward,
        risk_reward_ratio,
        timeframe: timeframe(snapshot.news_category(), snapshot.confidence).to_string(),
        market_timing: classify_market_timing(now),
    })
}
