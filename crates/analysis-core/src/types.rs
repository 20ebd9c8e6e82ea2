use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AnalysisError;

/// Fraction of price used as ATR when the snapshot carries none.
pub const ATR_FALLBACK_FRACTION: f64 = 0.025;
pub const DEFAULT_VIX: f64 = 20.0;
pub const DEFAULT_ADVANCE_DECLINE: f64 = 1.0;

/// Qualitative reliability label attached to the upstream NISS score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "HIGH",
            Confidence::Medium => "MEDIUM",
            Confidence::Low => "LOW",
        }
    }
}

/// Catalyst category of the latest headline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsCategory {
    Earnings,
    Fda,
    Merger,
    Analyst,
    Partnership,
    Clinical,
    Executive,
    #[serde(other)]
    Other,
}

/// Trade direction and strength, serialized with the wire labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalAction {
    #[serde(rename = "STRONG BUY")]
    StrongBuy,
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "HOLD")]
    Hold,
    #[serde(rename = "STRONG SELL")]
    StrongSell,
    #[serde(rename = "SELL")]
    Sell,
}

impl SignalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalAction::StrongBuy => "STRONG BUY",
            SignalAction::Buy => "BUY",
            SignalAction::Hold => "HOLD",
            SignalAction::StrongSell => "STRONG SELL",
            SignalAction::Sell => "SELL",
        }
    }

    /// BUY and STRONG BUY
    pub fn is_bullish(&self) -> bool {
        matches!(self, SignalAction::StrongBuy | SignalAction::Buy)
    }

    /// SELL and STRONG SELL
    pub fn is_bearish(&self) -> bool {
        matches!(self, SignalAction::StrongSell | SignalAction::Sell)
    }

    pub fn is_strong(&self) -> bool {
        matches!(self, SignalAction::StrongBuy | SignalAction::StrongSell)
    }
}

impl std::fmt::Display for SignalAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceData {
    pub change: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeData {
    pub relative_volume: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalData {
    pub atr: Option<f64>,
    pub momentum: Option<f64>,
    pub support: Option<f64>,
    pub resistance: Option<f64>,
    #[serde(rename = "priceAboveSMA20", alias = "priceAboveSma20")]
    pub price_above_sma20: Option<bool>,
    #[serde(rename = "priceBelowSMA20", alias = "priceBelowSma20")]
    pub price_below_sma20: Option<bool>,
}

/// Index-level market breadth inputs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketData {
    pub spy_change: Option<f64>,
    pub vix: Option<f64>,
    pub advance_decline: Option<f64>,
}

impl MarketData {
    pub fn spy_change_or_default(&self) -> f64 {
        self.spy_change.unwrap_or(0.0)
    }

    pub fn vix_or_default(&self) -> f64 {
        self.vix.unwrap_or(DEFAULT_VIX)
    }

    pub fn advance_decline_or_default(&self) -> f64 {
        self.advance_decline.unwrap_or(DEFAULT_ADVANCE_DECLINE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestNews {
    pub category: Option<NewsCategory>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Normalized per-instrument snapshot handed over by the data collectors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSnapshot {
    pub symbol: String,
    pub current_price: f64,
    #[serde(default)]
    pub niss_score: Option<f64>,
    #[serde(default)]
    pub confidence: Option<Confidence>,
    #[serde(default)]
    pub price_data: Option<PriceData>,
    #[serde(default)]
    pub volume_data: Option<VolumeData>,
    #[serde(default)]
    pub technical_data: Option<TechnicalData>,
    #[serde(default)]
    pub market_data: Option<MarketData>,
    #[serde(default)]
    pub latest_news: Option<LatestNews>,
}

impl StockSnapshot {
    /// Apply the defaulting table once, so no stage has to chase optional fields.
    pub fn resolve(&self) -> Result<ResolvedSnapshot, AnalysisError> {
        self.check_finite()?;

        let technical = self.technical_data.clone().unwrap_or_default();
        let atr = technical
            .atr
            .unwrap_or(self.current_price * ATR_FALLBACK_FRACTION)
            .max(0.0);

        Ok(ResolvedSnapshot {
            symbol: self.symbol.clone(),
            current_price: self.current_price,
            niss_score: self.niss_score.unwrap_or(0.0),
            confidence: self.confidence,
            price_change: self.price_data.as_ref().and_then(|p| p.change).unwrap_or(0.0),
            relative_volume: self
                .volume_data
                .as_ref()
                .and_then(|v| v.relative_volume)
                .unwrap_or(0.0),
            atr,
            momentum: technical.momentum.unwrap_or(0.0),
            support: technical.support.filter(|s| *s > 0.0),
            resistance: technical.resistance.filter(|r| *r > 0.0),
            above_sma20: technical.price_above_sma20 != Some(false),
            below_sma20: technical.price_below_sma20 != Some(false),
            market_data: self.market_data.clone(),
            news: self.latest_news.clone(),
        })
    }

    fn check_finite(&self) -> Result<(), AnalysisError> {
        let technical = self.technical_data.as_ref();
        let market = self.market_data.as_ref();
        let fields = [
            ("currentPrice", Some(self.current_price)),
            ("nissScore", self.niss_score),
            ("priceData.change", self.price_data.as_ref().and_then(|p| p.change)),
            (
                "volumeData.relativeVolume",
                self.volume_data.as_ref().and_then(|v| v.relative_volume),
            ),
            ("technicalData.atr", technical.and_then(|t| t.atr)),
            ("technicalData.momentum", technical.and_then(|t| t.momentum)),
            ("technicalData.support", technical.and_then(|t| t.support)),
            ("technicalData.resistance", technical.and_then(|t| t.resistance)),
            ("marketData.spyChange", market.and_then(|m| m.spy_change)),
            ("marketData.vix", market.and_then(|m| m.vix)),
            ("marketData.advanceDecline", market.and_then(|m| m.advance_decline)),
        ];

        match fields
            .iter()
            .find(|(_, value)| value.is_some_and(|v| !v.is_finite()))
        {
            Some((name, _)) => Err(AnalysisError::InvalidData(format!(
                "{} for {} is not a finite number",
                name, self.symbol
            ))),
            None => Ok(()),
        }
    }
}

/// Snapshot with every optional field replaced by its documented default.
///
/// `confidence` stays optional: each consumer maps an absent tier to its own
/// default (2.0x ATR stop, medium target ladder, 0.5 win probability).
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSnapshot {
    pub symbol: String,
    pub current_price: f64,
    pub niss_score: f64,
    pub confidence: Option<Confidence>,
    pub price_change: f64,
    pub relative_volume: f64,
    /// Always non-negative; falls back to 2.5% of price
    pub atr: f64,
    pub momentum: f64,
    /// Known support level (absent or non-positive inputs are unknown)
    pub support: Option<f64>,
    pub resistance: Option<f64>,
    /// `priceAboveSMA20` is not explicitly false
    pub above_sma20: bool,
    /// `priceBelowSMA20` is not explicitly false
    pub below_sma20: bool,
    pub market_data: Option<MarketData>,
    pub news: Option<LatestNews>,
}

impl ResolvedSnapshot {
    pub fn news_category(&self) -> Option<NewsCategory> {
        self.news.as_ref().and_then(|n| n.category)
    }

    pub fn news_timestamp(&self) -> Option<DateTime<Utc>> {
        self.news.as_ref().and_then(|n| n.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare(price: f64) -> StockSnapshot {
        StockSnapshot {
            symbol: "TEST".to_string(),
            current_price: price,
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_applies_defaults() {
        let resolved = bare(40.0).resolve().unwrap();

        assert_eq!(resolved.niss_score, 0.0);
        assert_eq!(resolved.confidence, None);
        assert_eq!(resolved.relative_volume, 0.0);
        assert_eq!(resolved.momentum, 0.0);
        assert!((resolved.atr - 1.0).abs() < 1e-9); // 40 * 0.025
        assert!(resolved.above_sma20);
        assert!(resolved.below_sma20);
        assert!(resolved.support.is_none());
        assert!(resolved.market_data.is_none());
    }

    #[test]
    fn test_explicit_false_sma_flags_survive() {
        let mut snap = bare(10.0);
        snap.technical_data = Some(TechnicalData {
            price_above_sma20: Some(false),
            price_below_sma20: Some(true),
            support: Some(0.0),
            ..Default::default()
        });

        let resolved = snap.resolve().unwrap();
        assert!(!resolved.above_sma20);
        assert!(resolved.below_sma20);
        assert!(resolved.support.is_none());
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let mut snap = bare(f64::NAN);
        assert!(matches!(snap.resolve(), Err(AnalysisError::InvalidData(_))));

        snap.current_price = 10.0;
        snap.market_data = Some(MarketData {
            vix: Some(f64::INFINITY),
            ..Default::default()
        });
        let err = snap.resolve().unwrap_err();
        assert!(err.to_string().contains("marketData.vix"));
    }

    #[test]
    fn test_snapshot_deserializes_wire_names() {
        let json = r#"{
            "symbol": "ACME",
            "currentPrice": 12.5,
            "nissScore": 80,
            "confidence": "HIGH",
            "volumeData": {"relativeVolume": 2.5},
            "technicalData": {"priceAboveSMA20": true, "atr": 0.4},
            "marketData": {"spyChange": 0.6, "vix": 14},
            "latestNews": {"category": "merger", "timestamp": "2024-03-12T12:00:00Z"}
        }"#;

        let snap: StockSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.confidence, Some(Confidence::High));
        assert_eq!(
            snap.technical_data.as_ref().and_then(|t| t.price_above_sma20),
            Some(true)
        );
        assert_eq!(
            snap.latest_news.as_ref().and_then(|n| n.category),
            Some(NewsCategory::Merger)
        );
    }

    #[test]
    fn test_unknown_news_category_maps_to_other() {
        let news: LatestNews = serde_json::from_str(r#"{"category": "lawsuit"}"#).unwrap();
        assert_eq!(news.category, Some(NewsCategory::Other));
    }

    #[test]
    fn test_action_direction_helpers() {
        assert!(SignalAction::StrongBuy.is_bullish() && SignalAction::StrongBuy.is_strong());
        assert!(SignalAction::Sell.is_bearish() && !SignalAction::Sell.is_strong());
        assert!(!SignalAction::Hold.is_bullish() && !SignalAction::Hold.is_bearish());
        assert_eq!(
            serde_json::to_string(&SignalAction::StrongSell).unwrap(),
            "\"STRONG SELL\""
        );
    }
}
