use analysis_core::SignalAction;
use chrono::{DateTime, Utc};
use compliance_validator::ComplianceScore;
use market_regime_detector::MarketRegime;
use risk_manager::RiskAssessment;
use serde::{Deserialize, Serialize};
use signal_classifier::Urgency;
use trade_setup::TradeSetup;

/// Combined recommendation for one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeSignalResult {
    pub symbol: String,
    pub action: SignalAction,
    pub priority: u8,
    pub reasoning: String,
    pub urgency: Urgency,
    pub timestamp: DateTime<Utc>,
    pub market_regime: Option<MarketRegime>,
    pub setup: Option<TradeSetup>,
    pub risk_management: Option<RiskAssessment>,
    pub compliance: Option<ComplianceScore>,
    /// Shortcut for `compliance.isCompliant`
    pub cheat_sheet_compliant: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TradeSignalResult {
    /// Conservative result used when any stage fails
    pub fn fallback(symbol: &str, timestamp: DateTime<Utc>, reason: String) -> Self {
        Self {
            symbol: symbol.to_string(),
            action: SignalAction::Hold,
            priority: 3,
            reasoning: format!("Signal evaluation failed, defaulting to HOLD: {}", reason),
            urgency: Urgency::Wait,
            timestamp,
            market_regime: None,
            setup: None,
            risk_management: None,
            compliance: None,
            cheat_sheet_compliant: false,
            error: Some(reason),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.error.is_some()
    }
}
