use serde::{Deserialize, Serialize};

/// Sizing limits applied on top of the Kelly estimate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskParameters {
    /// Account size used to express risk in dollars
    #[serde(default = "default_account_size")]
    pub account_size: f64,
    /// Cap for STRONG signals, percent of capital
    #[serde(default = "default_strong_cap")]
    pub strong_signal_cap_percent: f64,
    /// Cap for every other signal, percent of capital
    #[serde(default = "default_moderate_cap")]
    pub moderate_signal_cap_percent: f64,
    #[serde(default = "default_min_position")]
    pub min_position_percent: f64,
    /// Hard ceiling after the regime multiplier
    #[serde(default = "default_max_position")]
    pub max_position_percent: f64,
}

fn default_account_size() -> f64 {
    100_000.0
}

fn default_strong_cap() -> f64 {
    2.5
}

fn default_moderate_cap() -> f64 {
    1.5
}

fn default_min_position() -> f64 {
    0.5
}

fn default_max_position() -> f64 {
    6.0
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            account_size: default_account_size(),
            strong_signal_cap_percent: default_strong_cap(),
            moderate_signal_cap_percent: default_moderate_cap(),
            min_position_percent: default_min_position(),
            max_position_percent: default_max_position(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Threshold the additive penalty score
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 6 => RiskLevel::High,
            s if s >= 3 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StopLossLevel {
    Tight,
    Normal,
    Wide,
}

impl StopLossLevel {
    pub fn from_percentage(stop_percentage: f64) -> Self {
        let distance = stop_percentage.abs();
        if distance < 2.0 {
            StopLossLevel::Tight
        } else if distance < 4.0 {
            StopLossLevel::Normal
        } else {
            StopLossLevel::Wide
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DecayLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeDecay {
    pub level: DecayLevel,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSize {
    /// Percent of capital
    pub percentage: f64,
    pub max_dollar_risk: f64,
}

/// Single-instrument view; portfolio context is supplied elsewhere
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioCorrelation {
    pub sector_exposure: String,
    pub correlation_risk: String,
}

impl Default for PortfolioCorrelation {
    fn default() -> Self {
        Self {
            sector_exposure: "LOW".to_string(),
            correlation_risk: "ACCEPTABLE".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub position_size: PositionSize,
    pub risk_level: RiskLevel,
    pub stop_loss_level: StopLossLevel,
    pub portfolio_correlation: PortfolioCorrelation,
    pub time_decay: TimeDecay,
    /// Kelly breakdown behind the position size
    pub sizing_notes: String,
}
