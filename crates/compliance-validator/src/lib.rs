use analysis_core::{Confidence, ResolvedSnapshot, SignalAction};
use log::debug;
use market_regime_detector::{MarketRegime, Trend};
use serde::{Deserialize, Serialize};
use signal_classifier::Signal;

const NISS_THRESHOLD: f64 = 60.0;
const VOLUME_THRESHOLD: f64 = 1.5;
const COMPLIANT_SCORE: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
}

impl Grade {
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s >= 5 => Grade::A,
            s if s >= 4 => Grade::B,
            s if s >= 3 => Grade::C,
            _ => Grade::D,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        }
    }
}

impl std::str::FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Grade::A),
            "B" => Ok(Grade::B),
            "C" => Ok(Grade::C),
            "D" => Ok(Grade::D),
            other => Err(format!("unknown grade '{}'", other)),
        }
    }
}

/// Rule checklist result for one signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceScore {
    pub niss_threshold: bool,
    pub confidence_level: bool,
    pub volume_confirmation: bool,
    pub market_regime: bool,
    pub risk_reward: bool,
    pub overall_score: u8,
    pub is_compliant: bool,
    pub grade: Grade,
}

/// Score the signal against the five screening rules
pub fn validate(
    snapshot: &ResolvedSnapshot,
    signal: &Signal,
    regime: &MarketRegime,
) -> ComplianceScore {
    let niss_threshold = match signal.action {
        SignalAction::StrongBuy | SignalAction::Buy => snapshot.niss_score >= NISS_THRESHOLD,
        SignalAction::StrongSell | SignalAction::Sell => snapshot.niss_score <= -NISS_THRESHOLD,
        SignalAction::Hold => false,
    };
    let confidence_level = snapshot.confidence != Some(Confidence::Low);
    let volume_confirmation = snapshot.relative_volume > VOLUME_THRESHOLD;
    let market_regime = signal.action.is_bearish() || regime.trend != Trend::Bearish;
    // TODO: check the setup's reward:risk against a minimum ratio once one is agreed
    let risk_reward = true;

    let overall_score = [
        niss_threshold,
        confidence_level,
        volume_confirmation,
        market_regime,
        risk_reward,
    ]
    .iter()
    .filter(|passed| **passed)
    .count() as u8;

    let score = ComplianceScore {
        niss_threshold,
        confidence_level,
        volume_confirmation,
        market_regime,
        risk_reward,
        overall_score,
        is_compliant: overall_score >= COMPLIANT_SCORE,
        grade: Grade::from_score(overall_score),
    };
    debug!(
        "{}: compliance {}/5 grade {}",
        snapshot.symbol,
        overall_score,
        score.grade.as_str()
    );
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::{StockSnapshot, VolumeData};
    use market_regime_detector::{Breadth, Volatility};
    use signal_classifier::Urgency;

    fn snapshot(niss: f64, confidence: Option<Confidence>, volume: f64) -> ResolvedSnapshot {
        StockSnapshot {
            symbol: "TEST".to_string(),
            current_price: 25.0,
            niss_score: Some(niss),
            confidence,
            volume_data: Some(VolumeData {
                relative_volume: Some(volume),
            }),
            ..Default::default()
        }
        .resolve()
        .unwrap()
    }

    fn signal(action: SignalAction) -> Signal {
        Signal {
            action,
            priority: 1,
            reasoning: String::new(),
            max_position_size: 0.0,
            urgency: Urgency::Wait,
        }
    }

    fn bearish() -> MarketRegime {
        MarketRegime {
            trend: Trend::Bearish,
            volatility: Volatility::Normal,
            breadth: Breadth::Declining,
        }
    }

    #[test]
    fn test_fully_compliant_buy() {
        let snap = snapshot(80.0, Some(Confidence::High), 2.5);
        let score = validate(&snap, &signal(SignalAction::StrongBuy), &MarketRegime::neutral());
        assert_eq!(score.overall_score, 5);
        assert!(score.is_compliant);
        assert_eq!(score.grade, Grade::A);
    }

    #[test]
    fn test_bearish_tape_fails_buy_but_not_sell() {
        let snap = snapshot(-70.0, Some(Confidence::Medium), 2.0);
        let sell = validate(&snap, &signal(SignalAction::Sell), &bearish());
        assert!(sell.market_regime);
        assert!(sell.niss_threshold);
        assert_eq!(sell.grade, Grade::A);

        let buy = validate(&snap, &signal(SignalAction::Buy), &bearish());
        assert!(!buy.market_regime);
        assert!(!buy.niss_threshold);
        assert_eq!(buy.overall_score, 3);
        assert!(!buy.is_compliant);
        assert_eq!(buy.grade, Grade::C);
    }

    #[test]
    fn test_hold_never_passes_niss_check() {
        let snap = snapshot(90.0, Some(Confidence::Low), 1.0);
        let score = validate(&snap, &signal(SignalAction::Hold), &MarketRegime::neutral());
        assert!(!score.niss_threshold);
        assert!(!score.confidence_level);
        assert!(!score.volume_confirmation);
        // regime and placeholder reward:risk still pass
        assert_eq!(score.overall_score, 2);
        assert_eq!(score.grade, Grade::D);
    }

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(Grade::from_score(5), Grade::A);
        assert_eq!(Grade::from_score(4), Grade::B);
        assert_eq!(Grade::from_score(3), Grade::C);
        assert_eq!(Grade::from_score(0), Grade::D);
        assert_eq!("b".parse::<Grade>(), Ok(Grade::B));
        assert!("E".parse::<Grade>().is_err());
    }

    #[test]
    fn test_wire_shape() {
        let snap = snapshot(80.0, Some(Confidence::High), 2.5);
        let json = serde_json::to_value(validate(
            &snap,
            &signal(SignalAction::Buy),
            &MarketRegime::neutral(),
        ))
        .unwrap();
        assert_eq!(json["grade"], "A");
        assert_eq!(json["overallScore"], 5);
        assert_eq!(json["isCompliant"], true);
        assert_eq!(json["volumeConfirmation"], true);
    }
}
