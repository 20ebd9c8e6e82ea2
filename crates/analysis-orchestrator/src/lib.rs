use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use analysis_core::{AnalysisError, Clock, StockSnapshot, SystemClock};
use chrono::{DateTime, Utc};
use compliance_validator::validate;
use market_regime_detector::assess_regime;
use rayon::prelude::*;
use risk_manager::{RiskManager, RiskParameters};
use signal_classifier::classify;
use trade_setup::{calculate_setup, TradeSetup};

pub mod result;
pub use result::TradeSignalResult;

/// Runs regime → signal → setup → risk → compliance for each snapshot.
///
/// Holds only configuration; every evaluation is independent, so one
/// orchestrator can be shared across threads.
pub struct SignalOrchestrator {
    clock: Arc<dyn Clock>,
    risk_manager: RiskManager,
}

impl Default for SignalOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalOrchestrator {
    pub fn new() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            risk_manager: RiskManager::default(),
        }
    }

    /// Replace the clock used for market timing, catalyst age and timestamps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_risk_parameters(mut self, params: RiskParameters) -> Self {
        self.risk_manager = RiskManager::new(params);
        self
    }

    /// Evaluate one snapshot. Never fails: any stage error degrades to HOLD.
    pub fn evaluate(&self, snapshot: &StockSnapshot) -> TradeSignalResult {
        let now = self.clock.now();
        match self.run_pipeline(snapshot, now) {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Signal evaluation failed for {}: {}", snapshot.symbol, e);
                TradeSignalResult::fallback(&snapshot.symbol, now, e.to_string())
            }
        }
    }

    /// HOLD fallback for a record that never made it to a snapshot
    pub fn reject(&self, symbol: &str, reason: impl Into<String>) -> TradeSignalResult {
        let reason = reason.into();
        tracing::error!("Rejected input record {}: {}", symbol, reason);
        TradeSignalResult::fallback(symbol, self.clock.now(), reason)
    }

    /// Evaluate a batch in parallel, preserving input order
    pub fn evaluate_all(&self, snapshots: &[StockSnapshot]) -> Vec<TradeSignalResult> {
        tracing::info!("Evaluating {} snapshots", snapshots.len());
        snapshots.par_iter().map(|s| self.evaluate(s)).collect()
    }

    fn run_pipeline(
        &self,
        snapshot: &StockSnapshot,
        now: DateTime<Utc>,
    ) -> Result<TradeSignalResult, AnalysisError> {
        let resolved = snapshot.resolve()?;

        let regime = stage("regime", || assess_regime(resolved.market_data.as_ref()))?;
        let signal = stage("signal", || classify(&resolved, &regime))?;
        let setup = stage("setup", || calculate_setup(&resolved, &signal, now))?;
        check_setup(&setup)?;
        let risk = stage("risk", || {
            self.risk_manager.assess(&resolved, &signal, &setup, &regime, now)
        })?;
        if !risk.position_size.percentage.is_finite()
            || !risk.position_size.max_dollar_risk.is_finite()
        {
            return Err(AnalysisError::CalculationError(format!(
                "position size for {} is not finite",
                resolved.symbol
            )));
        }
        let compliance = stage("compliance", || validate(&resolved, &signal, &regime))?;

        tracing::info!(
            "{}: {} (priority {}, grade {}, size {:.2}%)",
            resolved.symbol,
            signal.action,
            signal.priority,
            compliance.grade.as_str(),
            risk.position_size.percentage
        );

        Ok(TradeSignalResult {
            symbol: resolved.symbol,
            action: signal.action,
            priority: signal.priority,
            reasoning: signal.reasoning,
            urgency: signal.urgency,
            timestamp: now,
            market_regime: Some(regime),
            setup: Some(setup),
            risk_management: Some(risk),
            cheat_sheet_compliant: compliance.is_compliant,
            compliance: Some(compliance),
            error: None,
        })
    }
}

/// Run one stage, turning a panic into a `StageFailure`
fn stage<T>(name: &'static str, f: impl FnOnce() -> T) -> Result<T, AnalysisError> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        AnalysisError::StageFailure { stage: name, reason }
    })
}

fn check_setup(setup: &TradeSetup) -> Result<(), AnalysisError> {
    let Some(active) = setup.as_active() else {
        return Ok(());
    };
    let finite = active.entry.price.is_finite()
        && active.stop_loss.price.is_finite()
        && active.targets.iter().all(|t| t.price.is_finite())
        && active.risk_reward_ratio.is_finite();
    if finite {
        Ok(())
    } else {
        Err(AnalysisError::CalculationError(
            "trade setup produced non-finite prices".to_string(),
        ))
    }
}

/// Evaluate with the system clock and default risk parameters
pub fn evaluate(snapshot: &StockSnapshot) -> TradeSignalResult {
    SignalOrchestrator::new().evaluate(snapshot)
}

/// Batch variant of [`evaluate`]
pub fn evaluate_all(snapshots: &[StockSnapshot]) -> Vec<TradeSignalResult> {
    SignalOrchestrator::new().evaluate_all(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::FixedClock;
    use chrono::TimeZone;

    #[test]
    fn test_stage_maps_panic_to_failure() {
        let err = stage("setup", || -> f64 { panic!("boom") }).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::StageFailure {
                stage: "setup",
                reason: "boom".to_string()
            }
        );
        assert_eq!(stage("setup", || 7).unwrap(), 7);
    }

    #[test]
    fn test_reject_uses_clock_and_reason() {
        let now = Utc.with_ymd_and_hms(2024, 3, 12, 15, 0, 0).unwrap();
        let orchestrator = SignalOrchestrator::new().with_clock(Arc::new(FixedClock(now)));

        let result = orchestrator.reject("BAD", "unknown variant");
        assert!(result.is_fallback());
        assert_eq!(result.symbol, "BAD");
        assert_eq!(result.action, analysis_core::SignalAction::Hold);
        assert_eq!(result.timestamp, now);
        assert_eq!(result.error.as_deref(), Some("unknown variant"));
    }

    #[test]
    fn test_non_finite_price_falls_back_to_hold() {
        let now = Utc.with_ymd_and_hms(2024, 3, 12, 15, 0, 0).unwrap();
        let orchestrator = SignalOrchestrator::new().with_clock(Arc::new(FixedClock(now)));
        let snapshot = StockSnapshot {
            symbol: "NAN".to_string(),
            current_price: f64::NAN,
            ..Default::default()
        };

        let result = orchestrator.evaluate(&snapshot);
        assert!(result.is_fallback());
        assert_eq!(result.priority, 3);
        assert!(result.setup.is_none());
        assert!(result.error.as_deref().unwrap_or("").contains("currentPrice"));
        assert_eq!(result.timestamp, now);
    }
}
