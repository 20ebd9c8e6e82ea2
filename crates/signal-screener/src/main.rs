use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read, Write};
use std::sync::Arc;

use analysis_core::{FixedClock, StockSnapshot};
use analysis_orchestrator::{SignalOrchestrator, TradeSignalResult};
use anyhow::{Context, Result};
use compliance_validator::Grade;
use serde_json::Value;

mod config;

use config::ScreenerConfig;

fn main() -> Result<()> {
    // 1. Load .env, init tracing
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    // Logs go to stderr so stdout carries only the JSON results
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_writer(io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    tracing::info!("Starting InvestIQ signal screener");

    // 2. Load configuration; a positional argument overrides SCREENER_INPUT
    let mut config = ScreenerConfig::from_env()?;
    if let Some(path) = std::env::args().nth(1) {
        config.input = path;
    }
    tracing::info!("Configuration loaded and validated");
    tracing::info!("  Input: {}", config.input);
    tracing::info!("  Account size: ${:.0}", config.risk.account_size);
    if let Some(as_of) = config.as_of {
        tracing::info!("  Clock pinned to {}", as_of.to_rfc3339());
    }

    // 3. Read records; only a non-array document is fatal
    let raw = read_input(&config.input)?;
    let records: Vec<Value> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse a JSON array from {}", config.input))?;
    tracing::info!("Loaded {} records", records.len());

    // 4. Evaluate
    let mut orchestrator = SignalOrchestrator::new().with_risk_parameters(config.risk.clone());
    if let Some(as_of) = config.as_of {
        orchestrator = orchestrator.with_clock(Arc::new(FixedClock(as_of)));
    }
    let results = screen(&orchestrator, records);
    log_summary(&results);

    // 5. Filter and write
    let results = filter_by_grade(results, config.min_grade);
    let output = if config.pretty {
        serde_json::to_string_pretty(&results)?
    } else {
        serde_json::to_string(&results)?
    };
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", output).context("Failed to write results")?;

    Ok(())
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read snapshots from stdin")?;
        Ok(buf)
    } else {
        fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))
    }
}

/// Evaluate every record in input order. Records that do not deserialize
/// become HOLD fallbacks instead of aborting the batch.
fn screen(orchestrator: &SignalOrchestrator, records: Vec<Value>) -> Vec<TradeSignalResult> {
    let parsed: Vec<Result<StockSnapshot, (String, String)>> = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let symbol = record
                .get("symbol")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("#{}", index));
            serde_json::from_value(record).map_err(|e| (symbol, e.to_string()))
        })
        .collect();

    let snapshots: Vec<StockSnapshot> = parsed
        .iter()
        .filter_map(|r| r.as_ref().ok().cloned())
        .collect();
    let mut evaluated = orchestrator.evaluate_all(&snapshots).into_iter();

    parsed
        .into_iter()
        .filter_map(|record| match record {
            Ok(_) => evaluated.next(),
            Err((symbol, reason)) => Some(orchestrator.reject(&symbol, reason)),
        })
        .collect()
}

fn log_summary(results: &[TradeSignalResult]) {
    let mut by_action: BTreeMap<&'static str, usize> = BTreeMap::new();
    for result in results {
        *by_action.entry(result.action.as_str()).or_default() += 1;
    }
    let compliant = results.iter().filter(|r| r.cheat_sheet_compliant).count();
    let failed = results.iter().filter(|r| r.is_fallback()).count();

    tracing::info!(
        "Screened {} snapshots: {:?}, {} compliant, {} failed",
        results.len(),
        by_action,
        compliant,
        failed
    );
}

/// Keep results graded at least `min_grade`; failed evaluations carry no grade
fn filter_by_grade(
    results: Vec<TradeSignalResult>,
    min_grade: Option<Grade>,
) -> Vec<TradeSignalResult> {
    let Some(min_grade) = min_grade else {
        return results;
    };
    results
        .into_iter()
        .filter(|r| r.compliance.as_ref().is_some_and(|c| c.grade <= min_grade))
        .collect()
}
