use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use compliance_validator::Grade;
use risk_manager::RiskParameters;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerConfig {
    // Input / output
    pub input: String,                      // path to a JSON array of snapshots, "-" for stdin
    pub pretty: bool,                       // pretty-print the JSON results
    pub min_grade: Option<Grade>,           // drop results graded below this

    // Evaluation
    pub as_of: Option<DateTime<Utc>>,       // pin "now" for reproducible runs
    pub risk: RiskParameters,
}

impl ScreenerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup (env vars in production, a map in tests)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = RiskParameters::default();

        let config = Self {
            input: lookup("SCREENER_INPUT").unwrap_or_else(|| "-".to_string()),
            pretty: lookup("SCREENER_PRETTY")
                .unwrap_or_else(|| "false".to_string())
                .parse()
                .context("SCREENER_PRETTY must be true or false")?,
            min_grade: lookup("SCREENER_MIN_GRADE")
                .map(|g| g.parse::<Grade>())
                .transpose()
                .map_err(anyhow::Error::msg)
                .context("SCREENER_MIN_GRADE must be one of A, B, C, D")?,

            as_of: lookup("SCREENER_AS_OF")
                .map(|t| DateTime::parse_from_rfc3339(&t).map(|t| t.with_timezone(&Utc)))
                .transpose()
                .context("SCREENER_AS_OF must be an RFC 3339 timestamp")?,
            risk: RiskParameters {
                account_size: lookup("ACCOUNT_SIZE")
                    .map(|v| v.parse::<f64>())
                    .transpose()
                    .context("ACCOUNT_SIZE must be a number")?
                    .unwrap_or(defaults.account_size),
                strong_signal_cap_percent: lookup("STRONG_SIGNAL_CAP")
                    .map(|v| v.parse::<f64>())
                    .transpose()
                    .context("STRONG_SIGNAL_CAP must be a number")?
                    .unwrap_or(defaults.strong_signal_cap_percent),
                moderate_signal_cap_percent: lookup("MODERATE_SIGNAL_CAP")
                    .map(|v| v.parse::<f64>())
                    .transpose()
                    .context("MODERATE_SIGNAL_CAP must be a number")?
                    .unwrap_or(defaults.moderate_signal_cap_percent),
                ..defaults
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(self.risk.account_size > 0.0) {
            bail!("ACCOUNT_SIZE must be positive, got {}", self.risk.account_size);
        }
        for (name, cap) in [
            ("STRONG_SIGNAL_CAP", self.risk.strong_signal_cap_percent),
            ("MODERATE_SIGNAL_CAP", self.risk.moderate_signal_cap_percent),
        ] {
            if cap < self.risk.min_position_percent || cap > self.risk.max_position_percent {
                bail!(
                    "{} must be between {} and {}, got {}",
                    name,
                    self.risk.min_position_percent,
                    self.risk.max_position_percent,
                    cap
                );
            }
        }
        Ok(())
    }
}
