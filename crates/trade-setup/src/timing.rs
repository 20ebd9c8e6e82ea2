use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimingStatus {
    Optimal,
    Acceptable,
    Avoid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimingQuality {
    High,
    Medium,
    Low,
}

/// Where "now" falls relative to the US equity session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketTiming {
    pub status: TimingStatus,
    pub window: String,
    pub quality: TimingQuality,
    pub recommendation: String,
}

struct Window {
    start: u32,
    end: u32,
    status: TimingStatus,
    name: &'static str,
    recommendation: &'static str,
}

const fn utc_minutes(hour: u32, minute: u32) -> u32 {
    hour * 60 + minute
}

// Regular session is 13:30-20:00 UTC. Windows are half-open [start, end).
const WINDOWS: [Window; 5] = [
    Window {
        start: utc_minutes(13, 30),
        end: utc_minutes(13, 45),
        status: TimingStatus::Avoid,
        name: "Opening volatility",
        recommendation: "Wait for the opening range to settle before entering",
    },
    Window {
        start: utc_minutes(19, 45),
        end: utc_minutes(20, 0),
        status: TimingStatus::Avoid,
        name: "Closing volatility",
        recommendation: "Avoid new entries into the closing auction",
    },
    Window {
        start: utc_minutes(13, 45),
        end: utc_minutes(14, 30),
        status: TimingStatus::Optimal,
        name: "Opening momentum",
        recommendation: "Enter on confirmation of the opening move",
    },
    Window {
        start: utc_minutes(14, 30),
        end: utc_minutes(15, 30),
        status: TimingStatus::Optimal,
        name: "Post-open stability",
        recommendation: "Spreads have tightened, execute at planned levels",
    },
    Window {
        start: utc_minutes(19, 0),
        end: utc_minutes(19, 45),
        status: TimingStatus::Optimal,
        name: "Late-day positioning",
        recommendation: "Position ahead of the close with defined risk",
    },
];

/// Classify `now` against the fixed UTC trading windows.
pub fn classify_market_timing(now: DateTime<Utc>) -> MarketTiming {
    let minute_of_day = now.hour() * 60 + now.minute();

    if let Some(window) = WINDOWS
        .iter()
        .find(|w| minute_of_day >= w.start && minute_of_day < w.end)
    {
        let quality = match window.status {
            TimingStatus::Optimal => TimingQuality::High,
            TimingStatus::Acceptable => TimingQuality::Medium,
            TimingStatus::Avoid => TimingQuality::Low,
        };
        return MarketTiming {
            status: window.status,
            window: window.name.to_string(),
            quality,
            recommendation: window.recommendation.to_string(),
        };
    }

    let in_session = (utc_minutes(13, 30)..utc_minutes(20, 0)).contains(&minute_of_day);
    MarketTiming {
        status: TimingStatus::Acceptable,
        window: if in_session {
            "Regular session".to_string()
        } else {
            "Outside regular session".to_string()
        },
        quality: TimingQuality::Medium,
        recommendation: "Standard execution, use limit orders".to_string(),
    }
}
