//! Trade setup derivation: entry, ATR-scaled stop, risk-multiple target
//! ladder, holding timeframe and intraday timing window.

pub mod calculator;
pub mod models;
pub mod timing;

pub use calculator::calculate_setup;
pub use models::*;
pub use timing::{classify_market_timing, MarketTiming, TimingQuality, TimingStatus};
