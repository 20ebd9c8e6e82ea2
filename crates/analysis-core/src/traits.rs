use chrono::{DateTime, Utc};

/// Source of "now" for every time-dependent calculation in the pipeline.
///
/// Stages never call `Utc::now()` directly; the orchestrator reads the clock
/// once per evaluation and threads the instant through, so a fixed clock makes
/// a whole run reproducible.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant (tests, replays, batch runs pinned to one time).
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
