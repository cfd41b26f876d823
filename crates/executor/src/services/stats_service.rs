use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Received,
    Executed,
    Rejected,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SignalCounters {
    pub received: u64,
    pub executed: u64,
    pub rejected: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub day: NaiveDate,
    #[serde(flatten)]
    pub counters: SignalCounters,
}

/// Per-UTC-day signal counters. The first access on a new day starts from zero.
pub struct SignalStats {
    day: NaiveDate,
    counters: SignalCounters,
}

impl SignalStats {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            day: now.date_naive(),
            counters: SignalCounters::default(),
        }
    }

    fn roll(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        if today != self.day {
            info!(
                "Day rolled over ({} -> {}), final counters: {:?}",
                self.day, today, self.counters
            );
            self.day = today;
            self.counters = SignalCounters::default();
        }
    }

    pub fn record(&mut self, outcome: Outcome, now: DateTime<Utc>) {
        self.roll(now);
        let counter = match outcome {
            Outcome::Received => &mut self.counters.received,
            Outcome::Executed => &mut self.counters.executed,
            Outcome::Rejected => &mut self.counters.rejected,
            Outcome::Failed => &mut self.counters.failed,
        };
        *counter += 1;
    }

    pub fn snapshot(&mut self, now: DateTime<Utc>) -> StatsSnapshot {
        self.roll(now);
        StatsSnapshot {
            day: self.day,
            counters: self.counters,
        }
    }
}
