//! In-memory send quota.
//!
//! Monthly and daily counters, reset neither persisted nor rebuilt from
//! the ledger on restart — these are soft operational counters, and the
//! monthly ceiling is reporting-only (it never blocks a send).

use chrono::NaiveDate;
use serde::Serialize;

/// Snapshot for /status and batch reports.
#[derive(Debug, Clone, Serialize)]
pub struct QuotaSnapshot {
    #[serde(rename = "totalSent")]
    pub total_sent: u32,
    #[serde(rename = "todaySent")]
    pub today_sent: u32,
    #[serde(rename = "lastReset")]
    pub last_reset: NaiveDate,
}

pub struct QuotaTracker {
    total_sent_month: u32,
    sent_today: u32,
    last_reset: NaiveDate,
    monthly_limit: u32,
    today: fn() -> NaiveDate,
}

fn utc_today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

impl QuotaTracker {
    pub fn new(monthly_limit: u32) -> Self {
        Self::with_clock(monthly_limit, utc_today)
    }

    /// Injectable clock for rollover tests.
    pub fn with_clock(monthly_limit: u32, today: fn() -> NaiveDate) -> Self {
        Self {
            total_sent_month: 0,
            sent_today: 0,
            last_reset: today(),
            monthly_limit,
            today,
        }
    }

    /// Reset the daily counter when the calendar date has advanced.
    /// Invoked before every report and every increment, so a rollover
    /// mid-batch counts only the post-rollover sends against the new day.
    pub fn rollover_if_new_day(&mut self) {
        let today = (self.today)();
        if today != self.last_reset {
            tracing::info!(
                "Daily quota rollover: {} → {} ({} sent yesterday)",
                self.last_reset,
                today,
                self.sent_today
            );
            self.sent_today = 0;
            self.last_reset = today;
        }
    }

    /// Count one accepted send.
    pub fn record_send(&mut self) {
        self.rollover_if_new_day();
        self.total_sent_month += 1;
        self.sent_today += 1;
    }

    /// Monthly ceiling minus the running total. Informational only.
    pub fn remaining(&self) -> i64 {
        i64::from(self.monthly_limit) - i64::from(self.total_sent_month)
    }

    pub fn monthly_limit(&self) -> u32 {
        self.monthly_limit
    }

    pub fn snapshot(&mut self) -> QuotaSnapshot {
        self.rollover_if_new_day();
        QuotaSnapshot {
            total_sent: self.total_sent_month,
            today_sent: self.sent_today,
            last_reset: self.last_reset,
        }
    }
}
