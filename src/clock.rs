//! # Run Clock
//! A run reads the wall clock exactly once (in the binary). Every component
//! receives the resulting `RunDate` instead of asking for "today" itself.

use chrono::{Days, NaiveDate};

/// Retention period used when no config overrides it.
pub const DEFAULT_RETENTION_DAYS: u32 = 7;

/// Calendar date of the run plus the oldest date still eligible for retention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunDate {
    pub today: NaiveDate,
    pub cutoff: NaiveDate,
}

impl RunDate {
    /// A window reaching past the calendar's start is clamped to its first day.
    pub fn new(today: NaiveDate, retention_days: u32) -> Self {
        Self {
            today,
            cutoff: today
                .checked_sub_days(Days::new(u64::from(retention_days)))
                .unwrap_or(NaiveDate::MIN),
        }
    }

    /// `true` when `date` is inside the retention window (cutoff inclusive).
    #[inline]
    pub fn keeps(&self, date: NaiveDate) -> bool {
        date >= self.cutoff
    }

    /// `YYYYMMDD`, used to key snapshot files.
    pub fn stamp(&self) -> String {
        self.today.format("%Y%m%d").to_string()
    }
}
