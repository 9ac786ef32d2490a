//! Operator-selected date range.

use chrono::{Days, NaiveDate, Utc};
use serde::Serialize;

/// Error type for range validation.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DateRangeError {
    #[error("End date must fall after start date.")]
    EndBeforeStart,

    #[error("Dates may not lie in the future.")]
    BeyondToday,
}

/// An inclusive date interval shared by every panel in a render pass.
///
/// Invariant: `start < end`, and neither bound lies past today. A violated
/// range never reaches the panels; construction fails instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Validate and construct a range.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        Self::new_as_of(start, end, Utc::now().date_naive())
    }

    /// Validation against an explicit "today", for deterministic tests.
    pub fn new_as_of(
        start: NaiveDate,
        end: NaiveDate,
        today: NaiveDate,
    ) -> Result<Self, DateRangeError> {
        if start >= end {
            return Err(DateRangeError::EndBeforeStart);
        }
        if start > today || end > today {
            return Err(DateRangeError::BeyondToday);
        }
        Ok(Self { start, end })
    }

    /// The default window: the trailing `days` days ending today.
    pub fn trailing_days(days: u64) -> Self {
        let end = Utc::now().date_naive();
        let start = end.checked_sub_days(Days::new(days)).unwrap_or(end);
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}
