//! Billing periods
//!
//! Calendar-safe month boundaries for each cost slot.

use chrono::{Datelike, Days, Months, NaiveDate};
use std::fmt;

use crate::error::FetchError;
use crate::metrics::MetricSlot;

/// Date format expected by the Cost Explorer API
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Half-open date interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl BillingPeriod {
    /// Period covered by `slot`, anchored to `today`
    pub fn for_slot(slot: MetricSlot, today: NaiveDate) -> Result<Self, FetchError> {
        let this_month = first_of_month(today);
        let last_month = months_back(this_month, 1)?;

        let period = match slot {
            MetricSlot::ThisMonth => Self {
                start: this_month,
                end: today,
            },
            MetricSlot::LastMonth => Self {
                start: last_month,
                end: this_month,
            },
            MetricSlot::BeforeLastMonth => Self {
                start: months_back(this_month, 2)?,
                end: last_month,
            },
        };
        Ok(period)
    }

    /// True when the interval covers no days (first day of the month for `ThisMonth`)
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Start date in API wire format
    pub fn start_str(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    /// End date in API wire format
    pub fn end_str(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start.format(DATE_FORMAT), self.end.format(DATE_FORMAT))
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

fn months_back(date: NaiveDate, n: u32) -> Result<NaiveDate, FetchError> {
    date.checked_sub_months(Months::new(n))
        .ok_or_else(|| FetchError::InvalidPeriod(format!("{date} minus {n} months is out of range")))
}
