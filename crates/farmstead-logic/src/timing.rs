//! Timer rules and monthly calendar helpers.
//!
//! The simulation advances one calendar month per step. Timer rules decide
//! whether an activity is due in the month containing a given date; all
//! comparisons are made at month resolution.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Absolute month number (`year * 12 + month0`) for month arithmetic.
pub fn month_index(date: NaiveDate) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}

/// Whole months from `from` to `to` (negative if `to` is earlier).
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    month_index(to) - month_index(from)
}

/// Advance a date by whole months, clamping to the end of shorter months.
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months)).unwrap_or(NaiveDate::MAX)
}

/// Rule deciding in which months an activity is due.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule")]
pub enum TimerRule {
    /// Due every month.
    Always,
    /// Due in months `start_month..=end_month` (1-12). Wraps over the year
    /// end when `start_month > end_month`.
    MonthRange { start_month: u32, end_month: u32 },
    /// Due in the month of `first` and every `every_months` after it.
    Interval { first: NaiveDate, every_months: u32 },
    /// Due in every month from `start` to `end` inclusive.
    DateRange { start: NaiveDate, end: NaiveDate },
}

impl TimerRule {
    /// Whether the rule is due in the month containing `date`.
    pub fn is_due(&self, date: NaiveDate) -> bool {
        match self {
            TimerRule::Always => true,
            TimerRule::MonthRange {
                start_month,
                end_month,
            } => {
                let month = date.month();
                if start_month <= end_month {
                    month >= *start_month && month <= *end_month
                } else {
                    month >= *start_month || month <= *end_month
                }
            }
            TimerRule::Interval {
                first,
                every_months,
            } => {
                let elapsed = months_between(*first, date);
                if elapsed < 0 {
                    return false;
                }
                if *every_months == 0 {
                    return elapsed == 0;
                }
                elapsed % *every_months as i64 == 0
            }
            TimerRule::DateRange { start, end } => {
                let m = month_index(date);
                m >= month_index(*start) && m <= month_index(*end)
            }
        }
    }

    /// Reject month numbers outside 1-12.
    pub fn is_valid(&self) -> bool {
        match self {
            TimerRule::MonthRange {
                start_month,
                end_month,
            } => (1..=12).contains(start_month) && (1..=12).contains(end_month),
            TimerRule::DateRange { start, end } => start <= end,
            _ => true,
        }
    }
}
