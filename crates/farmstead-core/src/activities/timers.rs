//! Activity timers.

use chrono::NaiveDate;
use farmstead_logic::timing::TimerRule;

/// Predicate deciding whether an activity is due on a date.
pub trait ActivityTimer {
    fn name(&self) -> &str;
    fn is_due(&self, date: NaiveDate) -> bool;
}

/// A named [`TimerRule`].
#[derive(Debug, Clone, PartialEq)]
pub struct Timer {
    pub name: String,
    pub rule: TimerRule,
}

impl Timer {
    pub fn new(name: impl Into<String>, rule: TimerRule) -> Self {
        Self {
            name: name.into(),
            rule,
        }
    }
}

impl ActivityTimer for Timer {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_due(&self, date: NaiveDate) -> bool {
        self.rule.is_due(date)
    }
}
