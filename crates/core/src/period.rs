use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coverage window declared by a bank statement. Banks frequently omit
/// one or both bounds, so each is optional and a missing bound is
/// treated as open-ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementPeriod {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl StatementPeriod {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        StatementPeriod { start, end }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        if let Some(start) = self.start {
            if date < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if date > end {
                return false;
            }
        }
        true
    }

    /// Inclusive day count, only defined when both bounds are present
    /// and in order.
    pub fn span_days(self) -> Option<i64> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if end >= start => Some((end - start).num_days() + 1),
            _ => None,
        }
    }
}

impl fmt::Display for StatementPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.start {
            Some(start) => write!(f, "{start}")?,
            None => write!(f, "?")?,
        }
        write!(f, " a ")?;
        match self.end {
            Some(end) => write!(f, "{end}"),
            None => write!(f, "?"),
        }
    }
}
