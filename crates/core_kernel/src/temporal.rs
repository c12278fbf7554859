//! Clocks and policy periods
//!
//! Everything that reads "now" takes a [`Clock`] so that number allocation,
//! loss-history windows and audit timestamps can be pinned in tests.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid period: start {start} must be before end {end}")]
    InvalidPeriod {
        start: String,
        end: String,
    },

    #[error("Date {date} precedes {reference}")]
    PrecedesReference {
        date: String,
        reference: String,
    },
}

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar year used as the epoch component of human-readable numbers
    fn current_year(&self) -> i32 {
        self.now().year()
    }
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a given instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Midnight UTC on the given calendar date
    pub fn at_date(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| Self(dt.and_utc()))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// The coverage period of a policy: effective (inclusive) to expiration (exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyPeriod {
    effective: DateTime<Utc>,
    expiration: DateTime<Utc>,
}

impl PolicyPeriod {
    /// Creates a period, rejecting one whose expiration is not after its effective date
    pub fn new(effective: DateTime<Utc>, expiration: DateTime<Utc>) -> Result<Self, TemporalError> {
        if effective >= expiration {
            return Err(TemporalError::InvalidPeriod {
                start: effective.to_rfc3339(),
                end: expiration.to_rfc3339(),
            });
        }
        Ok(Self { effective, expiration })
    }

    /// A twelve-month term starting at `effective`
    pub fn annual(effective: DateTime<Utc>) -> Result<Self, TemporalError> {
        let expiration = effective
            .checked_add_months(chrono::Months::new(12))
            .unwrap_or(effective + Duration::days(365));
        Self::new(effective, expiration)
    }

    pub fn effective(&self) -> DateTime<Utc> {
        self.effective
    }

    pub fn expiration(&self) -> DateTime<Utc> {
        self.expiration
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.effective && at < self.expiration
    }

    pub fn term_days(&self) -> i64 {
        (self.expiration - self.effective).num_days()
    }
}

/// Rejects `date` when it precedes `reference`
pub fn ensure_not_before(date: DateTime<Utc>, reference: DateTime<Utc>) -> Result<(), TemporalError> {
    if date < reference {
        return Err(TemporalError::PrecedesReference {
            date: date.to_rfc3339(),
            reference: reference.to_rfc3339(),
        });
    }
    Ok(())
}

/// Whole years between `birth` and `at`
pub fn age_at(birth: NaiveDate, at: NaiveDate) -> i32 {
    let mut age = at.year() - birth.year();
    if (at.month(), at.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_period_rejects_inverted_dates() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            PolicyPeriod::new(start, end),
            Err(TemporalError::InvalidPeriod { .. })
        ));
        assert!(PolicyPeriod::new(start, start).is_err());
    }

    #[test]
    fn test_annual_period() {
        let start = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        let period = PolicyPeriod::annual(start).unwrap();
        assert_eq!(period.expiration(), Utc.with_ymd_and_hms(2025, 3, 15, 0, 0, 0).unwrap());
        assert!(period.contains(start));
        assert!(!period.contains(period.expiration()));
    }

    #[test]
    fn test_fixed_clock_year() {
        let clock = FixedClock::at_date(2031, 7, 4).unwrap();
        assert_eq!(clock.current_year(), 2031);
    }

    #[test]
    fn test_age_at_respects_birthday() {
        let birth = NaiveDate::from_ymd_opt(2000, 5, 20).unwrap();
        assert_eq!(age_at(birth, NaiveDate::from_ymd_opt(2024, 5, 19).unwrap()), 23);
        assert_eq!(age_at(birth, NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()), 24);
    }

    #[test]
    fn test_ensure_not_before() {
        let loss = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        assert!(ensure_not_before(loss, loss).is_ok());
        assert!(ensure_not_before(loss - Duration::days(1), loss).is_err());
    }
}
