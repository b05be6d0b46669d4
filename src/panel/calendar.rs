//! Trading calendar used for completeness checks
//!
//! The calendar is the set of dates on which anything in the raw panel traded.
//! A contract is complete when its dates inside a window equal the calendar's
//! dates inside the same window.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};

/// Distinct trading dates across a panel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradingCalendar {
    dates: BTreeSet<NaiveDate>,
}

impl TradingCalendar {
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Calendar dates in `[expiration - window_days, expiration]`
    pub fn window(&self, expiration: NaiveDate, window_days: i64) -> BTreeSet<NaiveDate> {
        let start = expiration - Duration::days(window_days);
        self.dates.range(start..=expiration).copied().collect()
    }

    /// Compare a contract's dates with the calendar over the window ending at
    /// `expiration`. Contract dates outside the window are ignored.
    pub fn check(
        &self,
        dates: impl IntoIterator<Item = NaiveDate>,
        expiration: NaiveDate,
        window_days: i64,
    ) -> CalendarCheck {
        let start = expiration - Duration::days(window_days);
        let actual: BTreeSet<NaiveDate> = dates
            .into_iter()
            .filter(|d| *d >= start && *d <= expiration)
            .collect();
        let expected = self.window(expiration, window_days);

        CalendarCheck {
            missing: expected.difference(&actual).copied().collect(),
            extra: actual.difference(&expected).copied().collect(),
            expected: expected.len(),
        }
    }
}

/// Outcome of comparing a contract's dates with the trading calendar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarCheck {
    /// Calendar dates the contract has no observation for
    pub missing: Vec<NaiveDate>,
    /// Contract dates the calendar does not contain
    pub extra: Vec<NaiveDate>,
    /// Number of calendar dates in the window
    pub expected: usize,
}

impl CalendarCheck {
    /// Exact set equality with a non-empty window
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty() && self.expected > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 6, d).unwrap()
    }

    fn calendar() -> TradingCalendar {
        TradingCalendar::new([day(1), day(2), day(5), day(6), day(7), day(8), day(9)])
    }

    #[test]
    fn test_window_is_inclusive() {
        let cal = calendar();
        let window = cal.window(day(9), 4);
        assert_eq!(window.into_iter().collect::<Vec<_>>(), vec![day(5), day(6), day(7), day(8), day(9)]);
    }

    #[test]
    fn test_complete_contract() {
        let cal = calendar();
        let check = cal.check([day(5), day(6), day(7), day(8), day(9)], day(9), 4);
        assert!(check.is_complete());
        assert_eq!(check.expected, 5);
    }

    #[test]
    fn test_dates_outside_window_are_ignored() {
        let cal = calendar();
        let check = cal.check([day(1), day(5), day(6), day(7), day(8), day(9)], day(9), 4);
        assert!(check.is_complete());
    }

    #[test]
    fn test_single_missing_day() {
        let cal = calendar();
        let check = cal.check([day(5), day(6), day(8), day(9)], day(9), 4);
        assert!(!check.is_complete());
        assert_eq!(check.missing, vec![day(7)]);
    }

    #[test]
    fn test_equal_count_is_not_enough() {
        // Same number of dates, but one is off-calendar
        let cal = TradingCalendar::new([day(5), day(6), day(7)]);
        let check = cal.check([day(5), day(6), day(8)], day(8), 3);
        assert!(!check.is_complete());
        assert_eq!(check.missing, vec![day(7)]);
        assert_eq!(check.extra, vec![day(8)]);
    }

    #[test]
    fn test_empty_window_is_incomplete() {
        let cal = calendar();
        let check = cal.check(Vec::new(), day(30), 5);
        assert!(!check.is_complete());
    }
}
