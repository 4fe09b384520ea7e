use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use tracing::warn;

/// Ordered sequence of trading days over `[start, end]`, excluding weekends
/// and, when a holiday set is supplied, the configured holidays.
#[derive(Debug, Clone)]
pub struct TradingCalendar {
    days: Vec<NaiveDate>,
    holidays: HashSet<NaiveDate>,
}

impl TradingCalendar {
    /// Build a calendar by enumerating the inclusive date range.
    ///
    /// `holidays` is `None` when the caller has no holiday data configured
    /// for the spanned year(s); in that case all weekdays are treated as
    /// trading days and a warning is logged.
    pub fn build(start: NaiveDate, end: NaiveDate, holidays: Option<&HashSet<NaiveDate>>) -> Self {
        if holidays.is_none() {
            warn!(
                "no holiday calendar configured for range {}..={}; treating all weekdays as trading days",
                start, end
            );
        }

        let holidays = holidays.cloned().unwrap_or_default();
        let mut days = Vec::new();
        let mut cursor = start;
        while cursor <= end {
            let is_weekend = matches!(cursor.weekday(), Weekday::Sat | Weekday::Sun);
            if !is_weekend && !holidays.contains(&cursor) {
                days.push(cursor);
            }
            cursor += Duration::days(1);
        }

        Self { days, holidays }
    }

    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn excludes_weekends_with_no_holiday_set() {
        // 2024-02-09 Fri .. 2024-02-18 Sun, no holidays configured.
        let cal = TradingCalendar::build(d(2024, 2, 9), d(2024, 2, 18), None);
        assert!(cal.days().contains(&d(2024, 2, 9)));
        assert!(!cal.days().contains(&d(2024, 2, 10))); // Sat
        assert!(!cal.days().contains(&d(2024, 2, 11))); // Sun
        assert!(cal.days().contains(&d(2024, 2, 12)));
    }

    #[test]
    fn excludes_configured_holidays() {
        let mut holidays = HashSet::new();
        for day in 10..=17 {
            holidays.insert(d(2024, 2, day));
        }
        let cal = TradingCalendar::build(d(2024, 2, 9), d(2024, 2, 19), Some(&holidays));
        assert!(!cal.days().contains(&d(2024, 2, 8))); // out of range
        assert!(cal.days().contains(&d(2024, 2, 9)));
        for day in 10..=17 {
            assert!(!cal.days().contains(&d(2024, 2, day)));
        }
        assert!(cal.days().contains(&d(2024, 2, 19)));
    }
}
