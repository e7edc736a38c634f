use chrono::{Datelike, NaiveDate, Weekday};
use log::debug;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use super::TradingCalendar;
use crate::errors::{Error, Result};

/// Monday to Friday, minus per-exchange holidays.
///
/// Exchanges without a holiday list trade every weekday.
#[derive(Debug, Clone, Default)]
pub struct WeekdayCalendar {
    holidays: HashMap<String, BTreeSet<NaiveDate>>,
}

impl WeekdayCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_holidays(
        mut self,
        exchange: &str,
        dates: impl IntoIterator<Item = NaiveDate>,
    ) -> Self {
        self.holidays
            .entry(exchange.to_ascii_uppercase())
            .or_default()
            .extend(dates);
        self
    }

    /// Loads holidays from a JSON object mapping exchange to `YYYY-MM-DD` dates:
    ///
    /// ```json
    /// { "NYSE": ["2024-01-01", "2024-07-04"], "LSE": ["2024-12-25"] }
    /// ```
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigIO(format!("{}: {}", path.display(), e)))?;
        let parsed: HashMap<String, Vec<NaiveDate>> = serde_json::from_str(&raw)?;

        let mut calendar = Self::new();
        for (exchange, dates) in parsed {
            debug!("Loaded {} holiday(s) for {}", dates.len(), exchange);
            calendar = calendar.with_holidays(&exchange, dates);
        }
        Ok(calendar)
    }

    pub fn is_trading_day(&self, exchange: &str, date: NaiveDate) -> bool {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        !self
            .holidays
            .get(&exchange.to_ascii_uppercase())
            .is_some_and(|h| h.contains(&date))
    }
}

impl TradingCalendar for WeekdayCalendar {
    fn trading_days(
        &self,
        exchange: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        if from > to {
            return Ok(Vec::new());
        }
        Ok(from
            .iter_days()
            .take_while(|d| *d <= to)
            .filter(|d| self.is_trading_day(exchange, *d))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_weekends_are_closed() {
        let cal = WeekdayCalendar::new();
        // 2024-03-04 is a Monday.
        let days = cal.trading_days("NYSE", d(2024, 3, 4), d(2024, 3, 10)).unwrap();
        assert_eq!(days.len(), 5);
        assert_eq!(days.first(), Some(&d(2024, 3, 4)));
        assert_eq!(days.last(), Some(&d(2024, 3, 8)));
    }

    #[test]
    fn test_holidays_are_per_exchange() {
        let cal = WeekdayCalendar::new().with_holidays("nyse", [d(2024, 7, 4)]);
        assert!(!cal.is_trading_day("NYSE", d(2024, 7, 4)));
        assert!(cal.is_trading_day("LSE", d(2024, 7, 4)));
    }

    #[test]
    fn test_empty_when_range_inverted() {
        let cal = WeekdayCalendar::new();
        assert!(cal
            .trading_days("NYSE", d(2024, 3, 8), d(2024, 3, 4))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_trading_days_between_excludes_start() {
        let cal = WeekdayCalendar::new();
        // Friday -> next Wednesday: Mon, Tue, Wed.
        assert_eq!(
            cal.trading_days_between("NYSE", d(2024, 3, 8), d(2024, 3, 13))
                .unwrap(),
            3
        );
        assert_eq!(
            cal.trading_days_between("NYSE", d(2024, 3, 13), d(2024, 3, 13))
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"NYSE": ["2024-12-25"], "XETRA": ["2024-12-24"]}}"#).unwrap();

        let cal = WeekdayCalendar::from_json_file(file.path()).unwrap();
        assert!(!cal.is_trading_day("NYSE", d(2024, 12, 25)));
        assert!(cal.is_trading_day("NYSE", d(2024, 12, 24)));
        assert!(!cal.is_trading_day("XETRA", d(2024, 12, 24)));
    }

    #[test]
    fn test_unreadable_holidays_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = WeekdayCalendar::from_json_file(&dir.path().join("absent.json"));
        assert!(matches!(missing, Err(Error::ConfigIO(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"NYSE": ["not a date"]}}"#).unwrap();
        let malformed = WeekdayCalendar::from_json_file(file.path());
        assert!(matches!(malformed, Err(Error::ConfigIO(_))));
    }
}
