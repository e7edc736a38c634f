//! Exchange trading calendars.
//!
//! The scheduler counts business days with a calendar to measure staleness,
//! and the quality validator uses one to decide which dates a series should have.

mod weekday;

pub use weekday::WeekdayCalendar;

use chrono::NaiveDate;

use crate::errors::Result;

/// Source of exchange trading days.
pub trait TradingCalendar: Send + Sync {
    /// Trading days of `exchange` in the inclusive range `[from, to]`, ascending.
    ///
    /// Returns an empty list when `from > to`.
    fn trading_days(&self, exchange: &str, from: NaiveDate, to: NaiveDate)
        -> Result<Vec<NaiveDate>>;

    /// Number of trading days `d` with `after < d <= until`.
    fn trading_days_between(
        &self,
        exchange: &str,
        after: NaiveDate,
        until: NaiveDate,
    ) -> Result<usize> {
        match after.succ_opt() {
            Some(start) => Ok(self.trading_days(exchange, start, until)?.len()),
            None => Ok(0),
        }
    }
}
