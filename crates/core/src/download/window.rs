use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How much history a request asks the quote source for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestDuration {
    /// Calendar years ending at the window end.
    Years(u32),
    /// Trading days ending at the window end.
    TradingDays(u32),
}

impl fmt::Display for RequestDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestDuration::Years(n) => write!(f, "{} Y", n),
            RequestDuration::TradingDays(n) => write!(f, "{} D", n),
        }
    }
}

/// Requested history for one contract.
///
/// `start..=end` is the range recorded in the download state on success.
/// `duration` is what is actually asked of the source; for incremental
/// requests it covers only the tail of that range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub duration: RequestDuration,
}

impl RequestWindow {
    pub fn full_lookback(today: NaiveDate, years: u32) -> Self {
        let start = today
            .checked_sub_months(Months::new(years.saturating_mul(12)))
            .unwrap_or(NaiveDate::MIN);
        Self {
            start,
            end: today,
            duration: RequestDuration::Years(years),
        }
    }

    pub fn incremental(earliest: NaiveDate, today: NaiveDate, trading_days: u32) -> Self {
        Self {
            start: earliest,
            end: today,
            duration: RequestDuration::TradingDays(trading_days),
        }
    }
}

impl fmt::Display for RequestWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={} ({})", self.start, self.end, self.duration)
    }
}
