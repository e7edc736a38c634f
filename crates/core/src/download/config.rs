use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{Error, Result};

/// Whether contracts whose last attempt failed are attempted again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum ErrorRetryPolicy {
    /// Failed contracts stay failed until reset.
    #[default]
    Never,
    /// Every failed contract is retried.
    Always,
    /// Retry once the last attempt is at least this many days old.
    AfterDays(u32),
}

impl ErrorRetryPolicy {
    pub fn allows_retry(&self, attempted_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match self {
            ErrorRetryPolicy::Never => false,
            ErrorRetryPolicy::Always => true,
            ErrorRetryPolicy::AfterDays(days) => match attempted_at {
                Some(at) => now - at >= Duration::days(i64::from(*days)),
                None => true,
            },
        }
    }
}

impl fmt::Display for ErrorRetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorRetryPolicy::Never => write!(f, "never"),
            ErrorRetryPolicy::Always => write!(f, "always"),
            ErrorRetryPolicy::AfterDays(days) => write!(f, "after:{}", days),
        }
    }
}

impl FromStr for ErrorRetryPolicy {
    type Err = Error;

    /// Accepts `never`, `always` or `after:<days>`.
    fn from_str(s: &str) -> Result<Self> {
        let value = s.trim().to_ascii_lowercase();
        match value.as_str() {
            "never" | "" => Ok(ErrorRetryPolicy::Never),
            "always" => Ok(ErrorRetryPolicy::Always),
            _ => value
                .strip_prefix("after:")
                .and_then(|days| days.parse::<u32>().ok())
                .map(ErrorRetryPolicy::AfterDays)
                .ok_or_else(|| {
                    Error::InvalidConfigValue(format!(
                        "error retry policy '{}' (expected never, always or after:<days>)",
                        s
                    ))
                }),
        }
    }
}

impl TryFrom<String> for ErrorRetryPolicy {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ErrorRetryPolicy> for String {
    fn from(p: ErrorRetryPolicy) -> Self {
        p.to_string()
    }
}

/// Thresholds driving the per-contract download decision.
///
/// Day counts are trading days of the contract's exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulerConfig {
    /// History requested for a contract that has never been downloaded.
    pub lookback_years: u32,
    /// A successful contract at most this many trading days behind is left alone.
    pub redownload_threshold_days: u32,
    /// A successful contract more than this many trading days behind is skipped
    /// and reported for a manual full re-sync.
    pub max_staleness_days: u32,
    /// Extra trading days requested before the gap, so the last stored bar
    /// (possibly from an unfinished session) is overwritten.
    pub overlap_days: u32,
    pub error_retry: ErrorRetryPolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            lookback_years: 10,
            redownload_threshold_days: 1,
            max_staleness_days: 120,
            overlap_days: 3,
            error_retry: ErrorRetryPolicy::Never,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.lookback_years == 0 {
            return Err(Error::InvalidConfigValue(
                "lookback_years must be at least 1".to_string(),
            ));
        }
        if self.max_staleness_days < self.redownload_threshold_days {
            return Err(Error::InvalidConfigValue(format!(
                "max_staleness_days ({}) is below redownload_threshold_days ({})",
                self.max_staleness_days, self.redownload_threshold_days
            )));
        }
        Ok(())
    }
}
