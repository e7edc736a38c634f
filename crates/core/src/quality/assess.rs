//! Gap assessment of a stored price series against a trading calendar.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::errors::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QualityConfig {
    /// A series with fewer quotes is deleted.
    pub min_quote_count: usize,
    /// A series missing more trading days than this after its last quote is deleted.
    pub max_tail_gap_days: usize,
    /// Interior runs of missing trading days longer than this cause truncation.
    pub max_gap_size: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_quote_count: 50,
            max_tail_gap_days: 20,
            max_gap_size: 10,
        }
    }
}

impl QualityConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_quote_count == 0 {
            return Err(Error::InvalidConfigValue(
                "min_quote_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "reason")]
pub enum DeleteReason {
    TooFewQuotes { count: usize },
    StaleTail { missing: usize },
    TooFewAfterTruncation { from: NaiveDate, remaining: usize },
}

impl fmt::Display for DeleteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteReason::TooFewQuotes { count } => write!(f, "only {} quotes", count),
            DeleteReason::StaleTail { missing } => {
                write!(f, "{} trading days missing at the end", missing)
            }
            DeleteReason::TooFewAfterTruncation { from, remaining } => {
                write!(f, "only {} quotes left from {}", remaining, from)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "action")]
pub enum QualityAction {
    Keep,
    /// Drop every quote dated before this day.
    Truncate { from: NaiveDate },
    Delete(DeleteReason),
}

impl fmt::Display for QualityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityAction::Keep => write!(f, "keep"),
            QualityAction::Truncate { from } => write!(f, "truncate before {}", from),
            QualityAction::Delete(reason) => write!(f, "delete ({})", reason),
        }
    }
}

/// A run of consecutive trading days with no stored quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapRun {
    pub first_missing: NaiveDate,
    pub last_missing: NaiveDate,
    pub len: usize,
    /// First stored day after the run.
    pub resumes: NaiveDate,
}

/// Interior gaps of `stored`: runs of `trading_days` between the first and
/// last stored date that have no quote, in chronological order.
pub fn find_gaps(stored: &[NaiveDate], trading_days: &[NaiveDate]) -> Vec<GapRun> {
    let present: BTreeSet<NaiveDate> = stored.iter().copied().collect();
    let (Some(&first), Some(&last)) = (present.first(), present.last()) else {
        return Vec::new();
    };

    let mut gaps = Vec::new();
    let mut open: Option<(NaiveDate, NaiveDate, usize)> = None;
    for &day in trading_days.iter().filter(|d| **d >= first && **d <= last) {
        if present.contains(&day) {
            if let Some((first_missing, last_missing, len)) = open.take() {
                gaps.push(GapRun {
                    first_missing,
                    last_missing,
                    len,
                    resumes: day,
                });
            }
        } else {
            open = Some(match open {
                Some((start, _, len)) => (start, day, len + 1),
                None => (day, day, 1),
            });
        }
    }
    gaps
}

/// Decides what to do with a stored series.
///
/// `trading_days` must cover the first stored date through today. Runs of
/// missing days longer than `max_gap_size` are cut away from the earliest one
/// onward, so the cut lands after the last such run and a second pass over the
/// result keeps it.
pub fn assess_series(
    stored: &[NaiveDate],
    trading_days: &[NaiveDate],
    config: &QualityConfig,
) -> QualityAction {
    let present: BTreeSet<NaiveDate> = stored.iter().copied().collect();
    let count = present.len();
    if count < config.min_quote_count {
        return QualityAction::Delete(DeleteReason::TooFewQuotes { count });
    }
    let Some(&last) = present.last() else {
        return QualityAction::Delete(DeleteReason::TooFewQuotes { count });
    };

    let missing = trading_days.iter().filter(|d| **d > last).count();
    if missing > config.max_tail_gap_days {
        return QualityAction::Delete(DeleteReason::StaleTail { missing });
    }

    let cut = find_gaps(stored, trading_days)
        .into_iter()
        .filter(|gap| gap.len > config.max_gap_size)
        .last();

    match cut {
        None => QualityAction::Keep,
        Some(gap) => {
            let remaining = present.range(gap.resumes..).count();
            if remaining < config.min_quote_count {
                QualityAction::Delete(DeleteReason::TooFewAfterTruncation {
                    from: gap.resumes,
                    remaining,
                })
            } else {
                QualityAction::Truncate { from: gap.resumes }
            }
        }
    }
}
