//! Per-contract download decision.
//!
//! ```text
//! no state / NEVER_ATTEMPTED ──► full lookback
//! SUCCESS  gap <= threshold  ──► skip (fresh)
//!          gap >  staleness  ──► skip (stale, needs manual re-sync)
//!          otherwise         ──► [earliest, today], gap + overlap trading days
//! ERROR    retry allowed     ──► full lookback
//!          otherwise         ──► skip
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use std::fmt;

use super::config::SchedulerConfig;
use super::state::{DownloadState, DownloadStatus};
use super::window::RequestWindow;
use crate::calendar::TradingCalendar;
use crate::errors::Result;

/// Why a request is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestReason {
    Initial,
    Incremental { gap: usize },
    Retry,
}

/// Why a contract is left alone in this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Behind by at most the re-download threshold.
    Fresh { gap: usize },
    /// Behind by more than the staleness limit.
    Stale { gap: usize },
    /// Last attempt failed and the retry policy says no.
    PreviousError,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Fresh { gap } => write!(f, "fresh ({} trading days behind)", gap),
            SkipReason::Stale { gap } => {
                write!(f, "stale ({} trading days behind), needs full re-sync", gap)
            }
            SkipReason::PreviousError => write!(f, "previous attempt failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadDecision {
    Request {
        window: RequestWindow,
        reason: RequestReason,
    },
    Skip(SkipReason),
}

/// Decides what to request for one contract.
///
/// `today` is the last day the window may cover; `now` is compared with the
/// last attempt time by the error retry policy.
pub fn plan_download(
    state: Option<&DownloadState>,
    exchange: &str,
    today: NaiveDate,
    now: DateTime<Utc>,
    calendar: &dyn TradingCalendar,
    config: &SchedulerConfig,
) -> Result<DownloadDecision> {
    let full = |reason| DownloadDecision::Request {
        window: RequestWindow::full_lookback(today, config.lookback_years),
        reason,
    };

    let Some(state) = state else {
        return Ok(full(RequestReason::Initial));
    };

    match state.status {
        DownloadStatus::NeverAttempted => Ok(full(RequestReason::Initial)),
        DownloadStatus::Error => {
            if config.error_retry.allows_retry(state.attempted_at, now) {
                Ok(full(RequestReason::Retry))
            } else {
                Ok(DownloadDecision::Skip(SkipReason::PreviousError))
            }
        }
        DownloadStatus::Success => {
            let Some((earliest, latest)) = state.requested_range() else {
                debug!(
                    "Contract {} has a success state without a requested range, using full lookback",
                    state.contract_id
                );
                return Ok(full(RequestReason::Initial));
            };

            let gap = calendar.trading_days_between(exchange, latest, today)?;
            if gap <= config.redownload_threshold_days as usize {
                return Ok(DownloadDecision::Skip(SkipReason::Fresh { gap }));
            }
            if gap > config.max_staleness_days as usize {
                return Ok(DownloadDecision::Skip(SkipReason::Stale { gap }));
            }

            let trading_days = u32::try_from(gap)
                .unwrap_or(u32::MAX)
                .saturating_add(config.overlap_days);
            Ok(DownloadDecision::Request {
                window: RequestWindow::incremental(earliest, today, trading_days),
                reason: RequestReason::Incremental { gap },
            })
        }
    }
}
