//! Per-contract download state and its storage trait.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::window::RequestWindow;
use crate::errors::{Error, Result, ValidationError};
use crate::quotes::Quote;

/// Outcome of the last download attempt for a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DownloadStatus {
    #[default]
    NeverAttempted,
    Success,
    Error,
}

impl DownloadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadStatus::NeverAttempted => "NEVER_ATTEMPTED",
            DownloadStatus::Success => "SUCCESS",
            DownloadStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DownloadStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "NEVER_ATTEMPTED" => Ok(DownloadStatus::NeverAttempted),
            "SUCCESS" => Ok(DownloadStatus::Success),
            "ERROR" => Ok(DownloadStatus::Error),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "unknown download status '{}'",
                other
            )))),
        }
    }
}

/// Download bookkeeping for one contract.
///
/// `earliest_requested_date` and `latest_requested_date` are only set when
/// `status` is `Success`. They bound the range for which stored quotes are
/// known to be complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadState {
    pub contract_id: String,
    pub status: DownloadStatus,
    pub error_code: Option<i32>,
    pub error_text: Option<String>,
    pub earliest_requested_date: Option<NaiveDate>,
    pub latest_requested_date: Option<NaiveDate>,
    pub attempted_at: Option<DateTime<Utc>>,
}

impl DownloadState {
    pub fn never_attempted(contract_id: &str) -> Self {
        Self {
            contract_id: contract_id.to_string(),
            status: DownloadStatus::NeverAttempted,
            error_code: None,
            error_text: None,
            earliest_requested_date: None,
            latest_requested_date: None,
            attempted_at: None,
        }
    }

    pub fn succeeded(contract_id: &str, window: &RequestWindow, at: DateTime<Utc>) -> Self {
        Self {
            contract_id: contract_id.to_string(),
            status: DownloadStatus::Success,
            error_code: None,
            error_text: None,
            earliest_requested_date: Some(window.start),
            latest_requested_date: Some(window.end),
            attempted_at: Some(at),
        }
    }

    pub fn failed(
        contract_id: &str,
        error_code: Option<i32>,
        error_text: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            contract_id: contract_id.to_string(),
            status: DownloadStatus::Error,
            error_code,
            error_text: Some(error_text.into()),
            earliest_requested_date: None,
            latest_requested_date: None,
            attempted_at: Some(at),
        }
    }

    /// The known-complete range, if the last attempt succeeded and recorded one.
    pub fn requested_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (
            self.status,
            self.earliest_requested_date,
            self.latest_requested_date,
        ) {
            (DownloadStatus::Success, Some(earliest), Some(latest)) => Some((earliest, latest)),
            _ => None,
        }
    }
}

// =============================================================================
// DownloadStateStore
// =============================================================================

/// Storage interface for download states.
///
/// Every write replaces the previous state row of the contract.
#[async_trait]
pub trait DownloadStateStore: Send + Sync {
    fn get_state(&self, contract_id: &str) -> Result<Option<DownloadState>>;

    /// States keyed by contract id. Contracts without a row are absent from the map.
    fn get_states(&self, contract_ids: &[String]) -> Result<HashMap<String, DownloadState>>;

    fn list_by_status(&self, status: DownloadStatus) -> Result<Vec<DownloadState>>;

    /// Upserts `quotes` and writes `state` in one transaction.
    ///
    /// # Returns
    ///
    /// The number of quotes written
    async fn record_success(&self, state: DownloadState, quotes: Vec<Quote>) -> Result<usize>;

    async fn record_failure(&self, state: DownloadState) -> Result<()>;

    /// Deletes state rows so the next run treats the contracts as never attempted.
    async fn reset(&self, contract_ids: Vec<String>) -> Result<usize>;
}
