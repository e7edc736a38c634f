use serde::Serialize;

use super::planner::SkipReason;

/// A contract whose download failed with a per-contract provider error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractFailure {
    pub contract_id: String,
    pub contract: String,
    pub code: i32,
    pub text: String,
}

/// Aggregate result of one scheduler run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadSummary {
    /// Contracts in scope for the run.
    pub total: usize,
    /// Contracts visited before the run ended.
    pub processed: usize,
    /// Contracts for which a request was issued.
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped_fresh: usize,
    pub skipped_error: usize,
    pub quotes_written: usize,
    /// Bars dropped because their OHLC values were inconsistent.
    pub bars_rejected: usize,
    /// Contracts too far behind to update incrementally, as display strings.
    pub stale: Vec<String>,
    pub failures: Vec<ContractFailure>,
    /// The run stopped early on an interrupt request.
    pub cancelled: bool,
}

impl DownloadSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn skipped(&self) -> usize {
        self.skipped_fresh + self.stale.len() + self.skipped_error
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0 && !self.cancelled
    }

    pub fn summary(&self) -> String {
        let mut line = format!(
            "{}/{} contracts processed: {} downloaded ({} quotes), {} failed, {} skipped ({} fresh, {} stale, {} previous errors)",
            self.processed,
            self.total,
            self.succeeded,
            self.quotes_written,
            self.failed,
            self.skipped(),
            self.skipped_fresh,
            self.stale.len(),
            self.skipped_error,
        );
        if self.bars_rejected > 0 {
            line.push_str(&format!(", {} bars rejected", self.bars_rejected));
        }
        if self.cancelled {
            line.push_str(", cancelled");
        }
        line
    }

    pub(crate) fn add_skipped(&mut self, contract: String, reason: SkipReason) {
        match reason {
            SkipReason::Fresh { .. } => self.skipped_fresh += 1,
            SkipReason::Stale { .. } => self.stale.push(contract),
            SkipReason::PreviousError => self.skipped_error += 1,
        }
    }

    pub(crate) fn add_success(&mut self, quotes_written: usize) {
        self.succeeded += 1;
        self.quotes_written += quotes_written;
    }

    pub(crate) fn add_failure(&mut self, failure: ContractFailure) {
        self.failed += 1;
        self.failures.push(failure);
    }
}
