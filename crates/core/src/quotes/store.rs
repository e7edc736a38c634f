//! Quote storage trait.
//!
//! Abstracts the persistence of daily bars so the scheduler and the quality
//! validator can run against SQLite or an in-memory mock.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::model::Quote;
use crate::errors::Result;

/// Storage interface for quote data.
///
/// # Design Notes
///
/// - Sync methods are reads, async methods go through the single writer
/// - `(contract_id, date)` is unique; writes replace on conflict
/// - Bars are written together with the download state, through
///   [`DownloadStateStore::record_success`](crate::download::DownloadStateStore::record_success)
#[async_trait]
pub trait QuoteStore: Send + Sync {
    // =========================================================================
    // Mutations
    // =========================================================================

    /// Deletes every quote of `contract_id` dated strictly before `from_date`.
    ///
    /// The contract's download state, if it is a success, has its
    /// `earliest_requested_date` raised to `from_date` in the same transaction.
    ///
    /// # Returns
    ///
    /// The number of quotes removed
    async fn truncate_before(&self, contract_id: &str, from_date: NaiveDate) -> Result<usize>;

    // =========================================================================
    // Queries
    // =========================================================================

    /// Stored dates for a contract, ascending.
    fn quote_dates(&self, contract_id: &str) -> Result<Vec<NaiveDate>>;

    /// Quotes for a contract within an optional inclusive date range, ascending.
    fn get_quotes(
        &self,
        contract_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Quote>>;

    fn count_quotes(&self, contract_id: &str) -> Result<usize>;

    /// First and last stored date, or `None` when the contract has no quotes.
    fn date_bounds(&self, contract_id: &str) -> Result<Option<(NaiveDate, NaiveDate)>>;
}
