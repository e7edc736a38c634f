use async_trait::async_trait;
use thiserror::Error;

use super::model::ListingRecord;
use crate::contracts::InstrumentType;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ListingError {
    /// The source returned no records for the market.
    #[error("listing source returned no data")]
    NoData,

    /// The fetch was interrupted before completing.
    #[error("listing fetch was cancelled")]
    Cancelled,

    #[error("listing fetch failed: {0}")]
    Failed(String),
}

/// Source of the authoritative contract listing for one market.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch_listing(
        &self,
        instrument_type: &InstrumentType,
        exchange: &str,
    ) -> Result<Vec<ListingRecord>, ListingError>;
}
