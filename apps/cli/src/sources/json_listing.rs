use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use contract_sync_core::contracts::InstrumentType;
use contract_sync_core::listings::{ListingError, ListingRecord, ListingSource};

/// Reads `<dir>/<TYPE>_<EXCHANGE>.json`, a JSON array of listing records.
pub struct JsonListingSource {
    dir: PathBuf,
}

impl JsonListingSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, instrument_type: &InstrumentType, exchange: &str) -> PathBuf {
        self.dir.join(format!(
            "{}_{}.json",
            instrument_type.as_code(),
            exchange.trim().to_ascii_uppercase()
        ))
    }
}

fn failed(path: &Path, err: impl std::fmt::Display) -> ListingError {
    ListingError::Failed(format!("{}: {}", path.display(), err))
}

#[async_trait]
impl ListingSource for JsonListingSource {
    async fn fetch_listing(
        &self,
        instrument_type: &InstrumentType,
        exchange: &str,
    ) -> Result<Vec<ListingRecord>, ListingError> {
        let path = self.path_for(instrument_type, exchange);
        if !path.is_file() {
            debug!("No listing snapshot at {}", path.display());
            return Err(ListingError::NoData);
        }
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| failed(&path, e))?;
        let records: Vec<ListingRecord> = serde_json::from_str(&raw).map_err(|e| failed(&path, e))?;
        if records.is_empty() {
            return Err(ListingError::NoData);
        }
        debug!("Read {} listing records from {}", records.len(), path.display());
        Ok(records)
    }
}
