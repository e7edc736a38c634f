use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

use contract_sync_core::contracts::Contract;
use contract_sync_core::download::{
    QuoteSource, QuoteSourceError, RequestDuration, RequestWindow,
};
use contract_sync_core::quotes::{Bar, Quote};

/// Provider code for an unknown contract.
pub const NO_SECURITY_DEFINITION: i32 = 200;
/// Provider code for a historical data request that could not be served.
pub const HISTORICAL_DATA_ERROR: i32 = 162;

/// Reads daily bars from `<root>/<EXCHANGE>/<BROKER_SYMBOL>_<CURRENCY>.csv`
/// with a `date,open,high,low,close,volume` header.
pub struct CsvQuoteSource {
    root: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    date: String,
    open: String,
    high: String,
    low: String,
    close: String,
    volume: String,
}

impl CsvRow {
    fn into_bar(self) -> Result<Bar, String> {
        let decimal = |field: &str, raw: &str| {
            Decimal::from_str(raw.trim()).map_err(|e| format!("{} '{}': {}", field, raw, e))
        };
        Ok(Bar {
            date: NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
                .map_err(|e| format!("date '{}': {}", self.date, e))?,
            open: decimal("open", &self.open)?,
            high: decimal("high", &self.high)?,
            low: decimal("low", &self.low)?,
            close: decimal("close", &self.close)?,
            volume: decimal("volume", &self.volume)?,
        })
    }
}

impl From<&Quote> for CsvRow {
    fn from(quote: &Quote) -> Self {
        CsvRow {
            date: quote.date.format("%Y-%m-%d").to_string(),
            open: quote.open.to_string(),
            high: quote.high.to_string(),
            low: quote.low.to_string(),
            close: quote.close.to_string(),
            volume: quote.volume.to_string(),
        }
    }
}

/// Writes quotes in the layout [`CsvQuoteSource`] reads.
pub fn write_quotes<W: Write>(quotes: &[Quote], out: W) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for quote in quotes {
        writer.serialize(CsvRow::from(quote))?;
    }
    writer.flush()?;
    Ok(())
}

impl CsvQuoteSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, contract: &Contract) -> PathBuf {
        self.root.join(&contract.exchange).join(format!(
            "{}_{}.csv",
            contract.broker_symbol, contract.currency
        ))
    }
}

fn historical_error(text: String) -> QuoteSourceError {
    QuoteSourceError::Contract {
        code: HISTORICAL_DATA_ERROR,
        text: format!("Historical Market Data Service error message: {}", text),
    }
}

#[async_trait]
impl QuoteSource for CsvQuoteSource {
    async fn connect(&self) -> Result<(), QuoteSourceError> {
        if !self.root.is_dir() {
            return Err(QuoteSourceError::Systemic(format!(
                "quote directory {} not found",
                self.root.display()
            )));
        }
        info!("Reading quotes from {}", self.root.display());
        Ok(())
    }

    async fn disconnect(&self) {
        debug!("Closed quote directory {}", self.root.display());
    }

    async fn fetch_quotes(
        &self,
        contract: &Contract,
        window: &RequestWindow,
    ) -> Result<Vec<Bar>, QuoteSourceError> {
        let path = self.path_for(contract);
        if !path.is_file() {
            return Err(QuoteSourceError::Contract {
                code: NO_SECURITY_DEFINITION,
                text: "No security definition has been found for the request".to_string(),
            });
        }
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| QuoteSourceError::Systemic(format!("{}: {}", path.display(), e)))?;

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(raw.as_bytes());
        let mut bars = Vec::new();
        for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
            // Line 1 is the header.
            let line = index + 2;
            let bar = row
                .map_err(|e| historical_error(format!("line {}: {}", line, e)))?
                .into_bar()
                .map_err(|e| historical_error(format!("line {}: {}", line, e)))?;
            if bar.date >= window.start && bar.date <= window.end {
                bars.push(bar);
            }
        }
        bars.sort_by_key(|bar| bar.date);
        if let RequestDuration::TradingDays(n) = window.duration {
            let keep = n as usize;
            if bars.len() > keep {
                bars.drain(..bars.len() - keep);
            }
        }
        debug!(
            "{}: {} bars between {} and {} ({})",
            contract, bars.len(), window.start, window.end, window.duration
        );
        Ok(bars)
    }
}
