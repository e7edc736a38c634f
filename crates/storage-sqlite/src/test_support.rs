//! Temp-file database fixture shared by the repository tests.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use tempfile::TempDir;

use crate::db::{self, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::quotes::{upsert_quote_rows, QuoteDB};
use crate::{ContractRepository, DownloadStateRepository, QuoteRepository, UniverseRepository};
use contract_sync_core::contracts::{ContractRepositoryTrait, InstrumentType, NewContract};
use contract_sync_core::errors::Result;
use contract_sync_core::quotes::Quote;

pub struct TestDb {
    // Keeps the database file alive for the duration of the test.
    _dir: TempDir,
    pub pool: Arc<DbPool>,
    pub writer: WriteHandle,
}

impl TestDb {
    /// Must be called inside a Tokio runtime.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("test.db");
        let (pool, writer) = db::open(&path.to_string_lossy()).expect("open test database");
        Self {
            _dir: dir,
            pool,
            writer,
        }
    }

    pub fn contracts(&self) -> ContractRepository {
        ContractRepository::new(self.pool.clone(), self.writer.clone())
    }

    pub fn quotes(&self) -> QuoteRepository {
        QuoteRepository::new(self.pool.clone(), self.writer.clone())
    }

    pub fn states(&self) -> DownloadStateRepository {
        DownloadStateRepository::new(self.pool.clone(), self.writer.clone())
    }

    pub fn universes(&self) -> UniverseRepository {
        UniverseRepository::new(self.pool.clone(), self.writer.clone())
    }

    pub async fn add_contract(&self, exchange: &str, symbol: &str, currency: &str) -> String {
        self.contracts()
            .create(new_contract(exchange, symbol, currency))
            .await
            .expect("create contract")
            .id
    }

    /// Writes bars through the same statement the download path uses,
    /// without touching download state.
    pub async fn store_quotes(&self, quotes: Vec<Quote>) -> Result<usize> {
        let rows: Vec<QuoteDB> = quotes.iter().map(QuoteDB::from).collect();
        self.writer
            .exec(move |conn| upsert_quote_rows(conn, &rows).into_core())
            .await
    }
}

pub fn new_contract(exchange: &str, symbol: &str, currency: &str) -> NewContract {
    NewContract {
        id: None,
        instrument_type: InstrumentType::Stock,
        exchange: exchange.to_string(),
        broker_symbol: symbol.to_string(),
        currency: currency.to_string(),
        exchange_symbol: symbol.to_string(),
        name: format!("{} Corp", symbol),
    }
}

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

pub fn quote(contract_id: &str, date: NaiveDate, close: i64) -> Quote {
    let price = Decimal::from(close);
    Quote {
        contract_id: contract_id.to_string(),
        date,
        open: price,
        high: price,
        low: price,
        close: price,
        volume: Decimal::from(1000),
    }
}
