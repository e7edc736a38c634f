use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

use super::model::DownloadStateDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::quotes::{upsert_quote_rows, QuoteDB};
use crate::schema::download_states;
use crate::utils::chunk_for_sqlite;

use contract_sync_core::download::{DownloadState, DownloadStateStore, DownloadStatus};
use contract_sync_core::errors::Result;
use contract_sync_core::quotes::Quote;

pub struct DownloadStateRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl DownloadStateRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn write_state(conn: &mut SqliteConnection, row: &DownloadStateDB) -> QueryResult<usize> {
    diesel::replace_into(download_states::table)
        .values(row)
        .execute(conn)
}

#[async_trait]
impl DownloadStateStore for DownloadStateRepository {
    fn get_state(&self, contract_id: &str) -> Result<Option<DownloadState>> {
        let mut conn = get_connection(&self.pool)?;
        let row = download_states::table
            .find(contract_id)
            .select(DownloadStateDB::as_select())
            .first::<DownloadStateDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        row.map(DownloadState::try_from).transpose()
    }

    fn get_states(&self, contract_ids: &[String]) -> Result<HashMap<String, DownloadState>> {
        if contract_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = get_connection(&self.pool)?;
        let mut states = HashMap::with_capacity(contract_ids.len());
        for chunk in chunk_for_sqlite(contract_ids) {
            let rows = download_states::table
                .filter(download_states::contract_id.eq_any(chunk))
                .select(DownloadStateDB::as_select())
                .load::<DownloadStateDB>(&mut conn)
                .map_err(StorageError::from)?;
            for row in rows {
                states.insert(row.contract_id.clone(), DownloadState::try_from(row)?);
            }
        }
        Ok(states)
    }

    fn list_by_status(&self, status: DownloadStatus) -> Result<Vec<DownloadState>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = download_states::table
            .filter(download_states::status.eq(status.as_str()))
            .order(download_states::contract_id.asc())
            .select(DownloadStateDB::as_select())
            .load::<DownloadStateDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(DownloadState::try_from).collect()
    }

    async fn record_success(&self, state: DownloadState, quotes: Vec<Quote>) -> Result<usize> {
        let state_row = DownloadStateDB::from(&state);
        let quote_rows: Vec<QuoteDB> = quotes.iter().map(QuoteDB::from).collect();
        self.writer
            .exec(move |conn| {
                let written = upsert_quote_rows(conn, &quote_rows).map_err(StorageError::from)?;
                write_state(conn, &state_row).map_err(StorageError::from)?;
                debug!(
                    "Stored {} quotes for {} and marked it {}",
                    written, state_row.contract_id, state_row.status
                );
                Ok(written)
            })
            .await
    }

    async fn record_failure(&self, state: DownloadState) -> Result<()> {
        let row = DownloadStateDB::from(&state);
        self.writer
            .exec(move |conn| write_state(conn, &row).map(|_| ()).into_core())
            .await
    }

    async fn reset(&self, contract_ids: Vec<String>) -> Result<usize> {
        self.writer
            .exec(move |conn| {
                let mut removed = 0;
                for chunk in chunk_for_sqlite(&contract_ids) {
                    removed += diesel::delete(
                        download_states::table.filter(download_states::contract_id.eq_any(chunk)),
                    )
                    .execute(conn)
                    .map_err(StorageError::from)?;
                }
                Ok(removed)
            })
            .await
    }
}
