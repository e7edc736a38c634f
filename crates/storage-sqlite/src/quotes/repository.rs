use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::dsl::{count_star, max, min};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::sync::Arc;

use super::model::QuoteDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::{download_states, quotes};
use crate::utils::{chunk_rows, format_date, parse_date};

use contract_sync_core::download::DownloadStatus;
use contract_sync_core::errors::Result;
use contract_sync_core::quotes::{Quote, QuoteStore};

pub struct QuoteRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl QuoteRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

/// Replaces rows on `(contract_id, date)` conflicts, so writing the same bars
/// twice leaves one row per day.
pub(crate) fn upsert_quote_rows(conn: &mut SqliteConnection, rows: &[QuoteDB]) -> QueryResult<usize> {
    let mut written = 0;
    for chunk in chunk_rows(rows, QuoteDB::COLUMNS) {
        written += diesel::replace_into(quotes::table)
            .values(chunk)
            .execute(conn)?;
    }
    Ok(written)
}

fn truncate(conn: &mut SqliteConnection, contract_id: &str, from: &str) -> QueryResult<usize> {
    let removed = diesel::delete(
        quotes::table
            .filter(quotes::contract_id.eq(contract_id))
            .filter(quotes::date.lt(from)),
    )
    .execute(conn)?;

    diesel::update(
        download_states::table
            .filter(download_states::contract_id.eq(contract_id))
            .filter(download_states::status.eq(DownloadStatus::Success.as_str()))
            .filter(download_states::earliest_requested_date.lt(from)),
    )
    .set(download_states::earliest_requested_date.eq(from))
    .execute(conn)?;

    Ok(removed)
}

#[async_trait]
impl QuoteStore for QuoteRepository {
    async fn truncate_before(&self, contract_id: &str, from_date: NaiveDate) -> Result<usize> {
        let contract_id = contract_id.to_string();
        let from = format_date(from_date);
        let removed = self
            .writer
            .exec(move |conn| truncate(conn, &contract_id, &from).into_core())
            .await?;
        debug!("Removed {} quotes dated before {}", removed, from_date);
        Ok(removed)
    }

    fn quote_dates(&self, contract_id: &str) -> Result<Vec<NaiveDate>> {
        let mut conn = get_connection(&self.pool)?;
        let dates = quotes::table
            .filter(quotes::contract_id.eq(contract_id))
            .select(quotes::date)
            .order(quotes::date.asc())
            .load::<String>(&mut conn)
            .map_err(StorageError::from)?;
        dates.iter().map(|d| parse_date(d)).collect()
    }

    fn get_quotes(
        &self,
        contract_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Quote>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = quotes::table
            .filter(quotes::contract_id.eq(contract_id))
            .select(QuoteDB::as_select())
            .into_boxed();
        if let Some(from) = from {
            query = query.filter(quotes::date.ge(format_date(from)));
        }
        if let Some(to) = to {
            query = query.filter(quotes::date.le(format_date(to)));
        }
        let rows = query
            .order(quotes::date.asc())
            .load::<QuoteDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(Quote::try_from).collect()
    }

    fn count_quotes(&self, contract_id: &str) -> Result<usize> {
        let mut conn = get_connection(&self.pool)?;
        let count = quotes::table
            .filter(quotes::contract_id.eq(contract_id))
            .select(count_star())
            .first::<i64>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(count as usize)
    }

    fn date_bounds(&self, contract_id: &str) -> Result<Option<(NaiveDate, NaiveDate)>> {
        let mut conn = get_connection(&self.pool)?;
        let (first, last) = quotes::table
            .filter(quotes::contract_id.eq(contract_id))
            .select((min(quotes::date), max(quotes::date)))
            .first::<(Option<String>, Option<String>)>(&mut conn)
            .map_err(StorageError::from)?;
        match (first, last) {
            (Some(first), Some(last)) => Ok(Some((parse_date(&first)?, parse_date(&last)?))),
            _ => Ok(None),
        }
    }
}
