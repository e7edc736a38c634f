use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::sync::Arc;

use super::model::ContractDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::contracts;
use crate::utils::chunk_for_sqlite;

use contract_sync_core::contracts::{
    AppliedEdits, Contract, ContractKey, ContractRepositoryTrait, InstrumentType, NewContract,
};
use contract_sync_core::errors::{DatabaseError, Error, Result};

pub struct ContractRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl ContractRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

/// Deletes `ids` on an open connection. Dependent rows go with them through
/// `ON DELETE CASCADE`.
pub(crate) fn delete_contracts(conn: &mut SqliteConnection, ids: &[String]) -> QueryResult<usize> {
    let mut removed = 0;
    for chunk in chunk_for_sqlite(ids) {
        removed += diesel::delete(contracts::table.filter(contracts::id.eq_any(chunk)))
            .execute(conn)?;
    }
    Ok(removed)
}

fn insert_contract(conn: &mut SqliteConnection, new: NewContract) -> Result<Contract> {
    new.validate()?;
    let row = ContractDB::from(new);
    diesel::insert_into(contracts::table)
        .values(&row)
        .execute(conn)
        .map_err(StorageError::from)?;
    Ok(row.into())
}

#[async_trait]
impl ContractRepositoryTrait for ContractRepository {
    fn get_by_id(&self, contract_id: &str) -> Result<Contract> {
        let mut conn = get_connection(&self.pool)?;
        contracts::table
            .find(contract_id)
            .select(ContractDB::as_select())
            .first::<ContractDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(Contract::from)
            .ok_or_else(|| {
                Error::Database(DatabaseError::NotFound(format!("Contract {}", contract_id)))
            })
    }

    fn find_by_key(&self, key: &ContractKey) -> Result<Option<Contract>> {
        let mut conn = get_connection(&self.pool)?;
        let row = contracts::table
            .filter(contracts::instrument_type.eq(key.instrument_type.as_code()))
            .filter(contracts::exchange.eq(&key.exchange))
            .filter(contracts::broker_symbol.eq(&key.broker_symbol))
            .filter(contracts::currency.eq(&key.currency))
            .select(ContractDB::as_select())
            .first::<ContractDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(Contract::from))
    }

    fn list(&self) -> Result<Vec<Contract>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = contracts::table
            .order((
                contracts::exchange.asc(),
                contracts::broker_symbol.asc(),
                contracts::currency.asc(),
                contracts::id.asc(),
            ))
            .select(ContractDB::as_select())
            .load::<ContractDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Contract::from).collect())
    }

    fn list_by_market(
        &self,
        market_type: &InstrumentType,
        market_exchange: &str,
    ) -> Result<Vec<Contract>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = contracts::table
            .filter(contracts::instrument_type.eq(market_type.as_code()))
            .filter(contracts::exchange.eq(market_exchange))
            .order((contracts::broker_symbol.asc(), contracts::currency.asc()))
            .select(ContractDB::as_select())
            .load::<ContractDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Contract::from).collect())
    }

    async fn create(&self, new_contract: NewContract) -> Result<Contract> {
        self.writer
            .exec(move |conn| insert_contract(conn, new_contract))
            .await
    }

    async fn apply_edits(
        &self,
        remove_ids: Vec<String>,
        add: Vec<NewContract>,
    ) -> Result<AppliedEdits> {
        for new in &add {
            new.validate()?;
        }
        self.writer
            .exec(move |conn| {
                let deleted = delete_contracts(conn, &remove_ids).into_core()?;
                let inserted = add
                    .into_iter()
                    .map(|new| insert_contract(conn, new))
                    .collect::<Result<Vec<_>>>()?;
                debug!(
                    "Applied listing edits: {} inserted, {} deleted",
                    inserted.len(),
                    deleted
                );
                Ok(AppliedEdits { inserted, deleted })
            })
            .await
    }

    async fn delete(&self, contract_ids: Vec<String>) -> Result<usize> {
        self.writer
            .exec(move |conn| delete_contracts(conn, &contract_ids).into_core())
            .await
    }
}
