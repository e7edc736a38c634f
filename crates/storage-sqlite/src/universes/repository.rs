use async_trait::async_trait;
use chrono::Utc;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::collections::HashMap;
use std::sync::Arc;

use super::model::{UniverseDB, UniverseMemberDB};
use crate::contracts::ContractDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{contracts, universe_members, universes};
use crate::utils::{chunk_for_sqlite, chunk_rows};

use contract_sync_core::contracts::Contract;
use contract_sync_core::errors::Result;
use contract_sync_core::universes::{Universe, UniverseRepositoryTrait, UniverseSummary};

pub struct UniverseRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl UniverseRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl UniverseRepositoryTrait for UniverseRepository {
    fn get(&self, universe_name: &str) -> Result<Option<Universe>> {
        let mut conn = get_connection(&self.pool)?;
        let row = universes::table
            .find(universe_name)
            .select(UniverseDB::as_select())
            .first::<UniverseDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(Universe::from))
    }

    fn list(&self) -> Result<Vec<UniverseSummary>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = universes::table
            .order(universes::name.asc())
            .select(UniverseDB::as_select())
            .load::<UniverseDB>(&mut conn)
            .map_err(StorageError::from)?;
        let counts: HashMap<String, i64> = universe_members::table
            .group_by(universe_members::universe_name)
            .select((universe_members::universe_name, count_star()))
            .load::<(String, i64)>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .collect();

        Ok(rows
            .into_iter()
            .map(|row| UniverseSummary {
                member_count: counts.get(&row.name).copied().unwrap_or(0) as usize,
                name: row.name,
                description: row.description,
            })
            .collect())
    }

    fn contracts_in_universe(&self, universe_name: &str) -> Result<Vec<Contract>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = contracts::table
            .inner_join(universe_members::table)
            .filter(universe_members::universe_name.eq(universe_name))
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

    fn universes_for_contract(&self, contract_id: &str) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;
        let names = universe_members::table
            .filter(universe_members::contract_id.eq(contract_id))
            .select(universe_members::universe_name)
            .order(universe_members::universe_name.asc())
            .load::<String>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(names)
    }

    async fn create(&self, universe_name: &str, description: Option<String>) -> Result<Universe> {
        let row = UniverseDB {
            name: universe_name.to_string(),
            description,
            created_at: Utc::now().to_rfc3339(),
        };
        self.writer
            .exec(move |conn| {
                diesel::insert_into(universes::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(Universe::from(row))
            })
            .await
    }

    async fn delete(&self, universe_name: &str) -> Result<usize> {
        let universe_name = universe_name.to_string();
        self.writer
            .exec(move |conn| {
                let members = universe_members::table
                    .filter(universe_members::universe_name.eq(&universe_name))
                    .select(count_star())
                    .first::<i64>(conn)
                    .map_err(StorageError::from)?;
                // Memberships go with the universe through ON DELETE CASCADE.
                diesel::delete(universes::table.find(&universe_name))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(members as usize)
            })
            .await
    }

    async fn add_members(&self, universe_name: &str, contract_ids: Vec<String>) -> Result<usize> {
        let rows: Vec<UniverseMemberDB> = contract_ids
            .into_iter()
            .map(|contract_id| UniverseMemberDB {
                universe_name: universe_name.to_string(),
                contract_id,
            })
            .collect();
        self.writer
            .exec(move |conn| {
                let mut added = 0;
                for chunk in chunk_rows(&rows, 2) {
                    added += diesel::insert_or_ignore_into(universe_members::table)
                        .values(chunk)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(added)
            })
            .await
    }

    async fn remove_members(&self, universe_name: &str, contract_ids: Vec<String>) -> Result<usize> {
        let universe_name = universe_name.to_string();
        self.writer
            .exec(move |conn| {
                let mut removed = 0;
                for chunk in chunk_for_sqlite(&contract_ids) {
                    removed += diesel::delete(
                        universe_members::table
                            .filter(universe_members::universe_name.eq(&universe_name))
                            .filter(universe_members::contract_id.eq_any(chunk)),
                    )
                    .execute(conn)
                    .map_err(StorageError::from)?;
                }
                Ok(removed)
            })
            .await
    }
}
