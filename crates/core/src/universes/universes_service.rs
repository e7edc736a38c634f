use log::{debug, info};
use std::sync::Arc;

use super::universes_model::{validate_universe_name, Universe, UniverseSummary};
use super::universes_traits::UniverseRepositoryTrait;
use crate::contracts::{Contract, ContractRepositoryTrait, InstrumentType};
use crate::errors::{DatabaseError, Error, Result, ValidationError};

/// Universe management on top of the universe and contract repositories.
pub struct UniverseService {
    universe_repository: Arc<dyn UniverseRepositoryTrait>,
    contract_repository: Arc<dyn ContractRepositoryTrait>,
}

impl UniverseService {
    pub fn new(
        universe_repository: Arc<dyn UniverseRepositoryTrait>,
        contract_repository: Arc<dyn ContractRepositoryTrait>,
    ) -> Self {
        Self {
            universe_repository,
            contract_repository,
        }
    }

    pub async fn create_universe(
        &self,
        name: &str,
        description: Option<String>,
    ) -> Result<Universe> {
        validate_universe_name(name)?;
        if self.universe_repository.get(name)?.is_some() {
            return Err(Error::Database(DatabaseError::UniqueViolation(format!(
                "universe '{}' already exists",
                name
            ))));
        }
        let universe = self.universe_repository.create(name, description).await?;
        info!("Created universe '{}'", universe.name);
        Ok(universe)
    }

    pub async fn delete_universe(&self, name: &str) -> Result<()> {
        self.require(name)?;
        let removed = self.universe_repository.delete(name).await?;
        info!("Deleted universe '{}' ({} memberships removed)", name, removed);
        Ok(())
    }

    pub fn list_universes(&self) -> Result<Vec<UniverseSummary>> {
        self.universe_repository.list()
    }

    pub fn members(&self, name: &str) -> Result<Vec<Contract>> {
        self.require(name)?;
        self.universe_repository.contracts_in_universe(name)
    }

    /// Adds contracts of one market to a universe.
    ///
    /// With an empty `symbols` slice every contract of the market is added.
    /// Otherwise each symbol must match at least one contract.
    pub async fn add_market_members(
        &self,
        name: &str,
        instrument_type: &InstrumentType,
        exchange: &str,
        symbols: &[String],
    ) -> Result<usize> {
        self.require(name)?;
        let ids = self.resolve_ids(instrument_type, exchange, symbols)?;
        let added = self.universe_repository.add_members(name, ids).await?;
        info!(
            "Added {} {} contract(s) on {} to universe '{}'",
            added, instrument_type, exchange, name
        );
        Ok(added)
    }

    pub async fn remove_market_members(
        &self,
        name: &str,
        instrument_type: &InstrumentType,
        exchange: &str,
        symbols: &[String],
    ) -> Result<usize> {
        self.require(name)?;
        let ids = self.resolve_ids(instrument_type, exchange, symbols)?;
        let removed = self.universe_repository.remove_members(name, ids).await?;
        info!("Removed {} contract(s) from universe '{}'", removed, name);
        Ok(removed)
    }

    fn require(&self, name: &str) -> Result<Universe> {
        self.universe_repository.get(name)?.ok_or_else(|| {
            Error::Database(DatabaseError::NotFound(format!("universe '{}'", name)))
        })
    }

    fn resolve_ids(
        &self,
        instrument_type: &InstrumentType,
        exchange: &str,
        symbols: &[String],
    ) -> Result<Vec<String>> {
        let market = self
            .contract_repository
            .list_by_market(instrument_type, exchange)?;

        if symbols.is_empty() {
            return Ok(market.into_iter().map(|c| c.id).collect());
        }

        let mut ids = Vec::new();
        for symbol in symbols {
            let matched: Vec<String> = market
                .iter()
                .filter(|c| c.broker_symbol.eq_ignore_ascii_case(symbol))
                .map(|c| c.id.clone())
                .collect();
            if matched.is_empty() {
                return Err(Error::Validation(ValidationError::InvalidInput(format!(
                    "no {} contract '{}' on {}",
                    instrument_type, symbol, exchange
                ))));
            }
            debug!("Symbol {} resolved to {} contract(s)", symbol, matched.len());
            ids.extend(matched);
        }
        Ok(ids)
    }
}
