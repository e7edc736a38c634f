use super::universes_model::{Universe, UniverseSummary};
use crate::contracts::Contract;
use crate::errors::Result;

/// Trait defining the contract for Universe repository operations.
///
/// Deleting a universe removes its memberships only. Contracts are never
/// deleted through this trait.
#[async_trait::async_trait]
pub trait UniverseRepositoryTrait: Send + Sync {
    fn get(&self, name: &str) -> Result<Option<Universe>>;
    fn list(&self) -> Result<Vec<UniverseSummary>>;

    /// Member contracts in a stable order: exchange, broker symbol, currency, id.
    fn contracts_in_universe(&self, name: &str) -> Result<Vec<Contract>>;

    /// Names of the universes a contract belongs to.
    fn universes_for_contract(&self, contract_id: &str) -> Result<Vec<String>>;

    async fn create(&self, name: &str, description: Option<String>) -> Result<Universe>;
    async fn delete(&self, name: &str) -> Result<usize>;

    /// Adds memberships, ignoring ones that already exist. Returns how many were new.
    async fn add_members(&self, name: &str, contract_ids: Vec<String>) -> Result<usize>;
    async fn remove_members(&self, name: &str, contract_ids: Vec<String>) -> Result<usize>;
}
