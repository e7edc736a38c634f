use super::contracts_model::{Contract, ContractKey, InstrumentType, NewContract};
use crate::errors::Result;

/// Outcome of applying a listing edit set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppliedEdits {
    pub inserted: Vec<Contract>,
    pub deleted: usize,
}

/// Trait defining the contract for Contract repository operations.
///
/// Deleting a contract cascades to its quotes, its download state and its
/// universe memberships.
#[async_trait::async_trait]
pub trait ContractRepositoryTrait: Send + Sync {
    fn get_by_id(&self, contract_id: &str) -> Result<Contract>;
    fn find_by_key(&self, key: &ContractKey) -> Result<Option<Contract>>;
    fn list(&self) -> Result<Vec<Contract>>;

    /// All contracts of one (instrument_type, exchange) market, ordered by
    /// broker symbol then currency.
    fn list_by_market(&self, instrument_type: &InstrumentType, exchange: &str)
        -> Result<Vec<Contract>>;

    async fn create(&self, new_contract: NewContract) -> Result<Contract>;

    /// Deletes and inserts in a single transaction. Either every edit lands or none does.
    async fn apply_edits(
        &self,
        remove_ids: Vec<String>,
        add: Vec<NewContract>,
    ) -> Result<AppliedEdits>;

    /// Deletes contracts by id. Returns the number of rows removed.
    async fn delete(&self, contract_ids: Vec<String>) -> Result<usize>;
}
