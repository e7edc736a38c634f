//! SQLite storage implementation for contracts.

mod model;
mod repository;

pub use model::ContractDB;
pub use repository::ContractRepository;

// Re-export trait from core for convenience
pub use contract_sync_core::contracts::ContractRepositoryTrait;
