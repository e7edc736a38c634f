//! Contracts module - domain models and repository trait.

mod contracts_model;
mod contracts_traits;

pub use contracts_model::{Contract, ContractKey, InstrumentType, NewContract};
pub use contracts_traits::{AppliedEdits, ContractRepositoryTrait};
