//! SQLite storage implementation for universes and their memberships.

mod model;
mod repository;

pub use model::{UniverseDB, UniverseMemberDB};
pub use repository::UniverseRepository;

// Re-export trait from core for convenience
pub use contract_sync_core::universes::UniverseRepositoryTrait;
