//! SQLite storage implementation for per-contract download state.

mod model;
mod repository;

pub use model::DownloadStateDB;
pub use repository::DownloadStateRepository;

// Re-export trait from core for convenience
pub use contract_sync_core::download::DownloadStateStore;
