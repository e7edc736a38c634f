//! SQLite storage implementation for contract-sync.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the store traits defined in `contract-sync-core` and contains:
//! - Database connection pooling and the single-writer actor
//! - Diesel migrations
//! - Repository implementations for contracts, quotes, download states and universes
//! - Database-specific model types (with Diesel derives)
//!
//! Every dependent row (quotes, download state, universe memberships) references
//! its contract with `ON DELETE CASCADE`, so removing a contract removes
//! everything hanging off it.
//!
//! ```text
//!        contract-sync-core (domain)
//!                  │
//!                  ▼
//!      storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod contracts;
pub mod download;
pub mod quotes;
pub mod universes;

#[cfg(test)]
mod test_support;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, open, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use contracts::ContractRepository;
pub use download::DownloadStateRepository;
pub use quotes::QuoteRepository;
pub use universes::UniverseRepository;

// Re-export from contract-sync-core for convenience
pub use contract_sync_core::errors::{DatabaseError, Error, Result};
