//! SQLite storage implementation for daily quotes.

mod model;
mod repository;

pub use model::QuoteDB;
pub use repository::QuoteRepository;

pub(crate) use repository::upsert_quote_rows;

// Re-export trait from core for convenience
pub use contract_sync_core::quotes::QuoteStore;
