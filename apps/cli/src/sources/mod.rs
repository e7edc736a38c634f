//! File-backed listing and quote sources, so the binary runs against local
//! snapshots.

mod csv_quotes;
mod json_listing;

pub use csv_quotes::{write_quotes, CsvQuoteSource};
pub use json_listing::JsonListingSource;
