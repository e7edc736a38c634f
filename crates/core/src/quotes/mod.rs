//! Quotes module - daily bars and their storage trait.

mod model;
mod store;

pub use model::{Bar, Quote};
pub use store::QuoteStore;
