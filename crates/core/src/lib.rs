//! Core domain for contract-sync.
//!
//! Keeps a local reference set of contracts and their daily quotes in step
//! with an external listing source and an external quote source:
//!
//! - [`listings`] reconciles a fetched listing against the stored contracts.
//! - [`download`] decides, per contract, whether and how much history to request.
//! - [`quality`] prunes or removes series with holes against a trading calendar.
//!
//! This crate is database-agnostic. Persistence is reached through the store
//! traits in [`contracts`], [`quotes`], [`universes`] and [`download`], which are
//! implemented by `contract-sync-storage-sqlite`.

pub mod calendar;
pub mod contracts;
pub mod download;
pub mod errors;
pub mod listings;
pub mod quality;
pub mod quotes;
pub mod universes;

pub use errors::{DatabaseError, Error, Result};

#[cfg(test)]
mod testing;
