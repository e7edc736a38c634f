//! Universes module - named groups of contracts.

mod universes_model;
mod universes_service;
mod universes_traits;

pub use universes_model::{validate_universe_name, Universe, UniverseSummary};
pub use universes_service::UniverseService;
pub use universes_traits::UniverseRepositoryTrait;
