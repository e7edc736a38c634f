//! Listings module - reconciles fetched exchange listings with stored contracts.

mod diff;
mod model;
mod reconciler;
mod source;

pub use diff::{diff_listings, ListingDiff};
pub use model::{ListingKey, ListingRecord};
pub use reconciler::{
    AbortReason, AutoConfirm, ConfirmEdits, ListingPlan, ListingReconciler, ReconcileOutcome,
    ReconcilerConfig,
};
pub use source::{ListingError, ListingSource};
