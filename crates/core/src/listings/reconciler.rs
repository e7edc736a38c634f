//! Listing reconciliation.
//!
//! Brings the stored contracts of one (instrument_type, exchange) market in
//! line with a freshly fetched listing. The edit set is shown to the operator
//! and, once confirmed, committed in a single transaction.

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::diff::{diff_listings, ListingDiff};
use super::model::{ListingKey, ListingRecord};
use super::source::{ListingError, ListingSource};
use crate::contracts::{ContractRepositoryTrait, InstrumentType, NewContract};
use crate::errors::Result;

/// Edit set awaiting operator confirmation.
#[derive(Debug, Clone)]
pub struct ListingPlan {
    pub instrument_type: InstrumentType,
    pub exchange: String,
    pub added: Vec<ListingRecord>,
    pub removed: Vec<ListingRecord>,
}

impl ListingPlan {
    /// Counts plus up to `limit` symbols from each side.
    pub fn describe(&self, limit: usize) -> String {
        fn preview(records: &[ListingRecord], limit: usize) -> String {
            let mut shown: Vec<String> = records
                .iter()
                .take(limit)
                .map(|r| r.key().to_string())
                .collect();
            if records.len() > limit {
                shown.push(format!("... {} more", records.len() - limit));
            }
            shown.join(", ")
        }

        let mut out = format!(
            "{} {}: {} to add, {} to remove",
            self.exchange,
            self.instrument_type,
            self.added.len(),
            self.removed.len()
        );
        if !self.added.is_empty() {
            out.push_str(&format!("\n  + {}", preview(&self.added, limit)));
        }
        if !self.removed.is_empty() {
            out.push_str(&format!("\n  - {}", preview(&self.removed, limit)));
        }
        out
    }
}

/// Asks the operator whether a listing plan may be applied.
#[async_trait]
pub trait ConfirmEdits: Send + Sync {
    async fn confirm(&self, plan: &ListingPlan) -> Result<bool>;
}

/// Approves every plan. For unattended runs.
pub struct AutoConfirm;

#[async_trait]
impl ConfirmEdits for AutoConfirm {
    async fn confirm(&self, _plan: &ListingPlan) -> Result<bool> {
        Ok(true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconcilerConfig {
    /// Apply edits without asking.
    pub assume_yes: bool,
    /// Symbols shown per side in the plan description.
    pub preview_limit: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            assume_yes: false,
            preview_limit: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    EmptyListing,
    Cancelled,
    Declined,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::EmptyListing => write!(f, "listing source returned no records"),
            AbortReason::Cancelled => write!(f, "listing fetch was cancelled"),
            AbortReason::Declined => write!(f, "operator declined the edits"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Applied { added: usize, removed: usize },
    Unchanged,
    /// Nothing was written.
    Aborted(AbortReason),
}

pub struct ListingReconciler {
    contract_repository: Arc<dyn ContractRepositoryTrait>,
    listing_source: Arc<dyn ListingSource>,
    confirm: Arc<dyn ConfirmEdits>,
    config: ReconcilerConfig,
}

impl ListingReconciler {
    pub fn new(
        contract_repository: Arc<dyn ContractRepositoryTrait>,
        listing_source: Arc<dyn ListingSource>,
        confirm: Arc<dyn ConfirmEdits>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            contract_repository,
            listing_source,
            confirm,
            config,
        }
    }

    /// Fetches the listing of one market and reconciles it.
    pub async fn sync_listing(
        &self,
        instrument_type: &InstrumentType,
        exchange: &str,
    ) -> Result<ReconcileOutcome> {
        info!("Fetching {} listing for {}", instrument_type, exchange);
        let web = match self
            .listing_source
            .fetch_listing(instrument_type, exchange)
            .await
        {
            Ok(records) => records,
            Err(ListingError::NoData) => {
                warn!("No listing data for {} {}, nothing changed", exchange, instrument_type);
                return Ok(ReconcileOutcome::Aborted(AbortReason::EmptyListing));
            }
            Err(ListingError::Cancelled) => {
                warn!("Listing fetch for {} {} cancelled, nothing changed", exchange, instrument_type);
                return Ok(ReconcileOutcome::Aborted(AbortReason::Cancelled));
            }
            Err(e) => return Err(e.into()),
        };
        self.reconcile(instrument_type, exchange, web).await
    }

    /// Reconciles an already fetched listing against the stored contracts.
    pub async fn reconcile(
        &self,
        instrument_type: &InstrumentType,
        exchange: &str,
        web: Vec<ListingRecord>,
    ) -> Result<ReconcileOutcome> {
        if web.is_empty() {
            warn!("Empty {} listing for {}, nothing changed", instrument_type, exchange);
            return Ok(ReconcileOutcome::Aborted(AbortReason::EmptyListing));
        }

        let stored = self
            .contract_repository
            .list_by_market(instrument_type, exchange)?;
        let stored_records: Vec<ListingRecord> = stored.iter().map(ListingRecord::from).collect();

        let ListingDiff {
            added,
            removed,
            duplicates,
        } = diff_listings(&web, &stored_records);
        for key in &duplicates {
            warn!("Duplicate listing entry {} on {} ignored", key, exchange);
        }

        if added.is_empty() && removed.is_empty() {
            info!(
                "{} {} listing unchanged ({} contracts)",
                exchange,
                instrument_type,
                stored.len()
            );
            return Ok(ReconcileOutcome::Unchanged);
        }

        let plan = ListingPlan {
            instrument_type: instrument_type.clone(),
            exchange: exchange.to_string(),
            added,
            removed,
        };
        info!("{}", plan.describe(self.config.preview_limit));

        if !self.config.assume_yes && !self.confirm.confirm(&plan).await? {
            warn!("Listing edits for {} {} declined", exchange, instrument_type);
            return Ok(ReconcileOutcome::Aborted(AbortReason::Declined));
        }

        let ids_by_key: HashMap<ListingKey, &str> = stored
            .iter()
            .map(|c| (ListingRecord::from(c).key(), c.id.as_str()))
            .collect();
        let remove_ids: Vec<String> = plan
            .removed
            .iter()
            .filter_map(|r| ids_by_key.get(&r.key()).map(|id| id.to_string()))
            .collect();
        let add: Vec<NewContract> = plan
            .added
            .iter()
            .map(|r| r.to_new_contract(instrument_type, exchange))
            .collect();
        for contract in &add {
            contract.validate()?;
        }
        debug!(
            "Applying {} insert(s) and {} delete(s) for {} {}",
            add.len(),
            remove_ids.len(),
            exchange,
            instrument_type
        );

        let applied = self.contract_repository.apply_edits(remove_ids, add).await?;
        info!(
            "{} {} listing updated: {} added, {} removed",
            exchange,
            instrument_type,
            applied.inserted.len(),
            applied.deleted
        );
        Ok(ReconcileOutcome::Applied {
            added: applied.inserted.len(),
            removed: applied.deleted,
        })
    }
}
