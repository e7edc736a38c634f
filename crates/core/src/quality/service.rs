use chrono::{NaiveDate, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;

use super::assess::{assess_series, DeleteReason, QualityAction, QualityConfig};
use crate::calendar::TradingCalendar;
use crate::contracts::{Contract, ContractRepositoryTrait};
use crate::download::{DownloadStateStore, DownloadStatus};
use crate::errors::Result;
use crate::quotes::QuoteStore;
use crate::universes::UniverseRepositoryTrait;

/// Contracts covered by a maintenance pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationScope {
    All,
    Universe(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractVerdict {
    pub contract_id: String,
    pub contract: String,
    pub action: QualityAction,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    pub checked: usize,
    pub kept: usize,
    pub truncated: usize,
    pub deleted: usize,
    /// Contracts without a successful download, left out of the pass.
    pub not_downloaded: usize,
    pub quotes_removed: usize,
    /// Truncations and deletions, in processing order.
    pub verdicts: Vec<ContractVerdict>,
    pub dry_run: bool,
}

impl QualityReport {
    pub fn summary(&self) -> String {
        format!(
            "{}{} checked: {} kept, {} truncated, {} deleted ({} not downloaded)",
            if self.dry_run { "[dry run] " } else { "" },
            self.checked,
            self.kept,
            self.truncated,
            self.deleted,
            self.not_downloaded
        )
    }
}

/// Maintenance pass that prunes or removes series with holes.
pub struct QualityValidator {
    contract_repository: Arc<dyn ContractRepositoryTrait>,
    universe_repository: Arc<dyn UniverseRepositoryTrait>,
    quote_store: Arc<dyn QuoteStore>,
    state_store: Arc<dyn DownloadStateStore>,
    calendar: Arc<dyn TradingCalendar>,
    config: QualityConfig,
    as_of: Option<NaiveDate>,
}

impl QualityValidator {
    pub fn new(
        contract_repository: Arc<dyn ContractRepositoryTrait>,
        universe_repository: Arc<dyn UniverseRepositoryTrait>,
        quote_store: Arc<dyn QuoteStore>,
        state_store: Arc<dyn DownloadStateStore>,
        calendar: Arc<dyn TradingCalendar>,
        config: QualityConfig,
    ) -> Self {
        Self {
            contract_repository,
            universe_repository,
            quote_store,
            state_store,
            calendar,
            config,
            as_of: None,
        }
    }

    /// Pins "today" instead of reading the UTC clock.
    pub fn as_of(mut self, today: NaiveDate) -> Self {
        self.as_of = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Assesses one contract's series without changing anything.
    pub fn assess(&self, contract: &Contract) -> Result<QualityAction> {
        let stored = self.quote_store.quote_dates(&contract.id)?;
        let Some(&first) = stored.first() else {
            return Ok(QualityAction::Delete(DeleteReason::TooFewQuotes { count: 0 }));
        };
        let trading_days = self
            .calendar
            .trading_days(&contract.exchange, first, self.today())?;
        Ok(assess_series(&stored, &trading_days, &self.config))
    }

    /// Carries out `action`. Returns the number of quotes removed.
    pub async fn apply(&self, contract: &Contract, action: &QualityAction) -> Result<usize> {
        match action {
            QualityAction::Keep => Ok(0),
            QualityAction::Truncate { from } => {
                let removed = self.quote_store.truncate_before(&contract.id, *from).await?;
                info!("Truncated {} before {} ({} quotes removed)", contract, from, removed);
                Ok(removed)
            }
            QualityAction::Delete(reason) => {
                let count = self.quote_store.count_quotes(&contract.id)?;
                self.contract_repository
                    .delete(vec![contract.id.clone()])
                    .await?;
                warn!("Deleted {}: {}", contract, reason);
                Ok(count)
            }
        }
    }

    /// Assesses one contract and applies the outcome.
    pub async fn validate(&self, contract_id: &str) -> Result<QualityAction> {
        self.config.validate()?;
        let contract = self.contract_repository.get_by_id(contract_id)?;
        let action = self.assess(&contract)?;
        self.apply(&contract, &action).await?;
        Ok(action)
    }

    /// Validates every successfully downloaded contract in `scope`.
    ///
    /// Contracts that were never downloaded, or whose last attempt failed, are
    /// counted but left alone: an empty series there means "not fetched yet".
    pub async fn validate_all(
        &self,
        scope: &ValidationScope,
        dry_run: bool,
    ) -> Result<QualityReport> {
        self.config.validate()?;
        let contracts = match scope {
            ValidationScope::All => self.contract_repository.list()?,
            ValidationScope::Universe(name) => {
                self.universe_repository.contracts_in_universe(name)?
            }
        };
        let ids: Vec<String> = contracts.iter().map(|c| c.id.clone()).collect();
        let states = self.state_store.get_states(&ids)?;

        let mut report = QualityReport {
            dry_run,
            ..QualityReport::default()
        };
        info!(
            "Validating {} contract(s){}",
            contracts.len(),
            if dry_run { " (dry run)" } else { "" }
        );

        for contract in &contracts {
            let downloaded = states
                .get(&contract.id)
                .is_some_and(|s| s.status == DownloadStatus::Success);
            if !downloaded {
                report.not_downloaded += 1;
                continue;
            }

            let action = self.assess(contract)?;
            report.checked += 1;
            debug!("{}: {}", contract, action);
            match action {
                QualityAction::Keep => {
                    report.kept += 1;
                    continue;
                }
                QualityAction::Truncate { .. } => report.truncated += 1,
                QualityAction::Delete(_) => report.deleted += 1,
            }
            if !dry_run {
                report.quotes_removed += self.apply(contract, &action).await?;
            }
            report.verdicts.push(ContractVerdict {
                contract_id: contract.id.clone(),
                contract: contract.to_string(),
                action,
            });
        }

        info!("Validation finished: {}", report.summary());
        Ok(report)
    }
}
