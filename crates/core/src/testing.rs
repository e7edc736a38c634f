//! In-memory implementation of every store trait, for service tests.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;

use crate::contracts::{
    AppliedEdits, Contract, ContractKey, ContractRepositoryTrait, InstrumentType, NewContract,
};
use crate::download::{DownloadState, DownloadStateStore, DownloadStatus};
use crate::errors::{DatabaseError, Error, Result};
use crate::quotes::{Quote, QuoteStore};
use crate::universes::{Universe, UniverseRepositoryTrait, UniverseSummary};

pub fn new_contract(exchange: &str, symbol: &str, currency: &str) -> NewContract {
    NewContract {
        id: None,
        instrument_type: InstrumentType::Stock,
        exchange: exchange.to_string(),
        broker_symbol: symbol.to_string(),
        currency: currency.to_string(),
        exchange_symbol: symbol.to_string(),
        name: format!("{} Corp", symbol),
    }
}

#[derive(Default)]
struct Inner {
    next_id: usize,
    contracts: BTreeMap<String, Contract>,
    quotes: BTreeMap<(String, NaiveDate), Quote>,
    states: HashMap<String, DownloadState>,
    universes: BTreeMap<String, Universe>,
    members: BTreeSet<(String, String)>,
    fail_next_apply: bool,
}

impl Inner {
    fn insert(&mut self, new: NewContract) -> Result<Contract> {
        let key = new.key();
        if self.contracts.values().any(|c| c.key() == key) {
            return Err(Error::Database(DatabaseError::UniqueViolation(key.to_string())));
        }
        self.next_id += 1;
        let contract = Contract {
            id: new.id.unwrap_or_else(|| format!("c-{:04}", self.next_id)),
            instrument_type: new.instrument_type,
            exchange: new.exchange,
            broker_symbol: new.broker_symbol,
            currency: new.currency,
            exchange_symbol: new.exchange_symbol,
            name: new.name,
            created_at: Utc::now(),
        };
        self.contracts.insert(contract.id.clone(), contract.clone());
        Ok(contract)
    }

    fn delete_contract(&mut self, id: &str) -> bool {
        if self.contracts.remove(id).is_none() {
            return false;
        }
        self.quotes.retain(|(cid, _), _| cid != id);
        self.states.remove(id);
        self.members.retain(|(_, cid)| cid != id);
        true
    }
}

/// Shared in-memory store. Deleting a contract cascades like the SQLite schema.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn insert(&self, new: NewContract) -> Contract {
        self.inner.lock().unwrap().insert(new).unwrap()
    }

    pub fn create_universe(&self, name: &str) {
        self.inner.lock().unwrap().universes.insert(
            name.to_string(),
            Universe {
                name: name.to_string(),
                description: None,
                created_at: Utc::now(),
            },
        );
    }

    pub fn add_member(&self, universe: &str, contract_id: &str) {
        self.inner
            .lock()
            .unwrap()
            .members
            .insert((universe.to_string(), contract_id.to_string()));
    }

    pub fn contract_count(&self) -> usize {
        self.inner.lock().unwrap().contracts.len()
    }

    pub fn member_count(&self) -> usize {
        self.inner.lock().unwrap().members.len()
    }

    /// Makes the next `apply_edits` fail after deleting, to check rollback.
    pub fn fail_next_apply(&self) {
        self.inner.lock().unwrap().fail_next_apply = true;
    }

    pub fn put_quotes(&self, contract_id: &str, dates: &[NaiveDate]) {
        let mut inner = self.inner.lock().unwrap();
        for date in dates {
            inner.quotes.insert(
                (contract_id.to_string(), *date),
                Quote {
                    contract_id: contract_id.to_string(),
                    date: *date,
                    open: 1.into(),
                    high: 1.into(),
                    low: 1.into(),
                    close: 1.into(),
                    volume: 100.into(),
                },
            );
        }
    }
}

fn sort_contracts(contracts: &mut [Contract]) {
    contracts.sort_by(|a, b| {
        (&a.exchange, &a.broker_symbol, &a.currency, &a.id).cmp(&(
            &b.exchange,
            &b.broker_symbol,
            &b.currency,
            &b.id,
        ))
    });
}

#[async_trait]
impl ContractRepositoryTrait for InMemoryStore {
    fn get_by_id(&self, contract_id: &str) -> Result<Contract> {
        self.inner
            .lock()
            .unwrap()
            .contracts
            .get(contract_id)
            .cloned()
            .ok_or_else(|| Error::Database(DatabaseError::NotFound(contract_id.to_string())))
    }

    fn find_by_key(&self, key: &ContractKey) -> Result<Option<Contract>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .contracts
            .values()
            .find(|c| &c.key() == key)
            .cloned())
    }

    fn list(&self) -> Result<Vec<Contract>> {
        let mut all: Vec<Contract> = self.inner.lock().unwrap().contracts.values().cloned().collect();
        sort_contracts(&mut all);
        Ok(all)
    }

    fn list_by_market(
        &self,
        instrument_type: &InstrumentType,
        exchange: &str,
    ) -> Result<Vec<Contract>> {
        let mut found: Vec<Contract> = self
            .inner
            .lock()
            .unwrap()
            .contracts
            .values()
            .filter(|c| &c.instrument_type == instrument_type && c.exchange == exchange)
            .cloned()
            .collect();
        sort_contracts(&mut found);
        Ok(found)
    }

    async fn create(&self, new_contract: NewContract) -> Result<Contract> {
        self.inner.lock().unwrap().insert(new_contract)
    }

    async fn apply_edits(
        &self,
        remove_ids: Vec<String>,
        add: Vec<NewContract>,
    ) -> Result<AppliedEdits> {
        let mut inner = self.inner.lock().unwrap();
        // Work on a copy so a failure leaves the store untouched.
        let mut draft = Inner {
            next_id: inner.next_id,
            contracts: inner.contracts.clone(),
            quotes: inner.quotes.clone(),
            states: inner.states.clone(),
            universes: inner.universes.clone(),
            members: inner.members.clone(),
            fail_next_apply: false,
        };
        let mut deleted = 0;
        for id in &remove_ids {
            if draft.delete_contract(id) {
                deleted += 1;
            }
        }
        if inner.fail_next_apply {
            inner.fail_next_apply = false;
            return Err(Error::Database(DatabaseError::TransactionFailed(
                "injected failure".to_string(),
            )));
        }
        let mut inserted = Vec::new();
        for new in add {
            inserted.push(draft.insert(new)?);
        }
        *inner = draft;
        Ok(AppliedEdits { inserted, deleted })
    }

    async fn delete(&self, contract_ids: Vec<String>) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        Ok(contract_ids
            .iter()
            .filter(|id| inner.delete_contract(id))
            .count())
    }
}

#[async_trait]
impl QuoteStore for InMemoryStore {
    async fn truncate_before(&self, contract_id: &str, from_date: NaiveDate) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.quotes.len();
        inner
            .quotes
            .retain(|(cid, date), _| cid != contract_id || *date >= from_date);
        if let Some(state) = inner.states.get_mut(contract_id) {
            if state.status == DownloadStatus::Success {
                state.earliest_requested_date = state
                    .earliest_requested_date
                    .map(|d| d.max(from_date));
            }
        }
        Ok(before - inner.quotes.len())
    }

    fn quote_dates(&self, contract_id: &str) -> Result<Vec<NaiveDate>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .quotes
            .keys()
            .filter(|(cid, _)| cid == contract_id)
            .map(|(_, date)| *date)
            .collect())
    }

    fn get_quotes(
        &self,
        contract_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Quote>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .quotes
            .values()
            .filter(|q| q.contract_id == contract_id)
            .filter(|q| from.map_or(true, |f| q.date >= f) && to.map_or(true, |t| q.date <= t))
            .cloned()
            .collect())
    }

    fn count_quotes(&self, contract_id: &str) -> Result<usize> {
        Ok(self.quote_dates(contract_id)?.len())
    }

    fn date_bounds(&self, contract_id: &str) -> Result<Option<(NaiveDate, NaiveDate)>> {
        let dates = self.quote_dates(contract_id)?;
        Ok(dates.first().copied().zip(dates.last().copied()))
    }
}

#[async_trait]
impl DownloadStateStore for InMemoryStore {
    fn get_state(&self, contract_id: &str) -> Result<Option<DownloadState>> {
        Ok(self.inner.lock().unwrap().states.get(contract_id).cloned())
    }

    fn get_states(&self, contract_ids: &[String]) -> Result<HashMap<String, DownloadState>> {
        let inner = self.inner.lock().unwrap();
        Ok(contract_ids
            .iter()
            .filter_map(|id| inner.states.get(id).map(|s| (id.clone(), s.clone())))
            .collect())
    }

    fn list_by_status(&self, status: DownloadStatus) -> Result<Vec<DownloadState>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .states
            .values()
            .filter(|s| s.status == status)
            .cloned()
            .collect())
    }

    async fn record_success(&self, state: DownloadState, quotes: Vec<Quote>) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        let n = quotes.len();
        for q in quotes {
            inner.quotes.insert((q.contract_id.clone(), q.date), q);
        }
        inner.states.insert(state.contract_id.clone(), state);
        Ok(n)
    }

    async fn record_failure(&self, state: DownloadState) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .states
            .insert(state.contract_id.clone(), state);
        Ok(())
    }

    async fn reset(&self, contract_ids: Vec<String>) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        Ok(contract_ids
            .iter()
            .filter(|id| inner.states.remove(id.as_str()).is_some())
            .count())
    }
}

#[async_trait]
impl UniverseRepositoryTrait for InMemoryStore {
    fn get(&self, name: &str) -> Result<Option<Universe>> {
        Ok(self.inner.lock().unwrap().universes.get(name).cloned())
    }

    fn list(&self) -> Result<Vec<UniverseSummary>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .universes
            .values()
            .map(|u| UniverseSummary {
                name: u.name.clone(),
                description: u.description.clone(),
                member_count: inner.members.iter().filter(|(n, _)| n == &u.name).count(),
            })
            .collect())
    }

    fn contracts_in_universe(&self, name: &str) -> Result<Vec<Contract>> {
        let inner = self.inner.lock().unwrap();
        let mut found: Vec<Contract> = inner
            .members
            .iter()
            .filter(|(n, _)| n == name)
            .filter_map(|(_, id)| inner.contracts.get(id).cloned())
            .collect();
        sort_contracts(&mut found);
        Ok(found)
    }

    fn universes_for_contract(&self, contract_id: &str) -> Result<Vec<String>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .members
            .iter()
            .filter(|(_, id)| id == contract_id)
            .map(|(n, _)| n.clone())
            .collect())
    }

    async fn create(&self, name: &str, description: Option<String>) -> Result<Universe> {
        let universe = Universe {
            name: name.to_string(),
            description,
            created_at: Utc::now(),
        };
        self.inner
            .lock()
            .unwrap()
            .universes
            .insert(name.to_string(), universe.clone());
        Ok(universe)
    }

    async fn delete(&self, name: &str) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        inner.universes.remove(name);
        let before = inner.members.len();
        inner.members.retain(|(n, _)| n != name);
        Ok(before - inner.members.len())
    }

    async fn add_members(&self, name: &str, contract_ids: Vec<String>) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        Ok(contract_ids
            .into_iter()
            .filter(|id| inner.members.insert((name.to_string(), id.clone())))
            .count())
    }

    async fn remove_members(&self, name: &str, contract_ids: Vec<String>) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        Ok(contract_ids
            .into_iter()
            .filter(|id| inner.members.remove(&(name.to_string(), id.clone())))
            .count())
    }
}
