//! Quote download scheduler.
//!
//! Walks the contracts of a universe one at a time, plans a request for each
//! from its download state, and commits the returned quotes together with the
//! new state. Per-contract provider errors are recorded and the run moves on;
//! a systemic error aborts the run.

use chrono::{NaiveDate, Utc};
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::sync::Arc;

use super::config::SchedulerConfig;
use super::interrupt::InterruptFlag;
use super::planner::{plan_download, DownloadDecision};
use super::source::{QuoteSource, QuoteSourceError};
use super::state::{DownloadState, DownloadStateStore};
use super::summary::{ContractFailure, DownloadSummary};
use super::window::RequestWindow;
use crate::calendar::TradingCalendar;
use crate::contracts::Contract;
use crate::errors::{Error, Result};
use crate::quotes::Quote;
use crate::universes::UniverseRepositoryTrait;

/// Called after each contract with `(processed, total, contract)`.
pub type ProgressCallback = Arc<dyn Fn(usize, usize, &Contract) + Send + Sync>;

/// Download state of one universe member, for status reports.
#[derive(Debug, Clone)]
pub struct ContractStatus {
    pub contract: Contract,
    pub state: Option<DownloadState>,
}

pub struct DownloadScheduler {
    universe_repository: Arc<dyn UniverseRepositoryTrait>,
    state_store: Arc<dyn DownloadStateStore>,
    quote_source: Arc<dyn QuoteSource>,
    calendar: Arc<dyn TradingCalendar>,
    config: SchedulerConfig,
    interrupt: InterruptFlag,
    progress: Option<ProgressCallback>,
    as_of: Option<NaiveDate>,
}

impl DownloadScheduler {
    pub fn new(
        universe_repository: Arc<dyn UniverseRepositoryTrait>,
        state_store: Arc<dyn DownloadStateStore>,
        quote_source: Arc<dyn QuoteSource>,
        calendar: Arc<dyn TradingCalendar>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            universe_repository,
            state_store,
            quote_source,
            calendar,
            config,
            interrupt: InterruptFlag::new(),
            progress: None,
            as_of: None,
        }
    }

    pub fn with_interrupt(mut self, interrupt: InterruptFlag) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Pins "today" instead of reading the UTC clock.
    pub fn as_of(mut self, today: NaiveDate) -> Self {
        self.as_of = Some(today);
        self
    }

    pub fn interrupt_flag(&self) -> InterruptFlag {
        self.interrupt.clone()
    }

    fn today(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Downloads quotes for every member of `universe`.
    ///
    /// Returns `Err` only for storage failures and systemic quote source
    /// errors. Work committed before the error is kept.
    pub async fn run(&self, universe: &str) -> Result<DownloadSummary> {
        let contracts = self.universe_repository.contracts_in_universe(universe)?;
        info!(
            "Starting quote download for universe '{}' ({} contracts)",
            universe,
            contracts.len()
        );
        self.run_contracts(&contracts).await
    }

    /// Downloads quotes for `contracts`, in the given order.
    pub async fn run_contracts(&self, contracts: &[Contract]) -> Result<DownloadSummary> {
        self.config.validate()?;
        let mut summary = DownloadSummary::new(contracts.len());
        if contracts.is_empty() {
            info!("No contracts to download");
            return Ok(summary);
        }

        let ids: Vec<String> = contracts.iter().map(|c| c.id.clone()).collect();
        let states = self.state_store.get_states(&ids)?;

        if let Err(e) = self.quote_source.connect().await {
            error!("Failed to connect to quote source: {}", e);
            return Err(Error::QuoteSource(match e {
                QuoteSourceError::Contract { code, text } => {
                    QuoteSourceError::Systemic(format!("connect failed ({}): {}", code, text))
                }
                systemic => systemic,
            }));
        }

        let result = self.process_all(contracts, &states, &mut summary).await;
        self.quote_source.disconnect().await;

        match result {
            Ok(()) => {
                info!("Quote download finished: {}", summary.summary());
                Ok(summary)
            }
            Err(e) => {
                error!(
                    "Quote download aborted after {} contract(s): {}",
                    summary.processed, e
                );
                Err(e)
            }
        }
    }

    async fn process_all(
        &self,
        contracts: &[Contract],
        states: &HashMap<String, DownloadState>,
        summary: &mut DownloadSummary,
    ) -> Result<()> {
        let today = self.today();
        let now = Utc::now();
        let total = contracts.len();

        for contract in contracts {
            if self.interrupt.is_requested() {
                warn!(
                    "Interrupt requested, stopping after {}/{} contracts",
                    summary.processed, total
                );
                summary.cancelled = true;
                break;
            }

            let decision = plan_download(
                states.get(&contract.id),
                &contract.exchange,
                today,
                now,
                self.calendar.as_ref(),
                &self.config,
            )?;

            match decision {
                DownloadDecision::Skip(reason) => {
                    debug!("Skipping {}: {}", contract, reason);
                    summary.add_skipped(contract.to_string(), reason);
                }
                DownloadDecision::Request { window, reason } => {
                    debug!("Requesting {} for {} ({:?})", window, contract, reason);
                    self.download_contract(contract, &window, summary).await?;
                }
            }

            summary.processed += 1;
            if let Some(progress) = &self.progress {
                progress(summary.processed, total, contract);
            }
        }

        Ok(())
    }

    async fn download_contract(
        &self,
        contract: &Contract,
        window: &RequestWindow,
        summary: &mut DownloadSummary,
    ) -> Result<()> {
        summary.attempted += 1;
        let now = Utc::now();

        match self.quote_source.fetch_quotes(contract, window).await {
            Ok(bars) => {
                let received = bars.len();
                let quotes: Vec<Quote> = bars
                    .into_iter()
                    .filter(|bar| match bar.validate() {
                        Ok(()) => true,
                        Err(e) => {
                            warn!("Dropping bar for {}: {}", contract, e);
                            false
                        }
                    })
                    .map(|bar| Quote::from_bar(&contract.id, bar))
                    .collect();
                summary.bars_rejected += received - quotes.len();

                let state = DownloadState::succeeded(&contract.id, window, now);
                let written = self.state_store.record_success(state, quotes).await?;
                debug!("Stored {} quotes for {}", written, contract);
                summary.add_success(written);
                Ok(())
            }
            Err(QuoteSourceError::Contract { code, text }) => {
                warn!("Download failed for {} ({}): {}", contract, code, text);
                let state = DownloadState::failed(&contract.id, Some(code), text.clone(), now);
                self.state_store.record_failure(state).await?;
                summary.add_failure(ContractFailure {
                    contract_id: contract.id.clone(),
                    contract: contract.to_string(),
                    code,
                    text,
                });
                Ok(())
            }
            Err(e @ QuoteSourceError::Systemic(_)) => {
                error!("Quote source failed while downloading {}: {}", contract, e);
                Err(Error::QuoteSource(e))
            }
        }
    }

    /// Forgets the download state of `contract_ids` so the next run treats
    /// them as never attempted.
    pub async fn reset_download_state(&self, contract_ids: Vec<String>) -> Result<usize> {
        self.state_store.reset(contract_ids).await
    }

    /// [`reset_download_state`](Self::reset_download_state) for every member of `universe`.
    pub async fn reset_universe(&self, universe: &str) -> Result<usize> {
        let ids: Vec<String> = self
            .universe_repository
            .contracts_in_universe(universe)?
            .into_iter()
            .map(|c| c.id)
            .collect();
        let reset = self.reset_download_state(ids).await?;
        info!("Reset download state of {} contract(s) in '{}'", reset, universe);
        Ok(reset)
    }

    pub fn universe_status(&self, universe: &str) -> Result<Vec<ContractStatus>> {
        let contracts = self.universe_repository.contracts_in_universe(universe)?;
        let ids: Vec<String> = contracts.iter().map(|c| c.id.clone()).collect();
        let mut states = self.state_store.get_states(&ids)?;
        Ok(contracts
            .into_iter()
            .map(|contract| {
                let state = states.remove(&contract.id);
                ContractStatus { contract, state }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::WeekdayCalendar;
    use crate::download::{DownloadStatus, ErrorRetryPolicy, RequestDuration};
    use crate::quotes::{Bar, QuoteStore};
    use crate::testing::{new_contract, InMemoryStore};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    // Wednesday.
    fn today() -> NaiveDate {
        d(2024, 6, 12)
    }

    fn bar(date: NaiveDate) -> Bar {
        Bar {
            date,
            open: dec!(10),
            high: dec!(11),
            low: dec!(9),
            close: dec!(10.5),
            volume: dec!(1000),
        }
    }

    /// Scripted quote source. Returns the last three weekdays up to the window
    /// end unless the symbol is listed as failing.
    #[derive(Default)]
    struct MockQuoteSource {
        contract_errors: HashMap<String, (i32, String)>,
        systemic_on: Option<String>,
        fail_connect: bool,
        interrupt_after: Option<(usize, InterruptFlag)>,
        requests: Mutex<Vec<(String, RequestWindow)>>,
        fetches: AtomicUsize,
        connected: Mutex<bool>,
        disconnects: AtomicUsize,
    }

    #[async_trait]
    impl QuoteSource for MockQuoteSource {
        async fn connect(&self) -> std::result::Result<(), QuoteSourceError> {
            if self.fail_connect {
                return Err(QuoteSourceError::Systemic("gateway down".to_string()));
            }
            *self.connected.lock().unwrap() = true;
            Ok(())
        }

        async fn disconnect(&self) {
            *self.connected.lock().unwrap() = false;
            self.disconnects.fetch_add(1, Ordering::SeqCst);
        }

        async fn fetch_quotes(
            &self,
            contract: &Contract,
            window: &RequestWindow,
        ) -> std::result::Result<Vec<Bar>, QuoteSourceError> {
            assert!(*self.connected.lock().unwrap());
            self.requests
                .lock()
                .unwrap()
                .push((contract.broker_symbol.clone(), *window));
            let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some((after, flag)) = &self.interrupt_after {
                if n == *after {
                    flag.request();
                }
            }

            if self.systemic_on.as_deref() == Some(contract.broker_symbol.as_str()) {
                return Err(QuoteSourceError::Systemic("connection reset".to_string()));
            }
            if let Some((code, text)) = self.contract_errors.get(&contract.broker_symbol) {
                return Err(QuoteSourceError::Contract {
                    code: *code,
                    text: text.clone(),
                });
            }
            Ok(vec![bar(d(2024, 6, 10)), bar(d(2024, 6, 11)), bar(window.end)])
        }
    }

    struct Fixture {
        store: Arc<InMemoryStore>,
        contracts: Vec<Contract>,
    }

    fn fixture(symbols: &[&str]) -> Fixture {
        let store = Arc::new(InMemoryStore::default());
        store.create_universe("u");
        let contracts: Vec<Contract> = symbols
            .iter()
            .map(|s| store.insert(new_contract("NYSE", s, "USD")))
            .collect();
        for c in &contracts {
            store.add_member("u", &c.id);
        }
        Fixture { store, contracts }
    }

    fn config() -> SchedulerConfig {
        SchedulerConfig {
            lookback_years: 2,
            redownload_threshold_days: 5,
            max_staleness_days: 30,
            overlap_days: 2,
            error_retry: ErrorRetryPolicy::Never,
        }
    }

    fn scheduler(
        store: &Arc<InMemoryStore>,
        source: Arc<MockQuoteSource>,
        config: SchedulerConfig,
    ) -> DownloadScheduler {
        DownloadScheduler::new(
            store.clone(),
            store.clone(),
            source,
            Arc::new(WeekdayCalendar::new()),
            config,
        )
        .as_of(today())
    }

    #[tokio::test]
    async fn test_first_run_downloads_full_lookback() {
        let f = fixture(&["AAA", "BBB"]);
        let source = Arc::new(MockQuoteSource::default());
        let summary = scheduler(&f.store, source.clone(), config())
            .run("u")
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.quotes_written, 6);
        assert_eq!(source.disconnects.load(Ordering::SeqCst), 1);

        let requests = source.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].1.duration, RequestDuration::Years(2));

        let state = f.store.get_state(&f.contracts[0].id).unwrap().unwrap();
        assert_eq!(state.status, DownloadStatus::Success);
        assert_eq!(state.requested_range(), Some((d(2022, 6, 12), today())));
        assert_eq!(f.store.count_quotes(&f.contracts[0].id).unwrap(), 3);
    }

    #[tokio::test]
    async fn test_fresh_contracts_are_skipped_not_failed() {
        let f = fixture(&["AAA"]);
        let source = Arc::new(MockQuoteSource::default());
        let s = scheduler(&f.store, source.clone(), config());
        s.run("u").await.unwrap();

        let second = s.run("u").await.unwrap();
        assert_eq!(second.skipped_fresh, 1);
        assert_eq!(second.failed, 0);
        assert_eq!(second.attempted, 0);
        assert_eq!(source.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_incremental_window_and_overlap_rewrites_rows() {
        let f = fixture(&["AAA"]);
        let id = f.contracts[0].id.clone();
        let window = RequestWindow {
            start: d(2022, 6, 12),
            end: d(2024, 6, 4),
            duration: RequestDuration::Years(2),
        };
        f.store
            .record_success(
                DownloadState::succeeded(&id, &window, Utc::now()),
                vec![Quote::from_bar(&id, bar(d(2024, 6, 4)))],
            )
            .await
            .unwrap();

        let source = Arc::new(MockQuoteSource::default());
        let summary = scheduler(&f.store, source.clone(), config())
            .run("u")
            .await
            .unwrap();
        assert_eq!(summary.succeeded, 1);

        let requests = source.requests.lock().unwrap();
        assert_eq!(requests[0].1.start, d(2022, 6, 12));
        assert_eq!(requests[0].1.duration, RequestDuration::TradingDays(8));

        let state = f.store.get_state(&id).unwrap().unwrap();
        assert_eq!(state.requested_range(), Some((d(2022, 6, 12), today())));
        assert_eq!(f.store.count_quotes(&id).unwrap(), 4);
    }

    #[tokio::test]
    async fn test_stale_contract_is_reported() {
        let f = fixture(&["OLD"]);
        let id = f.contracts[0].id.clone();
        let window = RequestWindow::full_lookback(d(2023, 1, 3), 2);
        f.store
            .record_success(DownloadState::succeeded(&id, &window, Utc::now()), vec![])
            .await
            .unwrap();

        let source = Arc::new(MockQuoteSource::default());
        let summary = scheduler(&f.store, source.clone(), config())
            .run("u")
            .await
            .unwrap();
        assert_eq!(summary.stale.len(), 1);
        assert!(source.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_contract_error_is_recorded_and_run_continues() {
        let f = fixture(&["AAA", "BAD", "CCC"]);
        let source = Arc::new(MockQuoteSource {
            contract_errors: HashMap::from([(
                "BAD".to_string(),
                (200, "No security definition has been found".to_string()),
            )]),
            ..MockQuoteSource::default()
        });
        let summary = scheduler(&f.store, source.clone(), config())
            .run("u")
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures[0].code, 200);

        let bad = f.store.get_state(&f.contracts[1].id).unwrap().unwrap();
        assert_eq!(bad.status, DownloadStatus::Error);
        assert_eq!(bad.error_code, Some(200));
        assert_eq!(bad.requested_range(), None);

        // Not retried by default.
        let again = scheduler(&f.store, source.clone(), config())
            .as_of(d(2024, 6, 20))
            .run("u")
            .await
            .unwrap();
        assert_eq!(again.skipped_error, 1);

        // Retried with the explicit flag.
        let retry = SchedulerConfig {
            error_retry: ErrorRetryPolicy::Always,
            ..config()
        };
        let retried = scheduler(&f.store, source, retry).run("u").await.unwrap();
        assert_eq!(retried.attempted, 1);
        assert_eq!(retried.failed, 1);
    }

    #[tokio::test]
    async fn test_systemic_error_aborts_and_keeps_committed_work() {
        let f = fixture(&["AAA", "BBB", "CCC"]);
        let source = Arc::new(MockQuoteSource {
            systemic_on: Some("BBB".to_string()),
            ..MockQuoteSource::default()
        });
        let result = scheduler(&f.store, source.clone(), config()).run("u").await;

        assert!(matches!(
            result,
            Err(Error::QuoteSource(QuoteSourceError::Systemic(_)))
        ));
        assert_eq!(source.disconnects.load(Ordering::SeqCst), 1);
        assert!(f.store.get_state(&f.contracts[0].id).unwrap().is_some());
        assert!(f.store.get_state(&f.contracts[1].id).unwrap().is_none());
        assert!(f.store.get_state(&f.contracts[2].id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_connect_failure_is_systemic() {
        let f = fixture(&["AAA"]);
        let source = Arc::new(MockQuoteSource {
            fail_connect: true,
            ..MockQuoteSource::default()
        });
        let result = scheduler(&f.store, source.clone(), config()).run("u").await;
        assert!(matches!(result, Err(Error::QuoteSource(e)) if e.is_systemic()));
        assert!(source.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_after_k_of_n() {
        let f = fixture(&["A1", "A2", "A3", "A4", "A5"]);
        let flag = InterruptFlag::new();
        let source = Arc::new(MockQuoteSource {
            interrupt_after: Some((2, flag.clone())),
            ..MockQuoteSource::default()
        });
        let summary = scheduler(&f.store, source.clone(), config())
            .with_interrupt(flag)
            .run("u")
            .await
            .unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.processed, 2);
        assert_eq!(source.disconnects.load(Ordering::SeqCst), 1);
        for (i, c) in f.contracts.iter().enumerate() {
            let state = f.store.get_state(&c.id).unwrap();
            if i < 2 {
                assert_eq!(state.unwrap().status, DownloadStatus::Success);
                assert_eq!(f.store.count_quotes(&c.id).unwrap(), 3);
            } else {
                assert!(state.is_none());
                assert_eq!(f.store.count_quotes(&c.id).unwrap(), 0);
            }
        }
    }

    #[tokio::test]
    async fn test_progress_is_monotonic() {
        let f = fixture(&["A1", "A2", "A3"]);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let progress: ProgressCallback = Arc::new(move |done, total, _| {
            sink.lock().unwrap().push((done, total));
        });
        scheduler(&f.store, Arc::new(MockQuoteSource::default()), config())
            .with_progress(progress)
            .run("u")
            .await
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test]
    async fn test_reset_universe_forces_full_lookback() {
        let f = fixture(&["AAA"]);
        let source = Arc::new(MockQuoteSource::default());
        let s = scheduler(&f.store, source.clone(), config());
        s.run("u").await.unwrap();
        assert_eq!(s.reset_universe("u").await.unwrap(), 1);

        s.run("u").await.unwrap();
        let requests = source.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].1.duration, RequestDuration::Years(2));
    }

    #[tokio::test]
    async fn test_universe_status_pairs_states() {
        let f = fixture(&["AAA", "BBB"]);
        let id = f.contracts[0].id.clone();
        f.store
            .record_failure(DownloadState::failed(&id, Some(162), "pacing", Utc::now()))
            .await
            .unwrap();
        let status = scheduler(&f.store, Arc::new(MockQuoteSource::default()), config())
            .universe_status("u")
            .unwrap();
        assert_eq!(status.len(), 2);
        assert_eq!(status[0].state.as_ref().map(|s| s.status), Some(DownloadStatus::Error));
        assert!(status[1].state.is_none());
    }
}
