use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;
use contract_sync_core::calendar::WeekdayCalendar;
use contract_sync_storage_sqlite::{
    self as storage, ContractRepository, DownloadStateRepository, QuoteRepository,
    UniverseRepository,
};

/// Repositories and collaborators shared by every command.
pub struct AppContext {
    pub config: Config,
    pub contracts: Arc<ContractRepository>,
    pub quotes: Arc<QuoteRepository>,
    pub states: Arc<DownloadStateRepository>,
    pub universes: Arc<UniverseRepository>,
    pub calendar: Arc<WeekdayCalendar>,
}

/// Installs the tracing subscriber. `log` records from the library crates are
/// forwarded into it.
pub fn init_tracing() {
    let log_format = std::env::var("CS_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
}

pub fn build_context(config: Config) -> anyhow::Result<AppContext> {
    let (pool, writer) = storage::open(&config.db_path)
        .with_context(|| format!("failed to open database {}", config.db_path))?;
    tracing::info!("Database path in use: {}", config.db_path);

    let calendar = match &config.holidays_file {
        Some(path) => {
            tracing::info!("Loading exchange holidays from {}", path.display());
            WeekdayCalendar::from_json_file(path)?
        }
        None => WeekdayCalendar::new(),
    };

    Ok(AppContext {
        contracts: Arc::new(ContractRepository::new(pool.clone(), writer.clone())),
        quotes: Arc::new(QuoteRepository::new(pool.clone(), writer.clone())),
        states: Arc::new(DownloadStateRepository::new(pool.clone(), writer.clone())),
        universes: Arc::new(UniverseRepository::new(pool, writer)),
        calendar: Arc::new(calendar),
        config,
    })
}
