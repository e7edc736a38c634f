//! One function per subcommand. Results go to stdout, diagnostics to the log.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cli::{ExportArgs, UniverseCommands};
use crate::main_lib::AppContext;
use crate::prompt::StdinConfirm;
use crate::sources::{write_quotes, CsvQuoteSource, JsonListingSource};
use contract_sync_core::contracts::{
    Contract, ContractKey, ContractRepositoryTrait, InstrumentType,
};
use contract_sync_core::download::{
    DownloadScheduler, DownloadStatus, DownloadSummary, ErrorRetryPolicy, InterruptFlag,
    ProgressCallback, SchedulerConfig,
};
use contract_sync_core::listings::{ListingReconciler, ReconcileOutcome, ReconcilerConfig};
use contract_sync_core::quality::{QualityValidator, ValidationScope};
use contract_sync_core::quotes::QuoteStore;
use contract_sync_core::universes::UniverseService;

fn universe_service(ctx: &AppContext) -> UniverseService {
    UniverseService::new(ctx.universes.clone(), ctx.contracts.clone())
}

fn scheduler(ctx: &AppContext, config: SchedulerConfig) -> DownloadScheduler {
    DownloadScheduler::new(
        ctx.universes.clone(),
        ctx.states.clone(),
        Arc::new(CsvQuoteSource::new(&ctx.config.quote_dir)),
        ctx.calendar.clone(),
        config,
    )
}

pub async fn reconcile(ctx: &AppContext, instrument_type: &str, exchange: &str, yes: bool) -> Result<()> {
    let instrument_type = InstrumentType::from_code(instrument_type);
    let exchange = exchange.trim().to_ascii_uppercase();
    let config = ReconcilerConfig {
        assume_yes: yes,
        ..ReconcilerConfig::default()
    };
    let reconciler = ListingReconciler::new(
        ctx.contracts.clone(),
        Arc::new(JsonListingSource::new(&ctx.config.listing_dir)),
        Arc::new(StdinConfirm::new(config.preview_limit)),
        config,
    );

    match reconciler.sync_listing(&instrument_type, &exchange).await? {
        ReconcileOutcome::Applied { added, removed } => {
            println!("{} {}: {} added, {} removed", exchange, instrument_type, added, removed)
        }
        ReconcileOutcome::Unchanged => println!("{} {}: unchanged", exchange, instrument_type),
        ReconcileOutcome::Aborted(reason) => {
            println!("{} {}: nothing changed ({})", exchange, instrument_type, reason)
        }
    }
    Ok(())
}

/// Sets the interrupt flag on Ctrl-C. The in-flight contract is finished first.
fn watch_ctrl_c(flag: InterruptFlag) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current contract");
            flag.request();
        }
    });
}

fn print_summary(summary: &DownloadSummary) {
    println!("{}", summary.summary());
    for failure in &summary.failures {
        println!("  failed  {} [{}] {}", failure.contract, failure.code, failure.text);
    }
    for contract in &summary.stale {
        println!("  stale   {} (run `resync` to download it again)", contract);
    }
}

async fn run_download(ctx: &AppContext, universe: &str, config: SchedulerConfig) -> Result<()> {
    let members = universe_service(ctx).members(universe)?;
    if members.is_empty() {
        warn!("Universe '{}' has no members", universe);
    }

    let progress: ProgressCallback = Arc::new(|processed: usize, total: usize, contract: &Contract| {
        info!("[{}/{}] {}", processed, total, contract);
    });
    let scheduler = scheduler(ctx, config).with_progress(progress);
    watch_ctrl_c(scheduler.interrupt_flag());

    let summary = scheduler.run(universe).await?;
    print_summary(&summary);
    Ok(())
}

pub async fn download(ctx: &AppContext, universe: &str, retry_errors: bool) -> Result<()> {
    let mut config = ctx.config.scheduler.clone();
    if retry_errors {
        config.error_retry = ErrorRetryPolicy::Always;
    }
    run_download(ctx, universe, config).await
}

pub async fn resync(ctx: &AppContext, universe: &str) -> Result<()> {
    universe_service(ctx).members(universe)?;
    let reset = scheduler(ctx, ctx.config.scheduler.clone())
        .reset_universe(universe)
        .await?;
    println!("Reset download state of {} contract(s)", reset);
    run_download(ctx, universe, ctx.config.scheduler.clone()).await
}

pub async fn validate(ctx: &AppContext, universe: Option<&str>, dry_run: bool) -> Result<()> {
    let scope = match universe {
        Some(name) => {
            universe_service(ctx).members(name)?;
            ValidationScope::Universe(name.to_string())
        }
        None => ValidationScope::All,
    };
    let validator = QualityValidator::new(
        ctx.contracts.clone(),
        ctx.universes.clone(),
        ctx.quotes.clone(),
        ctx.states.clone(),
        ctx.calendar.clone(),
        ctx.config.quality.clone(),
    );

    let report = validator.validate_all(&scope, dry_run).await?;
    println!("{}", report.summary());
    for verdict in &report.verdicts {
        println!("  {}: {}", verdict.contract, verdict.action);
    }
    Ok(())
}

pub async fn universe(ctx: &AppContext, command: UniverseCommands) -> Result<()> {
    let service = universe_service(ctx);
    match command {
        UniverseCommands::Create { name, description } => {
            service.create_universe(&name, description).await?;
            println!("Created universe '{}'", name);
        }
        UniverseCommands::Delete { name } => {
            service.delete_universe(&name).await?;
            println!("Deleted universe '{}'", name);
        }
        UniverseCommands::Add {
            name,
            instrument_type,
            exchange,
            symbols,
        } => {
            let added = service
                .add_market_members(
                    &name,
                    &InstrumentType::from_code(&instrument_type),
                    &exchange.trim().to_ascii_uppercase(),
                    &symbols,
                )
                .await?;
            println!("Added {} contract(s) to '{}'", added, name);
        }
        UniverseCommands::Remove {
            name,
            instrument_type,
            exchange,
            symbols,
        } => {
            let removed = service
                .remove_market_members(
                    &name,
                    &InstrumentType::from_code(&instrument_type),
                    &exchange.trim().to_ascii_uppercase(),
                    &symbols,
                )
                .await?;
            println!("Removed {} contract(s) from '{}'", removed, name);
        }
        UniverseCommands::List => {
            for summary in service.list_universes()? {
                println!(
                    "{:<20} {:>6}  {}",
                    summary.name,
                    summary.member_count,
                    summary.description.unwrap_or_default()
                );
            }
        }
    }
    Ok(())
}

pub fn status(ctx: &AppContext, universe: &str) -> Result<()> {
    universe_service(ctx).members(universe)?;
    let rows = scheduler(ctx, ctx.config.scheduler.clone()).universe_status(universe)?;
    for row in &rows {
        let state = row.state.as_ref();
        let status = state.map(|s| s.status).unwrap_or_default();
        let detail = match state {
            Some(s) if s.status == DownloadStatus::Success => match s.requested_range() {
                Some((from, to)) => format!("{} .. {}", from, to),
                None => String::new(),
            },
            Some(s) if s.status == DownloadStatus::Error => format!(
                "[{}] {}",
                s.error_code.map(|c| c.to_string()).unwrap_or_default(),
                s.error_text.as_deref().unwrap_or_default()
            ),
            _ => String::new(),
        };
        let stored = match ctx.quotes.date_bounds(&row.contract.id)? {
            Some((first, last)) => format!(
                "{} quotes {} .. {}",
                ctx.quotes.count_quotes(&row.contract.id)?,
                first,
                last
            ),
            None => "no quotes".to_string(),
        };
        println!(
            "{:<40} {:<16} {:<24} {}",
            row.contract.to_string(),
            status.as_str(),
            stored,
            detail
        );
    }
    println!("{} contract(s)", rows.len());
    Ok(())
}

pub fn export(ctx: &AppContext, args: &ExportArgs) -> Result<()> {
    let key = ContractKey {
        instrument_type: InstrumentType::from_code(&args.instrument_type),
        exchange: args.exchange.trim().to_ascii_uppercase(),
        broker_symbol: args.symbol.trim().to_string(),
        currency: args.currency.trim().to_ascii_uppercase(),
    };
    let Some(contract) = ctx.contracts.find_by_key(&key)? else {
        anyhow::bail!("no contract {}", key);
    };
    let quotes = ctx.quotes.get_quotes(&contract.id, args.from, args.to)?;
    info!("Exporting {} quote(s) of {}", quotes.len(), contract);
    write_quotes(&quotes, std::io::stdout().lock())?;
    Ok(())
}
