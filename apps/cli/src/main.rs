//! contract-sync command-line entry point.

mod cli;
mod commands;
mod config;
mod main_lib;
mod prompt;
mod sources;

use clap::Parser;

use cli::{Cli, Commands};
use config::Config;
use main_lib::{build_context, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing();
    let ctx = build_context(config)?;

    match cli.command {
        Commands::Reconcile(args) => {
            commands::reconcile(&ctx, &args.instrument_type, &args.exchange, args.yes).await
        }
        Commands::Download(args) => {
            commands::download(&ctx, &args.universe, args.retry_errors).await
        }
        Commands::Resync(args) => commands::resync(&ctx, &args.universe).await,
        Commands::Validate(args) => {
            commands::validate(&ctx, args.universe.as_deref(), args.dry_run).await
        }
        Commands::Universe(command) => commands::universe(&ctx, command).await,
        Commands::Status(args) => commands::status(&ctx, &args.universe),
        Commands::Export(args) => commands::export(&ctx, &args),
    }
}
