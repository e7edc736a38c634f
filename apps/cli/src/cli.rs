//! Command-line arguments.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "contract-sync")]
#[command(about = "Keep a local set of contracts and their daily quotes in sync")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile the stored contracts of one market with its listing
    Reconcile(ReconcileArgs),
    /// Download missing quote history for a universe
    Download(DownloadArgs),
    /// Forget download state and download the full lookback again
    Resync(UniverseArg),
    /// Truncate or delete series with gaps
    Validate(ValidateArgs),
    /// Manage universes
    #[command(subcommand)]
    Universe(UniverseCommands),
    /// Show the download state of every member of a universe
    Status(UniverseArg),
    /// Write the stored quotes of one contract to stdout as CSV
    Export(ExportArgs),
}

#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Instrument type code (STK, ETF, IND, FUT, ...)
    #[arg(long = "type", default_value = "STK")]
    pub instrument_type: String,
    #[arg(long)]
    pub exchange: String,
    /// Apply the edits without asking
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    #[arg(long)]
    pub universe: String,
    /// Retry contracts whose last attempt failed
    #[arg(long)]
    pub retry_errors: bool,
}

#[derive(Args, Debug)]
pub struct UniverseArg {
    #[arg(long)]
    pub universe: String,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[arg(long = "type", default_value = "STK")]
    pub instrument_type: String,
    #[arg(long)]
    pub exchange: String,
    #[arg(long)]
    pub symbol: String,
    #[arg(long, default_value = "USD")]
    pub currency: String,
    /// First date to export (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// Last date to export (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Limit the pass to one universe
    #[arg(long)]
    pub universe: Option<String>,
    /// Report what would change without changing it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug)]
pub enum UniverseCommands {
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        name: String,
    },
    /// Add contracts of one market; all of them when no symbol is given
    Add {
        name: String,
        #[arg(long = "type", default_value = "STK")]
        instrument_type: String,
        #[arg(long)]
        exchange: String,
        symbols: Vec<String>,
    },
    Remove {
        name: String,
        #[arg(long = "type", default_value = "STK")]
        instrument_type: String,
        #[arg(long)]
        exchange: String,
        #[arg(required = true)]
        symbols: Vec<String>,
    },
    List,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_reconcile() {
        let cli = Cli::parse_from(["contract-sync", "reconcile", "--exchange", "NYSE", "--yes"]);
        match cli.command {
            Commands::Reconcile(args) => {
                assert_eq!(args.instrument_type, "STK");
                assert_eq!(args.exchange, "NYSE");
                assert!(args.yes);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_universe_add_with_symbols() {
        let cli = Cli::parse_from([
            "contract-sync",
            "universe",
            "add",
            "tech",
            "--type",
            "ETF",
            "--exchange",
            "ARCA",
            "SPY",
            "QQQ",
        ]);
        match cli.command {
            Commands::Universe(UniverseCommands::Add {
                name,
                instrument_type,
                exchange,
                symbols,
            }) => {
                assert_eq!(name, "tech");
                assert_eq!(instrument_type, "ETF");
                assert_eq!(exchange, "ARCA");
                assert_eq!(symbols, vec!["SPY", "QQQ"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_export_dates() {
        let cli = Cli::parse_from([
            "contract-sync",
            "export",
            "--exchange",
            "NYSE",
            "--symbol",
            "IBM",
            "--from",
            "2024-01-02",
        ]);
        match cli.command {
            Commands::Export(args) => {
                assert_eq!(args.currency, "USD");
                assert_eq!(args.from, NaiveDate::from_ymd_opt(2024, 1, 2));
                assert_eq!(args.to, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(Cli::try_parse_from([
            "contract-sync",
            "export",
            "--exchange",
            "NYSE",
            "--symbol",
            "IBM",
            "--from",
            "02/01/2024",
        ])
        .is_err());
    }

    #[test]
    fn test_remove_requires_symbols() {
        let parsed = Cli::try_parse_from([
            "contract-sync",
            "universe",
            "remove",
            "tech",
            "--exchange",
            "NYSE",
        ]);
        assert!(parsed.is_err());
    }
}
