//! Environment-driven configuration.

use anyhow::{Context, Result};
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use contract_sync_core::download::{ErrorRetryPolicy, SchedulerConfig};
use contract_sync_core::quality::QualityConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub listing_dir: PathBuf,
    pub quote_dir: PathBuf,
    pub holidays_file: Option<PathBuf>,
    pub scheduler: SchedulerConfig,
    pub quality: QualityConfig,
}

impl Config {
    /// Reads `CS_*` variables, after loading `.env` if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let scheduler_defaults = SchedulerConfig::default();
        let quality_defaults = QualityConfig::default();

        let scheduler = SchedulerConfig {
            lookback_years: parse_var(&get, "CS_LOOKBACK_YEARS", scheduler_defaults.lookback_years)?,
            redownload_threshold_days: parse_var(
                &get,
                "CS_REDOWNLOAD_THRESHOLD_DAYS",
                scheduler_defaults.redownload_threshold_days,
            )?,
            max_staleness_days: parse_var(
                &get,
                "CS_MAX_STALENESS_DAYS",
                scheduler_defaults.max_staleness_days,
            )?,
            overlap_days: parse_var(&get, "CS_OVERLAP_DAYS", scheduler_defaults.overlap_days)?,
            error_retry: parse_var::<ErrorRetryPolicy>(
                &get,
                "CS_ERROR_RETRY",
                scheduler_defaults.error_retry,
            )?,
        };
        scheduler.validate()?;

        let quality = QualityConfig {
            min_quote_count: parse_var(&get, "CS_MIN_QUOTES", quality_defaults.min_quote_count)?,
            max_tail_gap_days: parse_var(
                &get,
                "CS_MAX_TAIL_GAP_DAYS",
                quality_defaults.max_tail_gap_days,
            )?,
            max_gap_size: parse_var(&get, "CS_MAX_GAP_SIZE", quality_defaults.max_gap_size)?,
        };
        quality.validate()?;

        Ok(Self {
            db_path: get("CS_DB_PATH").unwrap_or_else(|| "data/contract-sync.db".to_string()),
            listing_dir: get("CS_LISTING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/listings")),
            quote_dir: get("CS_QUOTE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/quotes")),
            holidays_file: get("CS_HOLIDAYS_FILE")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            scheduler,
            quality,
        })
    }
}

fn parse_var<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match get(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("invalid value '{}' for {}", raw, key)),
        _ => Ok(default),
    }
}
