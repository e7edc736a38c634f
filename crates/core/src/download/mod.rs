//! Download module - per-contract quote download state machine and scheduler.

mod config;
mod interrupt;
mod planner;
mod service;
mod source;
mod state;
mod summary;
mod window;

pub use config::{ErrorRetryPolicy, SchedulerConfig};
pub use interrupt::InterruptFlag;
pub use planner::{plan_download, DownloadDecision, RequestReason, SkipReason};
pub use service::{ContractStatus, DownloadScheduler, ProgressCallback};
pub use source::{QuoteSource, QuoteSourceError};
pub use state::{DownloadState, DownloadStateStore, DownloadStatus};
pub use summary::{ContractFailure, DownloadSummary};
pub use window::{RequestDuration, RequestWindow};
