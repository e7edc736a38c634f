//! Quality module - detects holes in stored series and prunes or removes them.

mod assess;
mod service;

pub use assess::{assess_series, find_gaps, DeleteReason, GapRun, QualityAction, QualityConfig};
pub use service::{ContractVerdict, QualityReport, QualityValidator, ValidationScope};
