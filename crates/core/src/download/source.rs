//! Quote source abstraction.

use async_trait::async_trait;
use thiserror::Error;

use super::window::RequestWindow;
use crate::contracts::Contract;
use crate::quotes::Bar;

/// Failures reported by a quote source.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuoteSourceError {
    /// The request for one contract failed; the session is still usable.
    #[error("contract error {code}: {text}")]
    Contract { code: i32, text: String },

    /// The session itself is broken (connection lost, not logged in, ...).
    #[error("systemic failure: {0}")]
    Systemic(String),
}

impl QuoteSourceError {
    pub fn is_systemic(&self) -> bool {
        matches!(self, QuoteSourceError::Systemic(_))
    }
}

/// Historical daily bars provider.
///
/// Only one historical request is in flight at a time; callers await each
/// `fetch_quotes` before issuing the next.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn connect(&self) -> Result<(), QuoteSourceError>;

    async fn disconnect(&self);

    /// Daily bars for `contract` covering `window.duration` back from `window.end`.
    async fn fetch_quotes(
        &self,
        contract: &Contract,
        window: &RequestWindow,
    ) -> Result<Vec<Bar>, QuoteSourceError>;
}
