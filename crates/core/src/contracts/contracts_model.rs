//! Contract domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{Error, Result, ValidationError};

// =============================================================================
// InstrumentType
// =============================================================================

/// Kind of tradable instrument, stored as the broker's security-type code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum InstrumentType {
    Stock,
    Etf,
    Index,
    Future,
    Option,
    Forex,
    Cfd,
    Bond,
    Fund,
    Other(String),
}

impl InstrumentType {
    pub fn as_code(&self) -> &str {
        match self {
            InstrumentType::Stock => "STK",
            InstrumentType::Etf => "ETF",
            InstrumentType::Index => "IND",
            InstrumentType::Future => "FUT",
            InstrumentType::Option => "OPT",
            InstrumentType::Forex => "CASH",
            InstrumentType::Cfd => "CFD",
            InstrumentType::Bond => "BOND",
            InstrumentType::Fund => "FUND",
            InstrumentType::Other(code) => code.as_str(),
        }
    }

    /// Parses a code, falling back to `Other` for codes we don't model.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "STK" | "STOCK" => InstrumentType::Stock,
            "ETF" => InstrumentType::Etf,
            "IND" | "INDEX" => InstrumentType::Index,
            "FUT" | "FUTURE" => InstrumentType::Future,
            "OPT" | "OPTION" => InstrumentType::Option,
            "CASH" | "FX" | "FOREX" => InstrumentType::Forex,
            "CFD" => InstrumentType::Cfd,
            "BOND" => InstrumentType::Bond,
            "FUND" => InstrumentType::Fund,
            other => InstrumentType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

impl FromStr for InstrumentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "instrument_type".to_string(),
            )));
        }
        Ok(InstrumentType::from_code(s))
    }
}

impl From<String> for InstrumentType {
    fn from(s: String) -> Self {
        InstrumentType::from_code(&s)
    }
}

impl From<InstrumentType> for String {
    fn from(t: InstrumentType) -> Self {
        t.as_code().to_string()
    }
}

// =============================================================================
// ContractKey
// =============================================================================

/// Identity of a contract: (instrument_type, exchange, broker_symbol, currency).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractKey {
    pub instrument_type: InstrumentType,
    pub exchange: String,
    pub broker_symbol: String,
    pub currency: String,
}

impl fmt::Display for ContractKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.instrument_type, self.exchange, self.broker_symbol, self.currency
        )
    }
}

// =============================================================================
// Contract
// =============================================================================

/// A tradable instrument tracked locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: String,
    pub instrument_type: InstrumentType,
    pub exchange: String,
    pub broker_symbol: String,
    pub currency: String,
    pub exchange_symbol: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Contract {
    pub fn key(&self) -> ContractKey {
        ContractKey {
            instrument_type: self.instrument_type.clone(),
            exchange: self.exchange.clone(),
            broker_symbol: self.broker_symbol.clone(),
            currency: self.currency.clone(),
        }
    }
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {} {})",
            self.broker_symbol, self.exchange, self.currency, self.instrument_type
        )
    }
}

/// Input model for inserting a contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContract {
    pub id: Option<String>,
    pub instrument_type: InstrumentType,
    pub exchange: String,
    pub broker_symbol: String,
    pub currency: String,
    pub exchange_symbol: String,
    pub name: String,
}

impl NewContract {
    /// Checks that every identity field is present.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("exchange", &self.exchange),
            ("broker_symbol", &self.broker_symbol),
            ("currency", &self.currency),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Validation(ValidationError::MissingField(
                    field.to_string(),
                )));
            }
        }
        if self.instrument_type.as_code().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "instrument_type".to_string(),
            )));
        }
        Ok(())
    }

    pub fn key(&self) -> ContractKey {
        ContractKey {
            instrument_type: self.instrument_type.clone(),
            exchange: self.exchange.clone(),
            broker_symbol: self.broker_symbol.clone(),
            currency: self.currency.clone(),
        }
    }
}
