use serde::{Deserialize, Serialize};
use std::fmt;

use crate::contracts::{Contract, InstrumentType, NewContract};

/// Identity of a listing entry within one (instrument_type, exchange) market.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingKey {
    pub broker_symbol: String,
    pub currency: String,
}

impl fmt::Display for ListingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.broker_symbol, self.currency)
    }
}

/// One entry of an exchange listing.
///
/// Only `broker_symbol` and `currency` take part in comparisons; the other
/// fields are carried along into new contracts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    pub broker_symbol: String,
    pub currency: String,
    #[serde(default)]
    pub exchange_symbol: String,
    #[serde(default)]
    pub name: String,
}

impl ListingRecord {
    pub fn key(&self) -> ListingKey {
        ListingKey {
            broker_symbol: self.broker_symbol.clone(),
            currency: self.currency.clone(),
        }
    }

    pub fn to_new_contract(&self, instrument_type: &InstrumentType, exchange: &str) -> NewContract {
        let exchange_symbol = if self.exchange_symbol.is_empty() {
            self.broker_symbol.clone()
        } else {
            self.exchange_symbol.clone()
        };
        NewContract {
            id: None,
            instrument_type: instrument_type.clone(),
            exchange: exchange.to_string(),
            broker_symbol: self.broker_symbol.clone(),
            currency: self.currency.clone(),
            exchange_symbol,
            name: self.name.clone(),
        }
    }
}

impl From<&Contract> for ListingRecord {
    fn from(c: &Contract) -> Self {
        Self {
            broker_symbol: c.broker_symbol.clone(),
            currency: c.currency.clone(),
            exchange_symbol: c.exchange_symbol.clone(),
            name: c.name.clone(),
        }
    }
}
