//! Database model for daily quotes.

use diesel::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::utils::{format_date, parse_date};
use contract_sync_core::errors::Error;
use contract_sync_core::quotes::Quote;

/// Prices and volume are stored as decimal text to keep them exact.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::quotes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct QuoteDB {
    pub contract_id: String,
    pub date: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
}

impl QuoteDB {
    pub const COLUMNS: usize = 7;
}

/// A stored row that does not parse is an error, never a default value.
impl TryFrom<QuoteDB> for Quote {
    type Error = Error;

    fn try_from(db: QuoteDB) -> Result<Self, Self::Error> {
        Ok(Quote {
            date: parse_date(&db.date)?,
            open: Decimal::from_str(&db.open)?,
            high: Decimal::from_str(&db.high)?,
            low: Decimal::from_str(&db.low)?,
            close: Decimal::from_str(&db.close)?,
            volume: Decimal::from_str(&db.volume)?,
            contract_id: db.contract_id,
        })
    }
}

impl From<&Quote> for QuoteDB {
    fn from(quote: &Quote) -> Self {
        QuoteDB {
            contract_id: quote.contract_id.clone(),
            date: format_date(quote.date),
            open: quote.open.to_string(),
            high: quote.high.to_string(),
            low: quote.low.to_string(),
            close: quote.close.to_string(),
            volume: quote.volume.to_string(),
        }
    }
}
