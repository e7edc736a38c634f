//! Database model for contracts.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use contract_sync_core::contracts::{Contract, InstrumentType, NewContract};

#[derive(Queryable, Identifiable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::contracts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ContractDB {
    pub id: String,
    pub instrument_type: String,
    pub exchange: String,
    pub broker_symbol: String,
    pub currency: String,
    pub exchange_symbol: String,
    pub name: String,
    pub created_at: String,
}

impl From<ContractDB> for Contract {
    fn from(db: ContractDB) -> Self {
        Self {
            id: db.id,
            instrument_type: InstrumentType::from_code(&db.instrument_type),
            exchange: db.exchange,
            broker_symbol: db.broker_symbol,
            currency: db.currency,
            exchange_symbol: db.exchange_symbol,
            name: db.name,
            created_at: DateTime::parse_from_rfc3339(&db.created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_default(),
        }
    }
}

impl From<NewContract> for ContractDB {
    fn from(new: NewContract) -> Self {
        Self {
            id: new.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            instrument_type: new.instrument_type.as_code().to_string(),
            exchange: new.exchange,
            broker_symbol: new.broker_symbol,
            currency: new.currency,
            exchange_symbol: new.exchange_symbol,
            name: new.name,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}
