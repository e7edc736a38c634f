//! Database model for download states.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::utils::{format_date, parse_date};
use contract_sync_core::download::DownloadState;
use contract_sync_core::errors::Error;

#[derive(Queryable, Identifiable, Selectable, Insertable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::download_states)]
#[diesel(primary_key(contract_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DownloadStateDB {
    pub contract_id: String,
    pub status: String,
    pub error_code: Option<i32>,
    pub error_text: Option<String>,
    pub earliest_requested_date: Option<String>,
    pub latest_requested_date: Option<String>,
    pub attempted_at: Option<String>,
}

impl TryFrom<DownloadStateDB> for DownloadState {
    type Error = Error;

    fn try_from(db: DownloadStateDB) -> Result<Self, Self::Error> {
        Ok(Self {
            status: db.status.parse()?,
            error_code: db.error_code,
            error_text: db.error_text,
            earliest_requested_date: db
                .earliest_requested_date
                .as_deref()
                .map(parse_date)
                .transpose()?,
            latest_requested_date: db
                .latest_requested_date
                .as_deref()
                .map(parse_date)
                .transpose()?,
            attempted_at: db
                .attempted_at
                .as_deref()
                .map(DateTime::parse_from_rfc3339)
                .transpose()?
                .map(|dt| dt.with_timezone(&Utc)),
            contract_id: db.contract_id,
        })
    }
}

impl From<&DownloadState> for DownloadStateDB {
    fn from(state: &DownloadState) -> Self {
        Self {
            contract_id: state.contract_id.clone(),
            status: state.status.as_str().to_string(),
            error_code: state.error_code,
            error_text: state.error_text.clone(),
            earliest_requested_date: state.earliest_requested_date.map(format_date),
            latest_requested_date: state.latest_requested_date.map(format_date),
            attempted_at: state.attempted_at.map(|t| t.to_rfc3339()),
        }
    }
}
