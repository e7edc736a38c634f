//! Database models for universes.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use contract_sync_core::universes::Universe;

#[derive(Queryable, Identifiable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::universes)]
#[diesel(primary_key(name))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UniverseDB {
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
}

impl From<UniverseDB> for Universe {
    fn from(db: UniverseDB) -> Self {
        Self {
            name: db.name,
            description: db.description,
            created_at: DateTime::parse_from_rfc3339(&db.created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_default(),
        }
    }
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::universe_members)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UniverseMemberDB {
    pub universe_name: String,
    pub contract_id: String,
}
