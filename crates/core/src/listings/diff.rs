use std::collections::BTreeMap;

use super::model::{ListingKey, ListingRecord};

/// Symmetric difference between a fetched listing and the stored one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingDiff {
    /// In the fetched listing but not stored, ordered by key.
    pub added: Vec<ListingRecord>,
    /// Stored but no longer listed, ordered by key.
    pub removed: Vec<ListingRecord>,
    /// Keys that appeared more than once in the fetched listing.
    pub duplicates: Vec<ListingKey>,
}

impl ListingDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

fn index(
    records: &[ListingRecord],
    duplicates: &mut Vec<ListingKey>,
) -> BTreeMap<ListingKey, ListingRecord> {
    let mut map = BTreeMap::new();
    for record in records {
        let key = record.key();
        if map.contains_key(&key) {
            duplicates.push(key);
        } else {
            map.insert(key, record.clone());
        }
    }
    map
}

/// Diffs `web` against `db` on exact (broker_symbol, currency) equality.
///
/// Duplicate keys in `web` collapse to their first occurrence.
pub fn diff_listings(web: &[ListingRecord], db: &[ListingRecord]) -> ListingDiff {
    let mut duplicates = Vec::new();
    let web = index(web, &mut duplicates);
    let db = index(db, &mut Vec::new());

    let added = web
        .iter()
        .filter(|(key, _)| !db.contains_key(*key))
        .map(|(_, record)| record.clone())
        .collect();
    let removed = db
        .iter()
        .filter(|(key, _)| !web.contains_key(*key))
        .map(|(_, record)| record.clone())
        .collect();

    ListingDiff {
        added,
        removed,
        duplicates,
    }
}
