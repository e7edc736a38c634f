//! Helpers for staying under SQLite's statement parameter limit, and the
//! TEXT encodings used for dates.

use chrono::NaiveDate;

use contract_sync_core::errors::Result;

/// Dates are stored as ISO text so that string order is date order.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(text: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(text, DATE_FORMAT)?)
}

/// Maximum number of bound parameters used by one statement.
///
/// SQLite builds can be compiled with a limit as low as 999 variables. Keeping
/// `IN (...)` lists and multi-row inserts under 500 leaves room for the other
/// parameters of the query.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

/// Chunk a slice for `IN (...)` queries.
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}

/// Chunk rows for a multi-row insert of `columns` columns each.
pub fn chunk_rows<T>(rows: &[T], columns: usize) -> impl Iterator<Item = &[T]> {
    rows.chunks((SQLITE_MAX_PARAMS_CHUNK / columns.max(1)).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_text_sorts_like_dates() {
        let a = NaiveDate::from_ymd_opt(2023, 12, 29).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert!(format_date(a) < format_date(b));
        assert_eq!(parse_date(&format_date(b)).unwrap(), b);
        assert!(parse_date("02/01/2024").is_err());
    }

    #[test]
    fn test_chunk_for_sqlite_empty() {
        let items: Vec<i32> = vec![];
        assert_eq!(chunk_for_sqlite(&items).count(), 0);
    }

    #[test]
    fn test_chunk_for_sqlite_over_limit() {
        let items: Vec<i32> = (0..1200).collect();
        let chunks: Vec<_> = chunk_for_sqlite(&items).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), SQLITE_MAX_PARAMS_CHUNK);
        assert_eq!(chunks[2].len(), 200);
    }

    #[test]
    fn test_chunk_rows_respects_column_count() {
        let rows: Vec<i32> = (0..200).collect();
        let chunks: Vec<_> = chunk_rows(&rows, 7).collect();
        // 500 / 7 = 71 rows per statement
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 71);
        assert_eq!(chunks[2].len(), 58);
    }
}
