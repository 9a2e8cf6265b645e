//! Row-to-entity parsing helpers.
//!
//! Every repo converts `libsql::Row` (column-indexed) into typed entity
//! structs. Timestamps are written as fixed-width RFC 3339 UTC text so that
//! string comparison in SQL matches chronological order.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::Serialize;

use crate::error::DatabaseError;

/// Format a timestamp for storage, e.g. `2026-02-09T14:30:00.000000Z`.
#[must_use]
pub fn to_db_time(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time truncated to the stored precision, so a returned entity
/// equals the one read back.
#[must_use]
pub fn db_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// Handles both RFC 3339 (`"2026-02-09T14:30:00Z"`) and `SQLite`'s default
/// format (`"2026-02-09 14:30:00"`).
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string cannot be parsed as either format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Parse an optional TEXT column as `Option<DateTime<Utc>>`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty string cannot be parsed.
pub fn parse_optional_datetime(s: Option<&str>) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => Ok(Some(parse_datetime(s)?)),
        _ => Ok(None),
    }
}

/// Read a nullable timestamp column.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read or parse fails.
pub fn get_opt_datetime(row: &libsql::Row, idx: i32) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    parse_optional_datetime(get_opt_string(row, idx)?.as_deref())
}

/// Read a required timestamp column.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read or parse fails.
pub fn get_datetime(row: &libsql::Row, idx: i32) -> Result<DateTime<Utc>, DatabaseError> {
    parse_datetime(&row.get::<String>(idx)?)
}

/// Parse a TEXT column into a serde-deserializable enum.
///
/// Works with all lims-core enums that use `#[serde(rename_all = "snake_case")]`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string does not match any enum variant.
pub fn parse_enum<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| DatabaseError::Query(format!("Failed to parse enum from '{s}': {e}")))
}

/// Read a nullable TEXT column. Returns `None` for both SQL NULL and empty string.
///
/// `row.get::<String>(idx)` on a NULL column returns an error, not `""`.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Read an INTEGER 0/1 column as `bool`.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_bool(row: &libsql::Row, idx: i32) -> Result<bool, DatabaseError> {
    Ok(row.get::<i64>(idx)? != 0)
}

/// Read a non-negative INTEGER column as `u32`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the value is negative or too large.
pub fn get_u32(row: &libsql::Row, idx: i32) -> Result<u32, DatabaseError> {
    let value = row.get::<i64>(idx)?;
    u32::try_from(value)
        .map_err(|_| DatabaseError::Query(format!("Column {idx} out of range for u32: {value}")))
}

/// Extract an optional JSON value from a TEXT column.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty string contains invalid JSON.
pub fn parse_optional_json(s: Option<&str>) -> Result<Option<serde_json::Value>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => {
            let val = serde_json::from_str(s)
                .map_err(|e| DatabaseError::Query(format!("Invalid JSON in column: {e}")))?;
            Ok(Some(val))
        }
        _ => Ok(None),
    }
}

/// Serialize an audit detail payload.
///
/// # Errors
///
/// Returns `DatabaseError::Other` if serialization fails.
pub fn to_detail<T: Serialize>(detail: &T) -> Result<Option<serde_json::Value>, DatabaseError> {
    Ok(Some(serde_json::to_value(detail)?))
}

/// Collect every row of a result set through a row mapper.
///
/// # Errors
///
/// Returns the first error from fetching or mapping a row.
pub async fn collect_rows<T>(
    mut rows: libsql::Rows,
    map: impl Fn(&libsql::Row) -> Result<T, DatabaseError>,
) -> Result<Vec<T>, DatabaseError> {
    let mut out = Vec::new();
    while let Some(row) = rows.next().await? {
        out.push(map(&row)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_both_datetime_formats() {
        let expected = Utc.with_ymd_and_hms(2026, 2, 9, 14, 30, 0).unwrap();
        assert_eq!(parse_datetime("2026-02-09T14:30:00+00:00").unwrap(), expected);
        assert_eq!(parse_datetime("2026-02-09 14:30:00").unwrap(), expected);
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn db_time_is_fixed_width_and_sortable() {
        let a = Utc.with_ymd_and_hms(2026, 2, 9, 9, 0, 0).unwrap();
        let b = a + chrono::Duration::microseconds(1);
        let (sa, sb) = (to_db_time(a), to_db_time(b));
        assert_eq!(sa.len(), sb.len());
        assert!(sa < sb);
        assert_eq!(parse_datetime(&sa).unwrap(), a);
    }

    #[test]
    fn db_now_survives_storage() {
        let now = db_now();
        assert_eq!(parse_datetime(&to_db_time(now)).unwrap(), now);
    }

    #[test]
    fn parses_snake_case_enums() {
        let state: lims_core::enums::DataEntryState = parse_enum("repeat_failed").unwrap();
        assert_eq!(state, lims_core::enums::DataEntryState::RepeatFailed);
        assert!(parse_enum::<lims_core::enums::DataEntryState>("bogus").is_err());
    }

    #[test]
    fn optional_json() {
        assert_eq!(parse_optional_json(None).unwrap(), None);
        assert_eq!(parse_optional_json(Some("")).unwrap(), None);
        assert_eq!(
            parse_optional_json(Some(r#"{"a":1}"#)).unwrap(),
            Some(serde_json::json!({"a": 1}))
        );
        assert!(parse_optional_json(Some("{")).is_err());
    }
}
