use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;

/// Parse a snake_case enum value using serde-deserialization.
pub fn parse_enum<T>(raw: &str, field: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let normalized = raw.replace('-', "_");
    let json = format!("\"{normalized}\"");
    serde_json::from_str(&json).map_err(|error| anyhow::anyhow!("invalid {field} '{raw}': {error}"))
}

/// Parse an RFC 3339 instant, or a bare date meaning midnight UTC.
pub fn parse_instant(raw: &str, field: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| anyhow::anyhow!("invalid {field} '{raw}': expected RFC 3339 or YYYY-MM-DD"))
}
