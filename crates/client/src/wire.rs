//! Field helpers for backend JSON.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

/// Accepts `YYYY-MM-DD` or a timestamp whose first ten characters are a date.
pub fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_date(s).map(Some).map_err(serde::de::Error::custom),
    }
}

pub fn required_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_date(deserializer)?.ok_or_else(|| serde::de::Error::custom("missing date"))
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    let head = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").map_err(|e| format!("invalid date {s:?}: {e}"))
}
