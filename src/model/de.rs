//! Lenient deserializers for fields whose stored representation drifted over time.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

/// Parses `YYYY-MM-DD`, also accepting a full RFC 3339 timestamp such as
/// `2025-03-01T00:00:00.000Z` by looking only at the date part.
pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let date_part = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

pub(crate) fn date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_date(&s).ok_or_else(|| serde::de::Error::custom(format!("Invalid date '{s}'")))
}

/// Empty strings and `null` both become `None`.
pub(crate) fn opt_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_date(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("Invalid date '{s}'"))),
    }
}

/// Empty strings and `null` both become `None`. Used for optional references, which forms used
/// to submit as `""` when nothing was selected.
pub(crate) fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.trim().is_empty()))
}

#[test]
fn test_parse_date() {
    let expected = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    assert_eq!(parse_date("2025-03-01"), Some(expected));
    assert_eq!(parse_date("2025-03-01T12:30:00.000Z"), Some(expected));
    assert_eq!(parse_date("03/01/2025"), None);
    assert_eq!(parse_date(""), None);
}
