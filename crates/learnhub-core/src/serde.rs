//! Lenient field deserializers.
//!
//! Multipart submissions deliver every scalar as text, while JSON bodies
//! carry native numbers and booleans. The helpers here accept either form
//! for the same DTO field and treat empty strings as absent.
//!
//! Use them with `#[serde(default, deserialize_with = "...")]` on `Option`
//! fields.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, de::Error};
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(untagged)]
enum Flexible<T> {
    Native(T),
    Text(String),
}

fn flexible<'de, D, T, F>(deserializer: D, parse: F) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
    F: FnOnce(&str) -> Result<T, String>,
{
    match Option::<Flexible<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Flexible::Native(value)) => Ok(Some(value)),
        Some(Flexible::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                Ok(None)
            } else {
                parse(text).map(Some).map_err(D::Error::custom)
            }
        }
    }
}

pub fn deserialize_optional_uuid<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => Uuid::parse_str(s.trim())
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

pub fn flexible_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    flexible(deserializer, |s| {
        s.parse::<i64>()
            .map_err(|_| format!("invalid integer `{}`", s))
    })
}

pub fn flexible_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    flexible(deserializer, |s| {
        s.parse::<f64>().map_err(|_| format!("invalid number `{}`", s))
    })
}

pub fn flexible_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    flexible(deserializer, |s| match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(format!("invalid boolean `{}`", s)),
    })
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.date_naive()))
        .map_err(|_| format!("invalid date `{}`", s))
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp (time part is dropped).
pub fn flexible_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let text: Option<String> = Option::deserialize(deserializer)?;
    match text.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_date(s).map(Some).map_err(D::Error::custom),
    }
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` (midnight UTC).
pub fn flexible_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let text: Option<String> = Option::deserialize(deserializer)?;
    match text.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map(|d| d.and_time(NaiveTime::MIN).and_utc())
            })
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid date `{}`", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Form {
        #[serde(default, deserialize_with = "flexible_i64")]
        count: Option<i64>,
        #[serde(default, deserialize_with = "flexible_f64")]
        cgpa: Option<f64>,
        #[serde(default, deserialize_with = "flexible_bool")]
        flag: Option<bool>,
        #[serde(default, deserialize_with = "flexible_date")]
        born: Option<NaiveDate>,
        #[serde(default, deserialize_with = "flexible_datetime")]
        due: Option<DateTime<Utc>>,
        #[serde(default, deserialize_with = "deserialize_optional_uuid")]
        id: Option<Uuid>,
    }

    #[test]
    fn test_native_values() {
        let form: Form = serde_json::from_value(json!({
            "count": 12, "cgpa": 3.5, "flag": true
        }))
        .unwrap();
        assert_eq!(form.count, Some(12));
        assert_eq!(form.cgpa, Some(3.5));
        assert_eq!(form.flag, Some(true));
    }

    #[test]
    fn test_text_values() {
        let form: Form = serde_json::from_value(json!({
            "count": " 12 ", "cgpa": "3.75", "flag": "false",
            "born": "2001-04-09", "due": "2025-01-31T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(form.count, Some(12));
        assert_eq!(form.cgpa, Some(3.75));
        assert_eq!(form.flag, Some(false));
        assert_eq!(form.born, NaiveDate::from_ymd_opt(2001, 4, 9));
        assert_eq!(form.due.unwrap().to_rfc3339(), "2025-01-31T10:00:00+00:00");
    }

    #[test]
    fn test_empty_and_missing_are_none() {
        let form: Form = serde_json::from_value(json!({
            "count": "", "flag": null, "born": "", "id": ""
        }))
        .unwrap();
        assert!(form.count.is_none());
        assert!(form.flag.is_none());
        assert!(form.born.is_none());
        assert!(form.id.is_none());
        assert!(form.due.is_none());
    }

    #[test]
    fn test_date_only_datetime_is_midnight() {
        let form: Form = serde_json::from_value(json!({ "due": "2025-03-01" })).unwrap();
        assert_eq!(form.due.unwrap().to_rfc3339(), "2025-03-01T00:00:00+00:00");
    }

    #[test]
    fn test_datetime_accepted_as_date() {
        let form: Form =
            serde_json::from_value(json!({ "born": "1999-12-31T00:00:00.000Z" })).unwrap();
        assert_eq!(form.born, NaiveDate::from_ymd_opt(1999, 12, 31));
    }

    #[test]
    fn test_invalid_text_is_error() {
        assert!(serde_json::from_value::<Form>(json!({ "count": "ten" })).is_err());
        assert!(serde_json::from_value::<Form>(json!({ "flag": "maybe" })).is_err());
        assert!(serde_json::from_value::<Form>(json!({ "born": "09/04/2001" })).is_err());
    }
}
