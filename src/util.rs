use crate::error::{MetricsError, Result};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};

/// Date format used by the GitHub API for every timestamp field.
pub const SOURCE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub fn parse_source_date(input: &str) -> Result<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(input, SOURCE_DATE_FORMAT) {
        return Ok(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(input)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| MetricsError::InvalidDate(format!("'{input}': {e}")))
}

pub fn format_source_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(SOURCE_DATE_FORMAT).to_string()
}

pub fn from_epoch_seconds(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| MetricsError::InvalidDate(format!("Invalid timestamp: {secs}")))
}

/// `now` minus `weeks` whole weeks, rejecting spans chrono cannot represent.
pub fn lookback_start(now: DateTime<Utc>, weeks: u32) -> Result<DateTime<Utc>> {
    Duration::try_weeks(i64::from(weeks))
        .and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(|| MetricsError::InvalidArgument(format!("lookback of {weeks} weeks is out of range")))
}

/// Consecutive one-week windows covering `[start, end)`.
pub fn week_spans(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> impl Iterator<Item = (DateTime<Utc>, DateTime<Utc>)> {
    let mut current = start;
    std::iter::from_fn(move || {
        if current >= end {
            return None;
        }
        let next = current + Duration::weeks(1);
        let span = (current, next);
        current = next;
        Some(span)
    })
}

pub fn is_valid_slug(input: &str) -> bool {
    let valid_part = |part: &str| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    };
    match input.split_once('/') {
        Some((owner, name)) => valid_part(owner) && valid_part(name),
        None => false,
    }
}

/// Serde adapter writing timestamps in the source date format.
pub mod source_date {
    use super::{format_source_date, parse_source_date};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_source_date(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_source_date(&raw).map_err(serde::de::Error::custom)
    }
}

pub mod source_date_opt {
    use super::{format_source_date, parse_source_date};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&format_source_date(ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse_source_date(&raw).map(Some).map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
