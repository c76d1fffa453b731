//! Conversion between in-memory items and cache documents.
//!
//! Items carry dates in the source's string format; the cache stores them as
//! epoch seconds. Both directions walk the whole document so nested comment
//! timestamps are converted too.

use crate::cache::CachedItem;
use crate::error::{MetricsError, Result};
use crate::model::{HistoryItem, RepoId};
use crate::util::{format_source_date, from_epoch_seconds, parse_source_date};
use serde_json::Value;
use tracing::warn;

pub const DATE_FIELDS: [&str; 5] = ["created_at", "updated_at", "closed_at", "merged_at", "submitted_at"];

const NONE_SENTINEL: &str = "None";

pub fn to_cached(repo: &RepoId, item: &HistoryItem) -> Result<CachedItem> {
    let mut document = serde_json::to_value(item)?;
    dates_to_native(&mut document)?;
    Ok(CachedItem {
        repo_id: repo.slug(),
        category: item.category(),
        item_id: item.id().to_string(),
        updated_at: item.updated_at(),
        document,
    })
}

pub fn from_cached(cached: CachedItem) -> Result<HistoryItem> {
    let mut document = cached.document;
    dates_to_source(&mut document)?;
    let item: HistoryItem = serde_json::from_value(document).map_err(|e| {
        MetricsError::MalformedItem(format!("cached {} #{}: {e}", cached.category, cached.item_id))
    })?;
    if item.category() != cached.category {
        return Err(MetricsError::MalformedItem(format!(
            "cached {} #{} holds a {} document",
            cached.category,
            cached.item_id,
            item.category()
        )));
    }
    Ok(item)
}

fn dates_to_native(value: &mut Value) -> Result<()> {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if DATE_FIELDS.contains(&key.as_str()) {
                    let native = match &*field {
                        Value::String(s) if s.as_str() == NONE_SENTINEL => Some(Value::Null),
                        Value::String(s) => Some(Value::from(parse_source_date(s)?.timestamp())),
                        _ => None,
                    };
                    if let Some(native) = native {
                        *field = native;
                    }
                } else {
                    dates_to_native(field)?;
                }
            }
        }
        Value::Array(values) => {
            for v in values {
                dates_to_native(v)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn dates_to_source(value: &mut Value) -> Result<()> {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if DATE_FIELDS.contains(&key.as_str()) {
                    let source = match &*field {
                        Value::Number(n) => {
                            let secs = n.as_i64().ok_or_else(|| {
                                MetricsError::InvalidDate(format!("'{key}' is not whole seconds: {n}"))
                            })?;
                            Some(Value::String(format_source_date(&from_epoch_seconds(secs)?)))
                        }
                        Value::String(s) if s.as_str() == NONE_SENTINEL => {
                            warn!("cached field '{key}' holds the string \"None\", reading it as null");
                            Some(Value::Null)
                        }
                        _ => None,
                    };
                    if let Some(source) = source {
                        *field = source;
                    }
                } else {
                    dates_to_source(field)?;
                }
            }
        }
        Value::Array(values) => {
            for v in values {
                dates_to_source(v)?;
            }
        }
        _ => {}
    }
    Ok(())
}
