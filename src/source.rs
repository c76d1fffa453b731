use crate::error::{MetricsError, Result};
use crate::model::{ItemCategory, RepoId};
use crate::util::parse_source_date;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

pub type RawItems<'a> = Box<dyn Iterator<Item = Result<Value>> + 'a>;

/// Paginated, rate-limited issue/pull-request feed.
///
/// Implementations own authentication, pagination and rate-limit backoff. A call
/// may block for a long time but must not fail merely because the API asked
/// the client to wait. Each yielded value is the raw `data` payload of one item.
pub trait ItemSource {
    fn fetch(
        &self,
        repo: &RepoId,
        category: ItemCategory,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<RawItems<'_>>;
}

impl<T: ItemSource + ?Sized> ItemSource for &T {
    fn fetch(
        &self,
        repo: &RepoId,
        category: ItemCategory,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<RawItems<'_>> {
        (**self).fetch(repo, category, from, to)
    }
}

/// Replays a captured Perceval GitHub run: one `{"category": .., "data": {..}}`
/// object per line.
pub struct DumpSource {
    path: PathBuf,
}

impl DumpSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(MetricsError::InvalidArgument(format!(
                "Dump file not found: {}",
                path.display()
            )));
        }
        Ok(Self { path })
    }
}

impl ItemSource for DumpSource {
    fn fetch(
        &self,
        repo: &RepoId,
        category: ItemCategory,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<RawItems<'_>> {
        debug!(
            "replaying {} for {repo} ({category}, {from} .. {to})",
            self.path.display()
        );
        let reader = BufReader::new(File::open(&self.path)?);
        let items = reader
            .lines()
            .enumerate()
            .filter_map(move |(index, line)| {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => return Some(Err(MetricsError::from(e))),
                };
                if line.trim().is_empty() {
                    return None;
                }
                match parse_envelope(&line, index + 1) {
                    Ok((tag, data)) if tag == category.as_str() => {
                        match in_window(&data, from, to) {
                            Ok(true) => Some(Ok(data)),
                            Ok(false) => None,
                            Err(e) => Some(Err(e)),
                        }
                    }
                    Ok(_) => None,
                    Err(e) => Some(Err(e)),
                }
            });
        Ok(Box::new(items))
    }
}

fn parse_envelope(line: &str, line_no: usize) -> Result<(String, Value)> {
    let mut envelope: Value = serde_json::from_str(line)
        .map_err(|e| MetricsError::MalformedItem(format!("line {line_no}: {e}")))?;
    let tag = envelope
        .get("category")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| MetricsError::MalformedItem(format!("line {line_no}: missing category")))?;
    let data = envelope
        .get_mut("data")
        .map(Value::take)
        .filter(Value::is_object)
        .ok_or_else(|| MetricsError::MalformedItem(format!("line {line_no}: missing data")))?;
    Ok((tag, data))
}

fn in_window(data: &Value, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<bool> {
    let raw = data
        .get("updated_at")
        .and_then(Value::as_str)
        .ok_or_else(|| MetricsError::MalformedItem("missing updated_at".to_string()))?;
    let updated_at =
        parse_source_date(raw).map_err(|e| MetricsError::MalformedItem(e.to_string()))?;
    Ok(from <= updated_at && updated_at <= to)
}
