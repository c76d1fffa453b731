use crate::error::{MetricsError, Result};
use crate::model::{ItemCategory, SCHEMA_VERSION};
use crate::util::from_epoch_seconds;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;

/// Lookup for one repository's items of one category.
#[derive(Debug, Clone)]
pub struct ItemFilter {
    pub repo_id: String,
    pub category: ItemCategory,
    /// Strict lower bound on `updated_at`.
    pub updated_after: DateTime<Utc>,
}

/// A stored document. Date fields inside `document` are epoch seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedItem {
    pub repo_id: String,
    pub category: ItemCategory,
    pub item_id: String,
    pub updated_at: DateTime<Utc>,
    pub document: serde_json::Value,
}

pub trait CacheStore {
    /// The outer error means the store could not be queried. Each row carries
    /// its own decode result so one damaged entry does not hide the others.
    fn find_items(&self, filter: &ItemFilter) -> Result<Vec<Result<CachedItem>>>;

    /// Inserts or replaces every item keyed by `(repo_id, category, item_id)`.
    /// Either all items are written or none are.
    fn upsert_items(&mut self, items: &[CachedItem]) -> Result<()>;
}

impl<T: CacheStore + ?Sized> CacheStore for &mut T {
    fn find_items(&self, filter: &ItemFilter) -> Result<Vec<Result<CachedItem>>> {
        (**self).find_items(filter)
    }

    fn upsert_items(&mut self, items: &[CachedItem]) -> Result<()> {
        (**self).upsert_items(items)
    }
}

pub struct Cache {
    conn: Connection,
}

impl Cache {
    pub fn new<CP: AsRef<Path>, BP: AsRef<Path>>(cache_path: Option<CP>, base_path: BP) -> Result<Self> {
        let cache_dir = match cache_path {
            Some(path) => path.as_ref().to_path_buf(),
            None => base_path.as_ref().join(".repometrics"),
        };
        std::fs::create_dir_all(&cache_dir)?;
        let db_path = cache_dir.join("cache.db");
        let conn = Connection::open(&db_path)?;
        let mut cache = Self { conn };
        cache.initialize()?;
        Ok(cache)
    }

    pub fn in_memory() -> Result<Self> {
        let mut cache = Self { conn: Connection::open_in_memory()? };
        cache.initialize()?;
        Ok(cache)
    }

    fn initialize(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS history_items (
                repo_id TEXT NOT NULL,
                category TEXT NOT NULL,
                item_id TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                document TEXT NOT NULL,
                PRIMARY KEY (repo_id, category, item_id)
            );
            CREATE INDEX IF NOT EXISTS idx_history_items_updated
                ON history_items(repo_id, category, updated_at);
            ",
        )?;
        self.check_schema_version()?;
        Ok(())
    }

    fn check_schema_version(&mut self) -> Result<()> {
        let user_version: i64 = self
            .conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))?;

        if user_version == 0 {
            let set_stmt = format!("PRAGMA user_version = {SCHEMA_VERSION};");
            self.conn.execute_batch(&set_stmt)?;
        } else if user_version != SCHEMA_VERSION as i64 {
            return Err(MetricsError::Cache(format!(
                "Schema version mismatch: expected {}, found {}",
                SCHEMA_VERSION, user_version
            )));
        }

        Ok(())
    }

    pub fn count_items(&self, repo_id: &str, category: ItemCategory) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM history_items WHERE repo_id = ? AND category = ?",
            params![repo_id, category.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

impl CacheStore for Cache {
    fn find_items(&self, filter: &ItemFilter) -> Result<Vec<Result<CachedItem>>> {
        let mut stmt = self.conn.prepare(
            "SELECT item_id, updated_at, document
             FROM history_items
             WHERE repo_id = ? AND category = ? AND updated_at > ?
             ORDER BY updated_at",
        )?;
        let rows = stmt.query_map(
            params![
                filter.repo_id,
                filter.category.as_str(),
                filter.updated_after.timestamp()
            ],
            |row| {
                let item_id: String = row.get(0)?;
                let updated_at: i64 = row.get(1)?;
                let document: String = row.get(2)?;
                Ok((item_id, updated_at, document))
            },
        )?;

        let mut items = Vec::new();
        for row in rows {
            let (item_id, updated_at, document) = row?;
            items.push(decode_row(filter, item_id, updated_at, &document));
        }
        Ok(items)
    }

    fn upsert_items(&mut self, items: &[CachedItem]) -> Result<()> {
        let tx = self.conn.transaction()?;

        let mut upsert_stmt = tx.prepare(
            "INSERT INTO history_items (repo_id, category, item_id, updated_at, document)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(repo_id, category, item_id)
             DO UPDATE SET updated_at = excluded.updated_at, document = excluded.document",
        )?;

        for item in items {
            upsert_stmt.execute(params![
                item.repo_id,
                item.category.as_str(),
                item.item_id,
                item.updated_at.timestamp(),
                serde_json::to_string(&item.document)?
            ])?;
        }

        drop(upsert_stmt);

        tx.commit()?;
        Ok(())
    }
}

fn decode_row(filter: &ItemFilter, item_id: String, updated_at: i64, document: &str) -> Result<CachedItem> {
    let damaged = |e: MetricsError| {
        MetricsError::MalformedItem(format!("cached {} #{item_id}: {e}", filter.category))
    };
    let updated_at = from_epoch_seconds(updated_at).map_err(damaged)?;
    let document = serde_json::from_str(document).map_err(|e| damaged(e.into()))?;
    Ok(CachedItem {
        repo_id: filter.repo_id.clone(),
        category: filter.category,
        item_id,
        updated_at,
        document,
    })
}
