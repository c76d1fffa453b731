use super::document::{from_cached, to_cached};
use super::extract::{extract_item, is_misrouted};
use crate::cache::{CacheStore, ItemFilter};
use crate::config::Config;
use crate::error::{MetricsError, Result};
use crate::model::{HistoryMap, ItemCategory, RepoId};
use crate::source::ItemSource;
use crate::util::lookback_start;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Merged view of one category before it is written back to the cache.
#[derive(Debug, Clone)]
pub struct Collected {
    pub category: ItemCategory,
    pub items: HistoryMap,
    /// Identifiers observed in this run's fetch window.
    pub fresh: BTreeSet<String>,
    pub seeded: usize,
    pub skipped: usize,
    pub cutoff: DateTime<Utc>,
}

pub struct HistoryFetcher<S, C> {
    config: Config<S, C>,
    now: DateTime<Utc>,
}

impl<S: ItemSource, C: CacheStore> HistoryFetcher<S, C> {
    pub fn new(config: Config<S, C>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, now: Utc::now() })
    }

    /// Pins the run's clock.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn into_config(self) -> Config<S, C> {
        self.config
    }

    pub fn horizon(&self) -> Result<DateTime<Utc>> {
        lookback_start(self.now, self.config.lookback_weeks)
    }

    /// Seeds from the cache, then overlays everything the source reports as
    /// updated since the freshest cached item. Nothing is written.
    pub fn collect(&self, repo: &RepoId, category: ItemCategory) -> Result<Collected> {
        let horizon = self.horizon()?;
        let filter = ItemFilter {
            repo_id: repo.slug(),
            category,
            updated_after: horizon,
        };
        let cached = self
            .config
            .cache_client
            .find_items(&filter)
            .map_err(MetricsError::cache_unavailable)?;

        let mut items = HistoryMap::new();
        let mut skipped = 0;
        for entry in cached {
            match entry.and_then(from_cached) {
                Ok(item) => {
                    items.insert(item.id().to_string(), item);
                }
                Err(e) => {
                    warn!("{repo}: ignoring unreadable cache entry: {e}");
                    skipped += 1;
                }
            }
        }
        let seeded = items.len();

        let cutoff = items
            .values()
            .map(|item| item.updated_at())
            .max()
            .unwrap_or(horizon);
        info!("{repo}: {seeded} cached {category} items, fetching updates since {cutoff}");

        let mut fresh = BTreeSet::new();
        for raw in self.config.api_client.fetch(repo, category, cutoff, self.now)? {
            let raw = match raw {
                Ok(raw) => raw,
                Err(e) if e.is_malformed() => {
                    warn!("{repo}: skipping record: {e}");
                    skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };
            if is_misrouted(&raw) {
                debug!("{repo}: dropping {category} record carrying a pull_request marker");
                skipped += 1;
                continue;
            }
            match extract_item(category, &raw) {
                Ok(item) => {
                    let id = item.id().to_string();
                    items.insert(id.clone(), item);
                    fresh.insert(id);
                }
                Err(e) if e.is_malformed() => {
                    warn!("{repo}: skipping record: {e}");
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
        info!(
            "{repo}: {} fresh {category} items, {skipped} skipped, {} total",
            fresh.len(),
            items.len()
        );

        Ok(Collected { category, items, fresh, seeded, skipped, cutoff })
    }

    /// Upserts the freshly fetched items of `collected` in one batch.
    pub fn persist(&mut self, repo: &RepoId, collected: &Collected) -> Result<usize> {
        let documents = collected
            .fresh
            .iter()
            .filter_map(|id| collected.items.get(id))
            .map(|item| to_cached(repo, item))
            .collect::<Result<Vec<_>>>()?;

        if documents.is_empty() {
            return Ok(0);
        }

        self.config
            .cache_client
            .upsert_items(&documents)
            .map_err(MetricsError::cache_unavailable)?;
        debug!("{repo}: cached {} {} items", documents.len(), collected.category);
        Ok(documents.len())
    }

    pub fn fetch_history(&mut self, repo: &RepoId, category: ItemCategory) -> Result<HistoryMap> {
        let collected = self.collect(repo, category)?;
        self.persist(repo, &collected)?;
        Ok(collected.items)
    }
}
