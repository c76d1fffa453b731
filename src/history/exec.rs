use super::fetch::HistoryFetcher;
use crate::cache::{Cache, CacheStore};
use crate::cli::{CategoryArg, CommonArgs, FeedArgs};
use crate::config::Config;
use crate::model::{HistoryMap, HistoryOutput, ItemCategory, ItemState, RepoId, SCHEMA_VERSION};
use crate::source::{DumpSource, ItemSource};
use anyhow::Context;
use chrono::Utc;
use console::style;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

pub fn open_cache(common: &CommonArgs) -> anyhow::Result<Cache> {
    let base = match &common.repo {
        Some(path) => path.clone(),
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    Cache::new(common.cache.as_ref(), &base).context("Failed to initialize cache")
}

pub fn open_fetcher(common: &CommonArgs, feed: &FeedArgs) -> anyhow::Result<(RepoId, HistoryFetcher<DumpSource, Cache>)> {
    let repo: RepoId = feed.slug.parse().context("Invalid repository")?;
    let source = DumpSource::open(&feed.dump).context("Failed to open dump")?;
    let cache = open_cache(common)?;
    let config = Config::new(source, cache).with_lookback_weeks(common.lookback_weeks);
    let fetcher = HistoryFetcher::new(config).context("Invalid configuration")?;
    Ok((repo, fetcher))
}

/// Collects and persists each category. A failed write keeps the merged view.
pub fn collect_categories<S: ItemSource, C: CacheStore>(
    fetcher: &mut HistoryFetcher<S, C>,
    repo: &RepoId,
    categories: &[ItemCategory],
) -> anyhow::Result<BTreeMap<ItemCategory, HistoryMap>> {
    let mut out = BTreeMap::new();
    for &category in categories {
        let collected = fetcher
            .collect(repo, category)
            .with_context(|| format!("Failed to fetch {category} history for {repo}"))?;
        if let Err(e) = fetcher.persist(repo, &collected) {
            warn!("{repo}: {category} history not cached, continuing with fetched data: {e}");
        }
        out.insert(category, collected.items);
    }
    Ok(out)
}

pub fn exec(common: CommonArgs, feed: FeedArgs, category: CategoryArg, json: bool, ndjson: bool) -> anyhow::Result<()> {
    let (repo, mut fetcher) = open_fetcher(&common, &feed)?;
    let mut history = collect_categories(&mut fetcher, &repo, &category.categories())?;

    if json {
        let output = HistoryOutput {
            version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            repository: repo.slug(),
            issues: history.remove(&ItemCategory::Issue),
            pull_requests: history.remove(&ItemCategory::PullRequest),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if ndjson {
        for item in history.values().flat_map(|items| items.values()) {
            println!("{}", serde_json::to_string(item)?);
        }
    } else {
        output_summary(&repo, &feed.dump, &history);
    }

    Ok(())
}

fn output_summary(repo: &RepoId, dump: &Path, history: &BTreeMap<ItemCategory, HistoryMap>) {
    println!("{}", style(format!("History for {repo}")).bold());
    println!("{}", "─".repeat(50));
    println!("Source: {}", style(dump.display()).dim());

    for (category, items) in history {
        let open = items
            .values()
            .filter(|item| item.state() == ItemState::Open)
            .count();
        let newest = items.values().map(|item| item.updated_at()).max();
        println!(
            "{:<14} total: {:>6}  open: {:>6}  last update: {}",
            style(category).cyan(),
            items.len(),
            style(open).green(),
            newest
                .map(|ts| ts.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }

    println!("\nUse --json or --ndjson flags to export the raw data.");
}
