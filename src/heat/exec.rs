use super::{compute_heat, output_heatmap, output_json, output_ndjson};
use crate::cli::{CommonArgs, FeedArgs};
use crate::git::GitRepo;
use crate::history::collect_categories;
use crate::history::exec::open_fetcher;
use crate::model::ItemCategory;
use crate::util::lookback_start;
use anyhow::Context;
use chrono::Utc;
use tracing::info;

pub fn exec(common: CommonArgs, feed: FeedArgs, json: bool, ndjson: bool) -> anyhow::Result<()> {
    let repo = GitRepo::open(common.repo.as_ref()).context("Failed to open git repository")?;
    let (repo_id, mut fetcher) = open_fetcher(&common, &feed)?;

    let mut history = collect_categories(&mut fetcher, &repo_id, &ItemCategory::ALL)?;
    let issues = history.remove(&ItemCategory::Issue).unwrap_or_default();
    let pull_requests = history.remove(&ItemCategory::PullRequest).unwrap_or_default();

    let commits = repo
        .collect_commits()
        .context("Failed to collect commits from repository")?;

    let end = Utc::now();
    let start = lookback_start(end, common.lookback_weeks)?;
    info!(
        "{repo_id}: building heat map from {} issues, {} pull requests, {} commits",
        issues.len(),
        pull_requests.len(),
        commits.len()
    );
    let heat_data = compute_heat(&issues, &pull_requests, &commits, start, end);

    if json {
        output_json(&heat_data, &repo_id, common.lookback_weeks)?;
    } else if ndjson {
        output_ndjson(&heat_data)?;
    } else {
        output_heatmap(&heat_data, &repo_id)?;
    }

    Ok(())
}
