use crate::cli::CommonArgs;
use crate::config::Config;
use crate::git::GitRepo;
use crate::model::{Release, ReleasesOutput, SCHEMA_VERSION};
use anyhow::Context;
use chrono::Utc;
use console::style;
use tracing::info;

pub fn exec(common: CommonArgs, max_releases: usize, json: bool) -> anyhow::Result<()> {
    let repo = GitRepo::open(common.repo.as_ref()).context("Failed to open git repository")?;

    let releases = repo.releases().context("Failed to list repository tags")?;
    info!("There were {} tags found in the repository", releases.len());

    // sampling needs neither the item source nor the cache
    let config = Config::new((), ())
        .with_lookback_weeks(common.lookback_weeks)
        .with_max_sample_count(max_releases);
    let sampled = config
        .sample_releases(&releases)
        .context("Failed to sample releases")?;
    info!("number of tags reduced to: {}", sampled.len());

    if json {
        let output = ReleasesOutput {
            version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            repository_path: repo.path().to_string_lossy().to_string(),
            num_tags: releases.len(),
            latest_tag: releases.last().map(|r| r.name.clone()),
            max_releases: config.max_sample_count,
            sampled,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        output_table(&releases, &sampled);
    }

    Ok(())
}

fn output_table(releases: &[Release], sampled: &[Release]) {
    println!("{:<40} {:>20}", style("Tag").bold(), style("Committed").bold());
    println!("{}", "─".repeat(61));
    for release in sampled {
        println!(
            "{:<40} {:>20}",
            release.name,
            style(release.committed_at.format("%Y-%m-%d %H:%M")).dim()
        );
    }
    println!(
        "\n{} of {} tags selected",
        style(sampled.len()).cyan(),
        style(releases.len()).cyan()
    );
}
