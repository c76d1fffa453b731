use crate::model::{HeatBucket, HeatOutput, RepoId, SCHEMA_VERSION};
use anyhow::Result;
use chrono::Utc;
use console::style;

pub fn output_json(heat_data: &[HeatBucket], repo: &RepoId, lookback_weeks: u32) -> Result<()> {
    let output = HeatOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        repository: repo.slug(),
        lookback_weeks,
        buckets: heat_data.to_vec(),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn output_ndjson(heat_data: &[HeatBucket]) -> Result<()> {
    for bucket in heat_data {
        println!("{}", serde_json::to_string(bucket)?);
    }
    Ok(())
}

fn intensity(value: u32, max: u32) -> u32 {
    ((value as f64 / max.max(1) as f64) * 5.0) as u32
}

pub fn output_heatmap(heat_data: &[HeatBucket], repo: &RepoId) -> Result<()> {
    if heat_data.is_empty() {
        println!("No data to display");
        return Ok(());
    }

    let max_commits = heat_data.iter().map(|b| b.commits.created).max().unwrap_or(1);
    let max_issues = heat_data.iter().map(|b| b.issues.open).max().unwrap_or(1);
    let max_prs = heat_data
        .iter()
        .map(|b| b.pull_requests.created + b.pull_requests.merged + b.pull_requests.closed)
        .max()
        .unwrap_or(1);

    println!("{}", style(format!("Activity Heatmap for {repo}")).bold());
    println!("{}", "─".repeat(50));

    for bucket in heat_data {
        let prs = &bucket.pull_requests;

        let commit_char = match intensity(bucket.commits.created, max_commits) {
            0 => " ",
            1 => "▁",
            2 => "▃",
            3 => "▅",
            4 => "▇",
            _ => "█",
        };

        let issue_char = match intensity(bucket.issues.open, max_issues) {
            0 => " ",
            1 => "░",
            2 => "▒",
            3 => "▓",
            _ => "█",
        };

        let pr_char = match intensity(prs.created + prs.merged + prs.closed, max_prs) {
            0 => " ",
            1 => "░",
            2 => "▒",
            3 => "▓",
            _ => "█",
        };

        println!(
            "{:>3} {} {} {} {} commits: {:>3}, open issues: {:>4}, PRs +{}/m{}/x{}",
            bucket.week,
            bucket.start,
            style(commit_char).green(),
            style(issue_char).red(),
            style(pr_char).blue(),
            bucket.commits.created,
            bucket.issues.open,
            prs.created,
            prs.merged,
            prs.closed
        );
    }

    println!("\n{}", style("Legend").bold());
    println!("  {} commits intensity", style("▁▃▅▇█").green());
    println!("  {} open issues intensity", style("░▒▓█").red());
    println!("  {} pull request activity (created/merged/closed)", style("░▒▓█").blue());

    Ok(())
}
