use crate::cli::CommonArgs;
use crate::git::GitRepo;
use crate::model::{
    AuthorRanking, AuthorTally, CommitInfo, CommitsOutput, CommitsPerAuthor, MonthActivity,
    SCHEMA_VERSION,
};
use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use console::style;
use std::collections::{BTreeMap, HashMap, HashSet};

pub const MAX_AUTHORS: usize = 25;

pub fn exec(common: CommonArgs, json: bool) -> anyhow::Result<()> {
    let repo = GitRepo::open(common.repo.as_ref()).context("Failed to open git repository")?;
    let commits = repo
        .collect_commits()
        .context("Failed to collect commits from repository")?;

    let per_author = commits_per_author(&commits, Utc::now());
    let per_month = commits_per_month(&commits);

    if json {
        let output = CommitsOutput {
            version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            repository_path: repo.path().to_string_lossy().to_string(),
            commits_per_author: per_author,
            commits_per_month: per_month,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        output_table(&per_author, &per_month);
    }

    Ok(())
}

pub fn commits_per_author(commits: &[CommitInfo], now: DateTime<Utc>) -> CommitsPerAuthor {
    let recent_cutoff = now - Duration::days(30);
    let mut tallies: HashMap<&str, AuthorTally> = HashMap::new();
    let mut all_time_total = 0;
    let mut recent_total = 0;

    for commit in commits {
        let tally = tallies
            .entry(commit.author_name.as_str())
            .or_insert_with(|| AuthorTally {
                name: commit.author_name.clone(),
                all_time: 0,
                last_30_days: 0,
            });
        tally.all_time += 1;
        all_time_total += 1;
        if commit.timestamp > recent_cutoff {
            tally.last_30_days += 1;
            recent_total += 1;
        }
    }

    let ranked = |key: fn(&AuthorTally) -> u32| {
        let mut list: Vec<AuthorTally> = tallies.values().cloned().collect();
        list.sort_by(|a, b| key(b).cmp(&key(a)).then_with(|| a.name.cmp(&b.name)));
        list.truncate(MAX_AUTHORS);
        list
    };

    CommitsPerAuthor {
        all_time: AuthorRanking { top_25: ranked(|t| t.all_time), total: all_time_total },
        last_30_days: AuthorRanking { top_25: ranked(|t| t.last_30_days), total: recent_total },
    }
}

pub fn commits_per_month(commits: &[CommitInfo]) -> Vec<MonthActivity> {
    let mut months: BTreeMap<String, (u32, HashSet<&str>)> = BTreeMap::new();
    for commit in commits {
        let entry = months
            .entry(commit.timestamp.format("%Y-%m").to_string())
            .or_default();
        entry.0 += 1;
        entry.1.insert(commit.author_name.as_str());
    }

    months
        .into_iter()
        .rev()
        .map(|(month, (commits, contributors))| MonthActivity {
            month,
            commits,
            contributor_count: contributors.len() as u32,
        })
        .collect()
}

fn output_table(per_author: &CommitsPerAuthor, per_month: &[MonthActivity]) {
    println!(
        "{:<40} {:>10} {:>14}",
        style("Author").bold(),
        style("Commits").bold(),
        style("Last 30 days").bold()
    );
    println!("{}", "─".repeat(66));
    for tally in &per_author.all_time.top_25 {
        println!("{:<40} {:>10} {:>14}", tally.name, tally.all_time, tally.last_30_days);
    }
    println!(
        "\nTotal commits: {}, last 30 days: {}",
        style(per_author.all_time.total).cyan(),
        style(per_author.last_30_days.total).cyan()
    );

    println!("\n{:<10} {:>8} {:>14}", style("Month").bold(), style("Commits").bold(), style("Contributors").bold());
    println!("{}", "─".repeat(34));
    for month in per_month.iter().take(24) {
        println!("{:<10} {:>8} {:>14}", month.month, month.commits, month.contributor_count);
    }
    if per_month.len() > 24 {
        println!("\n... and {} earlier months", per_month.len() - 24);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn commit(id: &str, author: &str, ts: DateTime<Utc>) -> CommitInfo {
        CommitInfo {
            id: id.to_string(),
            author_name: author.to_string(),
            author_email: format!("{author}@example.com"),
            timestamp: ts,
        }
    }

    #[test]
    fn tallies_authors_all_time_and_recent() {
        let now = Utc.with_ymd_and_hms(2021, 6, 30, 0, 0, 0).unwrap();
        let commits = vec![
            commit("1", "alice", now - Duration::days(100)),
            commit("2", "alice", now - Duration::days(90)),
            commit("3", "bob", now - Duration::days(2)),
            commit("4", "alice", now - Duration::days(1)),
            commit("5", "carol", now - Duration::days(200)),
        ];

        let tallies = commits_per_author(&commits, now);
        assert_eq!(tallies.all_time.total, 5);
        assert_eq!(tallies.last_30_days.total, 2);
        let names: Vec<_> = tallies.all_time.top_25.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);
        assert_eq!(tallies.all_time.top_25[0].all_time, 3);
        assert_eq!(tallies.all_time.top_25[0].last_30_days, 1);
        let recent: Vec<_> = tallies.last_30_days.top_25.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(recent, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn limits_ranking_to_top_authors() {
        let now = Utc.with_ymd_and_hms(2021, 6, 30, 0, 0, 0).unwrap();
        let commits: Vec<_> = (0..40)
            .map(|i| commit(&i.to_string(), &format!("author{i:02}"), now))
            .collect();
        let tallies = commits_per_author(&commits, now);
        assert_eq!(tallies.all_time.top_25.len(), MAX_AUTHORS);
        assert_eq!(tallies.all_time.total, 40);
    }

    #[test]
    fn groups_commits_by_month_newest_first() {
        let commits = vec![
            commit("1", "alice", Utc.with_ymd_and_hms(2021, 5, 3, 0, 0, 0).unwrap()),
            commit("2", "bob", Utc.with_ymd_and_hms(2021, 5, 20, 0, 0, 0).unwrap()),
            commit("3", "alice", Utc.with_ymd_and_hms(2021, 5, 21, 0, 0, 0).unwrap()),
            commit("4", "alice", Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap()),
        ];
        assert_eq!(
            commits_per_month(&commits),
            vec![
                MonthActivity { month: "2021-06".to_string(), commits: 1, contributor_count: 1 },
                MonthActivity { month: "2021-05".to_string(), commits: 3, contributor_count: 2 },
            ]
        );
    }
}
