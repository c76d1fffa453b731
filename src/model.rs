use crate::error::{MetricsError, Result};
use crate::util::{is_valid_slug, source_date, source_date_opt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self { owner: owner.into(), name: name.into() }
    }

    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoId {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self> {
        if !is_valid_slug(s) {
            return Err(MetricsError::InvalidRepository(format!(
                "'{s}' is not of the form owner/name"
            )));
        }
        let (owner, name) = s
            .split_once('/')
            .ok_or_else(|| MetricsError::InvalidRepository(s.to_string()))?;
        Ok(Self::new(owner, name))
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub name: String,
    pub committed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitInfo {
    pub id: String,
    pub author_name: String,
    pub author_email: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Issue,
    PullRequest,
}

impl ItemCategory {
    pub const ALL: [ItemCategory; 2] = [ItemCategory::Issue, ItemCategory::PullRequest];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemCategory::Issue => "issue",
            ItemCategory::PullRequest => "pull_request",
        }
    }
}

impl FromStr for ItemCategory {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "issue" => Ok(ItemCategory::Issue),
            "pull_request" => Ok(ItemCategory::PullRequest),
            other => Err(MetricsError::InvalidArgument(format!("Unknown category '{other}'"))),
        }
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApproveState {
    #[serde(rename = "approve")]
    Approve,
    #[serde(rename = "not approve")]
    NotApprove,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub user: String,
    #[serde(with = "source_date")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub number: String,
    pub user: String,
    pub state: ItemState,
    #[serde(with = "source_date")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "source_date")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, with = "source_date_opt")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: String,
    pub title: String,
    pub user: String,
    pub state: ItemState,
    #[serde(with = "source_date")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "source_date")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, with = "source_date_opt")]
    pub closed_at: Option<DateTime<Utc>>,
    /// First review submitted by someone other than the author.
    #[serde(default, with = "source_date_opt")]
    pub submitted_at: Option<DateTime<Utc>>,
    pub merged: bool,
    #[serde(default, with = "source_date_opt")]
    pub merged_at: Option<DateTime<Utc>>,
    pub comments_num: u64,
    pub approve_state: ApproveState,
    pub review_times: u64,
    #[serde(default)]
    pub reviewers: Vec<String>,
}

/// One issue or pull request, tagged by category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum HistoryItem {
    Issue(Issue),
    PullRequest(PullRequest),
}

impl HistoryItem {
    pub fn category(&self) -> ItemCategory {
        match self {
            HistoryItem::Issue(_) => ItemCategory::Issue,
            HistoryItem::PullRequest(_) => ItemCategory::PullRequest,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            HistoryItem::Issue(issue) => &issue.number,
            HistoryItem::PullRequest(pr) => &pr.number,
        }
    }

    pub fn state(&self) -> ItemState {
        match self {
            HistoryItem::Issue(issue) => issue.state,
            HistoryItem::PullRequest(pr) => pr.state,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            HistoryItem::Issue(issue) => issue.created_at,
            HistoryItem::PullRequest(pr) => pr.created_at,
        }
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        match self {
            HistoryItem::Issue(issue) => issue.updated_at,
            HistoryItem::PullRequest(pr) => pr.updated_at,
        }
    }

    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        match self {
            HistoryItem::Issue(issue) => issue.closed_at,
            HistoryItem::PullRequest(pr) => pr.closed_at,
        }
    }
}

/// Items of one category keyed by identifier.
pub type HistoryMap = BTreeMap<String, HistoryItem>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCounts {
    pub open: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestCounts {
    pub created: u32,
    pub merged: u32,
    pub closed: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitCounts {
    pub created: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatBucket {
    pub week: u32,
    pub start: String,
    pub end: String,
    pub issues: IssueCounts,
    pub pull_requests: PullRequestCounts,
    pub commits: CommitCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository: String,
    pub lookback_weeks: u32,
    pub buckets: Vec<HeatBucket>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleasesOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository_path: String,
    pub num_tags: usize,
    pub latest_tag: Option<String>,
    pub max_releases: usize,
    pub sampled: Vec<Release>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository: String,
    pub issues: Option<HistoryMap>,
    pub pull_requests: Option<HistoryMap>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorTally {
    pub name: String,
    pub all_time: u32,
    pub last_30_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRanking {
    pub top_25: Vec<AuthorTally>,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitsPerAuthor {
    pub all_time: AuthorRanking,
    pub last_30_days: AuthorRanking,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthActivity {
    pub month: String,
    pub commits: u32,
    pub contributor_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitsOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository_path: String,
    pub commits_per_author: CommitsPerAuthor,
    pub commits_per_month: Vec<MonthActivity>,
}
