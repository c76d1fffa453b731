use crate::error::{MetricsError, Result};
use crate::model::{
    ApproveState, Comment, HistoryItem, Issue, ItemCategory, ItemState, PullRequest,
};
use crate::util::{source_date, source_date_opt};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Key GitHub attaches to issue-shaped records that describe a pull request.
pub const PULL_REQUEST_MARKER: &str = "pull_request";

#[derive(Deserialize)]
struct RawUser {
    login: String,
}

#[derive(Deserialize)]
struct RawComment {
    user: RawUser,
    #[serde(with = "source_date")]
    created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawIssue {
    number: u64,
    user: RawUser,
    state: ItemState,
    #[serde(with = "source_date")]
    created_at: DateTime<Utc>,
    #[serde(with = "source_date")]
    updated_at: DateTime<Utc>,
    #[serde(default, with = "source_date_opt")]
    closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    comments_data: Vec<RawComment>,
}

#[derive(Deserialize)]
struct RawReview {
    user_data: RawUser,
    #[serde(default, with = "source_date_opt")]
    submitted_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct RawPullRequest {
    number: u64,
    title: String,
    user: RawUser,
    state: ItemState,
    #[serde(with = "source_date")]
    created_at: DateTime<Utc>,
    #[serde(with = "source_date")]
    updated_at: DateTime<Utc>,
    #[serde(default, with = "source_date_opt")]
    closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    merged: bool,
    #[serde(default, with = "source_date_opt")]
    merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    comments: u64,
    #[serde(default)]
    review_comments: u64,
    #[serde(default)]
    reviews_data: Option<Vec<RawReview>>,
}

/// True when a record carries the pull-request marker and so does not belong
/// to either feed as a first-class item.
pub fn is_misrouted(raw: &Value) -> bool {
    raw.get(PULL_REQUEST_MARKER).is_some()
}

pub fn extract_item(category: ItemCategory, raw: &Value) -> Result<HistoryItem> {
    match category {
        ItemCategory::Issue => extract_issue(raw).map(HistoryItem::Issue),
        ItemCategory::PullRequest => extract_pull_request(raw).map(HistoryItem::PullRequest),
    }
}

fn malformed(category: ItemCategory, raw: &Value, err: serde_json::Error) -> MetricsError {
    let number = raw
        .get("number")
        .map(Value::to_string)
        .unwrap_or_else(|| "?".to_string());
    MetricsError::MalformedItem(format!("{category} #{number}: {err}"))
}

pub fn extract_issue(raw: &Value) -> Result<Issue> {
    let issue = RawIssue::deserialize(raw).map_err(|e| malformed(ItemCategory::Issue, raw, e))?;

    Ok(Issue {
        number: issue.number.to_string(),
        user: issue.user.login,
        state: issue.state,
        created_at: issue.created_at,
        updated_at: issue.updated_at,
        closed_at: issue.closed_at,
        comments: issue
            .comments_data
            .into_iter()
            .map(|c| Comment { user: c.user.login, created_at: c.created_at })
            .collect(),
    })
}

pub fn extract_pull_request(raw: &Value) -> Result<PullRequest> {
    let pr = RawPullRequest::deserialize(raw)
        .map_err(|e| malformed(ItemCategory::PullRequest, raw, e))?;
    let reviews = pr.reviews_data.unwrap_or_default();

    let submitted_at = reviews
        .iter()
        .filter(|r| r.user_data.login != pr.user.login)
        .find_map(|r| r.submitted_at);
    let approve_state = if reviews.is_empty() {
        ApproveState::NotApprove
    } else {
        ApproveState::Approve
    };

    Ok(PullRequest {
        number: pr.number.to_string(),
        title: pr.title,
        state: pr.state,
        created_at: pr.created_at,
        updated_at: pr.updated_at,
        closed_at: pr.closed_at,
        submitted_at,
        merged: pr.merged,
        merged_at: pr.merged_at,
        comments_num: pr.comments,
        approve_state,
        review_times: pr.review_comments,
        reviewers: reviews.into_iter().map(|r| r.user_data.login).collect(),
        user: pr.user.login,
    })
}
