use crate::model::{
    CommitCounts, CommitInfo, HeatBucket, HistoryItem, HistoryMap, IssueCounts, ItemState,
    PullRequestCounts,
};
use crate::util::week_spans;
use chrono::{DateTime, Utc};

pub const BUCKET_DATE_FORMAT: &str = "%Y-%m-%d-%H";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PullRequestAction {
    Created,
    Closed,
    Merged,
}

/// Open for the whole window: opened before it started and not closed until after it ended.
pub fn issue_is_open_in_week(item: &HistoryItem, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    if item.created_at() >= start {
        return false;
    }
    match item.state() {
        ItemState::Open => true,
        ItemState::Closed => item.closed_at().is_some_and(|closed| closed > end),
    }
}

pub fn pull_request_is_modified_in_week(
    item: &HistoryItem,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    action: PullRequestAction,
) -> bool {
    let HistoryItem::PullRequest(pr) = item else {
        return false;
    };
    let when = match action {
        PullRequestAction::Created => Some(pr.created_at),
        PullRequestAction::Closed => pr.closed_at,
        PullRequestAction::Merged => pr.merged_at,
    };
    when.is_some_and(|ts| start < ts && ts < end)
}

pub fn commit_is_in_week(commit: &CommitInfo, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    start < commit.timestamp && commit.timestamp < end
}

/// One bucket per week in `[start, end)`, newest first. Week numbers count
/// down from the oldest bucket to 1.
pub fn compute_heat(
    issues: &HistoryMap,
    pull_requests: &HistoryMap,
    commits: &[CommitInfo],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<HeatBucket> {
    let spans: Vec<_> = week_spans(start, end).collect();
    let num_weeks = spans.len() as u32;

    let mut buckets: Vec<HeatBucket> = spans
        .into_iter()
        .enumerate()
        .map(|(index, (week_start, week_end))| {
            let issue_open = issues
                .values()
                .filter(|issue| issue_is_open_in_week(issue, week_start, week_end))
                .count();

            let count_prs = |action| {
                pull_requests
                    .values()
                    .filter(|pr| pull_request_is_modified_in_week(pr, week_start, week_end, action))
                    .count() as u32
            };

            let commits_created = commits
                .iter()
                .filter(|c| commit_is_in_week(c, week_start, week_end))
                .count();

            HeatBucket {
                week: num_weeks - index as u32,
                start: week_start.format(BUCKET_DATE_FORMAT).to_string(),
                end: week_end.format(BUCKET_DATE_FORMAT).to_string(),
                issues: IssueCounts { open: issue_open as u32 },
                pull_requests: PullRequestCounts {
                    created: count_prs(PullRequestAction::Created),
                    merged: count_prs(PullRequestAction::Merged),
                    closed: count_prs(PullRequestAction::Closed),
                },
                commits: CommitCounts { created: commits_created as u32 },
            }
        })
        .collect();

    buckets.reverse();
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ApproveState, Issue, PullRequest};
    use crate::util::parse_source_date;
    use chrono::Duration;

    fn ts(raw: &str) -> DateTime<Utc> {
        parse_source_date(raw).unwrap()
    }

    fn issue(created: &str, state: ItemState, closed: Option<&str>) -> HistoryItem {
        HistoryItem::Issue(Issue {
            number: "1".to_string(),
            user: "alice".to_string(),
            state,
            created_at: ts(created),
            updated_at: ts(created),
            closed_at: closed.map(ts),
            comments: Vec::new(),
        })
    }

    fn pull_request(created: &str, closed: Option<&str>, merged: Option<&str>) -> HistoryItem {
        HistoryItem::PullRequest(PullRequest {
            number: "2".to_string(),
            title: "change".to_string(),
            user: "alice".to_string(),
            state: if closed.is_some() { ItemState::Closed } else { ItemState::Open },
            created_at: ts(created),
            updated_at: ts(created),
            closed_at: closed.map(ts),
            submitted_at: None,
            merged: merged.is_some(),
            merged_at: merged.map(ts),
            comments_num: 0,
            approve_state: ApproveState::NotApprove,
            review_times: 0,
            reviewers: Vec::new(),
        })
    }

    #[test]
    fn issue_open_for_whole_week() {
        let (start, end) = (ts("2020-01-04T12:00:00Z"), ts("2020-01-12T12:00:00Z"));
        assert!(issue_is_open_in_week(
            &issue("2020-01-02T12:00:00Z", ItemState::Closed, Some("2020-01-15T12:00:00Z")),
            start,
            end
        ));
        assert!(issue_is_open_in_week(&issue("2020-01-02T12:00:00Z", ItemState::Open, None), start, end));
    }

    #[test]
    fn issue_not_open_for_whole_week() {
        let (start, end) = (ts("2020-01-04T12:00:00Z"), ts("2020-01-12T12:00:00Z"));
        assert!(!issue_is_open_in_week(
            &issue("2020-01-02T12:00:00Z", ItemState::Closed, Some("2020-01-10T12:00:00Z")),
            start,
            end
        ));
        assert!(!issue_is_open_in_week(&issue("2020-01-07T12:00:00Z", ItemState::Open, None), start, end));
        assert!(!issue_is_open_in_week(&issue("2020-01-02T12:00:00Z", ItemState::Closed, None), start, end));
    }

    #[test]
    fn pull_request_actions_inside_week() {
        let (start, end) = (ts("2020-01-04T12:00:00Z"), ts("2020-01-12T12:00:00Z"));
        let pr = pull_request("2020-01-05T12:00:00Z", Some("2020-01-13T12:00:00Z"), None);
        assert!(pull_request_is_modified_in_week(&pr, start, end, PullRequestAction::Created));
        assert!(!pull_request_is_modified_in_week(&pr, start, end, PullRequestAction::Closed));
        assert!(!pull_request_is_modified_in_week(&pr, start, end, PullRequestAction::Merged));

        // boundaries are exclusive
        let pr = pull_request("2020-01-04T12:00:00Z", None, None);
        assert!(!pull_request_is_modified_in_week(&pr, start, end, PullRequestAction::Created));
    }

    #[test]
    fn buckets_are_newest_first() {
        let end = ts("2020-03-01T00:00:00Z");
        let start = end - Duration::weeks(3);

        let mut issues = HistoryMap::new();
        issues.insert("1".to_string(), issue("2020-01-01T00:00:00Z", ItemState::Open, None));
        let mut prs = HistoryMap::new();
        prs.insert(
            "2".to_string(),
            pull_request("2020-02-10T00:00:00Z", Some("2020-02-25T00:00:00Z"), Some("2020-02-25T00:00:00Z")),
        );
        let commits = vec![CommitInfo {
            id: "abc".to_string(),
            author_name: "alice".to_string(),
            author_email: "alice@example.com".to_string(),
            timestamp: ts("2020-02-26T00:00:00Z"),
        }];

        let buckets = compute_heat(&issues, &prs, &commits, start, end);
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets.iter().map(|b| b.week).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(buckets[0].start, "2020-02-23-00");
        assert_eq!(buckets[0].end, "2020-03-01-00");
        assert!(buckets.iter().all(|b| b.issues.open == 1));

        assert_eq!(buckets[0].pull_requests.merged, 1);
        assert_eq!(buckets[0].pull_requests.closed, 1);
        assert_eq!(buckets[0].commits.created, 1);
        assert_eq!(buckets[2].pull_requests.created, 1);
        assert_eq!(buckets[1].pull_requests, PullRequestCounts::default());
    }
}
