use crate::accumulator::Accumulator;
use crate::dates::{is_on_date, DateRange};
use crate::error::{Result, SkipReason};
use crate::github::parser::{composite_key, extract_ticket_id, ticket_or_skip};
use crate::github::{
    login_of, CodeHost, Commit, IssueComment, PullRequest, Review, ReviewsByPullRequest,
    SearchItem, SearchQuery,
};
use tracing::{debug, info, instrument};

/// Reviewed pull requests keyed by `owner/repo/number`
pub type ReviewMap = Accumulator<ReviewsByPullRequest>;

/// Decide whether a search row joins the authored pull requests.
///
/// Returns the ticket key when admitted.
pub fn admit(item: &SearchItem, accumulated: &[PullRequest]) -> std::result::Result<String, SkipReason> {
    let ticket = ticket_or_skip(&item.title)?;
    if accumulated.iter().any(|pr| pr.id == item.id) {
        return Err(SkipReason::AlreadySeen { id: item.id });
    }
    Ok(ticket)
}

/// Collect the user's own pull requests created or updated in the range.
///
/// Pull requests without a ticket key in the title are skipped, as are
/// repeats across the two searches. Each kept pull request carries the
/// commits authored on the first day of the range.
#[instrument(skip(host, range), fields(from = %range.from, to = %range.to))]
pub async fn pull_requests_by_date(
    host: &dyn CodeHost,
    org: &str,
    user: &str,
    range: &DateRange,
) -> Result<Vec<PullRequest>> {
    let queries = [
        SearchQuery::created(org, user, range),
        SearchQuery::updated(org, user, range),
    ];
    let date = range.start_str();

    let mut pull_requests: Vec<PullRequest> = Vec::new();

    for query in &queries {
        let items = host.search_issues(query).await?;
        info!(query = query.class.name(), found = items.len(), "searched pull requests");

        for item in &items {
            let ticket = match admit(item, &pull_requests) {
                Ok(ticket) => ticket,
                Err(reason) => {
                    debug!(pr = item.number, title = %item.title, %reason, "skipping pull request");
                    continue;
                }
            };

            let mut pull_request = PullRequest::from_search_item(item, query.class, Some(ticket));
            pull_request.commits = fetch_commits(host, &pull_request, &date).await?;
            pull_requests.push(pull_request);
        }
    }

    Ok(pull_requests)
}

/// Commits of a pull request authored on `date`
pub async fn fetch_commits(host: &dyn CodeHost, pr: &PullRequest, date: &str) -> Result<Vec<Commit>> {
    let listed = host.list_pull_commits(&pr.owner, &pr.repo, pr.number).await?;
    debug!(pr = pr.number, repo = %pr.repo, found = listed.len(), "listed commits");

    let mut commits = Vec::new();
    for entry in listed {
        let detail = host.get_commit(&pr.owner, &pr.repo, &entry.sha).await?;
        let Some(commit) = Commit::from_detail(detail, entry.commit.message) else {
            debug!(pr = pr.number, sha = %entry.sha, "skipping commit without author");
            continue;
        };
        if is_on_date(&commit.timestamp, date)? {
            commits.push(commit);
        }
    }
    Ok(commits)
}

/// Reviews `user` submitted on `date`, each with its inline comments
pub async fn fetch_reviews(
    host: &dyn CodeHost,
    pr: &PullRequest,
    user: &str,
    date: &str,
) -> Result<Vec<Review>> {
    let summaries = host.list_reviews(&pr.owner, &pr.repo, pr.number).await?;

    let mut reviews = Vec::new();
    for summary in summaries {
        if login_of(&summary.user) != user {
            continue;
        }
        let submitted_on_date = match &summary.submitted_at {
            Some(at) => is_on_date(at, date)?,
            None => false,
        };
        if !submitted_on_date {
            continue;
        }

        let comments = host
            .list_review_comments(&pr.owner, &pr.repo, pr.number, summary.id)
            .await?;
        reviews.push(Review { summary, comments });
    }
    Ok(reviews)
}

/// Top-level comments `user` left on a pull request
pub async fn fetch_comments(host: &dyn CodeHost, pr: &PullRequest, user: &str) -> Result<Vec<IssueComment>> {
    let comments = host.list_issue_comments(&pr.owner, &pr.repo, pr.number).await?;
    Ok(comments
        .into_iter()
        .filter(|c| login_of(&c.user) == user)
        .collect())
}

/// Collect other people's pull requests the user reviewed or commented on.
///
/// Results for the same `owner/repo/number` are merged into one entry.
#[instrument(skip(host, range), fields(from = %range.from, to = %range.to))]
pub async fn reviewed_pull_requests(
    host: &dyn CodeHost,
    org: &str,
    user: &str,
    range: &DateRange,
) -> Result<ReviewMap> {
    let query = SearchQuery::reviewed(org, user, range);
    let date = range.start_str();

    let items = host.search_issues(&query).await?;
    info!(query = query.class.name(), found = items.len(), "searched pull requests");

    let mut reviews_by_pr = ReviewMap::new();

    for item in &items {
        let ticket = extract_ticket_id(&item.title);
        let pull_request = PullRequest::from_search_item(item, query.class, ticket);

        let key = match composite_key(&pull_request.owner, &pull_request.repo, pull_request.number) {
            Ok(key) => key,
            Err(reason) => {
                debug!(pr = item.number, url = %item.repository_url, %reason, "skipping pull request");
                continue;
            }
        };

        let comments = fetch_comments(host, &pull_request, user).await?;
        let reviews = fetch_reviews(host, &pull_request, user, &date).await?;

        let entry = ReviewsByPullRequest {
            pull_request,
            reviews,
            comments,
        };
        reviews_by_pr.upsert(key, entry, ReviewsByPullRequest::merge);
    }

    Ok(reviews_by_pr)
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use crate::error::PerfError;
    use crate::github::{
        CommitData, CommitDetail, GitAuthor, PullCommit, ReviewComment, ReviewSummary,
    };
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// In-memory code host keyed by pull request number
    #[derive(Default)]
    pub struct FakeHost {
        pub searches: HashMap<String, Vec<SearchItem>>,
        pub commits: HashMap<u64, Vec<(String, String)>>,
        pub reviews: HashMap<u64, Vec<ReviewSummary>>,
        pub review_comments: HashMap<u64, Vec<ReviewComment>>,
        pub issue_comments: HashMap<u64, Vec<IssueComment>>,
        /// Calls (as recorded in `calls`) that return an API error
        pub failures: HashSet<String>,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeHost {
        /// Register a commit by sha with its author timestamp
        pub fn with_commit(mut self, number: u64, sha: &str, date: &str) -> Self {
            self.commits
                .entry(number)
                .or_default()
                .push((sha.to_string(), date.to_string()));
            self
        }

        /// Make a recorded call fail, e.g. `"reviews 5"` or `"commit abc"`
        pub fn failing(mut self, call: &str) -> Self {
            self.failures.insert(call.to_string());
            self
        }

        fn record(&self, call: String) -> Result<()> {
            let failed = self.failures.contains(&call);
            self.calls.lock().unwrap().push(call.clone());
            if failed {
                return Err(PerfError::github_api(format!("[500] {} failed", call)));
            }
            Ok(())
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CodeHost for FakeHost {
        async fn search_issues(&self, query: &SearchQuery) -> Result<Vec<SearchItem>> {
            self.record(format!("search {}", query.class.name()))?;
            Ok(self
                .searches
                .get(query.class.name())
                .cloned()
                .unwrap_or_default())
        }

        async fn list_pull_commits(&self, _owner: &str, _repo: &str, number: u64) -> Result<Vec<PullCommit>> {
            self.record(format!("commits {}", number))?;
            Ok(self
                .commits
                .get(&number)
                .map(|list| {
                    list.iter()
                        .map(|(sha, _)| PullCommit {
                            sha: sha.clone(),
                            commit: CommitData {
                                message: format!("message {}", sha),
                                author: None,
                            },
                        })
                        .collect()
                })
                .unwrap_or_default())
        }

        async fn get_commit(&self, _owner: &str, _repo: &str, sha: &str) -> Result<CommitDetail> {
            self.record(format!("commit {}", sha))?;
            let date = self
                .commits
                .values()
                .flatten()
                .find(|(s, _)| s == sha)
                .map(|(_, d)| d.clone())
                .ok_or_else(|| PerfError::github_api(format!("unknown commit {}", sha)))?;
            Ok(CommitDetail {
                sha: sha.to_string(),
                commit: CommitData {
                    message: String::new(),
                    // an empty date registers a commit with no author block
                    author: (!date.is_empty()).then(|| GitAuthor {
                        name: "Octo Cat".to_string(),
                        date: date.parse().unwrap(),
                    }),
                },
                files: vec![],
            })
        }

        async fn list_reviews(&self, _owner: &str, _repo: &str, number: u64) -> Result<Vec<ReviewSummary>> {
            self.record(format!("reviews {}", number))?;
            Ok(self.reviews.get(&number).cloned().unwrap_or_default())
        }

        async fn list_review_comments(
            &self,
            _owner: &str,
            _repo: &str,
            _number: u64,
            review_id: u64,
        ) -> Result<Vec<ReviewComment>> {
            Ok(self.review_comments.get(&review_id).cloned().unwrap_or_default())
        }

        async fn list_issue_comments(&self, _owner: &str, _repo: &str, number: u64) -> Result<Vec<IssueComment>> {
            Ok(self.issue_comments.get(&number).cloned().unwrap_or_default())
        }
    }
}
