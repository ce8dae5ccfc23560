pub mod aggregate;
pub mod client;
pub mod parser;

use crate::dates::DateRange;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Read access to the code-hosting API used by the aggregators
#[async_trait]
pub trait CodeHost: Send + Sync {
    /// Run an issue search and return the matching items
    async fn search_issues(&self, query: &SearchQuery) -> Result<Vec<SearchItem>>;

    /// List the commits of a pull request
    async fn list_pull_commits(&self, owner: &str, repo: &str, number: u64) -> Result<Vec<PullCommit>>;

    /// Fetch a single commit with its changed files
    async fn get_commit(&self, owner: &str, repo: &str, sha: &str) -> Result<CommitDetail>;

    /// List review summaries of a pull request
    async fn list_reviews(&self, owner: &str, repo: &str, number: u64) -> Result<Vec<ReviewSummary>>;

    /// List the inline comments left with one review
    async fn list_review_comments(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        review_id: u64,
    ) -> Result<Vec<ReviewComment>>;

    /// List top-level conversation comments of a pull request
    async fn list_issue_comments(&self, owner: &str, repo: &str, number: u64) -> Result<Vec<IssueComment>>;
}

/// Which search produced a pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QueryClass {
    Created,
    Updated,
    Reviewed,
}

impl QueryClass {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Reviewed => "reviewed",
        }
    }
}

/// Organization-scoped pull request search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub class: QueryClass,
    pub query: String,
}

impl SearchQuery {
    /// Pull requests authored by `user` and opened in the range
    pub fn created(org: &str, user: &str, range: &DateRange) -> Self {
        Self {
            class: QueryClass::Created,
            query: format!(
                "org:{} type:pr author:{} created:{}",
                org,
                user,
                range.search_qualifier()
            ),
        }
    }

    /// Pull requests authored by `user`, opened earlier, touched in the range
    pub fn updated(org: &str, user: &str, range: &DateRange) -> Self {
        let span = range.search_qualifier();
        Self {
            class: QueryClass::Updated,
            query: format!(
                "org:{} type:pr author:{} -created:{} updated:{}",
                org, user, span, span
            ),
        }
    }

    /// Pull requests by others that `user` commented on in the range
    pub fn reviewed(org: &str, user: &str, range: &DateRange) -> Self {
        Self {
            class: QueryClass::Reviewed,
            query: format!(
                "org:{} type:pr -author:{} commenter:{} updated:{}",
                org,
                user,
                user,
                range.search_qualifier()
            ),
        }
    }
}

/// GitHub user reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
}

/// Login of an optional user, empty for deleted accounts
pub fn login_of(user: &Option<User>) -> &str {
    user.as_ref().map(|u| u.login.as_str()).unwrap_or("")
}

/// One row of `GET /search/issues`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    pub id: u64,
    pub number: u64,
    pub repository_url: String,
    pub user: Option<User>,
    pub created_at: DateTime<Utc>,
    pub body: Option<String>,
    pub title: String,
    pub html_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

/// Author block of a git commit
#[derive(Debug, Clone, Deserialize)]
pub struct GitAuthor {
    pub name: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitData {
    pub message: String,
    pub author: Option<GitAuthor>,
}

/// One row of `GET /repos/{owner}/{repo}/pulls/{number}/commits`
#[derive(Debug, Clone, Deserialize)]
pub struct PullCommit {
    pub sha: String,
    pub commit: CommitData,
}

/// `GET /repos/{owner}/{repo}/commits/{sha}`
#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    pub sha: String,
    pub commit: CommitData,
    #[serde(default)]
    pub files: Vec<CommitFile>,
}

/// A file touched by a commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitFile {
    #[serde(default)]
    pub sha: Option<String>,
    pub filename: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub patch: Option<String>,
    #[serde(default)]
    pub previous_filename: Option<String>,
}

/// Review summary as returned by `GET .../pulls/{number}/reviews`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub id: u64,
    pub user: Option<User>,
    #[serde(default)]
    pub body: Option<String>,
    pub state: String,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub html_url: String,
}

/// Inline comment attached to a review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewComment {
    pub id: u64,
    pub user: Option<User>,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Top-level conversation comment on a pull request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueComment {
    pub id: u64,
    pub user: Option<User>,
    #[serde(default)]
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub html_url: String,
}

/// A commit attached to a pull request
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    pub sha: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub files: Vec<CommitFile>,
    pub message: String,
}

impl Commit {
    /// Build from the detailed commit, keeping the message from the PR listing
    pub fn from_detail(detail: CommitDetail, message: String) -> Option<Self> {
        let author = detail.commit.author?;
        Some(Self {
            sha: detail.sha,
            author: author.name,
            timestamp: author.date,
            files: detail.files,
            message,
        })
    }
}

/// A pull request found by one of the searches
#[derive(Debug, Clone, PartialEq)]
pub struct PullRequest {
    pub id: u64,
    pub number: u64,
    pub owner: String,
    pub repo: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub description: String,
    pub title: String,
    pub url: String,
    pub ticket: Option<String>,
    pub commits: Vec<Commit>,
    pub created: bool,
    pub updated: bool,
    pub reviewed: bool,
}

impl PullRequest {
    /// Build from a search row; commits are fetched separately
    pub fn from_search_item(item: &SearchItem, class: QueryClass, ticket: Option<String>) -> Self {
        let (owner, repo) = parser::parse_repository_url(&item.repository_url);
        Self {
            id: item.id,
            number: item.number,
            owner,
            repo,
            author: login_of(&item.user).to_string(),
            created_at: item.created_at,
            description: item.body.clone().unwrap_or_default(),
            title: item.title.clone(),
            url: item.html_url.clone(),
            ticket,
            commits: Vec::new(),
            created: class == QueryClass::Created,
            updated: class == QueryClass::Updated,
            reviewed: class == QueryClass::Reviewed,
        }
    }
}

/// A review summary with its inline comments
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub summary: ReviewSummary,
    pub comments: Vec<ReviewComment>,
}

/// Everything the user contributed to someone else's pull request
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewsByPullRequest {
    pub pull_request: PullRequest,
    pub reviews: Vec<Review>,
    pub comments: Vec<IssueComment>,
}

impl ReviewsByPullRequest {
    /// Append another result for the same pull request.
    ///
    /// Reviews and comments whose id is already present are dropped, the
    /// rest keep encounter order.
    pub fn merge(&mut self, other: ReviewsByPullRequest) {
        for review in other.reviews {
            if !self.reviews.iter().any(|r| r.summary.id == review.summary.id) {
                self.reviews.push(review);
            }
        }
        for comment in other.comments {
            if !self.comments.iter().any(|c| c.id == comment.id) {
                self.comments.push(comment);
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn range() -> DateRange {
        DateRange::parse("2025-06-16", "2025-06-17").unwrap()
    }

    #[test]
    fn test_search_queries() {
        let r = range();
        assert_eq!(
            SearchQuery::created("acme", "octo", &r).query,
            "org:acme type:pr author:octo created:2025-06-16..2025-06-17"
        );
        assert_eq!(
            SearchQuery::updated("acme", "octo", &r).query,
            "org:acme type:pr author:octo -created:2025-06-16..2025-06-17 updated:2025-06-16..2025-06-17"
        );
        let reviewed = SearchQuery::reviewed("acme", "octo", &r);
        assert_eq!(reviewed.class, QueryClass::Reviewed);
        assert_eq!(
            reviewed.query,
            "org:acme type:pr -author:octo commenter:octo updated:2025-06-16..2025-06-17"
        );
    }

    #[test]
    fn test_pull_request_from_search_item() {
        let item = search_item(11, 5, "[DX-57] feat");
        let pr = PullRequest::from_search_item(&item, QueryClass::Updated, Some("DX-57".into()));
        assert_eq!(pr.owner, "acme");
        assert_eq!(pr.repo, "widgets");
        assert_eq!(pr.author, "octo");
        assert_eq!(pr.ticket.as_deref(), Some("DX-57"));
        assert!(!pr.created);
        assert!(pr.updated);
        assert!(!pr.reviewed);
        assert!(pr.commits.is_empty());
    }

    #[test]
    fn test_merge_concatenates_in_order() {
        let item = search_item(1, 5, "title");
        let pr = PullRequest::from_search_item(&item, QueryClass::Reviewed, None);
        let mut first = ReviewsByPullRequest {
            pull_request: pr.clone(),
            reviews: vec![Review {
                summary: review(1, "octo", "2025-06-16T09:00:00Z"),
                comments: vec![],
            }],
            comments: vec![issue_comment(10, "octo")],
        };
        let second = ReviewsByPullRequest {
            pull_request: pr,
            reviews: vec![Review {
                summary: review(2, "octo", "2025-06-16T11:00:00Z"),
                comments: vec![],
            }],
            comments: vec![issue_comment(20, "octo")],
        };

        first.merge(second);

        let review_ids: Vec<u64> = first.reviews.iter().map(|r| r.summary.id).collect();
        let comment_ids: Vec<u64> = first.comments.iter().map(|c| c.id).collect();
        assert_eq!(review_ids, vec![1, 2]);
        assert_eq!(comment_ids, vec![10, 20]);
    }

    #[test]
    fn test_merge_drops_repeated_ids() {
        let item = search_item(1, 5, "title");
        let pr = PullRequest::from_search_item(&item, QueryClass::Reviewed, None);
        let entry = ReviewsByPullRequest {
            pull_request: pr,
            reviews: vec![Review {
                summary: review(1, "octo", "2025-06-16T09:00:00Z"),
                comments: vec![],
            }],
            comments: vec![issue_comment(10, "octo")],
        };
        let mut merged = entry.clone();
        merged.merge(entry);
        assert_eq!(merged.reviews.len(), 1);
        assert_eq!(merged.comments.len(), 1);
    }

    #[test]
    fn test_deserialize_search_response() {
        let json = r#"{
            "total_count": 1,
            "items": [{
                "id": 42,
                "number": 7,
                "repository_url": "https://api.github.com/repos/acme/widgets",
                "user": {"login": "octo"},
                "created_at": "2025-06-16T08:00:00Z",
                "body": null,
                "title": "[DX-1] thing",
                "html_url": "https://github.com/acme/widgets/pull/7"
            }]
        }"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].number, 7);
        assert!(response.items[0].body.is_none());
    }
}
