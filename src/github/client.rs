use crate::error::{PerfError, Result};
use crate::github::{
    CodeHost, CommitDetail, IssueComment, PullCommit, ReviewComment, ReviewSummary, SearchItem,
    SearchQuery, SearchResponse,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

pub const GITHUB_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = "perf-digest";
const PER_PAGE: u32 = 100;

/// GitHub REST API client
pub struct GitHubClient {
    token: String,
    client: Client,
    base_url: String,
}

impl GitHubClient {
    /// Create a new GitHub API client
    pub fn new(token: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            token,
            client,
            base_url: GITHUB_API_URL.to_string(),
        })
    }

    /// Point the client at another API root (GitHub Enterprise, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PerfError::github_api(format!(
                "GET {} failed with status {}: {}",
                path, status, error_text
            )));
        }

        Ok(response.json().await?)
    }

    fn page() -> (&'static str, String) {
        ("per_page", PER_PAGE.to_string())
    }
}

#[async_trait]
impl CodeHost for GitHubClient {
    #[instrument(skip(self, query), fields(class = query.class.name()))]
    async fn search_issues(&self, query: &SearchQuery) -> Result<Vec<SearchItem>> {
        let params = [
            ("q", query.query.clone()),
            ("sort", "created".to_string()),
            ("order", "desc".to_string()),
            Self::page(),
        ];
        let response: SearchResponse = self
            .get_json("/search/issues", &params)
            .await
            .map_err(|e| match e {
                PerfError::GitHubApi(msg) => PerfError::github_api(format!(
                    "failed to search for PRs with query {}: {}",
                    query.query, msg
                )),
                other => other,
            })?;
        debug!(total = response.total_count, "search complete");
        Ok(response.items)
    }

    async fn list_pull_commits(&self, owner: &str, repo: &str, number: u64) -> Result<Vec<PullCommit>> {
        let path = format!("/repos/{}/{}/pulls/{}/commits", owner, repo, number);
        self.get_json(&path, &[Self::page()]).await
    }

    async fn get_commit(&self, owner: &str, repo: &str, sha: &str) -> Result<CommitDetail> {
        let path = format!("/repos/{}/{}/commits/{}", owner, repo, sha);
        self.get_json(&path, &[]).await
    }

    async fn list_reviews(&self, owner: &str, repo: &str, number: u64) -> Result<Vec<ReviewSummary>> {
        let path = format!("/repos/{}/{}/pulls/{}/reviews", owner, repo, number);
        self.get_json(&path, &[Self::page()]).await
    }

    async fn list_review_comments(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        review_id: u64,
    ) -> Result<Vec<ReviewComment>> {
        let path = format!(
            "/repos/{}/{}/pulls/{}/reviews/{}/comments",
            owner, repo, number, review_id
        );
        self.get_json(&path, &[Self::page()]).await
    }

    async fn list_issue_comments(&self, owner: &str, repo: &str, number: u64) -> Result<Vec<IssueComment>> {
        let path = format!("/repos/{}/{}/issues/{}/comments", owner, repo, number);
        self.get_json(&path, &[Self::page()]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::DateRange;
    use mockito::Matcher;

    fn client(url: &str) -> GitHubClient {
        GitHubClient::new("ghp-test".to_string(), Duration::from_secs(5))
            .unwrap()
            .with_base_url(url)
    }

    #[test]
    fn test_client_creation() {
        let client = GitHubClient::new("ghp-test".to_string(), Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url, GITHUB_API_URL);

        let client = client.with_base_url("http://localhost:1234/");
        assert_eq!(client.base_url, "http://localhost:1234");
    }

    #[tokio::test]
    async fn test_search_issues() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(r"^/search/issues".to_string()))
            .match_header("authorization", "Bearer ghp-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"total_count": 1, "items": [{
                    "id": 42, "number": 7,
                    "repository_url": "https://api.github.com/repos/acme/widgets",
                    "user": {"login": "octo"},
                    "created_at": "2025-06-16T08:00:00Z",
                    "body": "desc", "title": "[DX-1] thing",
                    "html_url": "https://github.com/acme/widgets/pull/7"
                }]}"#,
            )
            .create_async()
            .await;

        let range = DateRange::parse("2025-06-16", "2025-06-17").unwrap();
        let query = SearchQuery::created("acme", "octo", &range);
        let items = client(&server.url()).search_issues(&query).await.unwrap();

        mock.assert_async().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, 42);
        assert_eq!(items[0].title, "[DX-1] thing");
    }

    #[tokio::test]
    async fn test_get_commit() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/repos/acme/widgets/commits/abc123".to_string()))
            .with_status(200)
            .with_body(
                r#"{"sha": "abc123",
                    "commit": {"message": "fix", "author": {"name": "Octo", "date": "2025-06-16T10:00:00Z"}},
                    "files": [{"filename": "src/lib.rs", "status": "modified", "patch": "@@ -1 +1 @@"}]}"#,
            )
            .create_async()
            .await;

        let detail = client(&server.url())
            .get_commit("acme", "widgets", "abc123")
            .await
            .unwrap();
        assert_eq!(detail.sha, "abc123");
        assert_eq!(detail.files.len(), 1);
        assert_eq!(detail.files[0].filename, "src/lib.rs");
        assert_eq!(detail.commit.author.unwrap().name, "Octo");
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/repos/acme/widgets/pulls/5/reviews".to_string()))
            .with_status(404)
            .with_body(r#"{"message": "Not Found"}"#)
            .create_async()
            .await;

        let err = client(&server.url())
            .list_reviews("acme", "widgets", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, PerfError::GitHubApi(_)));
        assert!(err.to_string().contains("404"));
    }
}
