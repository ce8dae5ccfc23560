use crate::error::{PerfError, Result};
use crate::jira::{parse_jira_time, IssueTracker, JiraFilter, Ticket, TicketComment};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument};

const ISSUE_FIELDS: &str = "assignee,creator,reporter,summary,description,comment,created,updated,status";
const MAX_RESULTS: u32 = 100;

/// Jira Cloud REST client using basic auth (username + API token)
pub struct JiraClient {
    username: String,
    token: String,
    client: Client,
    base_url: String,
}

impl JiraClient {
    /// Create a new Jira client for the site at `base_url`
    pub fn new(base_url: &str, username: String, token: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            username,
            token,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "jira request");
        self.client
            .request(method, url)
            .basic_auth(&self.username, Some(&self.token))
            .header("Accept", "application/json")
    }

    async fn check(response: Response, action: &str) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(PerfError::jira_api(format!(
            "[{}] failed to {}: {}",
            status.as_u16(),
            action,
            error_text
        )))
    }
}

#[async_trait]
impl IssueTracker for JiraClient {
    #[instrument(skip(self))]
    async fn find_filter(&self, name: &str) -> Result<Option<JiraFilter>> {
        let response = self
            .request(Method::GET, "/rest/api/3/filter/search")
            .query(&[("filterName", name), ("expand", "jql,owner")])
            .send()
            .await?;
        let page: FilterPage = Self::check(
            response,
            &format!("check if filter with name '{}' already exists", name),
        )
        .await?
        .json()
        .await?;

        Ok(page.values.into_iter().find(|f| f.name == name))
    }

    #[instrument(skip(self, filter, jql), fields(id = %filter.id))]
    async fn update_filter(&self, filter: &JiraFilter, jql: &str) -> Result<()> {
        let response = self
            .request(Method::PUT, &format!("/rest/api/3/filter/{}", filter.id))
            .json(&json!({ "jql": jql, "name": filter.name }))
            .send()
            .await?;
        Self::check(response, &format!("update filter with ID {}", filter.id)).await?;
        Ok(())
    }

    #[instrument(skip(self, jql))]
    async fn create_filter(&self, name: &str, jql: &str) -> Result<JiraFilter> {
        let response = self
            .request(Method::POST, "/rest/api/3/filter")
            .json(&json!({ "jql": jql, "name": name }))
            .send()
            .await?;
        let filter = Self::check(response, &format!("create filter '{}'", name))
            .await?
            .json()
            .await?;
        Ok(filter)
    }

    #[instrument(skip(self))]
    async fn search_keys(&self, jql: &str) -> Result<Vec<String>> {
        let response = self
            .request(Method::GET, "/rest/api/2/search")
            .query(&[
                ("jql", jql.to_string()),
                ("fields", "key".to_string()),
                ("maxResults", MAX_RESULTS.to_string()),
            ])
            .send()
            .await?;
        let page: SearchPage = Self::check(response, "search issues").await?.json().await?;
        Ok(page.issues.into_iter().map(|i| i.key).collect())
    }

    #[instrument(skip(self))]
    async fn get_ticket(&self, key: &str) -> Result<Ticket> {
        let response = self
            .request(Method::GET, &format!("/rest/api/2/issue/{}", key))
            .query(&[("fields", ISSUE_FIELDS)])
            .send()
            .await?;
        let issue: IssueResponse = Self::check(response, &format!("fetch ticket with key {}", key))
            .await?
            .json()
            .await?;
        Ticket::try_from(issue)
    }
}

#[derive(Debug, Deserialize)]
struct FilterPage {
    #[serde(default)]
    values: Vec<JiraFilter>,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    issues: Vec<IssueKey>,
}

#[derive(Debug, Deserialize)]
struct IssueKey {
    key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Person {
    #[serde(default)]
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct Status {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    author: Option<Person>,
    #[serde(default)]
    body: String,
    created: String,
    updated: String,
}

#[derive(Debug, Deserialize)]
struct CommentPage {
    #[serde(default)]
    comments: Vec<RawComment>,
}

#[derive(Debug, Deserialize)]
struct IssueFields {
    #[serde(default)]
    summary: String,
    description: Option<String>,
    status: Option<Status>,
    assignee: Option<Person>,
    creator: Option<Person>,
    reporter: Option<Person>,
    created: String,
    updated: String,
    comment: Option<CommentPage>,
}

#[derive(Debug, Deserialize)]
struct IssueResponse {
    key: String,
    fields: IssueFields,
}

fn display_name(person: Option<Person>) -> String {
    person.map(|p| p.display_name).unwrap_or_default()
}

impl TryFrom<RawComment> for TicketComment {
    type Error = PerfError;

    fn try_from(raw: RawComment) -> Result<Self> {
        Ok(Self {
            created_at: parse_jira_time(&raw.created)?,
            updated_at: parse_jira_time(&raw.updated)?,
            author: display_name(raw.author),
            body: raw.body,
        })
    }
}

impl TryFrom<IssueResponse> for Ticket {
    type Error = PerfError;

    fn try_from(issue: IssueResponse) -> Result<Self> {
        let fields = issue.fields;
        let comments = fields
            .comment
            .map(|page| page.comments)
            .unwrap_or_default()
            .into_iter()
            .map(TicketComment::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            key: issue.key,
            created: parse_jira_time(&fields.created)?,
            updated: parse_jira_time(&fields.updated)?,
            assignee: display_name(fields.assignee),
            creator: display_name(fields.creator),
            reporter: display_name(fields.reporter),
            title: fields.summary,
            body: fields.description.unwrap_or_default(),
            status: fields.status.map(|s| s.name).unwrap_or_default(),
            comments,
            pull_requests: Vec::new(),
        })
    }
}
