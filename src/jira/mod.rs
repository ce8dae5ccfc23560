pub mod client;
pub mod enrich;

use crate::error::{PerfError, Result};
use crate::github::PullRequest;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

const JIRA_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// Operations the digest needs from the issue tracker
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Look up a saved filter by exact name
    async fn find_filter(&self, name: &str) -> Result<Option<JiraFilter>>;

    /// Replace the JQL of a saved filter
    async fn update_filter(&self, filter: &JiraFilter, jql: &str) -> Result<()>;

    /// Save a new filter
    async fn create_filter(&self, name: &str, jql: &str) -> Result<JiraFilter>;

    /// Keys of the issues matching a JQL query
    async fn search_keys(&self, jql: &str) -> Result<Vec<String>>;

    /// Fetch one issue with its comments
    async fn get_ticket(&self, key: &str) -> Result<Ticket>;
}

/// A named JQL query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub name: String,
    pub jql: String,
}

impl Filter {
    /// Tickets in `project` reported by `reporter` between two dates
    pub fn created_between(project: &str, reporter: &str, from: &str, to: &str) -> Self {
        Self {
            name: "Created today".to_string(),
            jql: format!(
                "project = {} AND type IN (standardIssueTypes(), subTaskIssueTypes()) AND reporter = \"{}\" AND created >= \"{}\" AND created <= \"{}\" ORDER BY created DESC",
                project, reporter, from, to
            ),
        }
    }
}

/// A filter saved on the Jira server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiraFilter {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub jql: String,
}

/// Comment on a ticket
#[derive(Debug, Clone, PartialEq)]
pub struct TicketComment {
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
}

/// A Jira issue together with the pull requests that reference it
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub key: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub assignee: String,
    pub creator: String,
    pub reporter: String,
    pub title: String,
    pub body: String,
    pub status: String,
    pub comments: Vec<TicketComment>,
    pub pull_requests: Vec<PullRequest>,
}

impl Ticket {
    /// Attach a pull request unless one with the same id is already attached.
    ///
    /// Returns `true` if it was added.
    pub fn add_pull_request(&mut self, pr: PullRequest) -> bool {
        if self.pull_requests.iter().any(|existing| existing.id == pr.id) {
            return false;
        }
        self.pull_requests.push(pr);
        true
    }
}

/// Parse a Jira timestamp such as `2025-05-12T15:21:38.463+0200`
pub fn parse_jira_time(input: &str) -> Result<DateTime<Utc>> {
    DateTime::<FixedOffset>::parse_from_str(input, JIRA_TIME_FORMAT)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|source| PerfError::InvalidTimestamp {
            input: input.to_string(),
            source,
        })
}

/// Reuse the saved filter named like `filter`, or create it.
///
/// An existing filter gets its JQL replaced so reruns with other dates
/// query the right window.
#[instrument(skip(tracker, filter), fields(name = %filter.name))]
pub async fn ensure_filter(tracker: &dyn IssueTracker, filter: &Filter) -> Result<JiraFilter> {
    match tracker.find_filter(&filter.name).await? {
        Some(existing) => {
            tracker.update_filter(&existing, &filter.jql).await?;
            debug!(id = %existing.id, "updated the filter");
            Ok(JiraFilter {
                jql: filter.jql.clone(),
                ..existing
            })
        }
        None => {
            let created = tracker.create_filter(&filter.name, &filter.jql).await?;
            debug!(id = %created.id, "created the filter");
            Ok(JiraFilter {
                jql: filter.jql.clone(),
                ..created
            })
        }
    }
}

/// Run a named filter and fetch every matching ticket in full
pub async fn tickets_by_filter(tracker: &dyn IssueTracker, filter: &Filter) -> Result<Vec<Ticket>> {
    let saved = ensure_filter(tracker, filter).await?;
    let keys = tracker.search_keys(&saved.jql).await?;
    info!(filter = %saved.name, found = keys.len(), "found issues for filter");

    let mut tickets = Vec::with_capacity(keys.len());
    for key in keys {
        tickets.push(tracker.get_ticket(&key).await?);
    }
    Ok(tickets)
}
