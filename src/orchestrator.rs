use crate::ai::openai::OpenAiClient;
use crate::ai::prompt::{assemble_report, load_system_prompt};
use crate::ai::{ActivityReport, Completer, Summary};
use crate::config::{Config, Credentials};
use crate::dates::DateRange;
use crate::error::Result;
use crate::github::aggregate::{pull_requests_by_date, reviewed_pull_requests, ReviewMap};
use crate::github::client::GitHubClient;
use crate::github::CodeHost;
use crate::jira::client::JiraClient;
use crate::jira::enrich::{aggregate_by_ticket, TicketMap};
use crate::jira::{tickets_by_filter, Filter, IssueTracker, Ticket};
use tracing::{debug, info};

/// Orchestrator for coordinating the fetch and summary workflow
pub struct Orchestrator {
    config: Config,
    code_host: Box<dyn CodeHost>,
    tracker: Box<dyn IssueTracker>,
    completer: Box<dyn Completer>,
}

impl Orchestrator {
    /// Create an orchestrator backed by the GitHub, Jira and OpenAI clients
    pub fn new(config: Config, credentials: Credentials) -> Result<Self> {
        let timeout = config.request_timeout();

        let code_host = GitHubClient::new(credentials.github_token, timeout)?
            .with_base_url(config.github_api_url.clone());
        let tracker = JiraClient::new(
            &config.jira_url,
            credentials.jira_username,
            credentials.jira_token,
            timeout,
        )?;
        let completer = OpenAiClient::new(credentials.openai_api_key, timeout)?
            .with_model(config.model.clone())
            .with_base_url(config.openai_api_url.clone());

        Ok(Self::with_clients(
            config,
            Box::new(code_host),
            Box::new(tracker),
            Box::new(completer),
        ))
    }

    /// Create an orchestrator over arbitrary backends
    pub fn with_clients(
        config: Config,
        code_host: Box<dyn CodeHost>,
        tracker: Box<dyn IssueTracker>,
        completer: Box<dyn Completer>,
    ) -> Self {
        Self {
            config,
            code_host,
            tracker,
            completer,
        }
    }

    /// Tickets the user reported in the range, via the saved Jira filter
    async fn new_tickets(&self, range: &DateRange) -> Result<Vec<Ticket>> {
        let filter = Filter::created_between(
            &self.config.jira_project,
            &self.config.jira_user,
            &range.start_str(),
            &range.end_str(),
        );
        tickets_by_filter(self.tracker.as_ref(), &filter).await
    }

    /// The user's own pull requests grouped under their tickets
    async fn contributions(&self, range: &DateRange) -> Result<TicketMap> {
        let prs = pull_requests_by_date(
            self.code_host.as_ref(),
            &self.config.org,
            &self.config.github_user,
            range,
        )
        .await?;
        aggregate_by_ticket(self.tracker.as_ref(), prs).await
    }

    /// Pull requests by others that the user reviewed
    async fn reviews(&self, range: &DateRange) -> Result<ReviewMap> {
        reviewed_pull_requests(
            self.code_host.as_ref(),
            &self.config.org,
            &self.config.github_user,
            range,
        )
        .await
    }

    /// Run every fetch stage in order
    pub async fn gather(&self, range: &DateRange) -> Result<ActivityReport> {
        let new_tickets = self.new_tickets(range).await?;
        let tickets = self.contributions(range).await?;
        let reviews = self.reviews(range).await?;

        info!(
            new_tickets = new_tickets.len(),
            tickets = tickets.len(),
            reviews = reviews.len(),
            "gathered activity"
        );

        Ok(ActivityReport {
            range: range.clone(),
            new_tickets,
            tickets,
            reviews,
        })
    }

    /// Turn a gathered report into a model-written summary
    pub async fn summarize(&self, report: &ActivityReport) -> Result<Summary> {
        let system_prompt = load_system_prompt(&self.config.prompt_path)?;
        let digest = assemble_report(report);
        debug!(bytes = digest.len(), "assembled digest");

        let text = self.completer.complete(&system_prompt, &digest).await?;
        Ok(Summary::new(report.range.clone(), text))
    }
}
