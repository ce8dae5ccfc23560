pub mod openai;
pub mod prompt;

use crate::dates::DateRange;
use crate::error::Result;
use crate::github::aggregate::ReviewMap;
use crate::jira::enrich::TicketMap;
use crate::jira::Ticket;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Text completion backend
#[async_trait]
pub trait Completer: Send + Sync {
    /// Complete `input` under the given system prompt, returning the first choice
    async fn complete(&self, system_prompt: &str, input: &str) -> Result<String>;
}

/// Everything gathered for one run, before it is turned into a prompt
#[derive(Debug, Clone)]
pub struct ActivityReport {
    pub range: DateRange,
    /// Tickets the user opened in the range
    pub new_tickets: Vec<Ticket>,
    /// Tickets the user's pull requests refer to
    pub tickets: TicketMap,
    /// Pull requests by others the user reviewed
    pub reviews: ReviewMap,
}

impl ActivityReport {
    pub fn is_empty(&self) -> bool {
        self.new_tickets.is_empty() && self.tickets.is_empty() && self.reviews.is_empty()
    }
}

/// AI-generated performance summary
#[derive(Debug, Clone)]
pub struct Summary {
    pub range: DateRange,
    /// Model output, as returned
    pub text: String,
    pub generated_at: DateTime<Utc>,
}

impl Summary {
    pub fn new(range: DateRange, text: String) -> Self {
        Self {
            range,
            text,
            generated_at: Utc::now(),
        }
    }

    /// Format summary as markdown
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "# Performance summary {} to {}\n\n",
            self.range.start_str(),
            self.range.end_str()
        ));
        output.push_str(self.text.trim());
        output.push_str("\n\n");
        output.push_str(&format!(
            "*Generated at: {}*\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        output
    }
}
