use crate::accumulator::Accumulator;
use crate::error::{Result, SkipReason};
use crate::github::PullRequest;
use crate::jira::{IssueTracker, Ticket};
use tracing::{debug, info, instrument};

/// Tickets keyed by issue key, each carrying its pull requests
pub type TicketMap = Accumulator<Ticket>;

/// Fold another copy of a ticket into the accumulated one
pub fn merge_tickets(existing: &mut Ticket, incoming: Ticket) {
    for pr in incoming.pull_requests {
        existing.add_pull_request(pr);
    }
}

/// Group pull requests under the Jira tickets named in their titles.
///
/// Each ticket is fetched once, on first sight. Any failed lookup aborts
/// the whole pass.
#[instrument(skip_all, fields(pull_requests = prs.len()))]
pub async fn aggregate_by_ticket(tracker: &dyn IssueTracker, prs: Vec<PullRequest>) -> Result<TicketMap> {
    let mut tickets = TicketMap::new();

    for pr in prs {
        let Some(key) = pr.ticket.clone() else {
            debug!(pr = pr.number, reason = %SkipReason::MissingTicketId, "skipping pull request");
            continue;
        };

        if let Some(ticket) = tickets.get_mut(&key) {
            ticket.add_pull_request(pr);
            continue;
        }

        let mut ticket = tracker.get_ticket(&key).await?;
        ticket.add_pull_request(pr);
        tickets.upsert(key, ticket, merge_tickets);
    }

    info!(tickets = tickets.len(), "aggregated pull requests by ticket");
    Ok(tickets)
}
