use crate::ai::ActivityReport;
use crate::error::{PerfError, Result};
use crate::github::{login_of, Commit, PullRequest, ReviewsByPullRequest};
use crate::jira::Ticket;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;

pub const NEW_TICKETS_HEADER: &str = "Jira Tickets created today";
pub const CONTRIBUTIONS_HEADER: &str = "Individual contributions by Jira Ticket";
pub const REVIEWS_HEADER: &str = "Reviewed Pull Requests";

/// Patch lines kept per changed file
const MAX_PATCH_LINES: usize = 40;

/// System prompt written by `perf-digest init`
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are helping a software engineer write their daily performance log.

The user message lists the Jira tickets they created, their pull requests \
grouped by Jira ticket (with the commits they authored that day), and the \
pull requests of colleagues they reviewed.

Write a concise summary of the day's work in markdown:
- one short paragraph per ticket describing what was done and why it matters
- a bullet list of code reviews given, noting anything substantial
- no speculation beyond what the data shows
";

/// Read the system prompt from disk
pub fn load_system_prompt(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        PerfError::config(format!("failed to read prompt file {}: {}", path.display(), e))
    })
}

/// Build the completion input from the gathered activity
pub fn assemble_report(report: &ActivityReport) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!("Date: {}\n", report.range.start_str()));

    prompt.push_str(&format!("{}:\n", NEW_TICKETS_HEADER));
    if report.new_tickets.is_empty() {
        prompt.push_str("(none)\n");
    }
    for ticket in &report.new_tickets {
        prompt.push_str(&format_ticket(ticket));
        prompt.push('\n');
    }

    prompt.push_str(&format!("\n\n{}\n", CONTRIBUTIONS_HEADER));
    if report.tickets.is_empty() {
        prompt.push_str("(none)\n");
    }
    for (key, ticket) in report.tickets.iter() {
        prompt.push_str(&format!("TICKET [{}]: {}\n", key, ticket.title));
        prompt.push_str(&format_ticket_details(ticket));
        prompt.push_str(&format_pull_requests(&ticket.pull_requests));
        prompt.push('\n');
    }

    prompt.push_str(&format!("\n\n{}\n", REVIEWS_HEADER));
    if report.reviews.is_empty() {
        prompt.push_str("(none)\n");
    }
    for entry in report.reviews.values() {
        prompt.push_str(&format_review(entry));
        prompt.push('\n');
    }

    prompt
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}\n", prefix, line))
        .collect()
}

/// One ticket: header line, metadata, description and comments
pub fn format_ticket(ticket: &Ticket) -> String {
    format!("{} {}\n{}", ticket.key, ticket.title, format_ticket_details(ticket))
}

/// Ticket metadata, description and comments, without the header line
fn format_ticket_details(ticket: &Ticket) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "  Status: {} | Reporter: {} | Assignee: {}\n",
        ticket.status,
        ticket.reporter,
        if ticket.assignee.is_empty() { "unassigned" } else { ticket.assignee.as_str() }
    ));
    out.push_str(&format!(
        "  Created: {} | Updated: {}\n",
        timestamp(&ticket.created),
        timestamp(&ticket.updated)
    ));

    if !ticket.body.trim().is_empty() {
        out.push_str("  Description:\n");
        out.push_str(&indent(ticket.body.trim(), "    "));
    }

    if !ticket.comments.is_empty() {
        out.push_str("  Comments:\n");
        for comment in &ticket.comments {
            out.push_str(&format!(
                "    - {} ({}):\n",
                comment.author,
                timestamp(&comment.created_at)
            ));
            out.push_str(&indent(comment.body.trim(), "      "));
        }
    }

    out
}

fn format_pull_requests(prs: &[PullRequest]) -> String {
    let mut out = String::new();
    if prs.is_empty() {
        return out;
    }

    out.push_str("  Pull requests:\n");
    for pr in prs {
        let class = if pr.created {
            "opened"
        } else if pr.updated {
            "updated"
        } else {
            "reviewed"
        };
        out.push_str(&format!(
            "    - {}/{}#{} \"{}\" ({}) {}\n",
            pr.owner, pr.repo, pr.number, pr.title, class, pr.url
        ));
        if !pr.description.trim().is_empty() {
            out.push_str("      Description:\n");
            out.push_str(&indent(pr.description.trim(), "        "));
        }
        if pr.commits.is_empty() {
            out.push_str("      Commits: none on this day\n");
        } else {
            out.push_str("      Commits:\n");
            for commit in &pr.commits {
                out.push_str(&format_commit(commit));
            }
        }
    }
    out
}

fn format_commit(commit: &Commit) -> String {
    let mut out = String::new();
    let short_sha: String = commit.sha.chars().take(7).collect();

    out.push_str(&format!(
        "        - {} by {} at {}\n",
        short_sha,
        commit.author,
        timestamp(&commit.timestamp)
    ));
    out.push_str(&indent(commit.message.trim(), "          "));

    for file in &commit.files {
        match &file.previous_filename {
            Some(previous) => out.push_str(&format!(
                "          File: {} ({}, from {})\n",
                file.filename, file.status, previous
            )),
            None => out.push_str(&format!("          File: {} ({})\n", file.filename, file.status)),
        }
        if let Some(patch) = &file.patch {
            let total = patch.lines().count();
            let kept: Vec<&str> = patch.lines().take(MAX_PATCH_LINES).collect();
            out.push_str(&indent(&kept.join("\n"), "            "));
            if total > MAX_PATCH_LINES {
                out.push_str(&format!(
                    "            (+{} more lines)\n",
                    total - MAX_PATCH_LINES
                ));
            }
        }
    }
    out
}

/// One reviewed pull request with the user's reviews and comments
pub fn format_review(entry: &ReviewsByPullRequest) -> String {
    let pr = &entry.pull_request;
    let mut out = String::new();

    out.push_str(&format!(
        "PULL REQUEST {}/{}#{} by {}: \"{}\" {}\n",
        pr.owner, pr.repo, pr.number, pr.author, pr.title, pr.url
    ));
    if let Some(ticket) = &pr.ticket {
        out.push_str(&format!("  Ticket: {}\n", ticket));
    }

    if !entry.reviews.is_empty() {
        out.push_str("  Reviews:\n");
        for review in &entry.reviews {
            let submitted = review
                .summary
                .submitted_at
                .as_ref()
                .map(timestamp)
                .unwrap_or_default();
            out.push_str(&format!("    - {} at {}\n", review.summary.state, submitted));
            if let Some(body) = review.summary.body.as_deref().filter(|b| !b.trim().is_empty()) {
                out.push_str(&indent(body.trim(), "      "));
            }
            for comment in &review.comments {
                out.push_str(&format!("      - on {}:\n", comment.path));
                out.push_str(&indent(comment.body.trim(), "        "));
            }
        }
    }

    if !entry.comments.is_empty() {
        out.push_str("  Comments:\n");
        for comment in &entry.comments {
            out.push_str(&format!(
                "    - {} at {}:\n",
                login_of(&comment.user),
                timestamp(&comment.created_at)
            ));
            out.push_str(&indent(comment.body.as_deref().unwrap_or("").trim(), "      "));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::DateRange;
    use crate::github::aggregate::ReviewMap;
    use crate::github::fixtures::{issue_comment, review, search_item};
    use crate::github::{CommitFile, QueryClass, Review, ReviewComment, User};
    use crate::jira::enrich::TicketMap;
    use crate::jira::fake::ticket;
    use tempfile::TempDir;

    fn sample_report() -> ActivityReport {
        let mut pr = PullRequest::from_search_item(
            &search_item(1, 5, "[DX-57] feat: cache toolchain"),
            QueryClass::Created,
            Some("DX-57".to_string()),
        );
        pr.commits.push(Commit {
            sha: "abcdef1234567".to_string(),
            author: "Octo Cat".to_string(),
            timestamp: "2025-06-16T09:00:00Z".parse().unwrap(),
            files: vec![CommitFile {
                sha: None,
                filename: "ci.yml".to_string(),
                status: "modified".to_string(),
                patch: Some("@@ -1 +1 @@\n-old\n+new".to_string()),
                previous_filename: None,
            }],
            message: "cache the toolchain".to_string(),
        });

        let mut t = ticket("DX-57");
        t.add_pull_request(pr);
        let mut tickets = TicketMap::new();
        tickets.upsert("DX-57", t, crate::jira::enrich::merge_tickets);

        let reviewed = PullRequest::from_search_item(
            &search_item(9, 77, "[PF-5] refactor"),
            QueryClass::Reviewed,
            Some("PF-5".to_string()),
        );
        let mut reviews = ReviewMap::new();
        reviews.upsert(
            "acme/widgets/77",
            ReviewsByPullRequest {
                pull_request: reviewed,
                reviews: vec![Review {
                    summary: review(1, "octo", "2025-06-16T12:00:00Z"),
                    comments: vec![ReviewComment {
                        id: 3,
                        user: Some(User {
                            login: "octo".to_string(),
                        }),
                        path: "src/lib.rs".to_string(),
                        body: "consider a Cow here".to_string(),
                        created_at: "2025-06-16T12:00:00Z".parse().unwrap(),
                    }],
                }],
                comments: vec![issue_comment(10, "octo")],
            },
            ReviewsByPullRequest::merge,
        );

        ActivityReport {
            range: DateRange::parse("2025-06-16", "2025-06-17").unwrap(),
            new_tickets: vec![ticket("DX-60")],
            tickets,
            reviews,
        }
    }

    #[test]
    fn test_sections_in_order() {
        let text = assemble_report(&sample_report());

        assert!(text.starts_with("Date: 2025-06-16\n"));
        let new = text.find(NEW_TICKETS_HEADER).unwrap();
        let contributions = text.find(CONTRIBUTIONS_HEADER).unwrap();
        let reviews = text.find(REVIEWS_HEADER).unwrap();
        assert!(new < contributions && contributions < reviews);
    }

    #[test]
    fn test_entries_are_listed() {
        let text = assemble_report(&sample_report());

        assert!(text.contains("DX-60 Title of DX-60"));
        assert!(text.contains("TICKET [DX-57]: Title of DX-57\n  Status: In Progress"));
        assert!(!text.contains("DX-57 Title of DX-57"));
        assert!(text.contains("acme/widgets#5 \"[DX-57] feat: cache toolchain\" (opened)"));
        assert!(text.contains("abcdef1 by Octo Cat at 2025-06-16 09:00 UTC"));
        assert!(text.contains("File: ci.yml (modified)"));
        assert!(text.contains("+new"));
        assert!(text.contains("PULL REQUEST acme/widgets#77 by octo"));
        assert!(text.contains("Ticket: PF-5"));
        assert!(text.contains("- on src/lib.rs:"));
        assert!(text.contains("consider a Cow here"));
        assert!(text.contains("comment 10"));
    }

    #[test]
    fn test_empty_sections() {
        let report = ActivityReport {
            range: DateRange::parse("2025-06-16", "2025-06-17").unwrap(),
            new_tickets: vec![],
            tickets: TicketMap::new(),
            reviews: ReviewMap::new(),
        };
        let text = assemble_report(&report);
        assert_eq!(text.matches("(none)").count(), 3);
    }

    #[test]
    fn test_long_patch_is_truncated() {
        let patch: Vec<String> = (0..100).map(|i| format!("+line {}", i)).collect();
        let commit = Commit {
            sha: "abc".to_string(),
            author: "Octo".to_string(),
            timestamp: "2025-06-16T09:00:00Z".parse().unwrap(),
            files: vec![CommitFile {
                sha: None,
                filename: "big.rs".to_string(),
                status: "added".to_string(),
                patch: Some(patch.join("\n")),
                previous_filename: None,
            }],
            message: "big".to_string(),
        };
        let text = format_commit(&commit);
        assert!(text.contains("+line 39"));
        assert!(!text.contains("+line 40"));
        assert!(text.contains("(+60 more lines)"));
    }

    #[test]
    fn test_load_system_prompt() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("prompt.md");
        fs::write(&path, DEFAULT_SYSTEM_PROMPT).unwrap();

        assert_eq!(load_system_prompt(&path).unwrap(), DEFAULT_SYSTEM_PROMPT);
        assert!(load_system_prompt(&temp_dir.path().join("missing")).is_err());
    }
}
