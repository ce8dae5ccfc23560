use crate::error::SkipReason;
use once_cell::sync::Lazy;
use regex::Regex;

static TICKET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z]{2,}\d*-\d+").expect("ticket pattern is valid"));

/// Extract the first Jira ticket key (e.g. `DX-57`) from a pull request title
pub fn extract_ticket_id(title: &str) -> Option<String> {
    TICKET_RE.find(title).map(|m| m.as_str().to_string())
}

/// Ticket key of a title, or the reason the pull request is skipped
pub fn ticket_or_skip(title: &str) -> Result<String, SkipReason> {
    extract_ticket_id(title).ok_or(SkipReason::MissingTicketId)
}

/// Split a repository API URL into (owner, repo)
///
/// `https://api.github.com/repos/acme/widgets` gives `("acme", "widgets")`.
/// Missing segments come back empty.
pub fn parse_repository_url(url: &str) -> (String, String) {
    let mut parts = url.trim_end_matches('/').rsplit('/');
    let repo = parts.next().unwrap_or("").to_string();
    let owner = parts.next().unwrap_or("").to_string();
    (owner, repo)
}

/// Build the `owner/repo/number` key, empty when any part is missing
pub fn create_map_key(owner: &str, repo: &str, number: u64) -> String {
    if owner.is_empty() || repo.is_empty() || number == 0 {
        return String::new();
    }
    format!("{}/{}/{}", owner, repo, number)
}

/// Composite key of a pull request, or the reason it is skipped
pub fn composite_key(owner: &str, repo: &str, number: u64) -> Result<String, SkipReason> {
    let key = create_map_key(owner, repo, number);
    if key.is_empty() {
        Err(SkipReason::InvalidKey)
    } else {
        Ok(key)
    }
}
