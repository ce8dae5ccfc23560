use thiserror::Error;

/// Main error type for perf-digest
#[derive(Error, Debug)]
pub enum PerfError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Required environment variable is not set
    #[error("missing {0}")]
    MissingEnv(String),

    /// TOML parsing errors
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// GitHub API returned an error status
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Jira API returned an error status
    #[error("Jira API error: {0}")]
    JiraApi(String),

    /// Completion API errors
    #[error("Completion API error: {0}")]
    Completion(String),

    /// Date string not in YYYY-MM-DD form
    #[error("invalid date string '{input}': {source}")]
    InvalidDate {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Timestamp that could not be parsed
    #[error("failed to parse timestamp '{input}': {source}")]
    InvalidTimestamp {
        input: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Result type alias for perf-digest operations
pub type Result<T> = std::result::Result<T, PerfError>;

impl PerfError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new GitHub API error
    pub fn github_api<S: Into<String>>(msg: S) -> Self {
        Self::GitHubApi(msg.into())
    }

    /// Create a new Jira API error
    pub fn jira_api<S: Into<String>>(msg: S) -> Self {
        Self::JiraApi(msg.into())
    }

    /// Create a new completion API error
    pub fn completion<S: Into<String>>(msg: S) -> Self {
        Self::Completion(msg.into())
    }
}

/// Why a search result was left out of an aggregation.
///
/// Skips are not errors: the item is dropped and the pass continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No ticket key in the pull request title
    MissingTicketId,
    /// A pull request with this id was already accumulated
    AlreadySeen { id: u64 },
    /// The `owner/repo/number` key would be empty
    InvalidKey,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTicketId => write!(f, "no ticket id in title"),
            Self::AlreadySeen { id } => write!(f, "pull request {} already accumulated", id),
            Self::InvalidKey => write!(f, "empty composite key"),
        }
    }
}
