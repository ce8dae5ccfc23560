use crate::ai::openai::{DEFAULT_MODEL, OPENAI_API_URL};
use crate::ai::prompt::DEFAULT_SYSTEM_PROMPT;
use crate::error::{PerfError, Result};
use crate::github::client::GITHUB_API_URL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const GITHUB_TOKEN_VAR: &str = "GITHUB_API_TOKEN";
pub const JIRA_TOKEN_VAR: &str = "JIRA_API_TOKEN";
pub const JIRA_USERNAME_VAR: &str = "JIRA_USERNAME";
pub const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// GitHub organization searched for pull requests
    pub org: String,

    /// GitHub login whose activity is summarized
    pub github_user: String,

    /// Jira display name used as reporter in ticket searches
    pub jira_user: String,

    /// Jira project key (e.g. "DX")
    #[serde(default = "default_project")]
    pub jira_project: String,

    /// Jira site root, e.g. https://example.atlassian.net
    pub jira_url: String,

    /// GitHub API root
    #[serde(default = "default_github_api_url")]
    pub github_api_url: String,

    /// OpenAI API root
    #[serde(default = "default_openai_api_url")]
    pub openai_api_url: String,

    /// Completion model
    #[serde(default = "default_model")]
    pub model: String,

    /// File holding the system prompt
    #[serde(default = "default_prompt_path")]
    pub prompt_path: PathBuf,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from the default location (~/.config/perf-digest/config.toml)
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PerfError::config(format!(
                "Config file not found at: {}",
                path.display()
            )));
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Get the default config directory
    pub fn default_config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| PerfError::config("Could not determine home directory"))?;
        Ok(home.join(".config").join("perf-digest"))
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::default_config_dir()?.join("config.toml"))
    }

    /// Write a default config and system prompt into `dir`
    pub fn create_default_in(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;

        let config = Self {
            prompt_path: dir.join("prompt.md"),
            ..Self::default()
        };
        let toml_string = toml::to_string_pretty(&config)?;
        fs::write(dir.join("config.toml"), toml_string)?;

        if !config.prompt_path.exists() {
            fs::write(&config.prompt_path, DEFAULT_SYSTEM_PROMPT)?;
        }

        Ok(config)
    }

    /// Create a default configuration file at the default location
    pub fn create_default() -> Result<Self> {
        Self::create_default_in(&Self::default_config_dir()?)
    }

    /// Load config from file, or create default if it doesn't exist
    pub fn load_or_create_default() -> Result<Self> {
        match Self::load() {
            Ok(config) => Ok(config),
            Err(PerfError::Config(_)) => {
                eprintln!("Config file not found. Creating default config...");
                Self::create_default()
            }
            Err(e) => Err(e),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("org", &self.org),
            ("github_user", &self.github_user),
            ("jira_user", &self.jira_user),
            ("jira_project", &self.jira_project),
            ("jira_url", &self.jira_url),
        ] {
            if value.trim().is_empty() {
                return Err(PerfError::config(format!("{} is required", name)));
            }
        }

        if !self.jira_url.starts_with("http://") && !self.jira_url.starts_with("https://") {
            return Err(PerfError::config("jira_url must be an http(s) URL"));
        }

        if self.request_timeout_secs == 0 {
            return Err(PerfError::config("request_timeout_secs must be > 0"));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            org: String::new(),
            github_user: String::new(),
            jira_user: String::new(),
            jira_project: default_project(),
            jira_url: String::from("https://YOUR_SITE.atlassian.net"),
            github_api_url: default_github_api_url(),
            openai_api_url: default_openai_api_url(),
            model: default_model(),
            prompt_path: default_prompt_path(),
            request_timeout_secs: default_timeout(),
        }
    }
}

/// API credentials, read from the environment only
#[derive(Clone)]
pub struct Credentials {
    pub github_token: String,
    pub jira_token: String,
    pub jira_username: String,
    pub openai_api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("jira_username", &self.jira_username)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    /// Read all four variables from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through `lookup`; the first missing or empty variable is an error
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| PerfError::MissingEnv(name.to_string()))
        };

        Ok(Self {
            github_token: get(GITHUB_TOKEN_VAR)?,
            jira_token: get(JIRA_TOKEN_VAR)?,
            jira_username: get(JIRA_USERNAME_VAR)?,
            openai_api_key: get(OPENAI_KEY_VAR)?,
        })
    }
}

// Serde default functions
fn default_project() -> String {
    "DX".to_string()
}

fn default_github_api_url() -> String {
    GITHUB_API_URL.to_string()
}

fn default_openai_api_url() -> String {
    OPENAI_API_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_prompt_path() -> PathBuf {
    PathBuf::from("prompt")
}

fn default_timeout() -> u64 {
    60
}
