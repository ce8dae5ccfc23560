use crate::dates::{parse_date, DateRange};
use crate::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "perf-digest")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "AI-written daily performance summary from GitHub and Jira activity",
    long_about = "perf-digest collects the pull requests you opened, updated and reviewed \
                  in a GitHub organization, groups them under the Jira tickets they refer to, \
                  and asks a language model to summarize the day."
)]
pub struct Cli {
    /// First day to report on (YYYY-MM-DD, default: today UTC)
    #[arg(long, value_name = "DATE")]
    pub from: Option<String>,

    /// Last day of the search window (YYYY-MM-DD, default: the day after --from)
    #[arg(long, value_name = "DATE")]
    pub to: Option<String>,

    /// GitHub organization
    #[arg(long)]
    pub org: Option<String>,

    /// GitHub login
    #[arg(short, long)]
    pub user: Option<String>,

    /// Jira display name of the reporter
    #[arg(long)]
    pub jira_user: Option<String>,

    /// Jira project key
    #[arg(short, long)]
    pub project: Option<String>,

    /// Path to config file (default: ~/.config/perf-digest/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also write the assembled digest to this file
    #[arg(long, value_name = "FILE")]
    pub save_input: Option<PathBuf>,

    /// Print the digest without calling the completion API
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize configuration file and system prompt
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration
    Config,
}

impl Cli {
    /// Resolve the reporting window from --from/--to
    pub fn date_range(&self) -> Result<DateRange> {
        match (&self.from, &self.to) {
            (Some(from), Some(to)) => DateRange::parse(from, to),
            (Some(from), None) => Ok(DateRange::single_day(parse_date(from)?)),
            (None, Some(to)) => DateRange::new(DateRange::today().from, parse_date(to)?),
            (None, None) => Ok(DateRange::today()),
        }
    }

    /// Validate CLI arguments
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.date_range().map(|_| ()).map_err(|e| e.to_string())
    }

    /// Default log filter for the verbosity level
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
