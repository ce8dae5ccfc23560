mod accumulator;
mod ai;
mod cli;
mod config;
mod dates;
mod error;
mod github;
mod jira;
mod orchestrator;

use ai::prompt::assemble_report;
use anyhow::{bail, Context};
use clap::Parser;
use cli::{Cli, Commands};
use config::{Config, Credentials};
use indicatif::{ProgressBar, ProgressStyle};
use orchestrator::Orchestrator;
use std::fs;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    // Validate CLI arguments
    if let Err(e) = cli.validate() {
        bail!("invalid arguments: {}", e);
    }

    // Handle subcommands
    if let Some(command) = &cli.command {
        return handle_command(command, &cli);
    }

    let config = load_config(&cli)?;
    let config = apply_cli_overrides(config, &cli);
    config.validate().context("invalid configuration")?;

    // All four credentials must be present before anything touches the network
    let credentials = Credentials::from_env().context("reading credentials from environment")?;

    run(config, credentials, &cli).await
}

async fn run(config: Config, credentials: Credentials, cli: &Cli) -> anyhow::Result<()> {
    let range = cli.date_range()?;
    info!(from = %range.from, to = %range.to, org = %config.org, user = %config.github_user, "starting");

    let orchestrator = Orchestrator::new(config, credentials).context("creating API clients")?;

    let pb = spinner("Fetching GitHub and Jira activity...")?;
    let report = orchestrator.gather(&range).await.context("gathering activity")?;
    pb.finish_with_message(format!(
        "Found {} new tickets, contributions to {} tickets, {} reviewed pull requests",
        report.new_tickets.len(),
        report.tickets.len(),
        report.reviews.len()
    ));
    debug!(?report, "gathered report");
    if report.is_empty() {
        warn!(from = %report.range.from, to = %report.range.to, "no activity found in range");
    }

    if let Some(path) = &cli.save_input {
        fs::write(path, assemble_report(&report))
            .with_context(|| format!("writing digest to {}", path.display()))?;
        info!(path = %path.display(), "saved digest");
    }

    if cli.dry_run {
        println!("{}", assemble_report(&report));
        return Ok(());
    }

    let pb = spinner("Generating summary...")?;
    let summary = orchestrator
        .summarize(&report)
        .await
        .context("generating summary")?;
    pb.finish_and_clear();

    println!("{}", summary.to_markdown());
    Ok(())
}

fn spinner(message: &'static str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load_or_create_default().context("loading config")?,
    };
    Ok(config)
}

fn handle_command(command: &Commands, cli: &Cli) -> anyhow::Result<()> {
    match command {
        Commands::Init { force } => {
            let config_path = Config::default_config_path()?;

            if config_path.exists() && !force {
                bail!(
                    "config file already exists at {} (use --force to overwrite)",
                    config_path.display()
                );
            }

            let config = Config::create_default()?;
            println!("✓ Created config file at: {}", config_path.display());
            println!("✓ System prompt at: {}", config.prompt_path.display());
            println!("\nFill in org, github_user, jira_user and jira_url, then export:");
            for var in [
                config::GITHUB_TOKEN_VAR,
                config::JIRA_TOKEN_VAR,
                config::JIRA_USERNAME_VAR,
                config::OPENAI_KEY_VAR,
            ] {
                println!("  {}", var);
            }
        }
        Commands::Config => {
            let config = apply_cli_overrides(load_config(cli)?, cli);
            let toml_str = toml::to_string_pretty(&config)?;
            println!("Current configuration:\n");
            println!("{}", toml_str);
        }
    }
    Ok(())
}

fn apply_cli_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(ref org) = cli.org {
        config.org = org.clone();
    }

    if let Some(ref user) = cli.user {
        config.github_user = user.clone();
    }

    if let Some(ref jira_user) = cli.jira_user {
        config.jira_user = jira_user.clone();
    }

    if let Some(ref project) = cli.project {
        config.jira_project = project.clone();
    }

    config
}
