//! Issue command handlers

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Subcommand;
use colored::*;
use onboard_core::domain::issue::{Issue, IssueStatus};

use crate::config::Config;
use crate::id_resolver::resolve_issue_id;

/// Issue subcommands
#[derive(Subcommand)]
pub enum IssueCommands {
    /// List issues
    List {
        /// Include resolved issues
        #[arg(short, long)]
        all: bool,
    },
    /// Raise an issue against a pipeline
    Add {
        #[arg(short, long)]
        title: String,

        /// Name of the affected pipeline
        #[arg(short, long)]
        pipeline: String,

        #[arg(short, long, default_value = "")]
        description: String,

        /// Defaults to today
        #[arg(long)]
        opened: Option<NaiveDate>,
    },
    /// Change an issue's status
    Status {
        /// Issue ID or unambiguous prefix
        id: String,

        /// open, blocked or resolved
        status: IssueStatus,

        /// Days the issue has been blocking
        #[arg(long)]
        blocked_days: Option<u32>,
    },
    /// Delete an issue
    Delete {
        /// Issue ID or unambiguous prefix
        id: String,
    },
}

/// Handle issue commands
///
/// Issue IDs may be given as unambiguous prefixes.
///
/// # Arguments
/// * `command` - The issue command to execute
/// * `config` - The CLI configuration
pub fn handle_issue_command(command: IssueCommands, config: &Config) -> Result<()> {
    match command {
        IssueCommands::List { all } => list_issues(config, all),
        IssueCommands::Add {
            title,
            pipeline,
            description,
            opened,
        } => add_issue(config, title, pipeline, description, opened),
        IssueCommands::Status {
            id,
            status,
            blocked_days,
        } => set_status(config, &id, status, blocked_days),
        IssueCommands::Delete { id } => delete_issue(config, &id),
    }
}

fn list_issues(config: &Config, all: bool) -> Result<()> {
    let board = config.open_board()?;
    let document = board.document();

    let issues: Vec<&Issue> = document
        .issues
        .iter()
        .filter(|issue| all || issue.status.is_open())
        .collect();

    if issues.is_empty() {
        println!("{}", "No issues found.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} issue(s):", issues.len()).bold());
    println!();
    for issue in issues {
        let status = match issue.status {
            IssueStatus::Open => issue.status.to_string().yellow(),
            IssueStatus::Blocked => issue.status.to_string().red(),
            IssueStatus::Resolved => issue.status.to_string().green(),
        };
        println!("  {} {} [{}]", "▸".cyan(), issue.title.bold(), status);
        println!("    ID:       {}", issue.id.to_string().dimmed());
        let orphan = if document.has_pipeline_named(&issue.linked_pipeline) {
            String::new()
        } else {
            " (no such pipeline)".red().to_string()
        };
        println!("    Pipeline: {}{}", issue.linked_pipeline, orphan);
        println!("    Opened:   {}", issue.opened_date);
        if issue.blocked_days > 0 {
            println!("    Blocked:  {} day(s)", issue.blocked_days);
        }
        if !issue.description.is_empty() {
            println!("    {}", issue.description.dimmed());
        }
        println!();
    }

    Ok(())
}

fn add_issue(
    config: &Config,
    title: String,
    pipeline: String,
    description: String,
    opened: Option<NaiveDate>,
) -> Result<()> {
    let mut board = config.open_board()?;

    let mut issue = Issue::new(
        title,
        pipeline,
        opened.unwrap_or_else(|| Local::now().date_naive()),
    );
    issue.description = description;
    let linked_exists = board.document().has_pipeline_named(&issue.linked_pipeline);

    let id = board.add_issue(issue)?;

    println!("{}", "✓ Issue recorded".green().bold());
    println!("  ID: {}", id.to_string().cyan());
    if !linked_exists {
        println!(
            "  {}",
            "No pipeline with that name is on the board yet".yellow()
        );
    }
    Ok(())
}

fn set_status(
    config: &Config,
    id: &str,
    status: IssueStatus,
    blocked_days: Option<u32>,
) -> Result<()> {
    let mut board = config.open_board()?;
    let id = resolve_issue_id(&board.document().issues, id)?;

    let issue = board.set_issue_status(id, status, blocked_days)?;

    println!(
        "{}",
        format!("✓ Issue '{}' is now {}", issue.title, issue.status)
            .green()
            .bold()
    );
    Ok(())
}

fn delete_issue(config: &Config, id: &str) -> Result<()> {
    let mut board = config.open_board()?;
    let id = resolve_issue_id(&board.document().issues, id)?;

    let issue = board.remove_issue(id)?;

    println!(
        "{}",
        format!("✓ Issue '{}' deleted", issue.title).green().bold()
    );
    Ok(())
}
