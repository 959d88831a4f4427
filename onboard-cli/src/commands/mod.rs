//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod contact;
mod init;
mod ingest;
mod issue;
mod pipeline;
mod report;
mod snapshot;

pub use contact::ContactCommands;
pub use init::InitCommands;
pub use issue::IssueCommands;
pub use pipeline::PipelineCommands;

use anyhow::Result;
use clap::Subcommand;
use onboard_core::PipelineKind;
use std::path::PathBuf;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Pipeline management
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommands,
    },
    /// Validate a CSV or xlsx upload, optionally committing the accepted rows
    Ingest {
        /// CSV or xlsx file to read; xlsx is picked by extension
        file: PathBuf,

        /// Pipeline kind the file describes
        #[arg(short, long)]
        kind: PipelineKind,

        /// Save accepted rows to the board
        #[arg(long)]
        commit: bool,
    },
    /// Show board counts
    Report {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show which stage a status text falls into
    Classify {
        /// Free-text status
        text: String,
    },
    /// Issue tracking
    Issue {
        #[command(subcommand)]
        command: IssueCommands,
    },
    /// Contact management
    Contact {
        #[command(subcommand)]
        command: ContactCommands,
    },
    /// Write a snapshot of the board
    Export {
        /// Destination file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace the board with a snapshot
    Restore {
        /// Snapshot file produced by `export`
        file: PathBuf,
    },
    /// Generate starter files
    Init {
        #[command(subcommand)]
        command: InitCommands,
    },
}

/// Route a command to its handler module
///
/// # Arguments
/// * `command` - The parsed top-level command
/// * `config` - The CLI configuration
pub fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Pipeline { command } => pipeline::handle_pipeline_command(command, config),
        Commands::Ingest { file, kind, commit } => ingest::ingest_file(config, &file, kind, commit),
        Commands::Report { json } => report::show_report(config, json),
        Commands::Classify { text } => report::classify_text(config, &text),
        Commands::Issue { command } => issue::handle_issue_command(command, config),
        Commands::Contact { command } => contact::handle_contact_command(command, config),
        Commands::Export { output } => snapshot::export(config, output.as_deref()),
        Commands::Restore { file } => snapshot::restore(config, &file),
        Commands::Init { command } => init::handle_init_command(command),
    }
}
