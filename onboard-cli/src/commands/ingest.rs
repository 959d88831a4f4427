//! Ingest command handler
//!
//! Reads a CSV or xlsx upload, reports every rejected row with its line number, and
//! commits the accepted rows when asked to.

use anyhow::{Context, Result};
use colored::*;
use onboard_core::PipelineKind;
use onboard_core::ingest::{IngestOutcome, TableFormat, read_table};
use std::fs;
use std::path::Path;

use crate::config::Config;

/// Validate an upload and optionally commit the accepted rows
///
/// The format is picked from the file extension: `.xlsx`/`.xlsm` are read as
/// workbooks, anything else as CSV.
///
/// # Arguments
/// * `config` - The CLI configuration
/// * `path` - The upload to read
/// * `kind` - Which pipeline kind the upload holds
/// * `commit` - Save the accepted rows instead of only previewing them
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The header row is missing a required column
/// - Saving the board fails
///
/// Rejected rows are printed, not returned as errors.
pub fn ingest_file(config: &Config, path: &Path, kind: PipelineKind, commit: bool) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let format = TableFormat::from_path(path);
    tracing::debug!(%format, path = %path.display(), "Reading upload");
    let rows = read_table(&bytes, kind, format)
        .with_context(|| format!("Rejected upload {}", path.display()))?;

    let mut board = config.open_board()?;
    let outcome = board.preview_ingest(kind, rows);
    print_outcome(&outcome);

    if !commit {
        if !outcome.accepted.is_empty() {
            println!();
            println!("Re-run with {} to save the accepted rows.", "--commit".cyan());
        }
        return Ok(());
    }

    if outcome.accepted.is_empty() {
        println!("{}", "Nothing to commit.".yellow());
        return Ok(());
    }

    let count = board.commit(kind, outcome.accepted)?;
    println!(
        "{}",
        format!("✓ Committed {} {} pipeline(s)", count, kind)
            .green()
            .bold()
    );
    Ok(())
}

fn print_outcome(outcome: &IngestOutcome) {
    println!(
        "{} accepted, {} rejected",
        outcome.accepted.len().to_string().green().bold(),
        outcome.rejected.len().to_string().red().bold()
    );

    for pipeline in &outcome.accepted {
        println!("  {} {}", "✓".green(), pipeline.name());
    }

    for rejected in &outcome.rejected {
        let name = rejected.row.get("pipeline_name").unwrap_or("<unnamed>");
        println!(
            "  {} line {}: {}",
            "✗".red(),
            rejected.row.line,
            name.bold()
        );
        for error in &rejected.errors {
            println!("      {}", error.to_string().dimmed());
        }
    }
}
