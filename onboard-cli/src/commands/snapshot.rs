//! Snapshot command handlers
//!
//! `export` writes the persisted document byte for byte; `restore` replaces
//! the board after validating the snapshot.

use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::config::Config;

/// Write the persisted document byte for byte
///
/// # Arguments
/// * `config` - The CLI configuration
/// * `output` - Destination file; stdout when `None`
///
/// # Errors
/// Returns an error if the store cannot be read or the output cannot be written.
pub fn export(config: &Config, output: Option<&Path>) -> Result<()> {
    let snapshot = config
        .store()
        .export_snapshot()
        .context("Failed to export board")?;

    match output {
        Some(path) => {
            fs::write(path, &snapshot)
                .with_context(|| format!("Failed to write snapshot to {}", path.display()))?;
            eprintln!(
                "{}",
                format!("✓ Exported board to {}", path.display()).green().bold()
            );
        }
        None => io::stdout().write_all(&snapshot)?,
    }
    Ok(())
}

/// Replace the board with a snapshot file
///
/// # Arguments
/// * `config` - The CLI configuration
/// * `path` - The snapshot to restore
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The snapshot is not a valid document
/// - Saving the board fails
///
/// The board is left unchanged on any error.
pub fn restore(config: &Config, path: &Path) -> Result<()> {
    let snapshot =
        fs::read(path).with_context(|| format!("Failed to read snapshot {}", path.display()))?;

    let mut board = config.open_board()?;
    board
        .restore(&snapshot)
        .with_context(|| format!("Snapshot {} was not restored", path.display()))?;

    let document = board.document();
    println!("{}", "✓ Board restored".green().bold());
    println!("  Pipelines: {}", document.pipeline_count());
    println!("  Contacts:  {}", document.contacts.len());
    println!("  Issues:    {}", document.issues.len());
    Ok(())
}
