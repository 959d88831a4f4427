//! Init command handlers
//!
//! Generates CSV templates users fill in and upload with `onboard ingest`.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use onboard_core::PipelineKind;
use onboard_core::ingest::write_template;
use std::fs::{self, File};
use std::path::Path;

/// Init subcommands
#[derive(Subcommand)]
pub enum InitCommands {
    /// Write one upload template per pipeline kind
    Templates {
        /// Output directory for generated files
        #[arg(short, long, default_value = ".")]
        output: String,
    },
}

/// Handle init commands
///
/// # Arguments
/// * `command` - The init command to execute
///
/// # Errors
/// Returns an error if the output directory or a template cannot be written.
pub fn handle_init_command(command: InitCommands) -> Result<()> {
    match command {
        InitCommands::Templates { output } => generate_templates(Path::new(&output)),
    }
}

fn generate_templates(output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory {}", output_dir.display()))?;

    for kind in PipelineKind::ALL {
        let path = output_dir.join(format!("{}_template.csv", kind));
        let file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        write_template(file, kind)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("  {} {}", "Created".green(), path.display());
    }

    println!();
    println!("{}", "Next steps:".bold());
    println!("  1. Replace the example rows with your pipelines");
    println!(
        "  2. Check them with {}",
        "onboard ingest <file> --kind <batch|streaming>".cyan()
    );
    println!("  3. Add {} to save the accepted rows", "--commit".cyan());

    Ok(())
}
