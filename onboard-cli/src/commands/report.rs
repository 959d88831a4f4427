//! Report and classify command handlers

use anyhow::Result;
use colored::*;
use onboard_core::Report;

use super::pipeline::stage_label;
use crate::config::Config;

/// Print stage and kind counts, issues and contact engagement
///
/// # Arguments
/// * `config` - The CLI configuration
/// * `json` - Print the report as JSON instead of tables
pub fn show_report(config: &Config, json: bool) -> Result<()> {
    let board = config.open_board()?;
    let report = board.report(&config.rules()?);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Print the stage a status text classifies as
///
/// # Errors
/// Returns an error if the configured rules file cannot be loaded.
pub fn classify_text(config: &Config, text: &str) -> Result<()> {
    let stage = config.rules()?.classify(text);
    println!("{}", stage_label(stage));
    Ok(())
}

fn print_report(report: &Report) {
    println!("{}", "Pipelines".bold());
    println!(
        "  {:<12} {:>6} {:>10} {:>6}",
        "Stage".dimmed(),
        "Batch".dimmed(),
        "Streaming".dimmed(),
        "Total".dimmed()
    );
    for row in &report.distribution {
        println!(
            "  {:<12} {:>6} {:>10} {:>6}",
            row.stage.to_string(),
            row.batch,
            row.streaming,
            row.batch + row.streaming
        );
    }
    println!(
        "  {:<12} {:>6} {:>10} {:>6}",
        "Total".bold(),
        report.kinds.batch,
        report.kinds.streaming,
        report.kinds.total()
    );
    println!();

    let issues = &report.issues;
    println!("{}", "Issues".bold());
    println!(
        "  {} total, {} open, {} blocked, {} resolved",
        issues.total,
        issues.open.to_string().yellow(),
        issues.blocked.to_string().red(),
        issues.resolved.to_string().green()
    );
    println!("  Blocked days on open issues: {}", issues.open_blocked_days);
    for entry in &issues.per_pipeline {
        let marker = if entry.orphaned {
            " (no such pipeline)".red().to_string()
        } else {
            String::new()
        };
        println!(
            "    {} {}: {} open, {} blocked day(s){}",
            "▸".cyan(),
            entry.pipeline_name,
            entry.open,
            entry.blocked_days,
            marker
        );
    }
    if !issues.orphaned.is_empty() {
        println!("  {}", "Orphaned:".yellow());
        for orphan in &issues.orphaned {
            println!(
                "    {} {} [{}] -> {}",
                orphan.id.to_string()[..8].dimmed(),
                orphan.title,
                orphan.status,
                orphan.linked_pipeline
            );
        }
    }
    println!();

    let contacts = &report.contacts;
    println!("{}", "Contacts".bold());
    println!(
        "  {} producer, {} internal",
        contacts.producer, contacts.internal
    );
    for team in &contacts.by_team {
        let label = if team.team.is_empty() { "-" } else { team.team.as_str() };
        println!("    {} {} / {}: {}", "▸".cyan(), team.role, label, team.count);
    }
}
