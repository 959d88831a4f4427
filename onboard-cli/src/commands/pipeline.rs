//! Pipeline command handlers
//!
//! Handles listing, viewing, adding, and deleting pipeline records.

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Subcommand};
use colored::*;
use onboard_core::domain::pipeline::{
    BatchDetails, Frequency, Pipeline, PipelineBase, PipelineDetails, PipelineKind,
    StreamingDetails,
};
use onboard_core::domain::time_of_day;
use onboard_core::{ClassificationRules, Stage};

use crate::config::Config;

/// Pipeline subcommands
#[derive(Subcommand)]
pub enum PipelineCommands {
    /// List pipelines
    List {
        /// Only list one kind
        #[arg(short, long)]
        kind: Option<PipelineKind>,
    },
    /// Show a pipeline
    Get {
        kind: PipelineKind,
        /// Pipeline name (case-insensitive)
        name: String,
    },
    /// Add a batch pipeline
    AddBatch {
        #[command(flatten)]
        base: BaseArgs,

        #[arg(long)]
        frequency: Frequency,

        /// Time of day the run starts (HH:MM)
        #[arg(long, value_parser = parse_time)]
        run_timestamp: NaiveTime,

        #[arg(long)]
        file_size_mb: f64,
    },
    /// Add a streaming pipeline
    AddStreaming {
        #[command(flatten)]
        base: BaseArgs,

        /// Window start (HH:MM)
        #[arg(long, value_parser = parse_time)]
        start_time: NaiveTime,

        /// Window end (HH:MM); earlier than the start means it ends the next day
        #[arg(long, value_parser = parse_time)]
        end_time: NaiveTime,

        #[arg(long)]
        rough_volume_mb: f64,
    },
    /// Delete a pipeline; its issues are kept
    Delete {
        kind: PipelineKind,
        name: String,
    },
}

/// Fields every pipeline carries
#[derive(Args)]
pub struct BaseArgs {
    #[arg(short, long)]
    name: String,

    /// Data file or feed name
    #[arg(short, long)]
    data: String,

    /// e.g. "Monday" or "Weekdays"
    #[arg(long)]
    run_day: String,

    #[arg(long)]
    uat_date: Option<NaiveDate>,

    #[arg(long)]
    prod_date: Option<NaiveDate>,

    #[arg(long, default_value = "")]
    uat_status: String,

    #[arg(long, default_value = "")]
    prod_status: String,

    #[arg(long)]
    comment: Option<String>,
}

impl From<BaseArgs> for PipelineBase {
    fn from(args: BaseArgs) -> Self {
        let mut base = PipelineBase::new(args.name, args.data, args.run_day)
            .with_statuses(args.uat_status, args.prod_status);
        base.uat_date = args.uat_date;
        base.prod_date = args.prod_date;
        base.comment = args.comment.filter(|comment| !comment.trim().is_empty());
        base
    }
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    time_of_day::parse(s).ok_or_else(|| format!("invalid time '{}': expected HH:MM", s))
}

/// Handle pipeline commands
///
/// Routes pipeline subcommands to their respective handlers.
///
/// # Arguments
/// * `command` - The pipeline command to execute
/// * `config` - The CLI configuration
pub fn handle_pipeline_command(command: PipelineCommands, config: &Config) -> Result<()> {
    match command {
        PipelineCommands::List { kind } => list_pipelines(config, kind),
        PipelineCommands::Get { kind, name } => get_pipeline(config, kind, &name),
        PipelineCommands::AddBatch {
            base,
            frequency,
            run_timestamp,
            file_size_mb,
        } => add_pipeline(
            config,
            Pipeline::batch(
                base.into(),
                BatchDetails {
                    frequency,
                    run_timestamp,
                    file_size_mb,
                },
            ),
        ),
        PipelineCommands::AddStreaming {
            base,
            start_time,
            end_time,
            rough_volume_mb,
        } => add_pipeline(
            config,
            Pipeline::streaming(
                base.into(),
                StreamingDetails {
                    start_time,
                    end_time,
                    rough_volume_mb,
                },
            ),
        ),
        PipelineCommands::Delete { kind, name } => delete_pipeline(config, kind, &name),
    }
}

fn list_pipelines(config: &Config, only: Option<PipelineKind>) -> Result<()> {
    let board = config.open_board()?;
    let rules = config.rules()?;

    let kinds: Vec<PipelineKind> = match only {
        Some(kind) => vec![kind],
        None => PipelineKind::ALL.to_vec(),
    };

    for kind in kinds {
        let pipelines = board.document().pipelines(kind);
        if pipelines.is_empty() {
            println!("{}", format!("No {} pipelines.", kind).yellow());
            println!();
            continue;
        }

        println!(
            "{}",
            format!("{} {} pipeline(s):", pipelines.len(), kind).bold()
        );
        println!();
        for pipeline in pipelines {
            print_pipeline_summary(pipeline, &rules);
        }
    }

    Ok(())
}

fn get_pipeline(config: &Config, kind: PipelineKind, name: &str) -> Result<()> {
    let board = config.open_board()?;
    let rules = config.rules()?;

    let pipeline = board
        .document()
        .find_pipeline(kind, name)
        .ok_or_else(|| anyhow::anyhow!("No {} pipeline named '{}'", kind, name))?;

    print_pipeline_details(pipeline, &rules);
    Ok(())
}

fn add_pipeline(config: &Config, pipeline: Pipeline) -> Result<()> {
    let mut board = config.open_board()?;
    let kind = pipeline.kind();
    let name = pipeline.name().to_string();

    board.add_pipeline(pipeline)?;

    println!(
        "{}",
        format!("✓ Added {} pipeline '{}'", kind, name).green().bold()
    );
    Ok(())
}

fn delete_pipeline(config: &Config, kind: PipelineKind, name: &str) -> Result<()> {
    let mut board = config.open_board()?;

    let removed = board.remove_pipeline(kind, name)?;

    println!(
        "{}",
        format!("✓ Deleted {} pipeline '{}'", kind, removed.name())
            .green()
            .bold()
    );

    let linked = board
        .document()
        .issues
        .iter()
        .filter(|issue| issue.linked_pipeline.trim().eq_ignore_ascii_case(removed.name().trim()))
        .count();
    if linked > 0 {
        println!(
            "  {}",
            format!("{} issue(s) still link to this name", linked).yellow()
        );
    }

    Ok(())
}

/// Stage name colored by how far along it is
pub fn stage_label(stage: Stage) -> ColoredString {
    let label = stage.to_string();
    match stage {
        Stage::Planned => label.blue(),
        Stage::Uat => label.yellow(),
        Stage::Production => label.green(),
        Stage::Finalized => label.dimmed(),
    }
}

fn print_pipeline_summary(pipeline: &Pipeline, rules: &ClassificationRules) {
    println!(
        "  {} {} [{}]",
        "▸".cyan(),
        pipeline.name().bold(),
        stage_label(rules.effective_stage(pipeline))
    );
    println!("    Data:    {}", pipeline.base.data_name.dimmed());
    println!("    Runs:    {}", schedule(pipeline).dimmed());
    println!();
}

fn print_pipeline_details(pipeline: &Pipeline, rules: &ClassificationRules) {
    let base = &pipeline.base;
    let date = |date: Option<NaiveDate>| date.map(|d| d.to_string()).unwrap_or_else(|| "-".into());

    println!("{}", "Pipeline Details:".bold());
    println!("  Name:        {}", base.pipeline_name.cyan());
    println!("  Kind:        {}", pipeline.kind());
    println!("  Stage:       {}", stage_label(rules.effective_stage(pipeline)));
    println!("  Data:        {}", base.data_name);
    println!("  Runs:        {}", schedule(pipeline));
    match &pipeline.details {
        PipelineDetails::Batch(details) => {
            println!("  File size:   {} MB", details.file_size_mb);
        }
        PipelineDetails::Streaming(details) => {
            println!("  Volume:      {} MB", details.rough_volume_mb);
        }
    }
    println!("  UAT:         {} ({})", date(base.uat_date), base.uat_status);
    println!("  PROD:        {} ({})", date(base.prod_date), base.prod_status);
    if let Some(comment) = &base.comment {
        println!("  Comment:     {}", comment);
    }
}

fn schedule(pipeline: &Pipeline) -> String {
    match &pipeline.details {
        PipelineDetails::Batch(details) => format!(
            "{} on {} at {}",
            details.frequency,
            pipeline.base.run_day,
            time_of_day::format(&details.run_timestamp)
        ),
        PipelineDetails::Streaming(details) => format!(
            "{} {}-{}{}",
            pipeline.base.run_day,
            time_of_day::format(&details.start_time),
            time_of_day::format(&details.end_time),
            if details.crosses_midnight() { " (+1 day)" } else { "" }
        ),
    }
}
