//! Onboard CLI
//!
//! Command-line interface over a local onboarding board file.

mod commands;
mod config;
mod id_resolver;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "onboard")]
#[command(about = "Pipeline onboarding tracker", long_about = None)]
struct Cli {
    /// Board document
    #[arg(long, global = true, env = "ONBOARD_STORE", default_value = "onboard.json")]
    store: PathBuf,

    /// JSON file overriding the status classification rules
    #[arg(long, global = true, env = "ONBOARD_RULES")]
    rules: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        store_path: cli.store,
        rules_path: cli.rules,
    };

    handle_command(cli.command, &config)
}
