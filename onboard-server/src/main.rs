//! Onboard Server
//!
//! HTTP API over a single onboarding board document.

use onboard_core::{Board, ClassificationRules, DocumentStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "onboard_server=debug,onboard_core=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Onboard Server...");

    let config = Config::from_env();
    let addr = match config.validate() {
        Ok(addr) => addr,
        Err(err) => {
            tracing::error!("Invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    let rules = match load_rules(&config) {
        Ok(rules) => rules,
        Err(err) => {
            tracing::error!("Failed to load classification rules: {}", err);
            std::process::exit(1);
        }
    };

    tracing::info!("Opening board at {}", config.store_path.display());

    let board = match Board::open(DocumentStore::new(&config.store_path)) {
        Ok(board) => board,
        Err(err) => {
            tracing::error!("Failed to open board: {}", err);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Board loaded: {} pipeline(s), {} issue(s)",
        board.document().pipeline_count(),
        board.document().issues.len()
    );

    // Build router with all API endpoints
    let app = api::create_router(AppState::new(board, rules));

    tracing::info!("Listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("Failed to bind to {}: {}", addr, err);
            std::process::exit(1);
        }
    };

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", err);
        std::process::exit(1);
    }
}

fn load_rules(config: &Config) -> Result<ClassificationRules, String> {
    let Some(path) = &config.rules_path else {
        return Ok(ClassificationRules::default());
    };
    let text = std::fs::read_to_string(path).map_err(|err| format!("{}: {}", path.display(), err))?;
    ClassificationRules::from_json(&text).map_err(|err| format!("{}: {}", path.display(), err))
}
