use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use issue_triage::config::AppConfig;
use issue_triage::server::{create_router, AppState};
use issue_triage::shutdown::wait_for_shutdown;

#[derive(Parser)]
#[command(name = "triage", about = "LLM-powered GitHub issue triage")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the webhook endpoint (default)
    Serve {
        /// Log labels and comments instead of sending them to GitHub
        #[arg(long)]
        dry_run: bool,
    },
    /// Run a single webhook or API Gateway event from a file and print the response
    Invoke {
        /// JSON file holding the event
        #[arg(long)]
        event: PathBuf,
        /// Log labels and comments instead of sending them to GitHub
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Serve { dry_run: false }) {
        Command::Serve { dry_run } => serve(config, dry_run).await,
        Command::Invoke { event, dry_run } => invoke(config, &event, dry_run).await,
    }
}

async fn serve(config: AppConfig, dry_run: bool) -> anyhow::Result<()> {
    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        threshold = config.routing.confidence_threshold,
        "Starting triage server"
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, dry_run)?);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn invoke(config: AppConfig, event_path: &Path, dry_run: bool) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(event_path).await?;
    let event: serde_json::Value = serde_json::from_str(&raw)?;

    let state = AppState::new(config, dry_run)?;
    let response = issue_triage::lambda::handle_event(&state, event).await;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
