use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use dropwatch::config::AppConfig;
use dropwatch::extractor::PriceExtractor;
use dropwatch::fetcher::HttpFetcher;
use dropwatch::notifier::EmailNotifier;
use dropwatch::orchestrator::ScanOrchestrator;
use dropwatch::scheduler::ScanScheduler;
use dropwatch::store::SqliteTrackerStore;
use dropwatch::web::{self, AppState};

#[derive(Parser)]
#[command(name = "dropwatch", about = "Price-drop monitoring pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server and the embedded scan scheduler (default)
    Serve,
    /// Run one scan and print the summary, for external cron setups
    Scan,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dropwatch=debug".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    let store = Arc::new(SqliteTrackerStore::connect(&config.database).await?);
    let fetcher = Arc::new(HttpFetcher::new(&config.fetcher)?);
    let notifier = Arc::new(EmailNotifier::new(&config.notifications.smtp)?);
    let orchestrator = Arc::new(ScanOrchestrator::new(
        store.clone(),
        fetcher.clone(),
        notifier,
        config.fetcher.max_concurrent_checks,
    ));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Scan => {
            let summary = orchestrator.run_scan().await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Serve => {
            info!("Starting Dropwatch...");

            let mut scheduler = None;
            if config.scheduler.enabled {
                let mut s = ScanScheduler::new(
                    Arc::clone(&orchestrator),
                    config.scheduler.clone(),
                )
                .await?;
                s.start().await?;
                scheduler = Some(s);
            }

            let state = AppState {
                store,
                fetcher,
                extractor: Arc::new(PriceExtractor::new()),
                orchestrator,
                config: config.clone(),
            };

            tokio::select! {
                result = web::serve(config, state) => result?,
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutting down...");
                }
            }

            if let Some(mut s) = scheduler {
                s.shutdown().await?;
            }
        }
    }

    Ok(())
}
