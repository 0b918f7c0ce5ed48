//! fraudguard: consume file references, evaluate them for fraud, persist and notify.

use anyhow::Context;
use clap::{Parser, Subcommand};
use fraudguard_core::Config;
use fraudguard_evaluators::ContentHeuristicEvaluator;
use fraudguard_worker::{init_telemetry, setup, QueueConsumer};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "fraudguard", about = "Fraud evaluation pipeline", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Consume the inbound queue until Ctrl+C or SIGTERM (default)
    Run,
    /// Run one message through the full pipeline and print the verdicts
    Process {
        /// Message body, e.g. '{"bucket":"b","key":"k","userId":"u"}'
        message: String,
    },
    /// Run only the content heuristic against a local file
    CheckContent {
        /// Path to the file to scan
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_telemetry()?;

    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run().await,
        Commands::Process { message } => process(&message).await,
        Commands::CheckContent { file } => check_content(file).await,
    }
}

fn load_config() -> anyhow::Result<Config> {
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    tracing::info!(
        environment = %config.environment,
        storage_backend = %config.storage.backend,
        evaluation_mode = %config.worker.evaluation_mode,
        on_failure = %config.worker.on_failure,
        "Configuration loaded"
    );
    Ok(config)
}

async fn run() -> anyhow::Result<()> {
    let config = load_config()?;
    let sqs = setup::sqs_client(&config).await;
    let driver = setup::build_driver(&config, sqs.clone()).await?;

    let consumer = Arc::new(QueueConsumer::new(
        sqs,
        config.queue.clone(),
        &config.worker,
        driver,
    ));
    consumer.run(shutdown_signal()).await
}

async fn process(message: &str) -> anyhow::Result<()> {
    let config = load_config()?;
    let sqs = setup::sqs_client(&config).await;
    let driver = setup::build_driver(&config, sqs).await?;

    let report = driver.process_message(message).await?;
    println!("{}", serde_json::to_string_pretty(&report.to_json())?);
    Ok(())
}

async fn check_content(file: PathBuf) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(&file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let flagged = ContentHeuristicEvaluator::new().check(&bytes);
    println!(
        "{}",
        serde_json::json!({
            "file": file.display().to_string(),
            "contentFraud": flagged,
        })
    );
    Ok(())
}

/// Resolves on Ctrl+C (SIGINT) or SIGTERM.
///
/// # Panics
/// Panics if a signal handler cannot be installed.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal");
        },
    }

    tracing::info!("Shutting down gracefully...");
}
