//! Command handlers for Atlas Fetcher CLI
//!
//! This module implements the command handlers that connect CLI arguments
//! and the loaded configuration to the core application functionality.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::app::{AtlasClient, Coordinator, FetchOutcome, ProcessOutcome, SessionResult};
use crate::cli::{ConfigAction, ConfigArgs, PlanArgs, ProgressDisplay, RunArgs};
use crate::config::AppConfig;
use crate::constants::workers::CHANNEL_BUFFER_SIZE;
use crate::errors::{AppError, Result};

/// Handle the run command
///
/// Fetches every archive in the window, then processes the ones that are
/// available locally. Per-day failures are listed but do not fail the
/// command; only pre-flight errors do.
pub async fn handle_run(args: RunArgs, mut config: AppConfig, quiet: bool) -> Result<()> {
    args.apply_to(&mut config);
    let window = args.window.to_window()?;

    let (client_config, coordinator_config) = config.to_runtime_config();
    let coordinator_config = coordinator_config.with_fetch_only(args.fetch_only);
    let client = Arc::new(AtlasClient::with_config(client_config)?);

    info!(
        "Starting run over {} days with {} workers",
        window.len(),
        coordinator_config.worker_count
    );

    let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
    let display = ProgressDisplay::new(quiet).spawn(rx);

    let outcome = Coordinator::new(coordinator_config, client)
        .with_progress(tx)
        .execute(&window)
        .await;

    // The coordinator owned the only sender, so the display winds down here
    if let Err(e) = display.await {
        warn!("Progress display stopped unexpectedly: {}", e);
    }

    let result = outcome?;
    print_session(&result);
    Ok(())
}

/// Handle the plan command
///
/// Prints each archive URL with the local path it would be stored at.
/// Nothing is fetched and no directories are created.
pub async fn handle_plan(args: PlanArgs, mut config: AppConfig) -> Result<()> {
    args.dataset.apply_to(&mut config);
    let window = args.window.to_window()?;

    let (_, coordinator_config) = config.to_runtime_config();
    let raw_dir = coordinator_config.storage.raw_dir.clone();
    let locator = coordinator_config.locator()?;

    println!(
        "📋 {} archives from {} to {}",
        window.len(),
        window.start(),
        window.end()
    );
    for day in window.days() {
        let descriptor = locator.locate(day);
        let local = descriptor.raw_path(&raw_dir);
        println!("  {} -> {}", descriptor.url, local.display());
    }
    Ok(())
}

/// Handle configuration management commands
pub async fn handle_config(args: ConfigArgs, config: AppConfig) -> Result<()> {
    match args.action {
        ConfigAction::Init { force, path } => {
            let written = AppConfig::initialize(path, force).await?;
            println!("✅ Configuration written to {}", written.display());
            Ok(())
        }
        ConfigAction::Show => {
            let rendered = config.render()?;
            print!("{}", rendered);
            Ok(())
        }
    }
}

fn print_session(result: &SessionResult) {
    println!();
    println!("📊 Run summary");
    for line in result.summary().lines() {
        println!("   {}", line);
    }

    let failed_fetches: Vec<_> = result
        .fetches
        .iter()
        .filter(|(_, outcome)| !outcome.is_available())
        .collect();
    if !failed_fetches.is_empty() {
        println!();
        println!("⚠️  Archives not fetched:");
        for (day, outcome) in failed_fetches {
            println!("   {} {}", day, describe_fetch(outcome));
        }
    }

    let failed_processes: Vec<_> = result
        .processes
        .iter()
        .filter_map(|(day, outcome)| match outcome {
            ProcessOutcome::Failed(reason) => Some((day, reason)),
            _ => None,
        })
        .collect();
    if !failed_processes.is_empty() {
        println!();
        println!("⚠️  Archives not processed:");
        for (day, reason) in failed_processes {
            println!("   {} failed: {}", day, reason);
        }
    }

    if !result.has_failures() {
        println!();
        println!("✅ All archives available and processed");
    }
}

fn describe_fetch(outcome: &FetchOutcome) -> String {
    match outcome {
        FetchOutcome::NotFound { status } => format!("not found (HTTP {})", status),
        FetchOutcome::TransientError(reason) => format!("failed: {}", reason),
        other => other.label().to_string(),
    }
}

/// Map a pre-flight error to a hint for the user
pub fn error_hint(error: &AppError) -> Option<&'static str> {
    match error {
        AppError::Config(_) => {
            Some("Check the configuration with 'atlas_fetcher config show' and the command flags")
        }
        AppError::Io(_) => Some("Check that the storage directories are writable"),
        _ => None,
    }
}
