//! Atlas Fetcher CLI application
//!
//! Command-line interface for fetching RIPE Atlas daily measurement archives
//! and filtering them into per-day JSON documents.

use std::process;

use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use atlas_fetcher::cli::{error_hint, handle_config, handle_plan, handle_run, Cli, Commands};
use atlas_fetcher::config::AppConfig;
use atlas_fetcher::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error ({}): {}", e.category(), e);
        if let Some(hint) = error_hint(&e) {
            eprintln!("Hint: {}", hint);
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();
    let config = AppConfig::load(cli.global.config.clone()).await?;

    init_logging(&cli, &config.logging.level);
    info!("Atlas Fetcher v{} starting", env!("CARGO_PKG_VERSION"));

    let quiet = cli.global.quiet;
    match cli.command {
        Commands::Run(args) => {
            debug!("Executing run command");
            handle_run(args, config, quiet).await
        }
        Commands::Plan(args) => {
            debug!("Executing plan command");
            handle_plan(args, config).await
        }
        Commands::Config(args) => {
            debug!("Executing config command");
            handle_config(args, config).await
        }
    }
}

/// Initialize logging from CLI flags and the configured level
fn init_logging(cli: &Cli, configured_level: &str) {
    let log_level = cli.log_level(configured_level);

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("atlas_fetcher={}", log_level).parse() {
        filter = filter.add_directive(directive);
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .with_writer(std::io::stderr)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
