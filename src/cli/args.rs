//! Command-line argument parsing for Atlas Fetcher
//!
//! This module defines the CLI structure using clap derive macros. Every
//! flag that mirrors a configuration setting is optional; when given it
//! overrides the value loaded from the config file and environment.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::app::models::{DatasetSubtype, ProtocolFamily};
use crate::app::DateWindow;
use crate::config::AppConfig;
use crate::errors::ConfigResult;

/// Atlas Fetcher - Download and filter RIPE Atlas daily archives
#[derive(Parser, Debug)]
#[command(
    name = "atlas_fetcher",
    version,
    about = "Download and filter RIPE Atlas daily measurement archives",
    long_about = "Fetches one compressed measurement archive per day over a date window, then
streams each archive through a record filter and writes one JSON document per day.
Runs are resumable: archives and documents already on disk are never fetched or
processed twice."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (trace level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - warnings only, no progress bars
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch and process every archive in a date window
    Run(RunArgs),

    /// Show the archives a run would fetch, without touching the network
    Plan(PlanArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Inclusive date window
#[derive(Args, Debug, Clone)]
pub struct WindowArgs {
    /// First day (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub start: String,

    /// Last day (YYYY-MM-DD), defaults to the first day
    #[arg(long, value_name = "DATE")]
    pub end: Option<String>,
}

/// Dataset, server and storage selection shared by `run` and `plan`
#[derive(Args, Debug, Clone, Default)]
pub struct DatasetArgs {
    /// Protocol family: v4 or v6
    #[arg(long)]
    pub protocol: Option<ProtocolFamily>,

    /// Dataset subtype: builtin or udm
    #[arg(long)]
    pub subtype: Option<DatasetSubtype>,

    /// Measurement kind prefixed to archive names (e.g. ping)
    #[arg(long)]
    pub measurement: Option<String>,

    /// Archive server root URL
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Directory for raw archives
    #[arg(long, value_name = "DIR")]
    pub raw_dir: Option<PathBuf>,

    /// Directory for parsed documents
    #[arg(long, value_name = "DIR")]
    pub parsed_dir: Option<PathBuf>,
}

/// Arguments for the run command
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub window: WindowArgs,

    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Number of concurrent workers per phase
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Keep records whose metric is strictly greater than this
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Record field holding the metric
    #[arg(long, value_name = "FIELD")]
    pub metric_field: Option<String>,

    /// Stop after fetching; do not process archives
    #[arg(long)]
    pub fetch_only: bool,
}

/// Arguments for the plan command
#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    #[command(flatten)]
    pub window: WindowArgs,

    #[command(flatten)]
    pub dataset: DatasetArgs,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a commented default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,

        /// Where to write the file (defaults to the per-user location)
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,
    },

    /// Print the effective configuration
    Show,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level from flags, falling back to the configured one
    pub fn log_level(&self, configured: &str) -> tracing::Level {
        if self.global.quiet {
            tracing::Level::WARN
        } else if self.global.very_verbose {
            tracing::Level::TRACE
        } else if self.global.verbose {
            tracing::Level::DEBUG
        } else {
            configured.parse().unwrap_or(tracing::Level::INFO)
        }
    }
}

impl WindowArgs {
    pub fn to_window(&self) -> ConfigResult<DateWindow> {
        DateWindow::parse(&self.start, self.end.as_deref().unwrap_or(&self.start))
    }
}

impl DatasetArgs {
    /// Override configured values with the flags that were given
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(protocol) = self.protocol {
            config.pipeline.protocol = protocol;
        }
        if let Some(subtype) = self.subtype {
            config.pipeline.subtype = subtype;
        }
        if let Some(measurement) = &self.measurement {
            config.pipeline.measurement = measurement.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.pipeline.base_url = base_url.clone();
        }
        if let Some(raw_dir) = &self.raw_dir {
            config.storage.raw_dir = raw_dir.clone();
        }
        if let Some(parsed_dir) = &self.parsed_dir {
            config.storage.parsed_dir = parsed_dir.clone();
        }
    }
}

impl RunArgs {
    /// Override configured values with the flags that were given
    pub fn apply_to(&self, config: &mut AppConfig) {
        self.dataset.apply_to(config);
        if let Some(workers) = self.workers {
            config.pipeline.worker_count = workers;
        }
        if let Some(threshold) = self.threshold {
            config.filter.threshold = threshold;
        }
        if let Some(metric_field) = &self.metric_field {
            config.filter.metric_field = metric_field.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_args_parsing() {
        let cli = Cli::try_parse_from([
            "atlas_fetcher",
            "-v",
            "run",
            "--start",
            "2025-10-01",
            "--end",
            "2025-10-07",
            "--protocol",
            "v6",
            "--subtype",
            "udm",
            "-w",
            "4",
            "--threshold",
            "80",
            "--fetch-only",
        ])
        .unwrap();

        assert!(cli.global.verbose);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.window.to_window().unwrap().len(), 7);
        assert_eq!(args.dataset.protocol, Some(ProtocolFamily::V6));
        assert_eq!(args.dataset.subtype, Some(DatasetSubtype::Udm));
        assert_eq!(args.workers, Some(4));
        assert!(args.fetch_only);
    }

    #[test]
    fn test_invalid_protocol_is_rejected() {
        let result = Cli::try_parse_from([
            "atlas_fetcher",
            "plan",
            "--start",
            "2025-10-01",
            "--protocol",
            "v5",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_end_defaults_to_start() {
        let window = WindowArgs {
            start: "2025-10-01".to_string(),
            end: None,
        };
        assert_eq!(window.to_window().unwrap().len(), 1);

        let reversed = WindowArgs {
            start: "2025-10-02".to_string(),
            end: Some("2025-10-01".to_string()),
        };
        assert!(reversed.to_window().is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let args = RunArgs {
            window: WindowArgs {
                start: "2025-10-01".to_string(),
                end: None,
            },
            dataset: DatasetArgs {
                measurement: Some("traceroute".to_string()),
                raw_dir: Some(PathBuf::from("/tmp/raw")),
                ..Default::default()
            },
            workers: Some(2),
            threshold: None,
            metric_field: Some("max".to_string()),
            fetch_only: false,
        };

        let mut config = AppConfig::default();
        args.apply_to(&mut config);

        assert_eq!(config.pipeline.measurement, "traceroute");
        assert_eq!(config.pipeline.worker_count, 2);
        assert_eq!(config.storage.raw_dir, PathBuf::from("/tmp/raw"));
        assert_eq!(config.filter.metric_field, "max");
        // Untouched values keep their configured defaults
        assert_eq!(config.filter.threshold, 50.0);
        assert_eq!(config.pipeline.protocol, ProtocolFamily::V4);
    }

    #[test]
    fn test_log_level() {
        let mut cli = Cli::try_parse_from(["atlas_fetcher", "config", "show"]).unwrap();
        assert_eq!(cli.log_level("info"), tracing::Level::INFO);
        assert_eq!(cli.log_level("debug"), tracing::Level::DEBUG);
        assert_eq!(cli.log_level("nonsense"), tracing::Level::INFO);

        cli.global.quiet = true;
        assert_eq!(cli.log_level("debug"), tracing::Level::WARN);

        cli.global.quiet = false;
        cli.global.very_verbose = true;
        assert_eq!(cli.log_level("info"), tracing::Level::TRACE);
    }
}
