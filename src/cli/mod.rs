//! Command-line interface components
//!
//! This module contains CLI-specific code for the Atlas Fetcher application:
//! argument parsing, command handlers and the progress display.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{
    Cli, Commands, ConfigAction, ConfigArgs, DatasetArgs, GlobalArgs, PlanArgs, RunArgs,
    WindowArgs,
};
pub use commands::{error_hint, handle_config, handle_plan, handle_run};
pub use progress::ProgressDisplay;
