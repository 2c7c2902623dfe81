//! Atlas Fetcher Library
//!
//! Fetches RIPE Atlas daily measurement archives over a date window and
//! streams each one through a record filter into a JSON document. Both
//! phases are idempotent: finished files on disk are never redone, so an
//! interrupted run can simply be started again.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
