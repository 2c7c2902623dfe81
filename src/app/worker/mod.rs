//! Bounded concurrent execution for both pipeline phases
//!
//! # Module Organization
//!
//! - [`pool`] - The worker pool and its worker loop
//! - [`types`] - Run results and the in-flight gauge
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! use atlas_fetcher::app::worker::WorkerPool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = WorkerPool::new(4)?;
//! let run = pool.run(vec![1u64, 2, 3], |n| async move { n * 2 }).await;
//!
//! assert!(run.peak_in_flight <= 4);
//! for result in run.results {
//!     println!("{:?}", result);
//! }
//! # Ok(())
//! # }
//! ```

pub mod pool;
pub mod types;

pub use pool::WorkerPool;
pub use types::{InFlightGauge, PoolRun};
