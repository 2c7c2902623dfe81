//! Result types for worker pool runs

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::PoolError;

/// Everything a finished pool run produced
#[derive(Debug)]
pub struct PoolRun<O> {
    /// One entry per input item, in input order
    pub results: Vec<Result<O, PoolError>>,
    /// Highest number of tasks in flight at the same time
    pub peak_in_flight: usize,
    /// Workers actually spawned (never more than the item count)
    pub workers_spawned: usize,
    pub duration: Duration,
}

impl<O> PoolRun<O> {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of items whose task panicked or was lost
    pub fn failed_tasks(&self) -> usize {
        self.results.iter().filter(|r| r.is_err()).count()
    }
}

/// Tracks the current and peak number of running tasks
#[derive(Debug, Default)]
pub struct InFlightGauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlightGauge {
    pub fn enter(&self) -> usize {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        now
    }

    pub fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}
