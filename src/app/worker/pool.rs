//! Bounded worker pool
//!
//! A fixed number of workers pull items from a shared queue until it is
//! empty. Each worker runs one task at a time, so at most `worker_count`
//! tasks are ever in flight. Every task runs on its own tokio task, which
//! turns a panic into a per-item [`PoolError`] instead of tearing down the
//! whole run.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tokio::task::JoinError;
use tracing::{debug, warn};

use super::types::{InFlightGauge, PoolRun};
use crate::errors::PoolError;

/// Pool of workers executing one async task per item
#[derive(Debug, Clone)]
pub struct WorkerPool {
    worker_count: usize,
}

impl WorkerPool {
    /// Create a pool with `worker_count` workers
    ///
    /// # Errors
    ///
    /// Returns `PoolError::NoWorkers` when `worker_count` is zero
    pub fn new(worker_count: usize) -> Result<Self, PoolError> {
        if worker_count == 0 {
            return Err(PoolError::NoWorkers);
        }
        Ok(Self { worker_count })
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Run `task` once per item and wait for all of them
    ///
    /// Results come back in input order regardless of completion order.
    pub async fn run<T, O, F, Fut>(&self, items: Vec<T>, task: F) -> PoolRun<O>
    where
        T: Send + 'static,
        O: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
    {
        let started = Instant::now();
        let total = items.len();
        let workers = self.worker_count.min(total);

        let queue = Arc::new(Mutex::new(
            items.into_iter().enumerate().collect::<VecDeque<_>>(),
        ));
        let task = Arc::new(task);
        let gauge = Arc::new(InFlightGauge::default());

        debug!("Starting {} workers for {} items", workers, total);

        let handles: Vec<_> = (0..workers)
            .map(|worker_id| {
                let queue = Arc::clone(&queue);
                let task = Arc::clone(&task);
                let gauge = Arc::clone(&gauge);
                tokio::spawn(
                    async move { worker_loop(worker_id, queue, task, gauge).await },
                )
            })
            .collect();

        let mut slots: Vec<Option<Result<O, PoolError>>> = (0..total).map(|_| None).collect();
        for (worker_id, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(finished) => {
                    for (index, result) in finished {
                        slots[index] = Some(result);
                    }
                }
                Err(e) => warn!("Worker {} terminated: {}", worker_id, e),
            }
        }

        let results = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.unwrap_or(Err(PoolError::WorkerLost { index })))
            .collect();

        PoolRun {
            results,
            peak_in_flight: gauge.peak(),
            workers_spawned: workers,
            duration: started.elapsed(),
        }
    }
}

type Finished<O> = Vec<(usize, Result<O, PoolError>)>;

async fn worker_loop<T, O, F, Fut>(
    worker_id: usize,
    queue: Arc<Mutex<VecDeque<(usize, T)>>>,
    task: Arc<F>,
    gauge: Arc<InFlightGauge>,
) -> Finished<O>
where
    T: Send + 'static,
    O: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = O> + Send + 'static,
{
    let mut finished = Vec::new();

    loop {
        let next = queue.lock().await.pop_front();
        let Some((index, item)) = next else {
            break;
        };

        gauge.enter();
        let result = tokio::spawn((*task)(item))
            .await
            .map_err(|e| task_failure(worker_id, e));
        gauge.exit();

        if let Err(e) = &result {
            warn!("{}", e);
        }
        finished.push((index, result));
    }

    debug!("Worker {} finished {} items", worker_id, finished.len());
    finished
}

fn task_failure(worker_id: usize, error: JoinError) -> PoolError {
    let detail = if error.is_panic() {
        let payload = error.into_panic();
        payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "task panicked".to_string())
    } else {
        "task cancelled".to_string()
    };
    PoolError::TaskPanicked { worker_id, detail }
}
