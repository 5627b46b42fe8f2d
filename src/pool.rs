//! Fixed-size pool of async workers draining a shared job queue.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::{Result, SubextractError};
use crate::job::Job;

/// Capacity of the hand-off queue between the scanner and the workers
pub const QUEUE_CAPACITY: usize = 1;

/// Something that runs one job to completion. Failures are handled inside.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: Job);
}

/// Counter of dispatched-but-unfinished jobs with a blocking wait for zero
#[derive(Debug, Default)]
pub struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job before handing it to the queue
    pub fn add(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    /// Mark one job as finished
    pub fn done(&self) {
        let previous = self.count.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(previous > 0, "InFlight::done called more often than add");
        if previous == 1 {
            self.idle.notify_waiters();
        }
    }

    pub fn pending(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Wait until every registered job is done. Only call once the queue is
    /// closed, otherwise the count can rise again after returning.
    pub async fn wait(&self) {
        loop {
            let notified = self.idle.notified();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Marks one job done when dropped
struct Finished<'a>(&'a InFlight);

impl Drop for Finished<'_> {
    fn drop(&mut self) {
        self.0.done();
    }
}

/// `max(1, available - 1)`: one unit of parallelism stays with the host
pub fn default_concurrency() -> usize {
    let available = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    concurrency_for(available)
}

fn concurrency_for(available: usize) -> usize {
    if available > 1 { available - 1 } else { 1 }
}

pub struct WorkerPool {
    size: usize,
}

impl WorkerPool {
    /// Pool with the given number of workers (at least one)
    pub fn new(size: usize) -> Self {
        Self { size: size.max(1) }
    }

    /// Pool sized from the configured override or available parallelism
    pub fn from_config(workers: Option<usize>) -> Self {
        Self::new(workers.unwrap_or_else(default_concurrency))
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Spawn the workers. Each one pulls jobs until the queue is closed and
    /// drained, then returns how many jobs it completed.
    pub fn spawn<H>(
        &self,
        jobs: mpsc::Receiver<Job>,
        handler: Arc<H>,
        in_flight: Arc<InFlight>,
    ) -> Vec<JoinHandle<usize>>
    where
        H: JobHandler + ?Sized + 'static,
    {
        let jobs = Arc::new(Mutex::new(jobs));
        let mut handles = Vec::with_capacity(self.size);

        for worker_id in 0..self.size {
            let jobs = Arc::clone(&jobs);
            let handler = Arc::clone(&handler);
            let in_flight = Arc::clone(&in_flight);

            handles.push(tokio::spawn(async move {
                debug!("Worker {} started", worker_id);
                let mut completed = 0;

                loop {
                    // The lock is released before the job runs
                    let next = jobs.lock().await.recv().await;
                    let Some(job) = next else { break };

                    debug!("Worker {} picked job {}: {}", worker_id, job.id, job.display_name());
                    // Counts the job as done even if the handler panics
                    let _finished = Finished(&in_flight);
                    handler.handle(job).await;
                    completed += 1;
                }

                debug!("Worker {} finished after {} jobs", worker_id, completed);
                completed
            }));
        }

        info!("Started {} workers", self.size);
        handles
    }

    /// Wait for every worker to exit and sum their completions
    pub async fn join(handles: Vec<JoinHandle<usize>>) -> Result<usize> {
        let mut total = 0;
        for handle in handles {
            total += handle
                .await
                .map_err(|e| SubextractError::Worker(format!("Worker task failed: {}", e)))?;
        }
        Ok(total)
    }
}
