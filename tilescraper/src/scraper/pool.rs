//! Threaded download strategy.
//!
//! A fixed pool of worker threads consumes a FIFO task queue guarded by a
//! monitor. The driver thread never blocks on the queue itself; it polls
//! [`Downloader::check_ready`] so the queue stays shallow when workers fall
//! behind.
//!
//! ```text
//!  driver ──push──▶ ┌──────────────┐ ──pop──▶ worker 1
//!                   │  task queue  │ ──pop──▶ worker 2
//!  check_ready ◀─── │ depth < 3·N  │ ──pop──▶ worker N
//!                   └──────────────┘
//! ```
//!
//! Lock order is queue before counters. Workers release the queue lock
//! before running a task, so they never hold both.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use super::context::ScrapeContext;
use super::strategy::Downloader;
use super::task::DownloadTask;
use crate::error::{ScrapeError, ScrapeResult};

/// Queue depth allowed per worker before the driver is held back.
pub const QUEUE_DEPTH_FACTOR: usize = 3;

/// How long a flush waits between checks for cancellation or errors.
const FLUSH_POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Default)]
struct QueueState {
    tasks: VecDeque<DownloadTask>,
    /// Tasks currently running on a worker
    active: usize,
    /// Exit once the queue is empty
    shutdown: bool,
    /// Exit as soon as possible, dropping queued tasks
    terminate: bool,
}

#[derive(Default)]
struct Shared {
    state: Mutex<QueueState>,
    /// Signalled when a task is queued or the pool is shutting down
    work_available: Condvar,
    /// Signalled when a worker finishes a task
    task_done: Condvar,
}

/// Marks a task finished even if it panics.
struct ActiveGuard<'a>(&'a Shared);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.0.state.lock();
        state.active -= 1;
        self.0.task_done.notify_all();
    }
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        let task = {
            let mut state = shared.state.lock();
            loop {
                if state.terminate {
                    return;
                }
                if let Some(task) = state.tasks.pop_front() {
                    state.active += 1;
                    break task;
                }
                if state.shutdown {
                    return;
                }
                shared.work_available.wait(&mut state);
            }
        };

        let _guard = ActiveGuard(&shared);
        task.run();
    }
}

/// Runs tasks on a fixed pool of worker threads.
pub struct MultiThreadDownloader {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    pool_size: usize,
}

impl MultiThreadDownloader {
    /// Start a pool of `pool_size` workers (minimum 1).
    pub fn new(pool_size: usize) -> ScrapeResult<Self> {
        let pool_size = pool_size.max(1);
        let downloader = Self {
            shared: Arc::new(Shared::default()),
            workers: Mutex::new(Vec::with_capacity(pool_size)),
            pool_size,
        };

        for id in 0..pool_size {
            let shared = Arc::clone(&downloader.shared);
            let handle = thread::Builder::new()
                .name(format!("tile-worker-{}", id))
                .spawn(move || worker_loop(shared))
                .map_err(ScrapeError::WorkerSpawn)?;
            downloader.workers.lock().push(handle);
        }

        debug!(workers = pool_size, "Worker pool started");
        Ok(downloader)
    }

    /// Number of worker threads.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Tasks waiting for a worker.
    pub fn queue_depth(&self) -> usize {
        self.shared.state.lock().tasks.len()
    }

    /// Wait until every queued task has run.
    ///
    /// Stops waiting on cancellation, and on a download error unless
    /// `through_errors` is set.
    fn flush(&self, context: &ScrapeContext, through_errors: bool) {
        let mut state = self.shared.state.lock();
        while !state.tasks.is_empty() || state.active > 0 {
            if context.is_canceled() || (!through_errors && context.had_download_error()) {
                break;
            }
            self.shared
                .task_done
                .wait_for(&mut state, FLUSH_POLL_INTERVAL);
        }
    }
}

impl Downloader for MultiThreadDownloader {
    fn download_tile(&self, task: DownloadTask) {
        let mut state = self.shared.state.lock();
        state.tasks.push_back(task);
        self.shared.work_available.notify_one();
    }

    fn check_ready(&self) -> bool {
        self.queue_depth() < QUEUE_DEPTH_FACTOR * self.pool_size
    }

    fn on_level_complete(&self, context: &ScrapeContext) {
        self.flush(context, false);
    }

    /// Drain the queue unless the run was cancelled. Tasks queued before a
    /// fatal failure still run.
    fn on_download_exit(&self, context: &ScrapeContext) {
        if !context.is_canceled() {
            self.flush(context, true);
        }
        let mut state = self.shared.state.lock();
        state.shutdown = true;
        self.shared.work_available.notify_all();
    }

    /// Stop the pool. Running tasks finish; queued tasks are dropped.
    fn stop(&self) {
        {
            let mut state = self.shared.state.lock();
            state.terminate = true;
            if !state.tasks.is_empty() {
                debug!(dropped = state.tasks.len(), "Dropping queued tasks");
                state.tasks.clear();
            }
            self.shared.work_available.notify_all();
        }

        let workers: Vec<JoinHandle<()>> = self.workers.lock().drain(..).collect();
        for handle in workers {
            if handle.join().is_err() {
                warn!("Worker thread panicked");
            }
        }
    }
}

impl Drop for MultiThreadDownloader {
    fn drop(&mut self) {
        self.stop();
    }
}
